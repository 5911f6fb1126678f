//! Zone directory
//!
//! Holds the zones of one pass and resolves a record name to its owning
//! zone by longest-suffix match on label boundaries:
//!
//! ```text
//! zones:  example.com, sub.example.com
//! a.sub.example.com  -> sub.example.com
//! b.example.com      -> example.com
//! example.org        -> (none)
//! ```

use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Zone, canonical_name};
use crate::traits::ZoneTransport;

/// Canonical zone name -> zone, rebuilt every pass
pub type ZoneNameIndex = BTreeMap<String, Zone>;

/// Snapshot of the manageable zones for one pass
#[derive(Debug, Clone, Default)]
pub struct ZoneDirectory {
    index: ZoneNameIndex,
}

impl ZoneDirectory {
    /// Build a directory from a zone listing
    pub fn new(zones: impl IntoIterator<Item = Zone>) -> Self {
        let mut index = ZoneNameIndex::new();
        for zone in zones {
            let key = zone.canonical_name();
            if key.is_empty() {
                debug!("Ignoring zone with empty name");
                continue;
            }
            if index.insert(key, zone).is_some() {
                debug!("Zone listed twice, keeping the last entry");
            }
        }
        Self { index }
    }

    /// Fetch the zone listing from the transport
    ///
    /// Any failure is reported as [`Error::Retrieval`]; a partial listing is
    /// never returned.
    pub async fn load(transport: &dyn ZoneTransport) -> Result<Self> {
        let zones = transport.list_zones().await.map_err(|e| match e {
            Error::Retrieval(_) => e,
            other => Error::retrieval(format!("zone listing failed: {}", other)),
        })?;
        debug!(
            "Loaded {} zone(s) from {}",
            zones.len(),
            transport.transport_name()
        );
        Ok(Self::new(zones))
    }

    /// Zones ordered by canonical name
    pub fn list(&self) -> Vec<Zone> {
        self.index.values().cloned().collect()
    }

    /// Borrow the name index
    pub fn index(&self) -> &ZoneNameIndex {
        &self.index
    }

    /// Number of zones
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether no zones are managed
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Resolve the zone owning `name`, preferring the longest matching zone
    pub fn find_owner(&self, name: &str) -> Option<&Zone> {
        let name = canonical_name(name);
        let mut candidate = name.as_str();
        loop {
            if let Some(zone) = self.index.get(candidate) {
                return Some(zone);
            }
            match candidate.split_once('.') {
                Some((_, parent)) if !parent.is_empty() => candidate = parent,
                _ => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> ZoneDirectory {
        ZoneDirectory::new([
            Zone::new("example.com"),
            Zone::new("sub.example.com"),
            Zone::new("Other.NET."),
        ])
    }

    #[test]
    fn longest_suffix_wins() {
        let dir = directory();
        assert_eq!(
            dir.find_owner("a.sub.example.com").map(|z| z.name.as_str()),
            Some("sub.example.com")
        );
        assert_eq!(
            dir.find_owner("a.example.com").map(|z| z.name.as_str()),
            Some("example.com")
        );
        assert_eq!(
            dir.find_owner("sub.example.com").map(|z| z.name.as_str()),
            Some("sub.example.com")
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        let dir = directory();
        assert_eq!(
            dir.find_owner("WWW.other.net.").map(|z| z.name.as_str()),
            Some("Other.NET.")
        );
    }

    #[test]
    fn no_match_on_partial_label() {
        let dir = directory();
        assert!(dir.find_owner("badexample.com").is_none());
        assert!(dir.find_owner("example.org").is_none());
        assert!(dir.find_owner("").is_none());
    }

    #[test]
    fn list_is_ordered_and_deduplicated() {
        let dir = ZoneDirectory::new([
            Zone::new("b.test"),
            Zone::new("a.test"),
            Zone::new("B.test"),
            Zone::new(""),
        ]);
        let names: Vec<String> = dir.list().into_iter().map(|z| z.canonical_name()).collect();
        assert_eq!(names, vec!["a.test", "b.test"]);
        assert_eq!(dir.len(), 2);
    }
}
