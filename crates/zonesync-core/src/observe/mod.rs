//! Record observer
//!
//! Reads the current records of every zone and maps them into endpoints.
//! Observation is all-or-nothing: a partial read is not a safe basis for
//! diffing, so the first zone that fails aborts the whole read.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::model::{Endpoint, RecordType, Zone};
use crate::traits::{RemoteRecord, ZoneTransport};

/// Map a remote record into an endpoint
///
/// Returns `None` for record types zonesync does not model (SOA, ...). A
/// reported TTL becomes an explicit, configured TTL.
pub fn to_endpoint(record: &RemoteRecord) -> Option<Endpoint> {
    let record_type = match record.record_type.parse::<RecordType>() {
        Ok(record_type) => record_type,
        Err(_) => {
            debug!(
                "Skipping {} record {}: type not modelled",
                record.record_type, record.name
            );
            return None;
        }
    };

    Some(Endpoint {
        name: record.name.clone(),
        record_type,
        targets: vec![record.value.clone()],
        ttl: record.ttl,
    })
}

/// Reads records across zones through a transport
pub struct Observer {
    transport: Arc<dyn ZoneTransport>,
    max_concurrent_zones: usize,
}

impl Observer {
    /// Create an observer
    pub fn new(transport: Arc<dyn ZoneTransport>, max_concurrent_zones: usize) -> Self {
        Self {
            transport,
            max_concurrent_zones: max_concurrent_zones.max(1),
        }
    }

    /// Observe every zone
    ///
    /// Endpoints come back grouped by zone in the order `zones` was given,
    /// each zone in the order the transport listed its records, regardless
    /// of which zone finished first.
    pub async fn observe(&self, zones: &[Zone]) -> Result<Vec<Endpoint>> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_zones));
        let mut tasks = JoinSet::new();

        for (position, zone) in zones.iter().enumerate() {
            let transport = Arc::clone(&self.transport);
            let semaphore = Arc::clone(&semaphore);
            let zone = zone.name.clone();
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::retrieval(format!("zone {}: {}", zone, e)))?;
                let records = transport.list_records(&zone).await.map_err(|e| {
                    Error::retrieval(format!("record listing failed for zone {}: {}", zone, e))
                })?;
                debug!("Zone {}: {} remote record(s)", zone, records.len());
                Ok::<_, Error>((position, records))
            });
        }

        let mut by_position = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (position, records) = match joined {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => {
                    error!("{}", e);
                    // Dropping the set aborts the zones still being read.
                    return Err(e);
                }
                Err(e) => {
                    return Err(Error::retrieval(format!("record listing task failed: {}", e)));
                }
            };
            by_position.insert(position, records);
        }

        Ok(by_position
            .values()
            .flatten()
            .filter_map(to_endpoint)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_ttl_as_configured() {
        let ep = to_endpoint(&RemoteRecord::new("a.example.com", "A", "192.0.2.1", Some(600)))
            .unwrap();
        assert_eq!(ep.ttl, Some(600));
        assert_eq!(ep.targets, vec!["192.0.2.1".to_string()]);
        assert_eq!(ep.record_type, RecordType::A);
    }

    #[test]
    fn missing_ttl_stays_unconfigured() {
        let ep = to_endpoint(&RemoteRecord::new("a.example.com", "txt", "hello", None)).unwrap();
        assert_eq!(ep.ttl, None);
        assert_eq!(ep.record_type, RecordType::Txt);
    }

    #[test]
    fn unmodelled_types_are_skipped() {
        assert!(to_endpoint(&RemoteRecord::new(
            "example.com",
            "SOA",
            "ns1.example.com. hostmaster.example.com. 1 7200 900 1209600 86400",
            Some(86400)
        ))
        .is_none());
    }
}
