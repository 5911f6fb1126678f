// # Zone
//
// A zone is identified by its root domain. Zones are read once per pass
// from the transport and never mutated by the core.

use serde::{Deserialize, Serialize};

use super::endpoint::canonical_name;

/// A remote-managed DNS zone
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Zone {
    /// The zone's root domain, used both as identity and as the suffix-match key
    pub name: String,
}

impl Zone {
    /// Create a zone from its root domain
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Lowercased name without a trailing dot
    pub fn canonical_name(&self) -> String {
        canonical_name(&self.name)
    }
}

