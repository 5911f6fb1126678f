// # DNS Backend Trait
//
// The contract an orchestrator needs to treat zonesync as one pluggable DNS
// backend among several: read the current records, apply a change set.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Changes, Endpoint};

/// A reconcilable DNS backend
#[async_trait]
pub trait DnsBackend: Send + Sync {
    /// Current records across every managed zone
    ///
    /// Fails with [`crate::Error::Retrieval`] if any zone cannot be read;
    /// partial results are never returned.
    async fn records(&self) -> Result<Vec<Endpoint>>;

    /// Apply a change set
    ///
    /// Returns `Ok(())` or a single error enumerating every independent
    /// failure of the pass.
    async fn apply_changes(&self, changes: Changes) -> Result<()>;
}
