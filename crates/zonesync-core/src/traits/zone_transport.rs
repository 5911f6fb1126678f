// # Zone Transport Trait
//
// Defines the interface to the remote zone service.
//
// ## Implementations
//
// - Anexia CloudDNS: `zonesync-anexia` crate
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::ZoneTransport;
//
// async fn dump(transport: &dyn ZoneTransport) -> zonesync_core::Result<()> {
//     for zone in transport.list_zones().await? {
//         let records = transport.list_records(&zone.name).await?;
//         println!("{}: {} record(s)", zone.name, records.len());
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Change, Zone};

/// A record as returned by the remote zone service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRecord {
    /// Fully-qualified record name
    pub name: String,
    /// Record type as reported by the service (may be a type zonesync does
    /// not manage, such as SOA)
    pub record_type: String,
    /// Record value
    pub value: String,
    /// Explicit TTL, if the service reports one
    pub ttl: Option<i64>,
}

impl RemoteRecord {
    /// Create a remote record
    pub fn new(
        name: impl Into<String>,
        record_type: impl Into<String>,
        value: impl Into<String>,
        ttl: Option<i64>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            value: value.into(),
            ttl,
        }
    }
}

/// Access to a remote authoritative zone service
///
/// Implementations are authenticated and own their HTTP plumbing. They do
/// not retry; a failed call is returned to the core, which reports it and
/// lets the caller re-run the pass.
///
/// # Thread Safety
///
/// Implementations must be thread-safe: the submitter and the observer call
/// them from concurrent tasks, one per zone.
///
/// ## Forbidden Capabilities
/// - ❌ Retry or back off (owned by the caller of the pass)
/// - ❌ Reorder a batch (the submitter already fixed the order)
/// - ❌ Decide which changes are needed (owned by the planner/synthesizer)
#[async_trait]
pub trait ZoneTransport: Send + Sync {
    /// List every manageable zone
    ///
    /// Must fail as a whole rather than return a partial list.
    async fn list_zones(&self) -> Result<Vec<Zone>>;

    /// List every record in `zone`, with fully-qualified names
    async fn list_records(&self, zone: &str) -> Result<Vec<RemoteRecord>>;

    /// Apply one zone's batch, in the order given
    ///
    /// The error should name the action and record that failed.
    async fn apply_changes(&self, zone: &str, changes: &[Change]) -> Result<()>;

    /// Transport name (for logging/debugging)
    fn transport_name(&self) -> &'static str;
}

/// Helper trait for constructing transports from configuration
pub trait ZoneTransportFactory: Send + Sync {
    /// Create a transport instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn ZoneTransport>>;
}
