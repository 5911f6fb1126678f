// # zonesync-core
//
// Reconciliation engine for DNS zones held by a remote authoritative zone
// service.
//
// ## Architecture Overview
//
// A pass takes desired create/update/delete buckets from an orchestrator
// and converges the remote zones toward them:
// - **ZoneDirectory**: snapshot of manageable zones, longest-suffix owner lookup
// - **synth**: buckets -> provider-agnostic `Change` list, TTL defaulting
// - **router**: changes -> per-zone batches (all-or-nothing)
// - **Submitter**: per-zone CREATE/DELETE/UPDATE submission with failure isolation
// - **Observer**: remote records -> endpoints
// - **plan**: desired vs. observed diff
// - **ZoneSyncBackend**: the `DnsBackend` an orchestrator drives
//
// ## Design Principles
//
// 1. **Explicit inputs**: default TTL and concurrency come from `ReconcileConfig`
// 2. **Validate before mutating**: routing and endpoint checks run before any write
// 3. **Zone isolation**: a failed zone never blocks or rolls back another
// 4. **Idempotency**: re-running a pass against converged state changes nothing
// 5. **No retries in the core**: the caller re-runs the pass

pub mod backend;
pub mod cancel;
pub mod config;
pub mod directory;
pub mod error;
pub mod model;
pub mod observe;
pub mod plan;
pub mod registry;
pub mod router;
pub mod submit;
pub mod synth;
pub mod traits;

// Re-export core types for convenience
pub use backend::ZoneSyncBackend;
pub use cancel::{CancelHandle, Cancellation, cancellation};
pub use config::{ProviderConfig, ReconcileConfig, ZoneSyncConfig};
pub use directory::{ZoneDirectory, ZoneNameIndex};
pub use error::{Error, Result, SubmissionError, ZoneFailure};
pub use model::{
    Change, ChangeAction, ChangeBatches, ChangeRecord, Changes, Endpoint, RecordType, Zone,
};
pub use observe::Observer;
pub use plan::PlanPolicy;
pub use registry::TransportRegistry;
pub use submit::{SubmissionReport, Submitter, ZoneOutcome};
pub use traits::{DnsBackend, RemoteRecord, ZoneTransport, ZoneTransportFactory};
