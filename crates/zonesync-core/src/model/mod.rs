//! Data model shared by every stage of a reconciliation pass
//!
//! - [`Endpoint`]: desired or observed DNS record
//! - [`Zone`]: a remote-managed zone
//! - [`Change`]: one mutation to apply, built by the synthesizer
//! - [`Changes`]: the create/update/delete buckets supplied by the caller
//!
//! Everything here is transient per pass.

pub mod change;
pub mod endpoint;
pub mod zone;

pub use change::{Change, ChangeAction, ChangeBatches, ChangeRecord, Changes};
pub use endpoint::{Endpoint, RecordKey, RecordType, canonical_name};
pub use zone::Zone;
