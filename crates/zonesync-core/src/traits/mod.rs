//! Core traits for zonesync
//!
//! - [`ZoneTransport`]: authenticated access to the remote zone service
//! - [`DnsBackend`]: the two entry points an orchestrator drives

pub mod dns_backend;
pub mod zone_transport;

pub use dns_backend::DnsBackend;
pub use zone_transport::{RemoteRecord, ZoneTransport, ZoneTransportFactory};
