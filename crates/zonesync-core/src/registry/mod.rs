//! Plugin-based transport registry
//!
//! Transports register a factory under their provider type name, so the
//! daemon can build one from [`ProviderConfig`] without hard-coded
//! branching.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zonesync_core::registry::TransportRegistry;
//!
//! let registry = TransportRegistry::new();
//! zonesync_anexia::register(&registry);
//!
//! let transport = registry.create_transport(&config.provider)?;
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{ZoneTransport, ZoneTransportFactory};

/// Registry of transport factories keyed by provider type name
///
/// Uses interior mutability so registration works through a shared
/// reference.
#[derive(Default)]
pub struct TransportRegistry {
    transports: RwLock<HashMap<String, Box<dyn ZoneTransportFactory>>>,
}

impl TransportRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transport factory
    ///
    /// A later registration under the same name replaces the earlier one.
    pub fn register_transport(
        &self,
        name: impl Into<String>,
        factory: Box<dyn ZoneTransportFactory>,
    ) {
        let mut transports = self
            .transports
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        transports.insert(name.into(), factory);
    }

    /// Create a transport from configuration
    ///
    /// Fails if the provider type is not registered or the factory rejects
    /// the configuration.
    pub fn create_transport(&self, config: &ProviderConfig) -> Result<Box<dyn ZoneTransport>> {
        let transport_type = config.type_name();
        let transports = self
            .transports
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let factory = transports
            .get(transport_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", transport_type)))?;

        factory.create(config)
    }

    /// List all registered transport types, sorted
    pub fn list_transports(&self) -> Vec<String> {
        let transports = self
            .transports
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = transports.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a transport type is registered
    pub fn has_transport(&self, name: &str) -> bool {
        let transports = self
            .transports
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        transports.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RejectingFactory;

    impl ZoneTransportFactory for RejectingFactory {
        fn create(&self, _config: &ProviderConfig) -> Result<Box<dyn ZoneTransport>> {
            Err(Error::config("mock transport rejects every config"))
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = TransportRegistry::new();
        assert!(!registry.has_transport("mock"));

        registry.register_transport("mock", Box::new(RejectingFactory));

        assert!(registry.has_transport("mock"));
        assert_eq!(registry.list_transports(), vec!["mock".to_string()]);
    }

    #[test]
    fn unknown_type_is_a_config_error() {
        let registry = TransportRegistry::new();
        let config = ProviderConfig::Anexia {
            api_token: "t0k3n".to_string(),
            base_url: None,
        };
        match registry.create_transport(&config) {
            Err(Error::Config(msg)) => assert!(msg.contains("anexia")),
            Err(other) => panic!("expected Config error, got {other:?}"),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[test]
    fn custom_config_dispatches_on_factory_name() {
        let registry = TransportRegistry::new();
        registry.register_transport("mock", Box::new(RejectingFactory));
        let config = ProviderConfig::Custom {
            factory: "mock".to_string(),
            config: serde_json::json!({}),
        };
        assert!(matches!(
            registry.create_transport(&config),
            Err(Error::Config(msg)) if msg.contains("rejects")
        ));
    }
}
