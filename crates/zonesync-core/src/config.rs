//! Configuration types for zonesync
//!
//! Reconciliation behavior is fully determined by these values; nothing is
//! read from process-wide state inside the core.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::RecordType;

/// Main zonesync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSyncConfig {
    /// Remote zone service configuration
    pub provider: ProviderConfig,

    /// Reconciliation settings
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl ZoneSyncConfig {
    /// Create a configuration for the given provider with default settings
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            reconcile: ReconcileConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.reconcile.validate()?;
        Ok(())
    }
}

/// Remote zone service configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Anexia CloudDNS
    Anexia {
        /// API token
        api_token: String,
        /// Engine base URL (optional, defaults to the public endpoint)
        #[serde(default)]
        base_url: Option<String>,
    },

    /// Custom transport
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

// Custom Debug implementation that hides credentials
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderConfig::Anexia { base_url, .. } => f
                .debug_struct("Anexia")
                .field("api_token", &"<REDACTED>")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .field("config", &"<REDACTED>")
                .finish(),
        }
    }
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Anexia { api_token, base_url } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Anexia API token cannot be empty"));
                }
                if let Some(url) = base_url
                    && !url.starts_with("https://")
                    && !url.starts_with("http://")
                {
                    return Err(crate::Error::config(format!(
                        "Anexia base URL must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Anexia { .. } => "anexia",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

/// Reconciliation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// TTL applied to created/updated records that leave it unconfigured
    #[serde(default = "default_ttl")]
    pub default_ttl: i64,

    /// Upper bound on zones read or written concurrently
    #[serde(default = "default_max_concurrent_zones")]
    pub max_concurrent_zones: usize,

    /// Record types the planner may create, update or delete
    ///
    /// Observed records of other types (NS at the apex, MX managed by hand,
    /// ...) are left alone.
    #[serde(default = "default_managed_record_types")]
    pub managed_record_types: Vec<RecordType>,

    /// Read from the zone service but do not mutate it
    #[serde(default)]
    pub dry_run: bool,
}

impl ReconcileConfig {
    /// Validate the reconciliation settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.default_ttl < 0 {
            return Err(crate::Error::config(format!(
                "Default TTL must be >= 0. Got: {}",
                self.default_ttl
            )));
        }
        if self.max_concurrent_zones == 0 {
            return Err(crate::Error::config("max_concurrent_zones must be > 0"));
        }
        if self.managed_record_types.is_empty() {
            return Err(crate::Error::config(
                "At least one managed record type is required",
            ));
        }
        Ok(())
    }

    /// Set the default TTL
    pub fn with_default_ttl(mut self, default_ttl: i64) -> Self {
        self.default_ttl = default_ttl;
        self
    }

    /// Set the zone concurrency limit
    pub fn with_max_concurrent_zones(mut self, max: usize) -> Self {
        self.max_concurrent_zones = max;
        self
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            default_ttl: default_ttl(),
            max_concurrent_zones: default_max_concurrent_zones(),
            managed_record_types: default_managed_record_types(),
            dry_run: false,
        }
    }
}

/// Default TTL in seconds
pub const DEFAULT_TTL: i64 = 3600;

fn default_ttl() -> i64 {
    DEFAULT_TTL
}

fn default_max_concurrent_zones() -> usize {
    4
}

fn default_managed_record_types() -> Vec<RecordType> {
    vec![
        RecordType::A,
        RecordType::Aaaa,
        RecordType::Cname,
        RecordType::Txt,
    ]
}
