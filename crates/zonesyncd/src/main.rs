// # zonesyncd - zonesync command-line front end
//
// This binary is a THIN integration layer only. All reconciliation logic
// lives in zonesync-core; this file:
// 1. Reads configuration from environment variables
// 2. Initializes logging and the runtime
// 3. Registers transports and builds the configured one
// 4. Runs a single pass and maps the outcome to an exit code
//
// ## Commands
//
// - `zonesyncd records`                  print observed endpoints as JSON
// - `zonesyncd apply <changes.json>`     apply a change set document
// - `zonesyncd reconcile <desired.json>` plan against observed state and apply
//
// ## Configuration
//
// ### Provider
// - `ZONESYNC_PROVIDER_TYPE`: Provider type (anexia)
// - `ZONESYNC_PROVIDER_API_TOKEN`: API token (falls back to `ANEXIA_TOKEN`)
// - `ZONESYNC_PROVIDER_BASE_URL`: Engine base URL (optional)
//
// ### Reconciliation
// - `ZONESYNC_DEFAULT_TTL`: TTL for endpoints without one (default 3600)
// - `ZONESYNC_MAX_CONCURRENT_ZONES`: Zones submitted in parallel (default 4)
// - `ZONESYNC_MANAGED_TYPES`: Comma-separated record types to reconcile
// - `ZONESYNC_MODE`: `dry-run` to log mutations instead of sending them
// - `ZONESYNC_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export ZONESYNC_PROVIDER_TYPE=anexia
// export ZONESYNC_PROVIDER_API_TOKEN=your_token
// export ZONESYNC_MODE=dry-run
//
// zonesyncd reconcile desired.json
// ```

use anyhow::{Context, Result};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use zonesync_core::{
    CancelHandle, Changes, DnsBackend, Endpoint, ProviderConfig, ReconcileConfig, RecordType,
    TransportRegistry, ZoneSyncBackend, ZoneSyncConfig, cancellation,
};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Pass completed
/// - 1: Configuration or usage error
/// - 2: Runtime error (retrieval, routing, submission, cancellation)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZoneSyncExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<ZoneSyncExitCode> for ExitCode {
    fn from(code: ZoneSyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Requested operation
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Records,
    Apply(String),
    Reconcile(String),
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        match args {
            [cmd] if cmd == "records" => Ok(Command::Records),
            [cmd, path] if cmd == "apply" => Ok(Command::Apply(path.clone())),
            [cmd, path] if cmd == "reconcile" => Ok(Command::Reconcile(path.clone())),
            _ => anyhow::bail!(
                "usage: zonesyncd records | apply <changes.json> | reconcile <desired.json>"
            ),
        }
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    provider_type: String,
    provider_api_token: String,
    provider_base_url: Option<String>,
    default_ttl: Option<i64>,
    max_concurrent_zones: Option<usize>,
    managed_types: Vec<String>,
    mode: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let default_ttl = lookup("ZONESYNC_DEFAULT_TTL")
            .map(|s| {
                s.trim()
                    .parse()
                    .with_context(|| format!("ZONESYNC_DEFAULT_TTL is not a number: {}", s))
            })
            .transpose()?;
        let max_concurrent_zones = lookup("ZONESYNC_MAX_CONCURRENT_ZONES")
            .map(|s| {
                s.trim().parse().with_context(|| {
                    format!("ZONESYNC_MAX_CONCURRENT_ZONES is not a number: {}", s)
                })
            })
            .transpose()?;

        Ok(Self {
            provider_type: lookup("ZONESYNC_PROVIDER_TYPE").unwrap_or_else(|| "anexia".to_string()),
            provider_api_token: lookup("ZONESYNC_PROVIDER_API_TOKEN")
                .or_else(|| lookup("ANEXIA_TOKEN"))
                .unwrap_or_default(),
            provider_base_url: lookup("ZONESYNC_PROVIDER_BASE_URL").filter(|s| !s.is_empty()),
            default_ttl,
            max_concurrent_zones,
            managed_types: lookup("ZONESYNC_MANAGED_TYPES")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            mode: lookup("ZONESYNC_MODE").unwrap_or_else(|| "apply".to_string()),
            log_level: lookup("ZONESYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration and convert it into core settings
    fn into_zonesync_config(self) -> Result<ZoneSyncConfig> {
        if self.provider_api_token.is_empty() {
            anyhow::bail!(
                "ZONESYNC_PROVIDER_API_TOKEN is required. \
                Set it via: export ZONESYNC_PROVIDER_API_TOKEN=your_token"
            );
        }

        let token_lower = self.provider_api_token.to_lowercase();
        if token_lower.contains("your_token") || token_lower.contains("replace_me") {
            anyhow::bail!(
                "ZONESYNC_PROVIDER_API_TOKEN appears to be a placeholder. \
                Use an actual API token from your DNS provider."
            );
        }

        if let Some(url) = &self.provider_base_url
            && !url.starts_with("https://")
            && !url.starts_with("http://")
        {
            anyhow::bail!(
                "ZONESYNC_PROVIDER_BASE_URL must use HTTP or HTTPS scheme. Got: {}",
                url
            );
        }

        let provider = match self.provider_type.as_str() {
            "anexia" => ProviderConfig::Anexia {
                api_token: self.provider_api_token,
                base_url: self.provider_base_url,
            },
            other => anyhow::bail!(
                "ZONESYNC_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: anexia",
                other
            ),
        };

        let dry_run = match self.mode.to_lowercase().as_str() {
            "apply" => false,
            "dry-run" => true,
            other => anyhow::bail!(
                "ZONESYNC_MODE '{}' is not valid. Valid modes: apply, dry-run",
                other
            ),
        };

        let mut reconcile = ReconcileConfig {
            dry_run,
            ..ReconcileConfig::default()
        };
        if let Some(ttl) = self.default_ttl {
            reconcile = reconcile.with_default_ttl(ttl);
        }
        if let Some(max) = self.max_concurrent_zones {
            reconcile = reconcile.with_max_concurrent_zones(max);
        }
        if !self.managed_types.is_empty() {
            reconcile.managed_record_types = self
                .managed_types
                .iter()
                .map(|t| t.parse::<RecordType>())
                .collect::<zonesync_core::Result<_>>()
                .context("ZONESYNC_MANAGED_TYPES contains an unknown record type")?;
        }

        let config = ZoneSyncConfig {
            provider,
            reconcile,
        };
        config.validate()?;
        Ok(config)
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "ZONESYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            return ZoneSyncExitCode::ConfigError.into();
        }
    };

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ZoneSyncExitCode::ConfigError.into();
        }
    };

    let log_level = match config.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return ZoneSyncExitCode::ConfigError.into();
        }
    };

    let config = match config.into_zonesync_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration validation error: {:#}", e);
            return ZoneSyncExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZoneSyncExitCode::ConfigError.into();
    }

    info!(
        "Starting zonesyncd ({} provider{})",
        config.provider.type_name(),
        if config.reconcile.dry_run { ", dry-run" } else { "" }
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZoneSyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let backend = match build_backend(&config) {
            Ok(backend) => backend,
            Err(e) => {
                error!("Failed to initialize transport: {:#}", e);
                return ZoneSyncExitCode::ConfigError;
            }
        };

        match run(command, &backend).await {
            Ok(()) => ZoneSyncExitCode::Success,
            Err(e) => {
                error!("Pass failed: {:#}", e);
                ZoneSyncExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Build the backend for the configured provider
fn build_backend(config: &ZoneSyncConfig) -> Result<ZoneSyncBackend> {
    let registry = TransportRegistry::new();

    #[cfg(feature = "anexia")]
    {
        info!("Registering Anexia transport");
        zonesync_anexia::register(&registry);
    }

    let transport = registry.create_transport(&config.provider)?;
    Ok(ZoneSyncBackend::new(
        Arc::from(transport),
        config.reconcile.clone(),
    )?)
}

/// Run one command against the backend
async fn run(command: Command, backend: &ZoneSyncBackend) -> Result<()> {
    match command {
        Command::Records => {
            let endpoints = backend.records().await?;
            println!("{}", serde_json::to_string_pretty(&endpoints)?);
        }
        Command::Apply(path) => {
            let changes: Changes = read_json(&path).await?;
            info!("Applying {} change(s) from {}", changes.len(), path);

            let (handle, cancel) = cancellation();
            let watcher = tokio::spawn(cancel_on_signal(handle));
            let result = backend.apply_changes_with_cancel(changes, &cancel).await;
            watcher.abort();
            result?;
        }
        Command::Reconcile(path) => {
            let desired: Vec<Endpoint> = read_json(&path).await?;
            info!("Reconciling {} desired endpoint(s) from {}", desired.len(), path);

            let (handle, cancel) = cancellation();
            let watcher = tokio::spawn(cancel_on_signal(handle));
            let result = backend.reconcile(&desired, None, &cancel).await;
            watcher.abort();
            let changes = result?;
            println!("{}", serde_json::to_string_pretty(&changes)?);
        }
    }
    Ok(())
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path))
}

/// Cancel the pass on the first shutdown signal
async fn cancel_on_signal(handle: CancelHandle) {
    match wait_for_shutdown().await {
        Ok(signal) => {
            warn!("Received {}, cancelling pending zones", signal);
            handle.cancel();
        }
        Err(e) => error!("Signal handling unavailable: {}", e),
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
