// # Anexia CloudDNS Transport
//
// This crate provides the Anexia CloudDNS implementation of
// `zonesync_core::ZoneTransport`.
//
// ## Behavior
//
// - ✅ One zone listing call, one record listing call per zone
// - ✅ Batches applied in the order the submitter fixed, stopping at the first failure
// - ✅ Specific error handling for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Zone-relative record names on the wire, fully-qualified names in zonesync
// - ❌ NO retry or backoff (the caller re-runs the pass)
// - ❌ NO rollback of a partially applied batch (the API is not transactional)
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Transport MUST fail fast if the token is empty
//
// ## API Reference
//
// - List zones:     GET    `/api/clouddns/v1/zone.json`
// - List records:   GET    `/api/clouddns/v1/zone.json/:zone/records`
// - Create record:  POST   `/api/clouddns/v1/zone.json/:zone/records`
// - Update record:  PUT    `/api/clouddns/v1/zone.json/:zone/records/:identifier`
// - Delete record:  DELETE `/api/clouddns/v1/zone.json/:zone/records/:identifier`
// - Auth header:    `Authorization: Token <token>`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use zonesync_core::config::ProviderConfig;
use zonesync_core::model::canonical_name;
use zonesync_core::{
    Change, ChangeAction, ChangeRecord, Error, RemoteRecord, Result, TransportRegistry, Zone,
    ZoneTransport, ZoneTransportFactory,
};

/// Anexia Engine base URL
pub const ANEXIA_API_BASE: &str = "https://engine.anexia-it.com";

const ZONE_PATH: &str = "/api/clouddns/v1/zone.json";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const TRANSPORT_NAME: &str = "anexia";

/// Zone as listed by the API (only the fields zonesync needs)
#[derive(Debug, Clone, Deserialize)]
struct ApiZone {
    name: String,
}

/// Record as listed by the API
#[derive(Debug, Clone, Deserialize)]
struct ApiRecord {
    identifier: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    rdata: String,
    #[serde(default)]
    ttl: Option<i64>,
    #[serde(default)]
    immutable: bool,
}

/// Create/update request body
#[derive(Debug, Serialize)]
struct RecordRequest<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    rdata: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ttl: Option<i64>,
}

/// Anexia CloudDNS transport
///
/// Stateless between calls: every `apply_changes` re-reads the zone's
/// records to resolve record identifiers.
pub struct AnexiaTransport {
    /// API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// Engine base URL without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for AnexiaTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnexiaTransport")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AnexiaTransport {
    /// Create a new transport
    ///
    /// `base_url` defaults to [`ANEXIA_API_BASE`].
    pub fn new(api_token: impl Into<String>, base_url: Option<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Anexia API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = base_url
            .unwrap_or_else(|| ANEXIA_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_token,
            base_url,
            client,
        })
    }

    fn zones_url(&self) -> String {
        format!("{}{}", self.base_url, ZONE_PATH)
    }

    fn records_url(&self, zone: &str) -> String {
        format!("{}{}/{}/records", self.base_url, ZONE_PATH, zone)
    }

    fn record_url(&self, zone: &str, identifier: &str) -> String {
        format!("{}/{}", self.records_url(zone), identifier)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<reqwest::Response> {
        let response = request
            .header("Authorization", format!("Token {}", self.api_token))
            .send()
            .await
            .map_err(|e| Error::http(format!("{}: request failed: {}", context, e)))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        Err(status_error(status.as_u16(), context, &error_text))
    }

    async fn fetch_records(&self, zone: &str) -> Result<Vec<ApiRecord>> {
        let context = format!("list records of zone {}", zone);
        let response = self.send(self.client.get(self.records_url(zone)), &context).await?;
        response
            .json::<Vec<ApiRecord>>()
            .await
            .map_err(|e| {
                Error::provider(
                    TRANSPORT_NAME,
                    format!("{}: invalid response: {}", context, e),
                )
            })
    }

    async fn create_record(&self, zone: &str, record: &ChangeRecord) -> Result<()> {
        let relative = to_relative(&record.name, zone);
        let body = RecordRequest {
            name: &relative,
            record_type: record.record_type.as_str(),
            rdata: record.value.as_deref().unwrap_or_default(),
            ttl: record.ttl,
        };
        tracing::debug!("POST record {} in zone {}", relative, zone);
        self.send(
            self.client.post(self.records_url(zone)).json(&body),
            &format!("create {} in zone {}", record.name, zone),
        )
        .await?;
        Ok(())
    }

    async fn update_record(
        &self,
        zone: &str,
        identifier: &str,
        record: &ChangeRecord,
    ) -> Result<()> {
        let relative = to_relative(&record.name, zone);
        let body = RecordRequest {
            name: &relative,
            record_type: record.record_type.as_str(),
            rdata: record.value.as_deref().unwrap_or_default(),
            ttl: record.ttl,
        };
        tracing::debug!("PUT record {} ({}) in zone {}", relative, identifier, zone);
        self.send(
            self.client.put(self.record_url(zone, identifier)).json(&body),
            &format!("update {} in zone {}", record.name, zone),
        )
        .await?;
        Ok(())
    }

    async fn delete_record(&self, zone: &str, identifier: &str, name: &str) -> Result<()> {
        tracing::debug!("DELETE record {} ({}) in zone {}", name, identifier, zone);
        self.send(
            self.client.delete(self.record_url(zone, identifier)),
            &format!("delete {} in zone {}", name, zone),
        )
        .await?;
        Ok(())
    }

    async fn apply_one(&self, zone: &str, existing: &[ApiRecord], change: &Change) -> Result<()> {
        match change.action {
            ChangeAction::Create => self.create_record(zone, &change.record).await,
            ChangeAction::Delete => {
                let value = change.record.value.as_deref();
                let targets = find_records(existing, zone, &change.record, value)?;
                if targets.is_empty() {
                    tracing::debug!("{} already absent from zone {}", change, zone);
                }
                for record in targets {
                    self.delete_record(zone, &record.identifier, &change.record.name)
                        .await?;
                }
                Ok(())
            }
            ChangeAction::Update => {
                let previous_value = change.previous.as_ref().and_then(|p| p.value.as_deref());
                let mut targets = find_records(existing, zone, &change.record, None)?;
                // Rewrite the record that held the previous value, if known.
                if let Some(value) = previous_value
                    && let Some(pos) = targets.iter().position(|r| r.rdata == value)
                {
                    targets.swap(0, pos);
                }

                let Some((first, rest)) = targets.split_first() else {
                    tracing::debug!(
                        "{} not found in zone {}, creating it",
                        change.record.name,
                        zone
                    );
                    return self.create_record(zone, &change.record).await;
                };

                self.update_record(zone, &first.identifier, &change.record).await?;
                for record in rest {
                    self.delete_record(zone, &record.identifier, &change.record.name)
                        .await?;
                }
                Ok(())
            }
        }
    }
}

#[async_trait]
impl ZoneTransport for AnexiaTransport {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let response = self
            .send(self.client.get(self.zones_url()), "list zones")
            .await?;

        let zones: Vec<ApiZone> = response.json().await.map_err(|e| {
            Error::provider(TRANSPORT_NAME, format!("list zones: invalid response: {}", e))
        })?;

        tracing::debug!("Listed {} zone(s)", zones.len());
        Ok(zones.into_iter().map(|z| Zone::new(z.name)).collect())
    }

    async fn list_records(&self, zone: &str) -> Result<Vec<RemoteRecord>> {
        let records = self.fetch_records(zone).await?;

        Ok(records
            .into_iter()
            .map(|r| RemoteRecord::new(to_fqdn(&r.name, zone), r.record_type, r.rdata, r.ttl))
            .collect())
    }

    async fn apply_changes(&self, zone: &str, changes: &[Change]) -> Result<()> {
        tracing::info!("Applying {} change(s) to Anexia zone {}", changes.len(), zone);

        let needs_lookup = changes.iter().any(|c| c.action != ChangeAction::Create);
        let existing = if needs_lookup {
            self.fetch_records(zone).await?
        } else {
            Vec::new()
        };

        for change in changes {
            self.apply_one(zone, &existing, change).await.map_err(|e| {
                Error::provider(
                    TRANSPORT_NAME,
                    format!(
                        "{} {} ({}) in zone {} failed: {}",
                        change.action, change.record.name, change.record.record_type, zone, e
                    ),
                )
            })?;
        }

        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        TRANSPORT_NAME
    }
}

/// Map a failed HTTP status to an error
fn status_error(status: u16, context: &str, body: &str) -> Error {
    match status {
        401 | 403 => Error::auth(format!(
            "{}: invalid API token or insufficient permissions (HTTP {})",
            context, status
        )),
        404 => Error::not_found(format!("{}: HTTP 404", context)),
        409 => Error::provider(
            TRANSPORT_NAME,
            format!("{}: conflict, zone is being changed concurrently (HTTP 409)", context),
        ),
        429 => Error::rate_limited(format!("{}: rate limit exceeded (HTTP 429)", context)),
        500..=599 => Error::http(format!(
            "{}: server error (transient): HTTP {} - {}",
            context, status, body
        )),
        _ => Error::provider(
            TRANSPORT_NAME,
            format!("{}: HTTP {} - {}", context, status, body),
        ),
    }
}

/// Remote records with the change's name and type, and `value` if given
fn find_records<'a>(
    existing: &'a [ApiRecord],
    zone: &str,
    record: &ChangeRecord,
    value: Option<&str>,
) -> Result<Vec<&'a ApiRecord>> {
    let name = canonical_name(&record.name);
    let matches: Vec<&ApiRecord> = existing
        .iter()
        .filter(|r| canonical_name(&to_fqdn(&r.name, zone)) == name)
        .filter(|r| r.record_type.eq_ignore_ascii_case(record.record_type.as_str()))
        .filter(|r| value.is_none_or(|v| r.rdata == v))
        .collect();

    if let Some(locked) = matches.iter().find(|r| r.immutable) {
        return Err(Error::provider(
            TRANSPORT_NAME,
            format!("record {} ({}) is immutable", record.name, locked.identifier),
        ));
    }
    Ok(matches)
}

/// Expand a zone-relative name; `@` and the empty name denote the apex
fn to_fqdn(relative: &str, zone: &str) -> String {
    let zone = zone.trim_end_matches('.');
    match relative.trim_end_matches('.') {
        "" | "@" => zone.to_string(),
        name => format!("{}.{}", name, zone),
    }
}

/// Reduce a fully-qualified name to its zone-relative form
fn to_relative(fqdn: &str, zone: &str) -> String {
    let name = canonical_name(fqdn);
    let zone = canonical_name(zone);
    if name == zone {
        return "@".to_string();
    }
    match name.strip_suffix(zone.as_str()) {
        Some(prefix) if prefix.ends_with('.') => prefix.trim_end_matches('.').to_string(),
        _ => name,
    }
}

/// Factory for creating Anexia transports
pub struct AnexiaFactory;

impl ZoneTransportFactory for AnexiaFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn ZoneTransport>> {
        match config {
            ProviderConfig::Anexia {
                api_token,
                base_url,
            } => {
                if api_token.is_empty() {
                    return Err(Error::config("Anexia API token is required"));
                }
                Ok(Box::new(AnexiaTransport::new(
                    api_token.clone(),
                    base_url.clone(),
                )?))
            }
            _ => Err(Error::config("Invalid config for Anexia transport")),
        }
    }
}

/// Register the Anexia transport with a registry
///
/// # Example
///
/// ```rust
/// use zonesync_core::TransportRegistry;
///
/// let registry = TransportRegistry::new();
/// zonesync_anexia::register(&registry);
/// assert!(registry.has_transport("anexia"));
/// ```
pub fn register(registry: &TransportRegistry) {
    registry.register_transport(TRANSPORT_NAME, Box::new(AnexiaFactory));
}
