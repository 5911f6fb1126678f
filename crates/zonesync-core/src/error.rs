//! Error types for zonesync
//!
//! Validation-class errors ([`Error::InvalidEndpoint`], [`Error::Unroutable`],
//! [`Error::DuplicateEndpoint`]) are raised before any remote mutation.
//! Transport-class errors ([`Error::Retrieval`], [`Error::Submission`]) carry
//! enough context (zone, action, record name) for the caller to re-run the pass.

use std::fmt;
use thiserror::Error;

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for zonesync
#[derive(Error, Debug)]
pub enum Error {
    /// Zone or record listing failed; fatal to the current pass
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// A create/update endpoint has no usable value
    #[error("Invalid endpoint {name} ({record_type}): {reason}")]
    InvalidEndpoint {
        /// Record name
        name: String,
        /// Record type
        record_type: String,
        /// Why the endpoint was rejected
        reason: String,
    },

    /// A change targets a name that no managed zone owns
    #[error("Unroutable change: no managed zone owns {name}")]
    Unroutable {
        /// The offending record name
        name: String,
    },

    /// One or more zones failed to apply their batch
    #[error(transparent)]
    Submission(SubmissionError),

    /// The pass was cancelled before these zones were submitted
    #[error("Cancelled before submission: {}", .zones.join(", "))]
    Cancelled {
        /// Zones that were skipped
        zones: Vec<String>,
    },

    /// The same (name, type) pair appears twice in a desired set
    #[error("Duplicate endpoint in desired set: {name} ({record_type})")]
    DuplicateEndpoint {
        /// Record name
        name: String,
        /// Record type
        record_type: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client errors (from the zone service API)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Record or zone not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Transport name
        provider: String,
        /// Error message
        message: String,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Several independent failures from one pass
    #[error("{} failure(s): {}", .0.len(), join_errors(.0))]
    Multiple(Vec<Error>),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create a retrieval error
    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self::Retrieval(msg.into())
    }

    /// Create an invalid endpoint error
    pub fn invalid_endpoint(
        name: impl Into<String>,
        record_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidEndpoint {
            name: name.into(),
            record_type: record_type.into(),
            reason: reason.into(),
        }
    }

    /// Create an unroutable change error
    pub fn unroutable(name: impl Into<String>) -> Self {
        Self::Unroutable { name: name.into() }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a transport-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Collapse a list of independent failures into one error.
    ///
    /// Returns `None` for an empty list and the error itself for a single
    /// entry, so callers only see [`Error::Multiple`] when it adds information.
    pub fn combine(mut errors: Vec<Error>) -> Option<Error> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }

    /// Whether the error was raised before any remote mutation
    pub fn is_validation(&self) -> bool {
        match self {
            Self::InvalidEndpoint { .. }
            | Self::Unroutable { .. }
            | Self::DuplicateEndpoint { .. } => true,
            Self::Multiple(errors) => errors.iter().all(Error::is_validation),
            _ => false,
        }
    }

    /// Whether re-running the whole pass may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Retrieval(_)
            | Self::Submission(_)
            | Self::Cancelled { .. }
            | Self::Http(_)
            | Self::RateLimited(_) => true,
            Self::Multiple(errors) => errors.iter().any(Error::is_retryable),
            _ => false,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// A single zone whose batch failed to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneFailure {
    /// Zone name
    pub zone: String,
    /// Underlying cause, as reported by the transport
    pub cause: String,
}

/// Aggregated per-zone submission failure.
///
/// Zones that succeeded are not listed; their changes stay applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionError {
    /// Zones that failed, ordered by zone name
    pub failures: Vec<ZoneFailure>,
    /// Zones skipped because the pass was cancelled
    pub cancelled: Vec<String>,
}

impl SubmissionError {
    /// Names of the zones that failed
    pub fn failed_zones(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.zone.as_str()).collect()
    }
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Submission failed for {} zone(s)", self.failures.len())?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.zone, failure.cause)?;
        }
        if !self.cancelled.is_empty() {
            write!(f, "; cancelled: {}", self.cancelled.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for SubmissionError {}
