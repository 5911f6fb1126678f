// # Endpoint
//
// The record abstraction used on both sides of a diff. Names compare
// case-insensitively; a missing TTL ("unconfigured") is distinct from any
// explicit value, including zero.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowercase a DNS name and strip a trailing root dot
pub fn canonical_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    /// IPv4 address
    A,
    /// IPv6 address
    Aaaa,
    /// Canonical name
    Cname,
    /// Text
    Txt,
    /// Mail exchange
    Mx,
    /// Name server
    Ns,
    /// Service locator
    Srv,
    /// Certification authority authorization
    Caa,
    /// Pointer
    Ptr,
}

impl RecordType {
    /// Wire name of the type (e.g. "AAAA")
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Cname => "CNAME",
            RecordType::Txt => "TXT",
            RecordType::Mx => "MX",
            RecordType::Ns => "NS",
            RecordType::Srv => "SRV",
            RecordType::Caa => "CAA",
            RecordType::Ptr => "PTR",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            "CNAME" => Ok(RecordType::Cname),
            "TXT" => Ok(RecordType::Txt),
            "MX" => Ok(RecordType::Mx),
            "NS" => Ok(RecordType::Ns),
            "SRV" => Ok(RecordType::Srv),
            "CAA" => Ok(RecordType::Caa),
            "PTR" => Ok(RecordType::Ptr),
            other => Err(crate::Error::Other(format!(
                "Unsupported record type: {}",
                other
            ))),
        }
    }
}

/// Identity of a logical record: canonical name plus type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    /// Canonical (lowercase, no trailing dot) name
    pub name: String,
    /// Record type
    pub record_type: RecordType,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.record_type)
    }
}

/// Desired or observed DNS record
///
/// Serialized with the field names external orchestrators already use
/// (`dnsName`, `recordType`, `targets`, `recordTTL`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Fully-qualified domain name
    #[serde(rename = "dnsName")]
    pub name: String,

    /// Record type
    #[serde(rename = "recordType")]
    pub record_type: RecordType,

    /// Record values, in order
    #[serde(default)]
    pub targets: Vec<String>,

    /// TTL in seconds; `None` means unconfigured
    #[serde(rename = "recordTTL", default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
}

impl Endpoint {
    /// Create an endpoint with an unconfigured TTL
    pub fn new<I, S>(name: impl Into<String>, record_type: RecordType, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            record_type,
            targets: targets.into_iter().map(Into::into).collect(),
            ttl: None,
        }
    }

    /// Set an explicit TTL
    pub fn with_ttl(mut self, ttl: i64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Identity used for diffing and pairing
    pub fn key(&self) -> RecordKey {
        RecordKey {
            name: canonical_name(&self.name),
            record_type: self.record_type,
        }
    }

    /// First target, if any
    pub fn first_target(&self) -> Option<&str> {
        self.targets.first().map(String::as_str)
    }

    /// TTL after default substitution
    pub fn effective_ttl(&self, default_ttl: i64) -> i64 {
        self.ttl.unwrap_or(default_ttl)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}]",
            self.name,
            self.record_type,
            self.targets.join(", ")
        )?;
        if let Some(ttl) = self.ttl {
            write!(f, " ttl={}", ttl)?;
        }
        Ok(())
    }
}
