// # Changes
//
// `Changes` is what the caller hands in: the create / update-old /
// update-new / delete buckets of an upstream plan. `Change` is the
// provider-agnostic mutation the synthesizer produces from them; only
// transports translate it to a wire format.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::endpoint::{Endpoint, RecordType};

/// Zone name -> ordered changes for that zone
pub type ChangeBatches = BTreeMap<String, Vec<Change>>;

/// Kind of mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeAction {
    /// Add a record
    Create,
    /// Replace an existing record's value or TTL
    Update,
    /// Remove a record
    Delete,
}

impl ChangeAction {
    /// Position in the per-zone submission order: CREATE, DELETE, UPDATE
    pub fn submission_rank(self) -> u8 {
        match self {
            ChangeAction::Create => 0,
            ChangeAction::Delete => 1,
            ChangeAction::Update => 2,
        }
    }

    /// Upper-case action name
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Create => "CREATE",
            ChangeAction::Update => "UPDATE",
            ChangeAction::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The record a change acts on, as resolved at synthesis time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Fully-qualified record name
    pub name: String,
    /// Record type
    pub record_type: RecordType,
    /// Record value. Always set for create/update; `None` on a delete means
    /// every record of this name and type.
    pub value: Option<String>,
    /// TTL in seconds. Defaulted for create/update, passed through for delete.
    pub ttl: Option<i64>,
}

/// A single mutation to apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    /// What to do
    pub action: ChangeAction,
    /// The record to act on
    pub record: ChangeRecord,
    /// For updates: the record as it was observed before the change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<ChangeRecord>,
}

impl Change {
    /// Create a change with no previous record
    pub fn new(action: ChangeAction, record: ChangeRecord) -> Self {
        Self {
            action,
            record,
            previous: None,
        }
    }

    /// Attach the previously observed record
    pub fn with_previous(mut self, previous: ChangeRecord) -> Self {
        self.previous = Some(previous);
        self
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.action, self.record.name, self.record.record_type
        )?;
        if let Some(value) = &self.record.value {
            write!(f, " {}", value)?;
        }
        Ok(())
    }
}

/// Desired-state buckets for one pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Changes {
    /// Records to create
    pub create: Vec<Endpoint>,
    /// Records being updated, as currently observed
    pub update_old: Vec<Endpoint>,
    /// Records being updated, as desired
    pub update_new: Vec<Endpoint>,
    /// Records to delete
    pub delete: Vec<Endpoint>,
}

impl Changes {
    /// Whether there is nothing to do
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update_new.is_empty() && self.delete.is_empty()
    }

    /// Number of changes the synthesizer will consider
    pub fn len(&self) -> usize {
        self.create.len() + self.update_new.len() + self.delete.len()
    }
}
