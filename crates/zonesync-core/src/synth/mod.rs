//! Change synthesizer
//!
//! Turns the create/update/delete buckets into the provider-agnostic
//! [`Change`] list. Pure: no I/O, output depends only on the inputs.
//!
//! Output order is creates, then updates, then deletes, each in input order.
//! The submitter later regroups per zone into CREATE, DELETE, UPDATE.
//!
//! Records hold a single value: create and update write the first target of
//! an endpoint and log the targets they drop.
//!
//! An endpoint that cannot produce a change (create/update without a target,
//! empty name) is rejected on its own; the remaining changes are still
//! produced.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{Change, ChangeAction, ChangeRecord, Changes, Endpoint, RecordKey};

/// Result of a synthesis run
#[derive(Debug, Default)]
pub struct Synthesis {
    /// Changes for every valid endpoint
    pub changes: Vec<Change>,
    /// One [`Error::InvalidEndpoint`] per rejected endpoint
    pub rejected: Vec<Error>,
}

impl Synthesis {
    /// Whether every endpoint produced a change
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    /// All-or-nothing view: the changes, or every rejection combined
    pub fn into_result(self) -> Result<Vec<Change>> {
        match Error::combine(self.rejected) {
            Some(err) => Err(err),
            None => Ok(self.changes),
        }
    }
}

/// Synthesize changes from explicit buckets
pub fn synthesize(
    creates: &[Endpoint],
    updates: &[Endpoint],
    deletes: &[Endpoint],
    default_ttl: i64,
) -> Synthesis {
    Synthesizer::new(default_ttl).run(creates, updates, &[], deletes)
}

/// Synthesize changes from a caller-supplied [`Changes`] set
///
/// Each `update_new` endpoint is paired with the `update_old` endpoint of
/// the same name and type, which becomes the change's `previous` record.
pub fn synthesize_changes(changes: &Changes, default_ttl: i64) -> Synthesis {
    Synthesizer::new(default_ttl).run(
        &changes.create,
        &changes.update_new,
        &changes.update_old,
        &changes.delete,
    )
}

struct Synthesizer {
    default_ttl: i64,
}

impl Synthesizer {
    fn new(default_ttl: i64) -> Self {
        Self { default_ttl }
    }

    fn run(
        &self,
        creates: &[Endpoint],
        updates: &[Endpoint],
        update_old: &[Endpoint],
        deletes: &[Endpoint],
    ) -> Synthesis {
        let previous: HashMap<RecordKey, &Endpoint> =
            update_old.iter().map(|ep| (ep.key(), ep)).collect();

        let mut out = Synthesis {
            changes: Vec::with_capacity(creates.len() + updates.len() + deletes.len()),
            rejected: Vec::new(),
        };

        for ep in creates {
            match self.upsert(ChangeAction::Create, ep) {
                Ok(change) => out.changes.push(change),
                Err(e) => out.rejected.push(e),
            }
        }

        for ep in updates {
            match self.upsert(ChangeAction::Update, ep) {
                Ok(change) => {
                    let change = match previous.get(&ep.key()) {
                        Some(old) => change.with_previous(identity_record(old)),
                        None => change,
                    };
                    out.changes.push(change);
                }
                Err(e) => out.rejected.push(e),
            }
        }

        for ep in deletes {
            match self.delete(ep) {
                Ok(change) => out.changes.push(change),
                Err(e) => out.rejected.push(e),
            }
        }

        debug!(
            "Synthesized {} change(s), rejected {} endpoint(s)",
            out.changes.len(),
            out.rejected.len()
        );
        out
    }

    fn upsert(&self, action: ChangeAction, ep: &Endpoint) -> Result<Change> {
        check_name(ep)?;
        let value = ep.first_target().ok_or_else(|| {
            Error::invalid_endpoint(
                &ep.name,
                ep.record_type.as_str(),
                format!("{} requires at least one target", action),
            )
        })?;
        if ep.targets.len() > 1 {
            warn!(
                "{} has {} targets, only {} is written",
                ep,
                ep.targets.len(),
                value
            );
        }

        Ok(Change::new(
            action,
            ChangeRecord {
                name: ep.name.clone(),
                record_type: ep.record_type,
                value: Some(value.to_string()),
                ttl: Some(ep.effective_ttl(self.default_ttl)),
            },
        ))
    }

    fn delete(&self, ep: &Endpoint) -> Result<Change> {
        check_name(ep)?;
        Ok(Change::new(ChangeAction::Delete, identity_record(ep)))
    }
}

fn check_name(ep: &Endpoint) -> Result<()> {
    if ep.name.trim().is_empty() {
        return Err(Error::invalid_endpoint(
            "",
            ep.record_type.as_str(),
            "record name cannot be empty",
        ));
    }
    Ok(())
}

/// The record as observed: value only when it is unambiguous, TTL untouched
fn identity_record(ep: &Endpoint) -> ChangeRecord {
    let value = match ep.targets.as_slice() {
        [single] => Some(single.clone()),
        _ => None,
    };
    ChangeRecord {
        name: ep.name.clone(),
        record_type: ep.record_type,
        value,
        ttl: ep.ttl,
    }
}
