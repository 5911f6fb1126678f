//! Planner
//!
//! Diffs a desired endpoint set against observed state and produces the
//! create/update/delete buckets the synthesizer consumes. Re-running it
//! against state that already matches the desired set yields an empty
//! [`Changes`].
//!
//! The remote model holds one value per record, and the synthesizer only
//! writes the first target of an endpoint, so the comparison uses the first
//! desired target against every observed value of the same name and type.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::ReconcileConfig;
use crate::error::{Error, Result};
use crate::model::{Changes, Endpoint, RecordKey, RecordType, canonical_name};

/// What the planner may touch and how it fills in defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanPolicy {
    /// TTL assumed for endpoints and records that leave it unset
    pub default_ttl: i64,
    /// Record types the planner manages; everything else is left alone
    pub managed_record_types: Vec<RecordType>,
}

impl PlanPolicy {
    fn manages(&self, record_type: RecordType) -> bool {
        self.managed_record_types.contains(&record_type)
    }
}

impl From<&ReconcileConfig> for PlanPolicy {
    fn from(config: &ReconcileConfig) -> Self {
        Self {
            default_ttl: config.default_ttl,
            managed_record_types: config.managed_record_types.clone(),
        }
    }
}

impl Default for PlanPolicy {
    fn default() -> Self {
        Self::from(&ReconcileConfig::default())
    }
}

/// Compute the change set that converges `observed` to `desired`
///
/// Fails with [`Error::DuplicateEndpoint`] if the desired set names the same
/// (name, type) twice; duplicates are never merged silently.
pub fn calculate(
    desired: &[Endpoint],
    observed: &[Endpoint],
    policy: &PlanPolicy,
) -> Result<Changes> {
    let mut wanted: BTreeMap<RecordKey, &Endpoint> = BTreeMap::new();
    let mut duplicates = Vec::new();
    for ep in desired {
        if !policy.manages(ep.record_type) {
            warn!("Ignoring desired {}: record type not managed", ep);
            continue;
        }
        let key = ep.key();
        if wanted.insert(key.clone(), ep).is_some() {
            duplicates.push(Error::DuplicateEndpoint {
                name: key.name,
                record_type: key.record_type.to_string(),
            });
        }
    }
    if let Some(err) = Error::combine(duplicates) {
        return Err(err);
    }

    let current = group_observed(observed, policy);
    let mut changes = Changes::default();

    for (key, want) in &wanted {
        match current.get(key) {
            None => changes.create.push((*want).clone()),
            Some(have) if differs(want, have, policy.default_ttl) => {
                debug!("Planning update: {} -> {}", have, want);
                changes.update_old.push(have.clone());
                changes.update_new.push((*want).clone());
            }
            Some(_) => {}
        }
    }

    for (key, have) in &current {
        if !wanted.contains_key(key) {
            changes.delete.push(have.clone());
        }
    }

    debug!(
        "Planned {} create(s), {} update(s), {} delete(s)",
        changes.create.len(),
        changes.update_new.len(),
        changes.delete.len()
    );
    Ok(changes)
}

/// Merge observed records sharing a (name, type) into one endpoint
fn group_observed(observed: &[Endpoint], policy: &PlanPolicy) -> BTreeMap<RecordKey, Endpoint> {
    let mut grouped: BTreeMap<RecordKey, Endpoint> = BTreeMap::new();
    for ep in observed.iter().filter(|ep| policy.manages(ep.record_type)) {
        grouped
            .entry(ep.key())
            .and_modify(|existing| existing.targets.extend(ep.targets.iter().cloned()))
            .or_insert_with(|| ep.clone());
    }
    grouped
}

fn differs(want: &Endpoint, have: &Endpoint, default_ttl: i64) -> bool {
    let wanted: Vec<String> = want
        .first_target()
        .map(|t| normalize_target(want.record_type, t))
        .into_iter()
        .collect();
    let mut current: Vec<String> = have
        .targets
        .iter()
        .map(|t| normalize_target(have.record_type, t))
        .collect();
    current.sort();
    current.dedup();

    wanted != current || want.effective_ttl(default_ttl) != have.effective_ttl(default_ttl)
}

fn normalize_target(record_type: RecordType, target: &str) -> String {
    match record_type {
        RecordType::Cname | RecordType::Ns | RecordType::Ptr => canonical_name(target),
        RecordType::Txt => target.trim().trim_matches('"').to_string(),
        _ => target.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(name: &str, ip: &str) -> Endpoint {
        Endpoint::new(name, RecordType::A, [ip])
    }

    #[test]
    fn converged_state_plans_nothing() {
        let desired = vec![
            a("a.example.com", "192.0.2.1"),
            Endpoint::new("www.example.com", RecordType::Cname, ["a.example.com"]).with_ttl(60),
        ];
        let observed = vec![
            a("A.example.com.", "192.0.2.1").with_ttl(3600),
            Endpoint::new("www.example.com", RecordType::Cname, ["a.example.com."]).with_ttl(60),
        ];

        let changes = calculate(&desired, &observed, &PlanPolicy::default()).unwrap();
        assert!(changes.is_empty(), "unexpected changes: {changes:?}");
    }

    #[test]
    fn missing_changed_and_stale_records() {
        let desired = vec![a("new.example.com", "192.0.2.1"), a("moved.example.com", "192.0.2.9")];
        let observed = vec![
            a("moved.example.com", "192.0.2.2").with_ttl(3600),
            a("stale.example.com", "192.0.2.3").with_ttl(3600),
        ];

        let changes = calculate(&desired, &observed, &PlanPolicy::default()).unwrap();
        assert_eq!(changes.create, vec![a("new.example.com", "192.0.2.1")]);
        assert_eq!(changes.update_new, vec![a("moved.example.com", "192.0.2.9")]);
        assert_eq!(changes.update_old[0].targets, vec!["192.0.2.2".to_string()]);
        assert_eq!(changes.delete[0].name, "stale.example.com");
    }

    #[test]
    fn ttl_difference_triggers_update() {
        let desired = vec![a("a.example.com", "192.0.2.1").with_ttl(60)];
        let observed = vec![a("a.example.com", "192.0.2.1").with_ttl(3600)];
        let changes = calculate(&desired, &observed, &PlanPolicy::default()).unwrap();
        assert_eq!(changes.update_new.len(), 1);
    }

    #[test]
    fn extra_observed_values_trigger_update() {
        let desired = vec![a("a.example.com", "192.0.2.1")];
        let observed = vec![
            a("a.example.com", "192.0.2.1").with_ttl(3600),
            a("a.example.com", "192.0.2.2").with_ttl(3600),
        ];
        let changes = calculate(&desired, &observed, &PlanPolicy::default()).unwrap();
        assert_eq!(changes.update_old.len(), 1);
        assert_eq!(changes.update_old[0].targets.len(), 2);
    }

    #[test]
    fn unmanaged_types_are_left_alone() {
        let observed = vec![Endpoint::new("example.com", RecordType::Ns, ["ns1.example.com"])];
        let changes = calculate(&[], &observed, &PlanPolicy::default()).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn duplicate_desired_records_are_rejected() {
        let desired = vec![a("a.example.com", "192.0.2.1"), a("A.example.com", "192.0.2.2")];
        let err = calculate(&desired, &[], &PlanPolicy::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateEndpoint { ref name, .. } if name == "a.example.com"
        ));
    }
}
