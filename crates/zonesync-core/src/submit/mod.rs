//! Change submitter
//!
//! Applies each zone's batch through the transport.
//!
//! - Within a zone, changes are sent as CREATE, then DELETE, then UPDATE
//!   (stable within each group).
//! - Zones are independent: they run concurrently (bounded by
//!   `max_concurrent_zones`) and one zone failing does not stop the others.
//! - Empty batches make no remote call.
//! - Once cancellation is requested, zones that have not started are
//!   skipped and reported as cancelled; zones in flight finish.
//! - Nothing is rolled back. A failed zone is reported and the caller
//!   decides whether to re-run the pass.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::cancel::Cancellation;
use crate::error::{Error, Result, SubmissionError, ZoneFailure};
use crate::model::{Change, ChangeBatches};
use crate::traits::ZoneTransport;

/// What happened to one zone's batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneOutcome {
    /// Nothing to submit; no remote call was made
    NoOp,
    /// The batch was applied
    Applied {
        /// Number of changes sent
        changes: usize,
    },
    /// Dry-run: the batch was logged but not sent
    DryRun {
        /// Number of changes that would have been sent
        changes: usize,
    },
    /// The transport rejected the batch
    Failed {
        /// Underlying cause
        cause: String,
    },
    /// Skipped because the pass was cancelled before the zone started
    Cancelled,
}

/// Per-zone outcomes of one submission, ordered by zone name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionReport {
    /// Zone name -> outcome
    pub outcomes: BTreeMap<String, ZoneOutcome>,
}

impl SubmissionReport {
    /// Zones whose batch failed, with causes
    pub fn failures(&self) -> Vec<ZoneFailure> {
        self.outcomes
            .iter()
            .filter_map(|(zone, outcome)| match outcome {
                ZoneOutcome::Failed { cause } => Some(ZoneFailure {
                    zone: zone.clone(),
                    cause: cause.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Zones skipped by cancellation
    pub fn cancelled(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| **outcome == ZoneOutcome::Cancelled)
            .map(|(zone, _)| zone.clone())
            .collect()
    }

    /// Whether every zone applied (or had nothing to apply)
    pub fn is_success(&self) -> bool {
        self.outcomes.values().all(|outcome| {
            matches!(
                outcome,
                ZoneOutcome::NoOp | ZoneOutcome::Applied { .. } | ZoneOutcome::DryRun { .. }
            )
        })
    }

    /// Collapse the report into the caller-facing result
    ///
    /// Failures win over cancellations: if any zone failed the error is
    /// [`Error::Submission`], which also lists the cancelled zones. A pass
    /// that was only cancelled yields [`Error::Cancelled`].
    pub fn into_result(self) -> Result<()> {
        let failures = self.failures();
        let cancelled = self.cancelled();
        if !failures.is_empty() {
            return Err(Error::Submission(SubmissionError {
                failures,
                cancelled,
            }));
        }
        if !cancelled.is_empty() {
            return Err(Error::Cancelled { zones: cancelled });
        }
        Ok(())
    }
}

/// Reorder a zone's batch into submission order: CREATE, DELETE, UPDATE
pub fn order_batch(mut changes: Vec<Change>) -> Vec<Change> {
    changes.sort_by_key(|change| change.action.submission_rank());
    changes
}

/// Applies routed batches through a transport
pub struct Submitter {
    transport: Arc<dyn ZoneTransport>,
    max_concurrent_zones: usize,
    dry_run: bool,
}

impl Submitter {
    /// Create a submitter
    pub fn new(transport: Arc<dyn ZoneTransport>, max_concurrent_zones: usize) -> Self {
        Self {
            transport,
            max_concurrent_zones: max_concurrent_zones.max(1),
            dry_run: false,
        }
    }

    /// Log batches instead of sending them
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Submit every batch and report per-zone outcomes
    pub async fn submit(&self, batches: ChangeBatches, cancel: &Cancellation) -> SubmissionReport {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_zones));
        let mut report = SubmissionReport::default();
        let mut tasks = JoinSet::new();

        for (zone, changes) in batches {
            if changes.is_empty() {
                debug!("Zone {} has no changes, skipping", zone);
                report.outcomes.insert(zone, ZoneOutcome::NoOp);
                continue;
            }

            if cancel.is_cancelled() {
                warn!("Pass cancelled, skipping zone {}", zone);
                report.outcomes.insert(zone, ZoneOutcome::Cancelled);
                continue;
            }

            let changes = order_batch(changes);

            if self.dry_run {
                for change in &changes {
                    info!("[DRY-RUN] Zone {}: would apply {}", zone, change);
                }
                report.outcomes.insert(
                    zone,
                    ZoneOutcome::DryRun {
                        changes: changes.len(),
                    },
                );
                continue;
            }

            // Overwritten when the task reports back; only survives a panic.
            report.outcomes.insert(
                zone.clone(),
                ZoneOutcome::Failed {
                    cause: "submission task did not complete".to_string(),
                },
            );

            let transport = Arc::clone(&self.transport);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let outcome =
                    submit_zone(transport.as_ref(), &zone, &changes, semaphore, &cancel).await;
                (zone, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((zone, outcome)) => {
                    report.outcomes.insert(zone, outcome);
                }
                Err(e) => {
                    error!("Zone submission task failed: {}", e);
                }
            }
        }

        report
    }
}

async fn submit_zone(
    transport: &dyn ZoneTransport,
    zone: &str,
    changes: &[Change],
    semaphore: Arc<Semaphore>,
    cancel: &Cancellation,
) -> ZoneOutcome {
    let mut cancel = cancel.clone();
    let _permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!("Pass cancelled, skipping zone {}", zone);
            return ZoneOutcome::Cancelled;
        }
        permit = semaphore.acquire_owned() => match permit {
            Ok(permit) => permit,
            Err(_) => return ZoneOutcome::Cancelled,
        },
    };

    debug!(
        "Submitting {} change(s) to zone {} via {}",
        changes.len(),
        zone,
        transport.transport_name()
    );

    match transport.apply_changes(zone, changes).await {
        Ok(()) => {
            info!("Applied {} change(s) to zone {}", changes.len(), zone);
            ZoneOutcome::Applied {
                changes: changes.len(),
            }
        }
        Err(e) => {
            error!("Failed to apply changes to zone {}: {}", zone, e);
            ZoneOutcome::Failed {
                cause: e.to_string(),
            }
        }
    }
}
