//! Reconciliation backend
//!
//! `ZoneSyncBackend` wires the stages of a pass together:
//!
//! ```text
//!  Changes ──► synthesize ──► route ──► submit ──► Ok / aggregated Error
//!                               ▲
//!  ZoneTransport::list_zones ───┘ (ZoneDirectory)
//!
//!  records():  list_zones ──► observe ──► Vec<Endpoint>
//!  reconcile(): [records()] ──► plan ──► apply
//! ```
//!
//! ## Failure policy
//!
//! 1. Zone listing fails → `Retrieval`, nothing submitted
//! 2. Endpoint without a value → `InvalidEndpoint` for that endpoint only;
//!    the other changes still go out
//! 3. Any change without an owning zone → `Unroutable`, nothing submitted
//! 4. Zone batch fails → `Submission` naming the zone; other zones continue
//!
//! Every independent failure ends up in the single returned error.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cancel::Cancellation;
use crate::config::ReconcileConfig;
use crate::directory::ZoneDirectory;
use crate::error::{Error, Result};
use crate::model::{Changes, Endpoint};
use crate::observe::Observer;
use crate::plan::{self, PlanPolicy};
use crate::router::route;
use crate::submit::{SubmissionReport, Submitter};
use crate::synth::{Synthesis, synthesize_changes};
use crate::traits::{DnsBackend, ZoneTransport};

/// DNS backend reconciling against one remote zone service
pub struct ZoneSyncBackend {
    transport: Arc<dyn ZoneTransport>,
    config: ReconcileConfig,
}

impl ZoneSyncBackend {
    /// Create a backend
    ///
    /// Fails if the reconciliation settings are invalid.
    pub fn new(transport: Arc<dyn ZoneTransport>, config: ReconcileConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { transport, config })
    }

    /// Reconciliation settings in use
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Name of the underlying transport
    pub fn transport_name(&self) -> &'static str {
        self.transport.transport_name()
    }

    /// Snapshot the manageable zones
    pub async fn zones(&self) -> Result<ZoneDirectory> {
        ZoneDirectory::load(self.transport.as_ref()).await
    }

    /// Observe the records of the zones in `directory`
    pub async fn observe(&self, directory: &ZoneDirectory) -> Result<Vec<Endpoint>> {
        Observer::new(Arc::clone(&self.transport), self.config.max_concurrent_zones)
            .observe(&directory.list())
            .await
    }

    /// Apply a change set, honouring `cancel` between zones
    pub async fn apply_changes_with_cancel(
        &self,
        changes: Changes,
        cancel: &Cancellation,
    ) -> Result<()> {
        let (report, mut errors) = self.submit_changes(changes, cancel).await?;
        if let Err(e) = report.into_result() {
            errors.push(e);
        }
        match Error::combine(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Apply a change set and return the per-zone report
    ///
    /// Pre-submission failures (zone listing, routing) are returned as `Err`.
    /// Rejected endpoints are returned alongside the report, since the rest
    /// of the change set was still submitted.
    pub async fn submit_changes(
        &self,
        changes: Changes,
        cancel: &Cancellation,
    ) -> Result<(SubmissionReport, Vec<Error>)> {
        if changes.is_empty() {
            debug!("No changes to apply");
            return Ok((SubmissionReport::default(), Vec::new()));
        }

        let directory = self.zones().await.map_err(|e| {
            warn!("Failed to list zones, not applying changes: {}", e);
            e
        })?;

        let Synthesis {
            changes: synthesized,
            rejected,
        } = synthesize_changes(&changes, self.config.default_ttl);
        for err in &rejected {
            warn!("Skipping endpoint: {}", err);
        }

        let batches = match route(synthesized, &directory) {
            Ok(batches) => batches,
            Err(e) => {
                let mut errors = rejected;
                errors.push(e);
                return Err(Error::combine(errors).unwrap_or_else(|| Error::Other(
                    "routing failed".to_string(),
                )));
            }
        };

        let report = Submitter::new(Arc::clone(&self.transport), self.config.max_concurrent_zones)
            .with_dry_run(self.config.dry_run)
            .submit(batches, cancel)
            .await;

        info!(
            "Submission finished: {} zone(s), {} failed, {} cancelled",
            report.outcomes.len(),
            report.failures().len(),
            report.cancelled().len()
        );
        Ok((report, rejected))
    }

    /// Plan against observed state and apply the result
    ///
    /// When `observed` is `None` the current records are read first. Callers
    /// that already hold a fresh observation pass it in to skip the extra
    /// listing. Returns the planned change set.
    pub async fn reconcile(
        &self,
        desired: &[Endpoint],
        observed: Option<Vec<Endpoint>>,
        cancel: &Cancellation,
    ) -> Result<Changes> {
        let observed = match observed {
            Some(observed) => observed,
            None => self.records().await?,
        };

        let changes = plan::calculate(desired, &observed, &PlanPolicy::from(&self.config))?;
        if changes.is_empty() {
            info!("Zones already converged, nothing to do");
            return Ok(changes);
        }

        self.apply_changes_with_cancel(changes.clone(), cancel).await?;
        Ok(changes)
    }
}

#[async_trait]
impl DnsBackend for ZoneSyncBackend {
    async fn records(&self) -> Result<Vec<Endpoint>> {
        let directory = self.zones().await?;
        let endpoints = self.observe(&directory).await?;
        debug!(
            "Observed {} endpoint(s) across {} zone(s)",
            endpoints.len(),
            directory.len()
        );
        Ok(endpoints)
    }

    async fn apply_changes(&self, changes: Changes) -> Result<()> {
        self.apply_changes_with_cancel(changes, &Cancellation::never())
            .await
    }
}
