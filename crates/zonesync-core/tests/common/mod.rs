//! Test doubles and common utilities for contract tests
//!
//! `MockTransport` is an in-memory zone service: it applies changes to its
//! own record store so passes can be re-run against the result, and it
//! records every call for assertions.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use zonesync_core::error::{Error, Result};
use zonesync_core::model::canonical_name;
use zonesync_core::{
    Change, ChangeAction, ReconcileConfig, RemoteRecord, Zone, ZoneSyncBackend, ZoneTransport,
};

/// A recorded `apply_changes` call
#[derive(Debug, Clone)]
pub struct ApplyCall {
    pub zone: String,
    pub changes: Vec<Change>,
}

/// In-memory zone service with failure injection
#[derive(Clone, Default)]
pub struct MockTransport {
    zones: Arc<Mutex<Vec<Zone>>>,
    records: Arc<Mutex<BTreeMap<String, Vec<RemoteRecord>>>>,
    apply_calls: Arc<Mutex<Vec<ApplyCall>>>,
    list_zones_calls: Arc<AtomicUsize>,
    list_records_calls: Arc<AtomicUsize>,
    failing_zones: Arc<Mutex<HashSet<String>>>,
    failing_listings: Arc<Mutex<HashSet<String>>>,
    fail_zone_listing: Arc<Mutex<bool>>,
    apply_delay: Arc<Mutex<Option<Duration>>>,
}

impl MockTransport {
    /// A transport managing the given zones, all empty
    pub fn with_zones(zones: &[&str]) -> Self {
        let transport = Self::default();
        {
            let mut z = transport.zones.lock().unwrap();
            let mut r = transport.records.lock().unwrap();
            for name in zones {
                z.push(Zone::new(*name));
                r.insert(name.to_string(), Vec::new());
            }
        }
        transport
    }

    /// Seed a record into a zone
    pub fn seed(&self, zone: &str, record: RemoteRecord) {
        self.records
            .lock()
            .unwrap()
            .entry(zone.to_string())
            .or_default()
            .push(record);
    }

    /// Make every `apply_changes` call for `zone` fail
    pub fn fail_zone(&self, zone: &str) {
        self.failing_zones.lock().unwrap().insert(zone.to_string());
    }

    /// Make `list_records` for `zone` fail
    pub fn fail_listing(&self, zone: &str) {
        self.failing_listings.lock().unwrap().insert(zone.to_string());
    }

    /// Make `list_zones` fail
    pub fn fail_zone_listing(&self) {
        *self.fail_zone_listing.lock().unwrap() = true;
    }

    /// Delay every `apply_changes` call
    pub fn set_apply_delay(&self, delay: Duration) {
        *self.apply_delay.lock().unwrap() = Some(delay);
    }

    /// Every `apply_changes` call so far
    pub fn apply_calls(&self) -> Vec<ApplyCall> {
        self.apply_calls.lock().unwrap().clone()
    }

    /// Number of `apply_changes` calls
    pub fn apply_call_count(&self) -> usize {
        self.apply_calls.lock().unwrap().len()
    }

    /// Number of `list_zones` calls
    pub fn list_zones_calls(&self) -> usize {
        self.list_zones_calls.load(Ordering::SeqCst)
    }

    /// Number of `list_records` calls
    pub fn list_records_calls(&self) -> usize {
        self.list_records_calls.load(Ordering::SeqCst)
    }

    /// Current records of a zone
    pub fn records_in(&self, zone: &str) -> Vec<RemoteRecord> {
        self.records
            .lock()
            .unwrap()
            .get(zone)
            .cloned()
            .unwrap_or_default()
    }

    fn apply_one(records: &mut Vec<RemoteRecord>, change: &Change) {
        let name = canonical_name(&change.record.name);
        let record_type = change.record.record_type.as_str();
        let matches = |r: &RemoteRecord| {
            canonical_name(&r.name) == name && r.record_type.eq_ignore_ascii_case(record_type)
        };
        let value = change.record.value.clone().unwrap_or_default();

        match change.action {
            ChangeAction::Create => records.push(RemoteRecord::new(
                &change.record.name,
                record_type,
                value,
                change.record.ttl,
            )),
            ChangeAction::Delete => match &change.record.value {
                Some(v) => records.retain(|r| !(matches(r) && &r.value == v)),
                None => records.retain(|r| !matches(r)),
            },
            ChangeAction::Update => {
                records.retain(|r| !matches(r));
                records.push(RemoteRecord::new(
                    &change.record.name,
                    record_type,
                    value,
                    change.record.ttl,
                ));
            }
        }
    }
}

#[async_trait::async_trait]
impl ZoneTransport for MockTransport {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.list_zones_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_zone_listing.lock().unwrap() {
            return Err(Error::http("zone listing unavailable"));
        }
        Ok(self.zones.lock().unwrap().clone())
    }

    async fn list_records(&self, zone: &str) -> Result<Vec<RemoteRecord>> {
        self.list_records_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_listings.lock().unwrap().contains(zone) {
            return Err(Error::http(format!("records of {} unavailable", zone)));
        }
        Ok(self.records_in(zone))
    }

    async fn apply_changes(&self, zone: &str, changes: &[Change]) -> Result<()> {
        self.apply_calls.lock().unwrap().push(ApplyCall {
            zone: zone.to_string(),
            changes: changes.to_vec(),
        });

        let delay = *self.apply_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_zones.lock().unwrap().contains(zone) {
            return Err(Error::provider("mock", format!("zone {} rejected the batch", zone)));
        }

        let mut records = self.records.lock().unwrap();
        let zone_records = records.entry(zone.to_string()).or_default();
        for change in changes {
            Self::apply_one(zone_records, change);
        }
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "mock"
    }
}

/// A backend over `transport` with default settings
pub fn backend(transport: &MockTransport) -> ZoneSyncBackend {
    backend_with(transport, ReconcileConfig::default())
}

/// A backend over `transport` with explicit settings
pub fn backend_with(transport: &MockTransport, config: ReconcileConfig) -> ZoneSyncBackend {
    ZoneSyncBackend::new(Arc::new(transport.clone()), config).expect("valid config")
}
