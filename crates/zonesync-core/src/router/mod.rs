//! Change router
//!
//! Partitions a change list by owning zone. Routing is all-or-nothing: if
//! any change matches no zone, no batches are produced, so nothing can be
//! submitted on the back of a half-routed change set.

use tracing::{debug, warn};

use crate::directory::ZoneDirectory;
use crate::error::{Error, Result};
use crate::model::{Change, ChangeBatches};

/// Group `changes` by owning zone
///
/// Every zone in the directory appears in the output, with an empty list
/// when it has nothing to do. Fails with [`Error::Unroutable`] (or
/// [`Error::Multiple`] of them) naming each record without an owner.
pub fn route(changes: Vec<Change>, directory: &ZoneDirectory) -> Result<ChangeBatches> {
    let mut batches: ChangeBatches = directory
        .index()
        .values()
        .map(|zone| (zone.name.clone(), Vec::new()))
        .collect();
    let mut unroutable = Vec::new();

    for change in changes {
        match directory.find_owner(&change.record.name) {
            Some(zone) => {
                debug!("Routing {} to zone {}", change, zone.name);
                batches.entry(zone.name.clone()).or_default().push(change);
            }
            None => {
                warn!("No managed zone owns {}", change.record.name);
                unroutable.push(Error::unroutable(&change.record.name));
            }
        }
    }

    match Error::combine(unroutable) {
        Some(err) => Err(err),
        None => Ok(batches),
    }
}
