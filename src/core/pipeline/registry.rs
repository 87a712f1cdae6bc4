//! In-memory store of scan records.
//!
//! Each record sits behind its own mutex. The task running a scan holds the only
//! [`ScanWriter`] for it; everyone else gets cloned snapshots, so a reader never
//! sees a half-applied update.

use super::types::{Progress, ScanId, ScanListing, ScanPhase, ScanRecord, ScanResults, ScanStatus};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

type Slot = Arc<Mutex<ScanRecord>>;

/// Keyed store of every scan started in this process
#[derive(Debug, Default)]
pub struct ScanRegistry {
    scans: RwLock<HashMap<ScanId, Slot>>,
    /// How long finished scans are kept; `None` keeps them forever
    retention: Option<Duration>,
}

impl ScanRegistry {
    pub fn new(retention: Option<Duration>) -> Self {
        Self {
            scans: RwLock::new(HashMap::new()),
            retention,
        }
    }

    /// Register a new running scan and hand back its sole writer
    pub fn create(&self, source_path: PathBuf, recurse: bool) -> ScanWriter {
        let id = ScanId::new();
        let slot: Slot = Arc::new(Mutex::new(ScanRecord::new(id, source_path, recurse)));

        self.scans
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::clone(&slot));

        ScanWriter { id, slot }
    }

    /// Snapshot of one record
    pub fn get(&self, id: &ScanId) -> Option<ScanRecord> {
        let slot = self
            .scans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()?;

        let record = slot.lock().unwrap_or_else(PoisonError::into_inner).clone();
        Some(record)
    }

    /// Listing of every record, oldest first
    pub fn list(&self) -> Vec<ScanListing> {
        let slots: Vec<Slot> = self
            .scans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        let mut listings: Vec<ScanListing> = slots
            .iter()
            .map(|slot| slot.lock().unwrap_or_else(PoisonError::into_inner).listing())
            .collect();

        listings.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.id.to_string().cmp(&b.id.to_string()))
        });
        listings
    }

    /// Forget a scan whose worker never started
    pub(super) fn remove(&self, id: &ScanId) -> Option<ScanRecord> {
        let slot = self
            .scans
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)?;
        let record = slot.lock().unwrap_or_else(PoisonError::into_inner).clone();
        Some(record)
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.scans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop finished scans whose end time is older than the retention window.
    ///
    /// Running scans are never evicted. Returns how many records were removed.
    pub fn evict_expired(&self) -> usize {
        let Some(retention) = self.retention else {
            return 0;
        };
        let Ok(retention) = chrono::Duration::from_std(retention) else {
            return 0;
        };
        let cutoff = Utc::now() - retention;

        let mut scans = self.scans.write().unwrap_or_else(PoisonError::into_inner);
        let before = scans.len();

        scans.retain(|_, slot| {
            let record = slot.lock().unwrap_or_else(PoisonError::into_inner);
            match (record.status.is_terminal(), record.end_time) {
                (true, Some(end)) => end >= cutoff,
                _ => true,
            }
        });

        let evicted = before - scans.len();
        if evicted > 0 {
            debug!(evicted, "Evicted expired scans");
        }
        evicted
    }
}

/// Exclusive write access to one scan record.
///
/// Once the record reaches a terminal status every further update is ignored.
#[derive(Debug)]
pub struct ScanWriter {
    id: ScanId,
    slot: Slot,
}

impl ScanWriter {
    pub fn id(&self) -> ScanId {
        self.id
    }

    /// Snapshot of the record as this writer last left it
    pub fn snapshot(&self) -> ScanRecord {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_phase(&self, phase: ScanPhase) {
        self.update(|record| record.phase = phase);
    }

    /// Enter the analyzing phase with `total` files queued
    pub fn start_analyzing(&self, total: usize) {
        self.update(|record| {
            record.phase = ScanPhase::Analyzing;
            record.progress = Progress::of(0, total);
        });
    }

    pub fn set_progress(&self, progress: Progress) {
        self.update(|record| record.progress = progress);
    }

    /// Store results and mark the scan completed
    pub fn complete(&self, results: ScanResults) {
        self.update(|record| {
            record.status = ScanStatus::Completed;
            record.phase = ScanPhase::Complete;
            record.results = Some(results);
            record.end_time = Some(Utc::now());
        });
    }

    /// Mark the scan failed; any partial results are discarded
    pub fn fail(&self, error: impl Into<String>) {
        let error = error.into();
        self.update(|record| {
            record.status = ScanStatus::Error;
            record.results = None;
            record.error = Some(error);
            record.end_time = Some(Utc::now());
        });
    }

    fn update(&self, apply: impl FnOnce(&mut ScanRecord)) {
        let mut record = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if record.status.is_terminal() {
            warn!(scan_id = %self.id, "Ignoring update to finished scan");
            return;
        }
        apply(&mut record);
    }
}
