use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::scheduler::job::{JobOutcome, JobResult, StatusCounts};
use crate::scheduler::JobId;

/// Current status record of every known job.
///
/// Records are read and replaced whole under the lock, so a reader sees
/// either the pending record or the terminal one, never a mix. The lock is
/// never held across an `.await`.
#[derive(Debug, Default)]
pub struct ResultStore {
    results: RwLock<HashMap<JobId, JobResult>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the initial pending record. Returns false if the id is already known.
    pub fn insert_pending(&self, result: JobResult) -> bool {
        match self.results.write().entry(result.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(result);
                true
            }
        }
    }

    pub fn get(&self, id: &JobId) -> Option<JobResult> {
        self.results.read().get(id).cloned()
    }

    /// Replace a pending record with its terminal form.
    ///
    /// Returns the stored terminal record, or `None` if the job is unknown or
    /// already terminal; a terminal record is never overwritten.
    pub fn resolve(
        &self,
        id: &JobId,
        outcome: JobOutcome,
        finish_time: DateTime<Utc>,
    ) -> Option<JobResult> {
        let mut results = self.results.write();
        let current = results.get_mut(id)?;
        if current.is_terminal() {
            return None;
        }
        let terminal = current.resolved(outcome, finish_time);
        *current = terminal.clone();
        Some(terminal)
    }

    /// All records, oldest submission first.
    pub fn list(&self) -> Vec<JobResult> {
        let mut results: Vec<JobResult> = self.results.read().values().cloned().collect();
        results.sort_by_key(|r| r.start_time);
        results
    }

    pub fn counts(&self) -> StatusCounts {
        let results = self.results.read();
        let mut counts = StatusCounts::default();
        for result in results.values() {
            counts.record(result.status);
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.results.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.read().is_empty()
    }
}
