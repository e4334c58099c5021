use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::scheduler::JobId;
use crate::worker::context::JobContext;

/// Live, cancellable representation of a job that has not finished yet.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub id: JobId,
    context: JobContext,
}

impl JobHandle {
    pub fn new(id: JobId, context: JobContext) -> Self {
        Self { id, context }
    }

    /// Signal cancellation to the job's executor and action.
    pub fn cancel(&self) {
        self.context.cancel();
    }

    pub fn deadline_in(&self) -> Duration {
        self.context.remaining()
    }

    pub fn context(&self) -> &JobContext {
        &self.context
    }
}

/// Handles of every in-flight job.
#[derive(Debug, Default)]
pub struct Registry {
    handles: DashMap<JobId, JobHandle>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if a handle with the same id is already registered.
    pub fn insert(&self, handle: JobHandle) -> bool {
        match self.handles.entry(handle.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(handle);
                true
            }
        }
    }

    /// Remove and return the handle. Of several concurrent callers for the
    /// same id, only one receives it.
    pub fn remove(&self, id: &JobId) -> Option<JobHandle> {
        self.handles.remove(id).map(|(_, handle)| handle)
    }

    pub fn contains(&self, id: &JobId) -> bool {
        self.handles.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Cancel and remove every registered handle. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<JobId> = self.handles.iter().map(|entry| *entry.key()).collect();
        ids.iter()
            .filter_map(|id| self.remove(id))
            .map(|handle| handle.cancel())
            .count()
    }
}
