use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::config::JobsConfig;
use crate::error::{JobError, Result};
use crate::scheduler::job::{JobRequest, JobResult, StatusCounts};
use crate::scheduler::registry::{JobHandle, Registry};
use crate::scheduler::store::ResultStore;
use crate::scheduler::JobId;
use crate::worker::action::JobAction;
use crate::worker::context::JobContext;
use crate::worker::executor::JobExecutor;
use crate::worker::pool::{JobSlot, SlotPool};

/// Entry point for job lifecycle operations.
///
/// Owns identifier allocation and the initial pending record; the terminal
/// record is written by the [`JobExecutor`]. Submission never blocks on the
/// job itself: status is obtained by polling [`Coordinator::get`].
pub struct Coordinator {
    config: JobsConfig,
    store: Arc<ResultStore>,
    registry: Arc<Registry>,
    pool: Arc<SlotPool<JobSlot>>,
    executor: JobExecutor,
    /// Parent of every job context, cancelled on drain
    shutdown: CancellationToken,
    draining: AtomicBool,
}

impl Coordinator {
    pub fn new(config: JobsConfig, action: Arc<dyn JobAction>) -> Self {
        Self::with_stores(
            config,
            action,
            Arc::new(ResultStore::new()),
            Arc::new(Registry::new()),
        )
    }

    pub fn with_stores(
        config: JobsConfig,
        action: Arc<dyn JobAction>,
        store: Arc<ResultStore>,
        registry: Arc<Registry>,
    ) -> Self {
        let pool = Arc::new(SlotPool::new(
            config.max_in_flight,
            config.max_idle_slots,
            JobSlot::new,
        ));
        let executor = JobExecutor::new(store.clone(), registry.clone(), pool.clone(), action);

        Self {
            config,
            store,
            registry,
            pool,
            executor,
            shutdown: CancellationToken::new(),
            draining: AtomicBool::new(false),
        }
    }

    /// Validate and start a job. Returns as soon as the job is launched.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, request: JobRequest) -> Result<JobId> {
        if self.is_draining() {
            return Err(JobError::Draining);
        }
        request.validate(self.config.max_message_len)?;

        let mut slot = self.pool.get()?;
        let id = JobId::generate();
        let start_time = Utc::now();
        let context = JobContext::child_of(&self.shutdown, self.config.deadline);
        slot.arm(&request, context.clone());

        if let Err(e) = self.register(JobHandle::new(id, context), start_time) {
            self.pool.put(slot);
            return Err(e);
        }

        tracing::info!(
            job_id = %id,
            deadline_ms = self.config.deadline.as_millis() as u64,
            "Job submitted"
        );
        self.executor.spawn(id, slot);
        Ok(id)
    }

    /// Record the handle and the pending result, or neither.
    fn register(&self, handle: JobHandle, start_time: DateTime<Utc>) -> Result<()> {
        let id = handle.id;
        let in_use = || {
            tracing::error!(job_id = %id, "Generated job id already in use");
            JobError::ResourceExhausted("could not allocate a unique job id".to_string())
        };

        if !self.registry.insert(handle) {
            return Err(in_use());
        }
        if !self.store.insert_pending(JobResult::pending(id, start_time)) {
            self.registry.remove(&id);
            return Err(in_use());
        }
        Ok(())
    }

    /// Request cancellation of an in-flight job.
    ///
    /// The handle is removed immediately, so a second call for the same id
    /// returns `NotFound`, as does cancelling a job that already finished.
    /// The returned snapshot is taken without waiting for the executor to
    /// observe the cancellation, so it may still read `Pending`.
    pub fn cancel(&self, id: &JobId) -> Result<JobResult> {
        let handle = self.registry.remove(id).ok_or(JobError::NotFound(*id))?;
        handle.cancel();
        tracing::info!(
            job_id = %id,
            remaining_ms = handle.deadline_in().as_millis() as u64,
            "Job cancellation requested"
        );

        self.store.get(id).ok_or(JobError::NotFound(*id))
    }

    pub fn get(&self, id: &JobId) -> Result<JobResult> {
        self.store.get(id).ok_or(JobError::NotFound(*id))
    }

    pub fn list(&self) -> Vec<JobResult> {
        self.store.list()
    }

    /// Job counts by status. Jobs may resolve while the counts are read.
    pub fn info(&self) -> StatusCounts {
        self.store.counts()
    }

    /// Jobs that have not reached a terminal status yet.
    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    /// Stop accepting jobs and cancel everything in flight.
    ///
    /// Returns the number of jobs that were cancelled.
    pub fn drain(&self) -> usize {
        self.draining.store(true, Ordering::Release);
        let cancelled = self.registry.cancel_all();
        self.shutdown.cancel();
        tracing::info!(cancelled, slots_in_use = self.pool.live(), "Job coordinator drained");
        cancelled
    }
}
