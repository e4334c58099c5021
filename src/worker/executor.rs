use std::sync::Arc;

use chrono::Utc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::scheduler::job::{JobOutcome, JobResult};
use crate::scheduler::{JobId, JobStatus, Registry, ResultStore};
use crate::worker::action::JobAction;
use crate::worker::context::DoneReason;
use crate::worker::pool::{JobSlot, SlotPool};

/// Runs jobs and records how each one ended.
///
/// For every job three events race: the action finishing, the caller
/// cancelling, and the deadline passing. The first one observed decides the
/// terminal status; the write goes through the context's resolve-once guard
/// and the store refuses to overwrite a terminal record, so later signals are
/// no-ops.
#[derive(Clone)]
pub struct JobExecutor {
    store: Arc<ResultStore>,
    registry: Arc<Registry>,
    pool: Arc<SlotPool<JobSlot>>,
    action: Arc<dyn JobAction>,
}

impl JobExecutor {
    pub fn new(
        store: Arc<ResultStore>,
        registry: Arc<Registry>,
        pool: Arc<SlotPool<JobSlot>>,
        action: Arc<dyn JobAction>,
    ) -> Self {
        Self {
            store,
            registry,
            pool,
            action,
        }
    }

    /// Run the job on its own task.
    pub fn spawn(&self, id: JobId, slot: JobSlot) -> JoinHandle<Option<JobResult>> {
        let executor = self.clone();
        tokio::spawn(async move { executor.execute(id, slot).await })
    }

    /// Run the job to a terminal status, release its handle and return the slot.
    ///
    /// Returns the terminal record written by this call, or `None` if the job
    /// had already been resolved.
    pub async fn execute(&self, id: JobId, slot: JobSlot) -> Option<JobResult> {
        let outcome = self.race(id, &slot).await;

        // Unregister before the terminal write so a job that reads as terminal
        // can no longer be cancelled.
        self.registry.remove(&id);
        let claimed = slot.context().map_or(true, |ctx| ctx.guard().try_resolve());
        let resolved = if claimed {
            self.store.resolve(&id, outcome, Utc::now())
        } else {
            None
        };

        match &resolved {
            Some(result) if result.status == JobStatus::Failed => {
                tracing::warn!(job_id = %id, result = %result.result, "Job failed");
            }
            Some(result) => {
                tracing::info!(job_id = %id, status = %result.status, "Job finished");
            }
            None => {
                tracing::debug!(job_id = %id, "Job already resolved, outcome discarded");
            }
        }

        self.pool.put(slot);
        resolved
    }

    async fn race(&self, id: JobId, slot: &JobSlot) -> JobOutcome {
        let Some(ctx) = slot.context() else {
            tracing::error!(job_id = %id, "Job slot has no execution context");
            return JobOutcome::Failed("job slot has no execution context".to_string());
        };

        let (done_tx, done_rx) = oneshot::channel();
        let action = self.action.clone();
        let request = slot.request().clone();
        let cancel = ctx.token();
        tokio::spawn(async move {
            let output = action.run(request, cancel).await;
            let _ = done_tx.send(output);
        });

        tokio::select! {
            biased;
            reason = ctx.done() => match reason {
                DoneReason::DeadlineExceeded => JobOutcome::TimedOut(ctx.timeout()),
                DoneReason::Cancelled => JobOutcome::Cancelled,
            },
            output = done_rx => match output {
                Ok(Ok(payload)) => JobOutcome::Success(payload),
                Ok(Err(e)) => JobOutcome::Failed(e.to_string()),
                // Sender dropped without a value: the action panicked.
                Err(_) => JobOutcome::Failed("action aborted before reporting a result".to_string()),
            },
        }
    }
}
