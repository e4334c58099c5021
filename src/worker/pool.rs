use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::error::{JobError, Result};
use crate::scheduler::JobRequest;
use crate::worker::context::JobContext;

/// An instance that can be cleared and handed out again.
pub trait Reusable: Send {
    /// Drop any per-use state, in particular contexts and deadlines.
    fn reset(&mut self);
}

/// Recycles execution slots between jobs.
///
/// Instances are built by the injected factory when no idle one is available.
/// At most `max_live` instances may be checked out at once; at most `max_idle`
/// are retained for reuse.
pub struct SlotPool<T> {
    idle: Mutex<Vec<T>>,
    factory: Box<dyn Fn() -> T + Send + Sync>,
    live: AtomicUsize,
    max_live: usize,
    max_idle: usize,
}

impl<T: Reusable> SlotPool<T> {
    pub fn new<F>(max_live: usize, max_idle: usize, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            idle: Mutex::new(Vec::new()),
            factory: Box::new(factory),
            live: AtomicUsize::new(0),
            max_live,
            max_idle,
        }
    }

    /// Check out an instance, or fail with `ResourceExhausted` at capacity.
    pub fn get(&self) -> Result<T> {
        self.live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max_live).then_some(n + 1)
            })
            .map_err(|n| {
                tracing::warn!(live = n, max_live = self.max_live, "Slot pool exhausted");
                JobError::ResourceExhausted(format!("{} jobs already in flight", n))
            })?;

        let recycled = self.idle.lock().pop();
        Ok(recycled.unwrap_or_else(|| (self.factory)()))
    }

    /// Return an instance obtained from [`SlotPool::get`].
    pub fn put(&self, mut item: T) {
        item.reset();
        {
            let mut idle = self.idle.lock();
            if idle.len() < self.max_idle {
                idle.push(item);
            }
        }
        self.live.fetch_sub(1, Ordering::AcqRel);
    }

    /// Instances currently checked out.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Instances waiting for reuse.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }
}

/// Execution slot of one job: the request being run and its context.
///
/// Constructed empty; the context is attached when the slot is acquired for a
/// job and removed again by [`Reusable::reset`].
#[derive(Debug, Default)]
pub struct JobSlot {
    request: JobRequest,
    context: Option<JobContext>,
}

impl JobSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a job into the slot. The message buffer is reused.
    pub fn arm(&mut self, request: &JobRequest, context: JobContext) {
        self.request.message.clear();
        self.request.message.push_str(&request.message);
        self.context = Some(context);
    }

    pub fn request(&self) -> &JobRequest {
        &self.request
    }

    pub fn context(&self) -> Option<&JobContext> {
        self.context.as_ref()
    }
}

impl Reusable for JobSlot {
    fn reset(&mut self) {
        self.request.message.clear();
        self.context = None;
    }
}
