use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a [`JobContext`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneReason {
    Cancelled,
    DeadlineExceeded,
}

impl std::fmt::Display for DoneReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DoneReason::Cancelled => write!(f, "context canceled"),
            DoneReason::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

/// Atomic flag that lets exactly one caller claim the terminal write of a job.
#[derive(Debug, Default)]
pub struct ResolveOnce {
    resolved: AtomicBool,
}

impl ResolveOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true for the first caller only.
    pub fn try_resolve(&self) -> bool {
        self.resolved
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }
}

/// Cancellable, deadline-bound execution context of a single job.
///
/// Cancellation and the deadline share one done signal. The first of the two
/// to fire records its cause, which [`JobContext::err`] reports afterwards.
/// Created fresh for every acquisition, so the deadline is always measured
/// from submission.
#[derive(Debug, Clone)]
pub struct JobContext {
    token: CancellationToken,
    cause: Arc<OnceLock<DoneReason>>,
    guard: Arc<ResolveOnce>,
    deadline: Instant,
    timeout: Duration,
}

impl JobContext {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::from_token(CancellationToken::new(), timeout)
    }

    /// Context that is also cancelled when `parent` is.
    pub fn child_of(parent: &CancellationToken, timeout: Duration) -> Self {
        Self::from_token(parent.child_token(), timeout)
    }

    fn from_token(token: CancellationToken, timeout: Duration) -> Self {
        Self {
            token,
            cause: Arc::new(OnceLock::new()),
            guard: Arc::new(ResolveOnce::new()),
            deadline: Instant::now() + timeout,
            timeout,
        }
    }

    /// Trigger explicit cancellation. No-op once the context is done.
    pub fn cancel(&self) {
        self.finish(DoneReason::Cancelled);
    }

    fn finish(&self, reason: DoneReason) {
        let _ = self.cause.set(reason);
        self.token.cancel();
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> DoneReason {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => {}
            _ = tokio::time::sleep_until(self.deadline) => {
                self.finish(DoneReason::DeadlineExceeded);
            }
        }
        *self.cause.get_or_init(|| DoneReason::Cancelled)
    }

    /// Cause of completion, or `None` while the context is still live.
    pub fn err(&self) -> Option<DoneReason> {
        if let Some(reason) = self.cause.get() {
            return Some(*reason);
        }
        if self.token.is_cancelled() {
            // Cancelled through a parent token.
            return Some(*self.cause.get_or_init(|| DoneReason::Cancelled));
        }
        if Instant::now() >= self.deadline {
            self.finish(DoneReason::DeadlineExceeded);
            return self.cause.get().copied();
        }
        None
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Token the job's action should watch to stop work early.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn guard(&self) -> &ResolveOnce {
        &self.guard
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}
