use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::WorkConfig;
use crate::scheduler::JobRequest;

/// Error reported by a job's action. Recorded as the job's failure reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ActionError(pub String);

impl ActionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// The work a job performs.
///
/// Cancellation is cooperative: the executor stops tracking a job as soon as
/// it is cancelled or times out, but the action keeps running until it
/// notices `cancel` and returns. Long-running actions should watch it.
#[async_trait]
pub trait JobAction: Send + Sync + 'static {
    async fn run(
        &self,
        request: JobRequest,
        cancel: CancellationToken,
    ) -> Result<String, ActionError>;
}

/// Simulated work: waits a random time up to `max_delay`, then echoes the message.
#[derive(Debug, Clone)]
pub struct EchoAction {
    max_delay: Duration,
}

impl EchoAction {
    pub fn new(max_delay: Duration) -> Self {
        Self { max_delay }
    }

    pub fn from_config(config: &WorkConfig) -> Self {
        Self::new(config.max_delay)
    }
}

#[async_trait]
impl JobAction for EchoAction {
    async fn run(
        &self,
        request: JobRequest,
        cancel: CancellationToken,
    ) -> Result<String, ActionError> {
        let max_ms = self.max_delay.as_millis() as u64;
        let delay = Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms));
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Echo job started");

        tokio::select! {
            _ = cancel.cancelled() => Err(ActionError::new("interrupted before completion")),
            _ = tokio::time::sleep(delay) => Ok(request.message),
        }
    }
}

/// Adapts an async closure into a [`JobAction`].
pub struct FnAction<F> {
    f: F,
}

impl<F> FnAction<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> JobAction for FnAction<F>
where
    F: Fn(JobRequest, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, ActionError>> + Send + 'static,
{
    async fn run(
        &self,
        request: JobRequest,
        cancel: CancellationToken,
    ) -> Result<String, ActionError> {
        (self.f)(request, cancel).await
    }
}
