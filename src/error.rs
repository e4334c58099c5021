use thiserror::Error;

use crate::scheduler::JobId;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("job with id {0} not found")]
    NotFound(JobId),

    #[error("{0}")]
    Validation(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("server is draining, not accepting new jobs")]
    Draining,

    #[error("response encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("missing Token header")]
    Unauthorized,

    #[error("invalid Token header")]
    Forbidden,
}

impl JobError {
    /// Whether a client may retry the same request later and expect it to succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobError::ResourceExhausted(_) | JobError::Draining)
    }
}

pub type Result<T> = std::result::Result<T, JobError>;
