use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{JobError, Result};
use crate::scheduler::JobId;

/// Payload submitted by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub message: String,
}

impl JobRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn validate(&self, max_message_len: usize) -> Result<()> {
        if self.message.trim().is_empty() {
            return Err(JobError::Validation("message must not be empty".to_string()));
        }
        if self.message.len() > max_message_len {
            return Err(JobError::Validation(format!(
                "message is {} bytes, limit is {}",
                self.message.len(),
                max_message_len
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Success,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Success => write!(f, "success"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// How a job's race was decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The action finished and returned a payload.
    Success(String),
    /// The action finished and reported an error.
    Failed(String),
    /// The deadline elapsed before the action finished.
    TimedOut(Duration),
    /// The caller cancelled the job.
    Cancelled,
}

impl JobOutcome {
    pub fn status(&self) -> JobStatus {
        match self {
            JobOutcome::Success(_) => JobStatus::Success,
            JobOutcome::Failed(_) | JobOutcome::TimedOut(_) => JobStatus::Failed,
            JobOutcome::Cancelled => JobStatus::Cancelled,
        }
    }

    fn into_payload(self) -> String {
        match self {
            JobOutcome::Success(payload) => payload,
            JobOutcome::Failed(error) => format!("job failed with error: {}", error),
            JobOutcome::TimedOut(deadline) => {
                format!("job timed out after {}ms", deadline.as_millis())
            }
            JobOutcome::Cancelled => "job was cancelled".to_string(),
        }
    }
}

/// Status record of a job, as served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(rename = "jobID")]
    pub id: JobId,
    pub status: JobStatus,
    pub result: String,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "finishedTime")]
    pub finish_time: Option<DateTime<Utc>>,
}

impl JobResult {
    pub fn pending(id: JobId, start_time: DateTime<Utc>) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            result: String::new(),
            start_time,
            finish_time: None,
        }
    }

    /// Build the terminal record that replaces this pending one.
    pub fn resolved(&self, outcome: JobOutcome, finish_time: DateTime<Utc>) -> Self {
        Self {
            id: self.id,
            status: outcome.status(),
            result: outcome.into_payload(),
            start_time: self.start_time,
            finish_time: Some(finish_time),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Number of known jobs in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub success: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: JobStatus) {
        match status {
            JobStatus::Pending => self.pending += 1,
            JobStatus::Success => self.success += 1,
            JobStatus::Failed => self.failed += 1,
            JobStatus::Cancelled => self.cancelled += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.success + self.failed + self.cancelled
    }
}
