//! Per-job execution errors.

use thiserror::Error;

/// Why an animation job did not produce output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The computation (or writing its result) failed.
    #[error("{0}")]
    ComputationFailed(String),

    /// The job observed its cancel token and stopped.
    #[error("Animation was cancelled")]
    Cancelled,
}

impl JobError {
    /// Create a computation failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::ComputationFailed(message.into())
    }
}

/// Result type for engine runs.
pub type JobResult<T> = Result<T, JobError>;
