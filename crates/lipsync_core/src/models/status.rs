//! Job status and the action offered for each status.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an event job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum JobStatus {
    /// No animation produced in this session (or last run cancelled/failed).
    #[default]
    NotAnimated,
    /// Waiting in the scheduler queue.
    Pending,
    /// Currently being animated by the worker.
    Animating,
    /// Cancellation requested, worker has not unwound yet.
    Canceling,
    /// Animation written to the file.
    Done,
}

impl JobStatus {
    /// Get display string for UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAnimated => "Not animated",
            Self::Pending => "Pending",
            Self::Animating => "Animating",
            Self::Canceling => "Canceling",
            Self::Done => "Done",
        }
    }

    /// Whether the job is queued or owned by the worker.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Pending | Self::Animating | Self::Canceling)
    }

    /// Action the "perform action" affordance triggers in this status.
    pub fn action(&self) -> JobAction {
        match self {
            Self::NotAnimated => JobAction::Animate,
            Self::Done => JobAction::AnimateAgain,
            Self::Pending | Self::Animating | Self::Canceling => JobAction::Cancel,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What performing the action on a job does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobAction {
    /// Submit a job that has not been animated.
    Animate,
    /// Re-submit a finished job.
    AnimateAgain,
    /// Cancel a queued or running job.
    Cancel,
}

impl JobAction {
    /// Button label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Animate => "Animate",
            Self::AnimateAgain => "Animate again",
            Self::Cancel => "Cancel",
        }
    }

    /// Whether this action submits the job.
    pub fn is_submit(&self) -> bool {
        matches!(self, Self::Animate | Self::AnimateAgain)
    }
}
