//! Errors for job commands.

use thiserror::Error;

/// Why a submit or cancel request was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// No job with this event name exists.
    #[error("No job for event '{0}'")]
    UnknownJob(String),

    /// The job cannot be animated (e.g. its audio file is missing).
    #[error("Event '{event_name}' cannot be animated: {reason}")]
    Ineligible { event_name: String, reason: String },

    /// No file is loaded, or the loaded file is not valid.
    #[error("The character file is missing or invalid")]
    InvalidModel,

    /// The scheduler has been shut down.
    #[error("The scheduler has been shut down")]
    ShutDown,
}

impl CommandError {
    /// Create an unknown job error.
    pub fn unknown_job(event_name: impl Into<String>) -> Self {
        Self::UnknownJob(event_name.into())
    }

    /// Create an ineligible error.
    pub fn ineligible(event_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Ineligible {
            event_name: event_name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for job commands.
pub type CommandResult<T> = Result<T, CommandError>;
