//! Session errors.

use std::io;

use thiserror::Error;

use crate::scheduler::CommandError;
use crate::source::LoadError;

/// Errors returned by [`Session`](super::Session) operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The character file could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A job command was refused.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The file or naming can't change while jobs are queued or running.
    #[error("Jobs are still running; cancel them and wait until they stop")]
    Busy,

    /// No character file has been loaded yet.
    #[error("No character file is loaded")]
    NoFile,

    /// The worker thread could not be started.
    #[error("Failed to start worker thread: {0}")]
    Spawn(#[from] io::Error),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
