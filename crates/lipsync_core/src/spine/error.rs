//! Errors raised while writing Spine documents.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error from modifying or saving a Spine document.
#[derive(Error, Debug)]
pub enum SpineError {
    /// File I/O error.
    #[error("I/O error while {operation} '{}': {source}", path.display())]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The document could not be serialized.
    #[error("Failed to serialize Spine JSON: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SpineError {
    /// Create an I/O error with context.
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }
}

/// Result type for Spine document writes.
pub type SpineResult<T> = Result<T, SpineError>;
