//! Errors for loading character files.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to load a character file into a `SourceFileModel`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// No path given, or the path does not exist.
    #[error("{message}")]
    NotFound { path: PathBuf, message: String },

    /// The file could not be read or is not valid JSON.
    #[error("Wrong file format. This is not a valid JSON file: {0}")]
    ParseError(String),

    /// The JSON is valid but lacks structure a Spine export must have.
    #[error("{0}")]
    SchemaError(String),
}

impl LoadError {
    /// Create a not-found error for a path.
    pub fn not_found(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::NotFound {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError(message.into())
    }

    /// Create a schema error.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaError(message.into())
    }
}

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;
