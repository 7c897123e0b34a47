//! Character file loading and validation.
//!
//! This module provides:
//! - `SourceFileModel`: immutable, validated view of a loaded Spine file
//! - `LoadError`: why a file could not be loaded
//! - `parse_path_input`: turn user-typed path text into a path

mod errors;
mod model;

pub use errors::{LoadError, LoadResult};
pub use model::{parse_path_input, SourceFileModel};
