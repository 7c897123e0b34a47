//! Spine skeleton JSON access.
//!
//! This module provides:
//! - `SpineDocument`: parsed skeleton file with schema checks
//! - Slot, attachment and audio event queries used to build the file model
//! - Animation write-back and atomic save of finished lip-sync animations

mod document;
mod error;

pub use document::{AudioEvent, SpineDocument, DEFAULT_FRAME_RATE};
pub use error::{SpineError, SpineResult};
