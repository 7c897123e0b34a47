//! Per-event animation jobs.
//!
//! This module provides:
//! - `EventJob`: one unit of work per audio event with its live status
//! - `AnimationNaming`: prefix/suffix wrapped around event names
//! - `build_jobs`: the job set for a loaded file

mod naming;
mod types;

pub use naming::{AnimationNaming, DEFAULT_ANIMATION_PREFIX};
pub use types::{build_jobs, EventJob};
