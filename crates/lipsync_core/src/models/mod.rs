//! Data models shared across the crate.
//!
//! This module contains the small value types everything else builds on:
//! - Mouth shapes, naming conventions and timed mouth cues
//! - Job status and the action a job currently offers

mod mouth;
mod status;

pub use mouth::{MouthCue, MouthNaming, MouthShape, MouthShapeCasing};
pub use status::{JobAction, JobStatus};
