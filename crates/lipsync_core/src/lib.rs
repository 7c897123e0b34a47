//! Spine lip-sync core - batch lip-sync animation for Spine characters.
//!
//! This crate contains all logic with zero UI dependencies: loading and
//! validating Spine skeleton JSON files, one animation job per audio
//! event, a single-worker scheduler with cooperative cancellation, and an
//! observable state store that front ends poll or subscribe to.
//!
//! It can be used by a GUI application or the `spine-lipsync` CLI.

pub mod config;
pub mod engine;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod scheduler;
pub mod session;
pub mod source;
pub mod spine;
pub mod state;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
