//! Lip-sync computation interface.
//!
//! The scheduler only knows the `AnimationEngine` contract: take a request,
//! report progress in `[0, 1]`, poll a `CancelToken`, and return mouth
//! cues or a `JobError`. `RhubarbEngine` implements it by driving the
//! rhubarb command-line tool.
//!
//! Finished output is handed to an `AnimationSink`; `SpineFileSink`
//! writes it into the character file.
//!
//! # Example
//!
//! ```ignore
//! use lipsync_core::engine::{AnimationEngine, CancelToken, RhubarbEngine};
//!
//! let engine = RhubarbEngine::new().with_binary_path("/opt/rhubarb/rhubarb");
//! let cancel = CancelToken::new();
//! let output = engine.run(&request, &|p| println!("{:.0}%", p * 100.0), &cancel)?;
//! println!("{} cues", output.cues.len());
//! ```

mod cancel;
mod errors;
mod rhubarb;
mod sink;
mod types;

pub use cancel::CancelToken;
pub use errors::{JobError, JobResult};
pub use rhubarb::RhubarbEngine;
pub use sink::{AnimationSink, SpineFileSink};
pub use types::{AnimationEngine, AnimationOutput, AnimationRequest};
