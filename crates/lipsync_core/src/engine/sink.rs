//! Destinations for finished animations.

use parking_lot::Mutex;

use super::errors::{JobError, JobResult};
use super::types::{AnimationOutput, AnimationRequest};
use crate::spine::SpineDocument;

/// Receives the output of every successful job before it is marked done.
///
/// Only the scheduler's worker thread calls `write`, one job at a time.
pub trait AnimationSink: Send + Sync {
    fn write(&self, request: &AnimationRequest, output: &AnimationOutput) -> JobResult<()>;
}

/// Writes animations into the character file and saves it.
///
/// The sink keeps its own working copy of the document for the current
/// load, so animations from consecutive jobs accumulate instead of each
/// save starting again from the file as it was loaded.
#[derive(Default)]
pub struct SpineFileSink {
    working: Mutex<Option<(u64, SpineDocument)>>,
}

impl SpineFileSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnimationSink for SpineFileSink {
    fn write(&self, request: &AnimationRequest, output: &AnimationOutput) -> JobResult<()> {
        let load_id = request.source.load_id();
        let mut working = self.working.lock();

        // Edit a copy so a failed save leaves nothing behind for later jobs.
        let mut document = match working.as_ref() {
            Some((id, document)) if *id == load_id => document.clone(),
            _ => request.source.document().clone(),
        };
        document.write_animation(
            &request.animation_name,
            &request.event_name,
            &request.mouth_slot,
            &request.mouth_naming,
            &output.cues,
        );
        document.save().map_err(|e| JobError::failed(e.to_string()))?;

        tracing::info!(
            "Wrote animation '{}' ({} cues) to {}",
            request.animation_name,
            output.cues.len(),
            document.path().display()
        );
        *working = Some((load_id, document));
        Ok(())
    }
}
