//! Engine contract types.

use std::path::PathBuf;
use std::sync::Arc;

use super::cancel::CancelToken;
use super::errors::JobResult;
use crate::jobs::EventJob;
use crate::models::{MouthCue, MouthNaming, MouthShape};
use crate::source::SourceFileModel;

/// Everything an engine needs to animate one event.
///
/// Captured when the worker picks the job up, so later edits to the file
/// model or naming cannot affect a running job.
#[derive(Debug, Clone)]
pub struct AnimationRequest {
    /// Event being animated.
    pub event_name: String,
    /// Animation to create or replace.
    pub animation_name: String,
    /// Audio file to analyze.
    pub audio_file_path: PathBuf,
    /// Optional dialog text to guide recognition.
    pub dialog: Option<String>,
    /// Extended shapes the character provides.
    pub extended_shapes: Vec<MouthShape>,
    /// Slot that receives the attachment timeline.
    pub mouth_slot: String,
    /// Attachment naming for the slot.
    pub mouth_naming: MouthNaming,
    /// File model the job belongs to.
    pub source: Arc<SourceFileModel>,
}

impl AnimationRequest {
    /// Capture a request for a job, `None` if the job or model lacks
    /// what an animation needs.
    pub fn capture(job: &EventJob, source: &Arc<SourceFileModel>) -> Option<Self> {
        Some(Self {
            event_name: job.event_name.clone(),
            animation_name: job.animation_name.clone(),
            audio_file_path: job.audio_file_path.clone()?,
            dialog: job.dialog.clone(),
            extended_shapes: source.extended_shapes(),
            mouth_slot: source.selected_slot()?.to_string(),
            mouth_naming: source.mouth_naming()?.clone(),
            source: Arc::clone(source),
        })
    }
}

/// Mouth cues computed for one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationOutput {
    pub cues: Vec<MouthCue>,
}

/// A long-running lip-sync computation.
///
/// Implementations must poll `cancel` often enough to keep cancellation
/// responsive and return `JobError::Cancelled` once they observe it.
/// Progress values are fractions in `[0, 1]`.
pub trait AnimationEngine: Send + Sync {
    /// Engine name for logging.
    fn name(&self) -> &str;

    /// Compute mouth cues for a request.
    fn run(
        &self,
        request: &AnimationRequest,
        on_progress: &dyn Fn(f64),
        cancel: &CancelToken,
    ) -> JobResult<AnimationOutput>;
}
