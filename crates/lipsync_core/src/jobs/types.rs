//! Event job types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::naming::AnimationNaming;
use crate::models::{JobAction, JobStatus};
use crate::source::SourceFileModel;

/// One animation job per audio event.
///
/// `progress` is `Some` exactly while the job is `Animating`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventJob {
    /// Event name; also identifies the job.
    pub event_name: String,
    /// Name of the animation written for this event.
    pub animation_name: String,
    /// Resolved audio file, `None` if it does not exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_file_path: Option<PathBuf>,
    /// Audio path as stored in the file, for display.
    pub relative_audio_path: String,
    /// Dialog text passed to the engine as a hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialog: Option<String>,
    /// Current status.
    pub status: JobStatus,
    /// Fraction complete while animating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    /// Failure description from the last run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EventJob {
    /// Whether the job has an audio file to animate.
    pub fn has_audio(&self) -> bool {
        self.audio_file_path.is_some()
    }

    /// Recompute the animation name after a naming change.
    pub fn rename(&mut self, naming: &AnimationNaming) {
        self.animation_name = naming.animation_name(&self.event_name);
    }

    /// Action offered for this job, `None` when it is unavailable.
    ///
    /// Nothing is offered while the file model is invalid. A job without
    /// audio offers no action unless it is already queued or running, in
    /// which case it can still be cancelled.
    pub fn action(&self, file_valid: bool) -> Option<JobAction> {
        if !file_valid {
            return None;
        }
        let action = self.status.action();
        if action.is_submit() && !self.has_audio() {
            return None;
        }
        Some(action)
    }

    /// Text for the status column, e.g. `"Animating 42%"`.
    pub fn status_display(&self) -> String {
        match (self.status, self.progress) {
            (JobStatus::Animating, Some(progress)) => {
                format!("Animating {}%", (progress * 100.0) as u32)
            }
            (status, _) => status.as_str().to_string(),
        }
    }

    pub(crate) fn set_status(&mut self, status: JobStatus) {
        self.status = status;
        self.progress = match status {
            JobStatus::Animating => Some(self.progress.unwrap_or(0.0)),
            _ => None,
        };
    }
}

/// Build the job set for a loaded file, one job per audio event.
pub fn build_jobs(model: &SourceFileModel, naming: &AnimationNaming) -> Vec<EventJob> {
    model
        .audio_events()
        .iter()
        .map(|event| EventJob {
            event_name: event.name.clone(),
            animation_name: naming.animation_name(&event.name),
            audio_file_path: model.audio_file_path(event),
            relative_audio_path: event.relative_audio_path.clone(),
            dialog: event.dialog.clone(),
            status: JobStatus::NotAnimated,
            progress: None,
            error: None,
        })
        .collect()
}
