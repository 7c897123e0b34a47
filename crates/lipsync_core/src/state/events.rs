//! Change notifications.

use crate::jobs::EventJob;

/// A change published to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    /// The file model was replaced (load or slot selection).
    FileModelChanged { valid: bool },
    /// The field-level file error changed (`None` = cleared).
    FileError(Option<String>),
    /// The job set was rebuilt for a new file.
    JobsReplaced { count: usize },
    /// A job's status, error or naming changed. Carries the new state.
    JobChanged(EventJob),
    /// A running job advanced. May be coalesced.
    Progress { event_name: String, value: f64 },
    /// The aggregate busy flag flipped.
    BusyChanged(bool),
}

impl StateEvent {
    /// Event name of the job this event concerns, if any.
    pub fn event_name(&self) -> Option<&str> {
        match self {
            Self::JobChanged(job) => Some(&job.event_name),
            Self::Progress { event_name, .. } => Some(event_name),
            Self::FileModelChanged { .. }
            | Self::FileError(_)
            | Self::JobsReplaced { .. }
            | Self::BusyChanged(_) => None,
        }
    }
}
