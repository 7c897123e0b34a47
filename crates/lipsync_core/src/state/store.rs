//! The shared state store.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use parking_lot::Mutex;

use super::events::StateEvent;
use crate::engine::CancelToken;
use crate::jobs::{AnimationNaming, EventJob};
use crate::models::JobAction;
use crate::source::SourceFileModel;

/// Default minimum progress step between published progress events.
pub const DEFAULT_PROGRESS_MIN_DELTA: f64 = 0.01;

/// Tuning for how changes are published.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Progress events are only sent once a job advanced by this much
    /// since the last one (completion is always sent).
    pub progress_min_delta: f64,
    /// Naming applied to jobs until changed.
    pub naming: AnimationNaming,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            progress_min_delta: DEFAULT_PROGRESS_MIN_DELTA,
            naming: AnimationNaming::default(),
        }
    }
}

/// The job currently owned by the worker.
#[derive(Debug, Clone)]
pub(crate) struct ActiveJob {
    pub(crate) event_name: String,
    pub(crate) token: CancelToken,
    pub(crate) generation: u64,
    pub(crate) published_progress: f64,
}

/// Everything guarded by the store lock.
#[derive(Debug)]
pub(crate) struct SharedState {
    pub(crate) file: Option<Arc<SourceFileModel>>,
    pub(crate) file_error: Option<String>,
    pub(crate) naming: AnimationNaming,
    pub(crate) jobs: Vec<EventJob>,
    pub(crate) queue: VecDeque<String>,
    pub(crate) active: Option<ActiveJob>,
    /// Bumped whenever the job set is rebuilt.
    pub(crate) generation: u64,
    /// Cleared on shutdown; no new submissions afterwards.
    pub(crate) accepting: bool,
}

impl SharedState {
    fn new(naming: AnimationNaming) -> Self {
        Self {
            file: None,
            file_error: None,
            naming,
            jobs: Vec::new(),
            queue: VecDeque::new(),
            active: None,
            generation: 0,
            accepting: true,
        }
    }

    pub(crate) fn job(&self, event_name: &str) -> Option<&EventJob> {
        self.jobs.iter().find(|j| j.event_name == event_name)
    }

    pub(crate) fn job_mut(&mut self, event_name: &str) -> Option<&mut EventJob> {
        self.jobs.iter_mut().find(|j| j.event_name == event_name)
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.active.is_some() || !self.queue.is_empty()
    }

    pub(crate) fn file_valid(&self) -> bool {
        self.file.as_ref().is_some_and(|f| f.is_valid())
    }
}

struct StoreInner {
    state: SharedState,
    subscribers: Vec<Sender<StateEvent>>,
}

/// Consistent copy of the shared state at one instant.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub file: Option<Arc<SourceFileModel>>,
    pub file_error: Option<String>,
    pub naming: AnimationNaming,
    pub jobs: Vec<EventJob>,
    /// Queued event names in execution order.
    pub queue: Vec<String>,
    /// Event name of the job owned by the worker.
    pub active_job: Option<String>,
    pub busy: bool,
}

impl SessionSnapshot {
    /// Whether a valid file model is loaded.
    pub fn file_valid(&self) -> bool {
        self.file.as_ref().is_some_and(|f| f.is_valid())
    }

    pub fn job(&self, event_name: &str) -> Option<&EventJob> {
        self.jobs.iter().find(|j| j.event_name == event_name)
    }

    /// Action currently offered for a job.
    pub fn action_for(&self, event_name: &str) -> Option<JobAction> {
        self.job(event_name)?.action(self.file_valid())
    }
}

/// Single owner of all state the worker and observers share.
pub struct StateStore {
    inner: Mutex<StoreInner>,
    progress_min_delta: f64,
}

impl StateStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                state: SharedState::new(options.naming),
                subscribers: Vec::new(),
            }),
            progress_min_delta: options.progress_min_delta.clamp(0.0, 1.0),
        }
    }

    /// Copy the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock();
        let state = &inner.state;
        SessionSnapshot {
            file: state.file.clone(),
            file_error: state.file_error.clone(),
            naming: state.naming.clone(),
            jobs: state.jobs.clone(),
            queue: state.queue.iter().cloned().collect(),
            active_job: state.active.as_ref().map(|a| a.event_name.clone()),
            busy: state.is_busy(),
        }
    }

    /// Current state of one job.
    pub fn job(&self, event_name: &str) -> Option<EventJob> {
        self.inner.lock().state.job(event_name).cloned()
    }

    /// Currently loaded file model.
    pub fn file_model(&self) -> Option<Arc<SourceFileModel>> {
        self.inner.lock().state.file.clone()
    }

    /// Whether a job is running or queued.
    pub fn is_busy(&self) -> bool {
        self.inner.lock().state.is_busy()
    }

    /// Whether a valid file model is loaded.
    pub fn file_valid(&self) -> bool {
        self.inner.lock().state.file_valid()
    }

    /// Action currently offered for a job.
    pub fn action_for(&self, event_name: &str) -> Option<JobAction> {
        let inner = self.inner.lock();
        let state = &inner.state;
        state.job(event_name)?.action(state.file_valid())
    }

    /// Receive every change from now on.
    ///
    /// Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> Receiver<StateEvent> {
        let (tx, rx) = mpsc::channel();
        self.inner.lock().subscribers.push(tx);
        rx
    }

    pub(crate) fn progress_min_delta(&self) -> f64 {
        self.progress_min_delta
    }

    /// Mutate the state in one critical section.
    ///
    /// Events pushed by `f` (plus a `BusyChanged` if the busy flag
    /// flipped) are delivered before the lock is released.
    pub(crate) fn update<R>(
        &self,
        f: impl FnOnce(&mut SharedState, &mut Vec<StateEvent>) -> R,
    ) -> R {
        let mut inner = self.inner.lock();
        let was_busy = inner.state.is_busy();

        let mut events = Vec::new();
        let result = f(&mut inner.state, &mut events);

        let busy = inner.state.is_busy();
        if busy != was_busy {
            events.push(StateEvent::BusyChanged(busy));
        }

        if !events.is_empty() {
            inner
                .subscribers
                .retain(|tx| events.iter().all(|event| tx.send(event.clone()).is_ok()));
        }
        result
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(StoreOptions::default())
    }
}
