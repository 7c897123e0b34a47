//! Session command interface.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::errors::{SessionError, SessionResult};
use crate::config::Settings;
use crate::engine::{AnimationEngine, AnimationSink, RhubarbEngine, SpineFileSink};
use crate::jobs::{build_jobs, AnimationNaming};
use crate::models::JobAction;
use crate::scheduler::{CancelOutcome, CommandError, JobScheduler, ShutdownMode, SubmitOutcome};
use crate::source::{parse_path_input, SourceFileModel};
use crate::state::{SessionSnapshot, StateEvent, StateStore, StoreOptions};

/// A loaded character file, its jobs, and the worker that runs them.
pub struct Session {
    store: Arc<StateStore>,
    scheduler: JobScheduler,
}

impl Session {
    /// Session using the Rhubarb engine and writing into the Spine file.
    pub fn new(settings: &Settings) -> SessionResult<Self> {
        let engine = RhubarbEngine::new()
            .with_binary_path(settings.paths.rhubarb_binary.as_str())
            .with_poll_interval(settings.engine.cancel_poll_interval());
        Self::with_parts(
            Arc::new(engine),
            Arc::new(SpineFileSink::new()),
            settings.store_options(),
        )
    }

    /// Session with a custom engine and sink.
    pub fn with_parts(
        engine: Arc<dyn AnimationEngine>,
        sink: Arc<dyn AnimationSink>,
        options: StoreOptions,
    ) -> SessionResult<Self> {
        let store = Arc::new(StateStore::new(options));
        let scheduler = JobScheduler::start(Arc::clone(&store), engine, sink)?;
        Ok(Self { store, scheduler })
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.store.snapshot()
    }

    /// Receive every state change from now on.
    pub fn subscribe(&self) -> Receiver<StateEvent> {
        self.store.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.store.is_busy()
    }

    /// Load a character file and rebuild the job set.
    ///
    /// `input` may be a pasted path with surrounding quotes. While jobs
    /// are running the load is refused and everything is cancelled, so a
    /// retry succeeds once the worker is idle. A failed load keeps the
    /// previous model and records the error for display.
    pub fn load_file(&self, input: &str) -> SessionResult<Arc<SourceFileModel>> {
        if self.store.is_busy() {
            let cancelled = self.scheduler.cancel_all();
            tracing::info!("Load requested while busy; cancelled {} job(s)", cancelled);
            return Err(SessionError::Busy);
        }

        let model = match parse_path_input(input).and_then(|path| SourceFileModel::load(&path)) {
            Ok(model) => Arc::new(model),
            Err(e) => {
                tracing::warn!("Failed to load '{}': {}", input.trim(), e);
                let message = e.to_string();
                self.store.update(|state, events| {
                    state.file_error = Some(message.clone());
                    events.push(StateEvent::FileError(Some(message)));
                });
                return Err(e.into());
            }
        };

        self.store.update(|state, events| {
            if state.is_busy() {
                return Err(SessionError::Busy);
            }
            state.jobs = build_jobs(&model, &state.naming);
            state.generation += 1;
            state.file = Some(Arc::clone(&model));
            if state.file_error.take().is_some() {
                events.push(StateEvent::FileError(None));
            }
            events.push(StateEvent::FileModelChanged {
                valid: model.is_valid(),
            });
            events.push(StateEvent::JobsReplaced {
                count: state.jobs.len(),
            });
            Ok(())
        })?;

        Ok(model)
    }

    /// Choose a different mouth slot.
    pub fn select_slot(&self, slot: &str) -> SessionResult<Arc<SourceFileModel>> {
        self.store.update(|state, events| {
            if state.is_busy() {
                return Err(SessionError::Busy);
            }
            let current = state.file.as_ref().ok_or(SessionError::NoFile)?;
            let model = Arc::new(current.select_slot(slot));
            tracing::debug!(
                "Selected slot '{}' (valid={})",
                slot,
                model.is_valid()
            );

            state.file = Some(Arc::clone(&model));
            events.push(StateEvent::FileModelChanged {
                valid: model.is_valid(),
            });
            Ok(model)
        })
    }

    /// Change the animation prefix and suffix; renames every job.
    pub fn set_naming(&self, naming: AnimationNaming) -> SessionResult<()> {
        self.store.update(|state, events| {
            if state.is_busy() {
                return Err(SessionError::Busy);
            }
            for job in &mut state.jobs {
                job.rename(&naming);
                events.push(StateEvent::JobChanged(job.clone()));
            }
            state.naming = naming;
            Ok(())
        })
    }

    pub fn submit_job(&self, event_name: &str) -> SessionResult<SubmitOutcome> {
        Ok(self.scheduler.submit(event_name)?)
    }

    pub fn cancel_job(&self, event_name: &str) -> SessionResult<CancelOutcome> {
        Ok(self.scheduler.cancel(event_name)?)
    }

    /// Run whatever action the job currently offers (animate or cancel).
    pub fn perform_action(&self, event_name: &str) -> SessionResult<JobAction> {
        let Some(job) = self.store.job(event_name) else {
            return Err(CommandError::unknown_job(event_name).into());
        };
        let file_valid = self.store.file_valid();
        let Some(action) = job.action(file_valid) else {
            return Err(if file_valid {
                CommandError::ineligible(event_name, "Audio file is missing.")
            } else {
                CommandError::InvalidModel
            }
            .into());
        };

        match action {
            JobAction::Animate | JobAction::AnimateAgain => {
                self.scheduler.submit(event_name)?;
            }
            JobAction::Cancel => {
                self.scheduler.cancel(event_name)?;
            }
        }
        Ok(action)
    }

    /// Submit every job that has audio and is not already queued.
    ///
    /// Returns the event names that were queued.
    pub fn submit_all(&self) -> SessionResult<Vec<String>> {
        let candidates: Vec<String> = self
            .store
            .snapshot()
            .jobs
            .into_iter()
            .filter(|job| job.has_audio() && !job.status.is_busy())
            .map(|job| job.event_name)
            .collect();

        let mut queued = Vec::new();
        for event_name in candidates {
            match self.scheduler.submit(&event_name) {
                Ok(SubmitOutcome::Queued) => queued.push(event_name),
                Ok(SubmitOutcome::AlreadyActive) => {}
                Err(CommandError::Ineligible { reason, .. }) => {
                    tracing::warn!("Skipping '{}': {}", event_name, reason);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(queued)
    }

    pub fn cancel_all(&self) -> usize {
        self.scheduler.cancel_all()
    }

    /// Block until no job is queued or running, or the timeout expires.
    ///
    /// Returns whether the session is idle.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        let rx = self.store.subscribe();
        let deadline = Instant::now() + timeout;
        while self.store.is_busy() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match rx.recv_timeout(remaining) {
                Ok(_) => {}
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return !self.store.is_busy();
                }
            }
        }
        true
    }

    /// Stop the worker. Later submissions are refused.
    pub fn shutdown(&self, mode: ShutdownMode) {
        self.scheduler.shutdown(mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AnimationOutput, AnimationRequest, CancelToken, JobResult};
    use crate::source::LoadError;

    struct NoopEngine;

    impl AnimationEngine for NoopEngine {
        fn name(&self) -> &str {
            "noop"
        }

        fn run(
            &self,
            _request: &AnimationRequest,
            _on_progress: &dyn Fn(f64),
            _cancel: &CancelToken,
        ) -> JobResult<AnimationOutput> {
            Ok(AnimationOutput::default())
        }
    }

    struct NoopSink;

    impl AnimationSink for NoopSink {
        fn write(&self, _request: &AnimationRequest, _output: &AnimationOutput) -> JobResult<()> {
            Ok(())
        }
    }

    fn session() -> Session {
        crate::logging::init_test_tracing();
        Session::with_parts(
            Arc::new(NoopEngine),
            Arc::new(NoopSink),
            StoreOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn blank_input_records_file_error() {
        let session = session();
        let rx = session.subscribe();

        let err = session.load_file("  ").unwrap_err();
        assert!(matches!(err, SessionError::Load(LoadError::NotFound { .. })));

        let snapshot = session.snapshot();
        assert!(snapshot.file.is_none());
        assert_eq!(snapshot.file_error.as_deref(), Some("No input file specified."));
        assert!(matches!(rx.try_recv(), Ok(StateEvent::FileError(Some(_)))));
    }

    #[test]
    fn select_slot_without_file() {
        let session = session();
        assert!(matches!(session.select_slot("mouth"), Err(SessionError::NoFile)));
    }

    #[test]
    fn idle_session_is_idle_immediately() {
        let session = session();
        assert!(session.wait_until_idle(Duration::from_millis(10)));
    }

    #[test]
    fn naming_applies_to_future_loads() {
        let session = session();
        session
            .set_naming(AnimationNaming::new("talk_", "_v2"))
            .unwrap();
        assert_eq!(session.snapshot().naming.animation_name("hi"), "talk_hi_v2");
    }
}
