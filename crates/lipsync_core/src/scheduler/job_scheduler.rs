//! Foreground handle to the worker thread.

use std::io;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use super::errors::{CommandError, CommandResult};
use super::worker::{Worker, WorkerMessage};
use crate::engine::{AnimationEngine, AnimationSink};
use crate::models::JobStatus;
use crate::state::{SharedState, StateEvent, StateStore};

/// Name of the worker thread.
const WORKER_THREAD_NAME: &str = "lipsync-worker";

/// Result of a submit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The job was appended to the queue.
    Queued,
    /// The job was already queued or running; nothing changed.
    AlreadyActive,
}

/// Result of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The job was still queued and has been removed.
    Dequeued,
    /// The job is running; the engine has been asked to stop.
    Signalled,
    /// Cancellation was already requested.
    AlreadyCanceling,
    /// The job was neither queued nor running.
    NotActive,
}

/// How queued work is treated on shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Run everything already queued, then stop.
    Drain,
    /// Cancel queued and running jobs, then stop.
    CancelAll,
}

/// Runs jobs one at a time on a background thread.
///
/// All state lives in the shared [`StateStore`]; the scheduler only owns
/// the worker thread and the channel used to wake it.
pub struct JobScheduler {
    store: Arc<StateStore>,
    sender: Mutex<Option<Sender<WorkerMessage>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl JobScheduler {
    /// Spawn the worker thread.
    pub fn start(
        store: Arc<StateStore>,
        engine: Arc<dyn AnimationEngine>,
        sink: Arc<dyn AnimationSink>,
    ) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let worker = Worker {
            store: Arc::clone(&store),
            engine,
            sink,
            rx,
        };
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || worker.run())?;

        tracing::debug!("Job scheduler started");
        Ok(Self {
            store,
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(handle)),
        })
    }

    /// The store this scheduler drives.
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Whether a job is running or queued.
    pub fn is_busy(&self) -> bool {
        self.store.is_busy()
    }

    /// Queue a job: `NotAnimated | Done -> Pending`.
    ///
    /// Submitting a job that is already queued or running is a no-op.
    /// The audio file is checked again; if it has disappeared the job
    /// loses its audio path and the request is refused.
    pub fn submit(&self, event_name: &str) -> CommandResult<SubmitOutcome> {
        let audio_present = self
            .store
            .job(event_name)
            .and_then(|job| job.audio_file_path)
            .is_some_and(|path| path.is_file());

        let outcome = self.store.update(|state, events| {
            if !state.accepting {
                return Err(CommandError::ShutDown);
            }
            if !state.file_valid() {
                return Err(CommandError::InvalidModel);
            }
            let Some(job) = state.job_mut(event_name) else {
                return Err(CommandError::unknown_job(event_name));
            };
            if job.status.is_busy() {
                return Ok(SubmitOutcome::AlreadyActive);
            }
            if !audio_present {
                if job.audio_file_path.take().is_some() {
                    events.push(StateEvent::JobChanged(job.clone()));
                }
                return Err(CommandError::ineligible(
                    event_name,
                    "Audio file is missing.",
                ));
            }

            job.error = None;
            job.set_status(JobStatus::Pending);
            events.push(StateEvent::JobChanged(job.clone()));
            state.queue.push_back(event_name.to_string());
            Ok(SubmitOutcome::Queued)
        })?;

        if outcome == SubmitOutcome::Queued {
            tracing::debug!("Queued '{}'", event_name);
            self.wake();
        }
        Ok(outcome)
    }

    /// Cancel a queued or running job.
    ///
    /// A queued job goes straight back to `NotAnimated`. A running job
    /// moves to `Canceling` and stays there until the worker observes the
    /// engine stopping.
    pub fn cancel(&self, event_name: &str) -> CommandResult<CancelOutcome> {
        self.store.update(|state, events| {
            let status = state
                .job(event_name)
                .map(|job| job.status)
                .ok_or_else(|| CommandError::unknown_job(event_name))?;

            let outcome = match status {
                JobStatus::Pending => {
                    state.queue.retain(|queued| queued != event_name);
                    transition(state, events, event_name, JobStatus::NotAnimated);
                    CancelOutcome::Dequeued
                }
                JobStatus::Animating => {
                    signal_active(state, event_name);
                    transition(state, events, event_name, JobStatus::Canceling);
                    CancelOutcome::Signalled
                }
                JobStatus::Canceling => CancelOutcome::AlreadyCanceling,
                JobStatus::NotAnimated | JobStatus::Done => CancelOutcome::NotActive,
            };
            tracing::debug!("Cancel '{}': {:?}", event_name, outcome);
            Ok(outcome)
        })
    }

    /// Cancel every queued and running job. Returns how many were affected.
    pub fn cancel_all(&self) -> usize {
        self.store.update(|state, events| {
            let mut count = 0;
            let queued: Vec<String> = state.queue.drain(..).collect();
            for event_name in &queued {
                if transition(state, events, event_name, JobStatus::NotAnimated) {
                    count += 1;
                }
            }

            let running = state
                .active
                .as_ref()
                .map(|active| active.event_name.clone());
            if let Some(event_name) = running {
                let animating = state
                    .job(&event_name)
                    .is_some_and(|job| job.status == JobStatus::Animating);
                if animating {
                    signal_active(state, &event_name);
                    transition(state, events, &event_name, JobStatus::Canceling);
                    count += 1;
                }
            }

            if count > 0 {
                tracing::info!("Cancelling {} job(s)", count);
            }
            count
        })
    }

    /// Stop accepting work and wait for the worker thread to exit.
    ///
    /// Calling this more than once is harmless.
    pub fn shutdown(&self, mode: ShutdownMode) {
        let Some(sender) = self.sender.lock().take() else {
            return;
        };
        tracing::info!("Shutting down job scheduler ({:?})", mode);

        self.store.update(|state, _| state.accepting = false);
        if mode == ShutdownMode::CancelAll {
            self.cancel_all();
        }

        // A send error means the worker already exited.
        let _ = sender.send(WorkerMessage::Shutdown);
        drop(sender);

        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }
    }

    fn wake(&self) {
        if let Some(sender) = self.sender.lock().as_ref() {
            let _ = sender.send(WorkerMessage::Wake);
        }
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        self.shutdown(ShutdownMode::CancelAll);
    }
}

/// Set a job's status and publish it. Returns false if the job is gone.
fn transition(
    state: &mut SharedState,
    events: &mut Vec<StateEvent>,
    event_name: &str,
    status: JobStatus,
) -> bool {
    let Some(job) = state.job_mut(event_name) else {
        return false;
    };
    job.set_status(status);
    events.push(StateEvent::JobChanged(job.clone()));
    true
}

fn signal_active(state: &SharedState, event_name: &str) {
    if let Some(active) = state
        .active
        .as_ref()
        .filter(|active| active.event_name == event_name)
    {
        active.token.cancel();
    }
}
