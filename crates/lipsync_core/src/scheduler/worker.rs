//! Background worker and the transitions it drives.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use crate::engine::{AnimationEngine, AnimationRequest, AnimationSink, CancelToken, JobError, JobResult};
use crate::models::JobStatus;
use crate::state::{ActiveJob, StateEvent, StateStore};

/// Messages from the foreground to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerMessage {
    /// Something was queued.
    Wake,
    /// Finish whatever is queued, then exit.
    Shutdown,
}

/// A job the worker has claimed.
struct StartedJob {
    request: AnimationRequest,
    token: CancelToken,
    generation: u64,
}

/// The single background worker.
pub(crate) struct Worker {
    pub(crate) store: Arc<StateStore>,
    pub(crate) engine: Arc<dyn AnimationEngine>,
    pub(crate) sink: Arc<dyn AnimationSink>,
    pub(crate) rx: Receiver<WorkerMessage>,
}

impl Worker {
    /// Worker thread body.
    pub(crate) fn run(self) {
        tracing::debug!("Worker started (engine: {})", self.engine.name());
        loop {
            self.drain();
            match self.rx.recv() {
                Ok(WorkerMessage::Wake) => continue,
                Ok(WorkerMessage::Shutdown) | Err(_) => {
                    self.drain();
                    break;
                }
            }
        }
        tracing::debug!("Worker stopped");
    }

    /// Run queued jobs until the queue is empty.
    fn drain(&self) {
        while let Some(started) = begin_next(&self.store) {
            self.execute(started);
        }
    }

    fn execute(&self, started: StartedJob) {
        let StartedJob {
            request,
            token,
            generation,
        } = started;
        let event_name = request.event_name.clone();
        tracing::info!(
            "Animating event '{}' into '{}'",
            event_name,
            request.animation_name
        );

        let store = &self.store;
        let on_progress = |value: f64| report_progress(store, &event_name, generation, value);
        // A panicking engine or sink fails the job, not the worker.
        let result = catch_unwind(AssertUnwindSafe(|| {
            match self.engine.run(&request, &on_progress, &token) {
                Ok(output) if !token.is_cancelled() => self.sink.write(&request, &output),
                Ok(_) => Err(JobError::Cancelled),
                Err(e) => Err(e),
            }
        }))
        .unwrap_or_else(|payload| {
            Err(JobError::failed(format!(
                "Animation crashed: {}",
                panic_message(&*payload)
            )))
        });

        finish(store, &event_name, generation, result);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Claim the next queued job: `Pending -> Animating`.
fn begin_next(store: &StateStore) -> Option<StartedJob> {
    store.update(|state, events| {
        while let Some(event_name) = state.queue.pop_front() {
            let generation = state.generation;
            let file = state.file.clone();
            let Some(job) = state.job_mut(&event_name) else {
                continue;
            };
            if job.status != JobStatus::Pending {
                tracing::warn!("Skipping queued job '{}' in status {}", event_name, job.status);
                continue;
            }

            let Some(request) = file
                .as_ref()
                .and_then(|file| AnimationRequest::capture(job, file))
            else {
                job.error = Some("Audio file or mouth slot is missing.".to_string());
                job.set_status(JobStatus::NotAnimated);
                events.push(StateEvent::JobChanged(job.clone()));
                continue;
            };

            job.error = None;
            job.progress = None;
            job.set_status(JobStatus::Animating);
            events.push(StateEvent::JobChanged(job.clone()));

            let token = CancelToken::new();
            state.active = Some(ActiveJob {
                event_name,
                token: token.clone(),
                generation,
                published_progress: 0.0,
            });
            return Some(StartedJob {
                request,
                token,
                generation,
            });
        }
        None
    })
}

/// Record engine progress for the active job.
///
/// Values are clamped to `[0, 1]`. Anything that would move progress
/// backwards, or that arrives after cancellation was requested, is dropped.
fn report_progress(store: &StateStore, event_name: &str, generation: u64, value: f64) {
    if !value.is_finite() {
        return;
    }
    let value = value.clamp(0.0, 1.0);
    let min_delta = store.progress_min_delta();

    store.update(|state, events| {
        let Some(active) = state.active.as_mut() else {
            return;
        };
        if active.event_name != event_name
            || active.generation != generation
            || active.token.is_cancelled()
        {
            return;
        }
        let Some(job) = state.jobs.iter_mut().find(|j| j.event_name == event_name) else {
            return;
        };
        if job.status != JobStatus::Animating {
            return;
        }

        let current = job.progress.unwrap_or(0.0);
        if value <= current {
            return;
        }
        job.progress = Some(value);

        if value - active.published_progress >= min_delta || value >= 1.0 {
            active.published_progress = value;
            events.push(StateEvent::Progress {
                event_name: event_name.to_string(),
                value,
            });
        }
    });
}

/// Record the outcome of the active job and release it.
fn finish(store: &StateStore, event_name: &str, generation: u64, result: JobResult<()>) {
    store.update(|state, events| {
        let Some(active) = state.active.take() else {
            tracing::warn!("Job '{}' finished but no job was active", event_name);
            return;
        };
        if active.event_name != event_name || active.generation != generation {
            tracing::warn!(
                "Job '{}' finished but '{}' was active",
                event_name,
                active.event_name
            );
            return;
        }
        let cancelled = active.token.is_cancelled();

        let Some(job) = state.job_mut(event_name) else {
            return;
        };
        match (cancelled, result) {
            (true, _) | (false, Err(JobError::Cancelled)) => {
                tracing::info!("Animation of '{}' cancelled", event_name);
                job.error = None;
                job.set_status(JobStatus::NotAnimated);
            }
            (false, Ok(())) => {
                tracing::info!("Animation of '{}' done", event_name);
                job.error = None;
                job.set_status(JobStatus::Done);
            }
            (false, Err(e)) => {
                tracing::warn!("Animation of '{}' failed: {}", event_name, e);
                job.error = Some(e.to_string());
                job.set_status(JobStatus::NotAnimated);
            }
        }
        events.push(StateEvent::JobChanged(job.clone()));
    });
}
