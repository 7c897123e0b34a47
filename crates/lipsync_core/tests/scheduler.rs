//! Job lifecycle through the worker, observed from the foreground.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::{
    collect_until, collect_until_idle, path_str, scripted_engine, session, RecordingSink,
};
use lipsync_core::engine::{
    AnimationEngine, AnimationOutput, AnimationRequest, CancelToken, JobResult,
};
use lipsync_core::models::JobStatus;
use lipsync_core::scheduler::{CancelOutcome, ShutdownMode, SubmitOutcome};
use lipsync_core::session::Session;
use lipsync_core::state::{StateEvent, StoreOptions};
use tempfile::TempDir;

/// Engine that panics on one event and succeeds instantly on the rest.
struct PanicsOn(&'static str);

impl AnimationEngine for PanicsOn {
    fn name(&self) -> &str {
        "panics"
    }

    fn run(
        &self,
        request: &AnimationRequest,
        on_progress: &dyn Fn(f64),
        _cancel: &CancelToken,
    ) -> JobResult<AnimationOutput> {
        if request.event_name == self.0 {
            panic!("decoder blew up");
        }
        on_progress(1.0);
        Ok(AnimationOutput::default())
    }
}

fn statuses(events: &[StateEvent], event_name: &str) -> Vec<JobStatus> {
    events
        .iter()
        .filter_map(|event| match event {
            StateEvent::JobChanged(job) if job.event_name == event_name => Some(job.status),
            _ => None,
        })
        .collect()
}

#[test]
fn jobs_run_in_submission_order_one_at_a_time() {
    let dir = TempDir::new().unwrap();
    let (session, engine, sink) = session(true);
    session
        .load_file(&path_str(&common::character(&dir, &["a", "b", "c"])))
        .unwrap();
    let rx = session.subscribe();

    for name in ["a", "b", "c"] {
        assert_eq!(session.submit_job(name).unwrap(), SubmitOutcome::Queued);
    }

    for expected in ["a", "b", "c"] {
        assert_eq!(engine.wait_started(), expected);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.active_job.as_deref(), Some(expected));
        let active = snapshot
            .jobs
            .iter()
            .filter(|job| matches!(job.status, JobStatus::Animating | JobStatus::Canceling))
            .count();
        assert_eq!(active, 1);
        engine.finish();
    }

    let events = collect_until_idle(&rx);
    assert_eq!(sink.written(), vec!["say_a", "say_b", "say_c"]);

    // Replay the published transitions: never two jobs active at once.
    let mut current: HashMap<String, JobStatus> = HashMap::new();
    for event in &events {
        if let StateEvent::JobChanged(job) = event {
            current.insert(job.event_name.clone(), job.status);
            let active = current
                .values()
                .filter(|s| matches!(s, JobStatus::Animating | JobStatus::Canceling))
                .count();
            assert!(active <= 1, "two active jobs after {:?}", event);
        }
    }

    // Each job finished before the next one started.
    let position = |name: &str, status: JobStatus| {
        events
            .iter()
            .position(|e| matches!(e, StateEvent::JobChanged(j) if j.event_name == name && j.status == status))
            .unwrap()
    };
    assert!(position("a", JobStatus::Done) < position("b", JobStatus::Animating));
    assert!(position("b", JobStatus::Done) < position("c", JobStatus::Animating));

    for job in session.snapshot().jobs {
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.progress, None);
    }
}

#[test]
fn submit_is_a_noop_for_queued_and_running_jobs() {
    let dir = TempDir::new().unwrap();
    let (session, engine, _sink) = session(true);
    session
        .load_file(&path_str(&common::character(&dir, &["a", "b"])))
        .unwrap();

    session.submit_job("a").unwrap();
    assert_eq!(engine.wait_started(), "a");
    session.submit_job("b").unwrap();

    assert_eq!(session.submit_job("a").unwrap(), SubmitOutcome::AlreadyActive);
    assert_eq!(session.submit_job("b").unwrap(), SubmitOutcome::AlreadyActive);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.queue, vec!["b".to_string()]);
    assert_eq!(snapshot.job("a").unwrap().status, JobStatus::Animating);
    assert_eq!(snapshot.job("b").unwrap().status, JobStatus::Pending);

    engine.finish();
    assert_eq!(engine.wait_started(), "b");
    engine.finish();
    assert!(session.wait_until_idle(common::TIMEOUT));
    engine.assert_not_started(Duration::from_millis(50));
}

#[test]
fn cancelling_a_pending_job_returns_it_to_not_animated() {
    let dir = TempDir::new().unwrap();
    let (session, engine, sink) = session(true);
    session
        .load_file(&path_str(&common::character(&dir, &["a", "b"])))
        .unwrap();

    session.submit_job("a").unwrap();
    assert_eq!(engine.wait_started(), "a");
    session.submit_job("b").unwrap();

    assert_eq!(session.cancel_job("b").unwrap(), CancelOutcome::Dequeued);
    let b = session.store().job("b").unwrap();
    assert_eq!(b.status, JobStatus::NotAnimated);
    assert!(session.snapshot().queue.is_empty());

    engine.finish();
    assert!(session.wait_until_idle(common::TIMEOUT));
    engine.assert_not_started(Duration::from_millis(50));
    assert_eq!(sink.written(), vec!["say_a"]);
}

#[test]
fn progress_never_goes_backwards() {
    let dir = TempDir::new().unwrap();
    let (session, engine, _sink) = session(true);
    session
        .load_file(&path_str(&common::character(&dir, &["a"])))
        .unwrap();
    let rx = session.subscribe();

    session.submit_job("a").unwrap();
    engine.wait_started();
    engine.progress(0.2);
    engine.progress(0.1);
    engine.progress(0.5);
    engine.progress(f64::NAN);
    engine.progress(0.505);
    engine.progress(2.0);
    engine.finish();

    let events = collect_until_idle(&rx);
    let values: Vec<f64> = events
        .iter()
        .filter_map(|event| match event {
            StateEvent::Progress { value, .. } => Some(*value),
            _ => None,
        })
        .collect();
    assert_eq!(values, vec![0.2, 0.5, 1.0]);

    // The Animating snapshot always carried progress.
    for event in &events {
        if let StateEvent::JobChanged(job) = event {
            assert_eq!(job.status == JobStatus::Animating, job.progress.is_some());
        }
    }
}

#[test]
fn cancelling_a_running_job_never_completes_it() {
    let dir = TempDir::new().unwrap();
    let (session, engine, sink) = session(true);
    session
        .load_file(&path_str(&common::character(&dir, &["a"])))
        .unwrap();
    let rx = session.subscribe();

    session.submit_job("a").unwrap();
    engine.wait_started();
    engine.progress(0.3);
    collect_until(&rx, |e| matches!(e, StateEvent::Progress { .. }));

    assert_eq!(session.cancel_job("a").unwrap(), CancelOutcome::Signalled);
    // The worker may already have observed the first request.
    assert!(matches!(
        session.cancel_job("a").unwrap(),
        CancelOutcome::AlreadyCanceling | CancelOutcome::NotActive
    ));

    let events = collect_until_idle(&rx);
    assert_eq!(
        statuses(&events, "a"),
        vec![JobStatus::Canceling, JobStatus::NotAnimated]
    );
    assert!(!events
        .iter()
        .any(|e| matches!(e, StateEvent::Progress { .. })));

    let job = session.store().job("a").unwrap();
    assert_eq!(job.status, JobStatus::NotAnimated);
    assert_eq!(job.error, None);
    assert!(sink.written().is_empty());
}

#[test]
fn output_arriving_after_cancel_is_discarded() {
    let dir = TempDir::new().unwrap();
    let (session, engine, sink) = session(false);
    session
        .load_file(&path_str(&common::character(&dir, &["a"])))
        .unwrap();
    let rx = session.subscribe();

    session.submit_job("a").unwrap();
    engine.wait_started();
    session.cancel_job("a").unwrap();

    // The engine ignores the token: late progress and output must not land.
    engine.progress(0.9);
    engine.finish();

    let events = collect_until_idle(&rx);
    let after_cancel: Vec<&StateEvent> = events
        .iter()
        .skip_while(|e| !matches!(e, StateEvent::JobChanged(j) if j.status == JobStatus::Canceling))
        .collect();
    assert!(!after_cancel
        .iter()
        .any(|e| matches!(e, StateEvent::Progress { .. })));
    assert!(!statuses(&events, "a").contains(&JobStatus::Done));
    assert_eq!(session.store().job("a").unwrap().status, JobStatus::NotAnimated);
    assert!(sink.written().is_empty());
}

#[test]
fn done_job_can_be_animated_again() {
    let dir = TempDir::new().unwrap();
    let (session, engine, sink) = session(true);
    session
        .load_file(&path_str(&common::character(&dir, &["a"])))
        .unwrap();

    session.submit_job("a").unwrap();
    engine.wait_started();
    engine.finish();
    assert!(session.wait_until_idle(common::TIMEOUT));
    assert_eq!(session.store().job("a").unwrap().status, JobStatus::Done);

    let rx = session.subscribe();
    assert_eq!(session.submit_job("a").unwrap(), SubmitOutcome::Queued);
    engine.wait_started();
    engine.finish();

    let events = collect_until_idle(&rx);
    assert_eq!(
        statuses(&events, "a"),
        vec![JobStatus::Pending, JobStatus::Animating, JobStatus::Done]
    );
    assert_eq!(sink.written(), vec!["say_a", "say_a"]);
}

#[test]
fn failed_job_records_error_and_can_be_retried() {
    let dir = TempDir::new().unwrap();
    let (session, engine, _sink) = session(true);
    session
        .load_file(&path_str(&common::character(&dir, &["a", "b"])))
        .unwrap();

    session.submit_job("a").unwrap();
    session.submit_job("b").unwrap();
    assert_eq!(engine.wait_started(), "a");
    engine.fail("Audio format not supported.");

    // The worker keeps going after a failure.
    assert_eq!(engine.wait_started(), "b");
    engine.finish();
    assert!(session.wait_until_idle(common::TIMEOUT));

    let a = session.store().job("a").unwrap();
    assert_eq!(a.status, JobStatus::NotAnimated);
    assert!(a.error.as_deref().unwrap().contains("Audio format not supported."));
    assert_eq!(session.store().job("b").unwrap().status, JobStatus::Done);

    session.submit_job("a").unwrap();
    assert_eq!(session.store().job("a").unwrap().error, None);
    engine.wait_started();
    engine.finish();
    assert!(session.wait_until_idle(common::TIMEOUT));
    assert_eq!(session.store().job("a").unwrap().status, JobStatus::Done);
}

#[test]
fn cancel_all_clears_queue_and_signals_running_job() {
    let dir = TempDir::new().unwrap();
    let (session, engine, sink) = session(true);
    session
        .load_file(&path_str(&common::character(&dir, &["a", "b", "c"])))
        .unwrap();

    for name in ["a", "b", "c"] {
        session.submit_job(name).unwrap();
    }
    engine.wait_started();

    assert_eq!(session.cancel_all(), 3);
    assert!(session.wait_until_idle(common::TIMEOUT));
    engine.assert_not_started(Duration::from_millis(50));

    for job in session.snapshot().jobs {
        assert_eq!(job.status, JobStatus::NotAnimated);
    }
    assert!(sink.written().is_empty());
}

#[test]
fn drain_shutdown_finishes_queued_work() {
    let dir = TempDir::new().unwrap();
    let (session, engine, sink) = session(true);
    session
        .load_file(&path_str(&common::character(&dir, &["a", "b"])))
        .unwrap();

    session.submit_job("a").unwrap();
    session.submit_job("b").unwrap();
    engine.finish();
    engine.finish();
    session.shutdown(ShutdownMode::Drain);

    assert_eq!(sink.written(), vec!["say_a", "say_b"]);
    assert!(session.submit_job("a").is_err());
}

#[test]
fn dropping_the_session_cancels_running_work() {
    let dir = TempDir::new().unwrap();
    let (session, engine, sink) = session(true);
    session
        .load_file(&path_str(&common::character(&dir, &["a"])))
        .unwrap();
    let store = session.store().clone();

    session.submit_job("a").unwrap();
    engine.wait_started();
    drop(session);

    assert!(!store.is_busy());
    assert_eq!(store.job("a").unwrap().status, JobStatus::NotAnimated);
    assert!(sink.written().is_empty());
}

#[test]
fn panicking_engine_fails_the_job_and_worker_keeps_going() {
    let dir = TempDir::new().unwrap();
    let path = common::character(&dir, &["a", "b"]);
    let sink = Arc::new(RecordingSink::default());
    let session =
        Session::with_parts(Arc::new(PanicsOn("a")), sink.clone(), StoreOptions::default())
            .unwrap();
    session.load_file(&path_str(&path)).unwrap();

    session.submit_job("a").unwrap();
    session.submit_job("b").unwrap();
    assert!(session.wait_until_idle(common::TIMEOUT));

    let a = session.store().job("a").unwrap();
    assert_eq!(a.status, JobStatus::NotAnimated);
    assert!(a.error.as_deref().unwrap().contains("decoder blew up"));
    assert_eq!(session.store().job("b").unwrap().status, JobStatus::Done);
    assert_eq!(sink.written(), vec!["say_b"]);

    // The session is usable again.
    assert!(session.load_file(&path_str(&path)).is_ok());
    session.submit_job("b").unwrap();
    assert!(session.wait_until_idle(common::TIMEOUT));
    assert_eq!(session.store().job("b").unwrap().status, JobStatus::Done);
}

#[test]
fn sink_failure_fails_the_job_and_next_job_runs() {
    let dir = TempDir::new().unwrap();
    let path = common::character(&dir, &["a", "b"]);
    let (engine, control) = scripted_engine(true);
    let sink = Arc::new(RecordingSink::failing_on("say_a"));
    let session = Session::with_parts(engine, sink.clone(), StoreOptions::default()).unwrap();
    session.load_file(&path_str(&path)).unwrap();
    let rx = session.subscribe();

    session.submit_job("a").unwrap();
    session.submit_job("b").unwrap();
    assert_eq!(control.wait_started(), "a");
    control.finish();
    assert_eq!(control.wait_started(), "b");
    control.finish();

    let events = collect_until_idle(&rx);
    assert_eq!(
        statuses(&events, "a"),
        vec![JobStatus::Pending, JobStatus::Animating, JobStatus::NotAnimated]
    );
    let a = session.store().job("a").unwrap();
    assert!(a.error.as_deref().unwrap().contains("Disk full."));
    assert_eq!(session.store().job("b").unwrap().status, JobStatus::Done);
    assert_eq!(sink.written(), vec!["say_b"]);
}
