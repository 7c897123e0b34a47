//! Shared fixtures: a scripted engine, a recording sink, and character files.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lipsync_core::engine::{
    AnimationEngine, AnimationOutput, AnimationRequest, AnimationSink, CancelToken, JobError,
    JobResult,
};
use lipsync_core::models::{MouthCue, MouthShape};
use lipsync_core::session::Session;
use lipsync_core::state::{StateEvent, StoreOptions};
use parking_lot::Mutex;
use tempfile::TempDir;

pub const TIMEOUT: Duration = Duration::from_secs(10);

/// What the scripted engine does next.
#[derive(Debug, Clone)]
pub enum Step {
    Progress(f64),
    Finish,
    Fail(String),
}

/// Engine whose every move is dictated by the test.
pub struct ScriptedEngine {
    steps: Mutex<Receiver<Step>>,
    started: Mutex<Sender<String>>,
    honor_cancel: bool,
}

/// Test-side handle to a [`ScriptedEngine`].
pub struct EngineControl {
    steps: Sender<Step>,
    started: Receiver<String>,
}

/// An engine that stops as soon as it sees cancellation, or one that
/// ignores it and keeps following the script.
pub fn scripted_engine(honor_cancel: bool) -> (Arc<ScriptedEngine>, EngineControl) {
    let (steps_tx, steps_rx) = mpsc::channel();
    let (started_tx, started_rx) = mpsc::channel();
    let engine = ScriptedEngine {
        steps: Mutex::new(steps_rx),
        started: Mutex::new(started_tx),
        honor_cancel,
    };
    let control = EngineControl {
        steps: steps_tx,
        started: started_rx,
    };
    (Arc::new(engine), control)
}

impl AnimationEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn run(
        &self,
        request: &AnimationRequest,
        on_progress: &dyn Fn(f64),
        cancel: &CancelToken,
    ) -> JobResult<AnimationOutput> {
        let _ = self.started.lock().send(request.event_name.clone());
        let steps = self.steps.lock();
        loop {
            if self.honor_cancel && cancel.is_cancelled() {
                return Err(JobError::Cancelled);
            }
            match steps.recv_timeout(Duration::from_millis(5)) {
                Ok(Step::Progress(value)) => on_progress(value),
                Ok(Step::Finish) => {
                    return Ok(AnimationOutput {
                        cues: vec![
                            MouthCue::new(0.0, MouthShape::X),
                            MouthCue::new(0.1, MouthShape::B),
                            MouthCue::new(0.4, MouthShape::X),
                        ],
                    })
                }
                Ok(Step::Fail(message)) => return Err(JobError::failed(message)),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Err(JobError::Cancelled),
            }
        }
    }
}

impl EngineControl {
    pub fn progress(&self, value: f64) {
        self.steps.send(Step::Progress(value)).unwrap();
    }

    pub fn finish(&self) {
        self.steps.send(Step::Finish).unwrap();
    }

    pub fn fail(&self, message: &str) {
        self.steps.send(Step::Fail(message.to_string())).unwrap();
    }

    /// Wait for the engine to be handed the next job.
    pub fn wait_started(&self) -> String {
        self.started
            .recv_timeout(TIMEOUT)
            .expect("no job was started")
    }

    /// Assert that no further job is started within `window`.
    pub fn assert_not_started(&self, window: Duration) {
        if let Ok(name) = self.started.recv_timeout(window) {
            panic!("job '{}' started unexpectedly", name);
        }
    }
}

/// Sink that records which animations were written.
#[derive(Default)]
pub struct RecordingSink {
    written: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl RecordingSink {
    /// Sink that refuses to write the given animation.
    pub fn failing_on(animation_name: &str) -> Self {
        Self {
            written: Mutex::default(),
            fail_on: Some(animation_name.to_string()),
        }
    }

    pub fn written(&self) -> Vec<String> {
        self.written.lock().clone()
    }
}

impl AnimationSink for RecordingSink {
    fn write(&self, request: &AnimationRequest, _output: &AnimationOutput) -> JobResult<()> {
        if self.fail_on.as_deref() == Some(request.animation_name.as_str()) {
            return Err(JobError::failed("Disk full."));
        }
        self.written.lock().push(request.animation_name.clone());
        Ok(())
    }
}

/// Character file with a complete mouth slot and one audio event per name.
pub fn character(dir: &TempDir, events: &[&str]) -> PathBuf {
    let root = dir.path();
    fs::create_dir_all(root.join("images")).unwrap();
    fs::create_dir_all(root.join("audio")).unwrap();

    let mut event_json = Vec::new();
    for name in events {
        fs::write(root.join("audio").join(format!("{}.wav", name)), b"RIFF").unwrap();
        event_json.push(format!(
            r#""{name}": {{ "audio": "{name}.wav", "string": "Line {name}" }}"#
        ));
    }

    let json = format!(
        r#"{{
  "skeleton": {{ "hash": "x", "spine": "3.8.99", "fps": 30, "images": "./images/", "audio": "./audio/" }},
  "bones": [ {{ "name": "root" }} ],
  "slots": [
    {{ "name": "body", "bone": "root", "attachment": "body" }},
    {{ "name": "mouth", "bone": "root", "attachment": "mouth_x" }}
  ],
  "skins": [ {{ "name": "default", "attachments": {{
    "body": {{ "body": {{}} }},
    "mouth": {{
      "mouth_a": {{}}, "mouth_b": {{}}, "mouth_c": {{}}, "mouth_d": {{}},
      "mouth_e": {{}}, "mouth_f": {{}}, "mouth_g": {{}}, "mouth_x": {{}}
    }}
  }} }} ],
  "events": {{ {events} }},
  "animations": {{}}
}}"#,
        events = event_json.join(", ")
    );

    let path = root.join("character.json");
    fs::write(&path, json).unwrap();
    path
}

/// Session driven by a scripted engine and a recording sink.
pub fn session(honor_cancel: bool) -> (Session, EngineControl, Arc<RecordingSink>) {
    let (engine, control) = scripted_engine(honor_cancel);
    let sink = Arc::new(RecordingSink::default());
    let session = Session::with_parts(engine, sink.clone(), StoreOptions::default())
        .expect("worker thread starts");
    (session, control, sink)
}

pub fn path_str(path: &Path) -> String {
    path.display().to_string()
}

/// Receive events until one matches, returning every event seen.
pub fn collect_until(
    rx: &Receiver<StateEvent>,
    mut done: impl FnMut(&StateEvent) -> bool,
) -> Vec<StateEvent> {
    let deadline = Instant::now() + TIMEOUT;
    let mut seen = Vec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let event = rx
            .recv_timeout(remaining)
            .unwrap_or_else(|_| panic!("timed out; events so far: {:?}", seen));
        let finished = done(&event);
        seen.push(event);
        if finished {
            return seen;
        }
    }
}

/// Receive events until the session reports it is idle.
pub fn collect_until_idle(rx: &Receiver<StateEvent>) -> Vec<StateEvent> {
    collect_until(rx, |event| *event == StateEvent::BusyChanged(false))
}
