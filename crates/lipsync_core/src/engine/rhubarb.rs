//! Rhubarb Lip Sync command-line engine.
//!
//! Runs `rhubarb` in machine-readable mode. Progress and the final
//! outcome arrive as JSON lines on stderr; the mouth cues are written to
//! a temporary JSON file. Cancellation kills the child process.

use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tempfile::NamedTempFile;

use super::cancel::CancelToken;
use super::errors::{JobError, JobResult};
use super::types::{AnimationEngine, AnimationOutput, AnimationRequest};
use crate::models::{MouthCue, MouthShape};

/// Default interval between cancellation checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One status line from `rhubarb --machineReadable`.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RhubarbMessage {
    Start,
    Progress {
        value: f64,
    },
    Success,
    Failure {
        #[serde(default)]
        reason: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RhubarbResult {
    mouth_cues: Vec<RhubarbCue>,
}

#[derive(Debug, Deserialize)]
struct RhubarbCue {
    start: f64,
    value: String,
}

/// Engine backed by the rhubarb executable.
#[derive(Debug, Clone)]
pub struct RhubarbEngine {
    /// Custom rhubarb path (None = search PATH).
    binary_path: Option<String>,
    poll_interval: Duration,
}

impl RhubarbEngine {
    /// Create an engine that runs `rhubarb` from PATH.
    pub fn new() -> Self {
        Self {
            binary_path: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set a custom rhubarb path.
    pub fn with_binary_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.binary_path = (!path.trim().is_empty()).then_some(path);
        self
    }

    /// Set how often cancellation is checked while waiting for output.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Get the rhubarb command.
    pub fn binary(&self) -> &str {
        self.binary_path.as_deref().unwrap_or("rhubarb")
    }

    fn build_args(
        &self,
        request: &AnimationRequest,
        output_path: &Path,
        dialog_path: Option<&Path>,
    ) -> Vec<String> {
        let extended: String = request
            .extended_shapes
            .iter()
            .map(MouthShape::as_str)
            .collect();

        let mut args = vec![
            "--machineReadable".to_string(),
            "--exportFormat".to_string(),
            "json".to_string(),
            "--extendedShapes".to_string(),
            extended,
            "--output".to_string(),
            output_path.display().to_string(),
        ];
        if let Some(dialog) = dialog_path {
            args.push("--dialogFile".to_string());
            args.push(dialog.display().to_string());
        }
        args.push(request.audio_file_path.display().to_string());
        args
    }

    fn spawn(&self, args: &[String]) -> JobResult<Child> {
        tracing::debug!("Running: {} {}", self.binary(), args.join(" "));
        Command::new(self.binary())
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| JobError::failed(format!("Failed to run {}: {}", self.binary(), e)))
    }
}

impl Default for RhubarbEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationEngine for RhubarbEngine {
    fn name(&self) -> &str {
        "rhubarb"
    }

    fn run(
        &self,
        request: &AnimationRequest,
        on_progress: &dyn Fn(f64),
        cancel: &CancelToken,
    ) -> JobResult<AnimationOutput> {
        if cancel.is_cancelled() {
            return Err(JobError::Cancelled);
        }
        if !request.audio_file_path.is_file() {
            return Err(JobError::failed(format!(
                "File '{}' does not exist.",
                request.audio_file_path.display()
            )));
        }

        let dialog_file = request
            .dialog
            .as_deref()
            .map(write_temp_text)
            .transpose()?;
        let output_file = NamedTempFile::new()
            .map_err(|e| JobError::failed(format!("Failed to create output file: {}", e)))?;

        let args = self.build_args(
            request,
            output_file.path(),
            dialog_file.as_ref().map(NamedTempFile::path),
        );
        let mut child = self.spawn(&args)?;

        let Some(stderr) = child.stderr.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(JobError::failed("Rhubarb stderr was not captured."));
        };

        let (tx, rx) = mpsc::channel();
        let reader = thread::spawn(move || {
            for line in BufReader::new(stderr).lines() {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        let outcome = pump_messages(&rx, self.poll_interval, on_progress, cancel);
        if outcome.is_err() {
            let _ = child.kill();
        }
        let _ = child.wait();
        drop(rx);
        let _ = reader.join();

        outcome?;
        let content = fs::read_to_string(output_file.path())
            .map_err(|e| JobError::failed(format!("Failed to read rhubarb output: {}", e)))?;
        parse_result(&content)
    }
}

/// Relay status lines until rhubarb reports success or failure.
fn pump_messages(
    rx: &Receiver<io::Result<String>>,
    poll_interval: Duration,
    on_progress: &dyn Fn(f64),
    cancel: &CancelToken,
) -> JobResult<()> {
    loop {
        if cancel.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        let line = match rx.recv_timeout(poll_interval) {
            Ok(Ok(line)) => line,
            Ok(Err(e)) => {
                return Err(JobError::failed(format!("Failed to read rhubarb status: {}", e)))
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                return Err(JobError::failed("Rhubarb terminated unexpectedly."))
            }
        };

        match serde_json::from_str::<RhubarbMessage>(&line) {
            Ok(RhubarbMessage::Progress { value }) => on_progress(value),
            Ok(RhubarbMessage::Success) => {
                on_progress(1.0);
                return Ok(());
            }
            Ok(RhubarbMessage::Failure { reason }) => {
                return Err(JobError::failed(
                    reason.unwrap_or_else(|| "Rhubarb failed without reason.".to_string()),
                ))
            }
            Ok(RhubarbMessage::Start | RhubarbMessage::Other) => {}
            Err(_) => tracing::debug!("rhubarb: {}", line),
        }
    }
}

fn parse_result(content: &str) -> JobResult<AnimationOutput> {
    let result: RhubarbResult = serde_json::from_str(content)
        .map_err(|e| JobError::failed(format!("Invalid rhubarb output: {}", e)))?;

    let cues = result
        .mouth_cues
        .into_iter()
        .map(|cue| {
            MouthShape::from_letter(&cue.value)
                .map(|shape| MouthCue::new(cue.start, shape))
                .ok_or_else(|| {
                    JobError::failed(format!("Unknown mouth shape '{}' in rhubarb output", cue.value))
                })
        })
        .collect::<JobResult<Vec<_>>>()?;

    Ok(AnimationOutput { cues })
}

fn write_temp_text(text: &str) -> JobResult<NamedTempFile> {
    let mut file = NamedTempFile::new()
        .map_err(|e| JobError::failed(format!("Failed to create dialog file: {}", e)))?;
    file.write_all(text.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| JobError::failed(format!("Failed to write dialog file: {}", e)))?;
    Ok(file)
}
