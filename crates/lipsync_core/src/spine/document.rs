//! Parsed Spine skeleton file.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};

use super::error::{SpineError, SpineResult};
use crate::models::{MouthCue, MouthNaming};
use crate::source::{LoadError, LoadResult};

/// Frame rate assumed when the skeleton does not declare `fps`.
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// An event in the skeleton that references an audio file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioEvent {
    /// Event name (key in the `events` table).
    pub name: String,
    /// Audio path relative to the skeleton's audio directory.
    pub relative_audio_path: String,
    /// Dialog text stored in the event's `string` property.
    pub dialog: Option<String>,
}

/// A Spine skeleton JSON document.
///
/// Structural checks run once in `parse`; the query methods afterwards
/// assume a well-formed skeleton.
#[derive(Debug, Clone)]
pub struct SpineDocument {
    path: PathBuf,
    json: Map<String, Value>,
}

impl SpineDocument {
    /// Read and parse a skeleton file.
    pub fn open(path: &Path) -> LoadResult<Self> {
        if !path.is_file() {
            return Err(LoadError::not_found(
                path,
                format!("File '{}' does not exist.", path.display()),
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| LoadError::parse(e.to_string()))?;
        Self::parse(path, &content)
    }

    /// Parse skeleton JSON that was read from `path`.
    ///
    /// `path` is only used to resolve the images and audio directories.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> LoadResult<Self> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| LoadError::parse(e.to_string()))?;
        let Value::Object(json) = value else {
            return Err(LoadError::schema("JSON file is corrupted."));
        };

        let document = Self {
            path: path.into(),
            json,
        };
        document.validate()?;
        Ok(document)
    }

    fn validate(&self) -> LoadResult<()> {
        self.skeleton()?;
        self.images_dir()?;
        self.audio_dir()?;
        self.slots()?;
        self.audio_events()?;
        Ok(())
    }

    /// Path the document was loaded from (and is saved to).
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn base_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn skeleton(&self) -> LoadResult<&Map<String, Value>> {
        self.json
            .get("skeleton")
            .and_then(Value::as_object)
            .ok_or_else(|| LoadError::schema("JSON file is corrupted."))
    }

    fn skeleton_dir(&self, key: &str, what: &str) -> LoadResult<PathBuf> {
        let relative = self
            .skeleton()?
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                LoadError::schema(format!(
                    "JSON file is incomplete: {} path is missing. \
                     Make sure to check 'Nonessential data' when exporting.",
                    what
                ))
            })?;

        let dir = normalize(&self.base_dir().join(relative));
        if !dir.is_dir() {
            return Err(LoadError::schema(format!(
                "Could not find {} directory relative to the JSON file. \
                 Make sure the JSON file is in the same directory as the original Spine file.",
                what.to_lowercase()
            )));
        }
        Ok(dir)
    }

    /// Images directory (`skeleton.images`), resolved against the file.
    pub fn images_dir(&self) -> LoadResult<PathBuf> {
        self.skeleton_dir("images", "Images")
    }

    /// Audio directory (`skeleton.audio`), resolved against the file.
    pub fn audio_dir(&self) -> LoadResult<PathBuf> {
        self.skeleton_dir("audio", "Audio")
    }

    /// Skeleton frame rate (`skeleton.fps`).
    pub fn frame_rate(&self) -> f64 {
        self.skeleton()
            .ok()
            .and_then(|s| s.get("fps"))
            .and_then(Value::as_f64)
            .filter(|fps| *fps > 0.0)
            .unwrap_or(DEFAULT_FRAME_RATE)
    }

    /// Slot names in declaration order.
    pub fn slots(&self) -> LoadResult<Vec<String>> {
        let Some(slots) = self.json.get("slots") else {
            return Ok(Vec::new());
        };
        let slots = slots
            .as_array()
            .ok_or_else(|| LoadError::schema("Invalid slot list found."))?;

        slots
            .iter()
            .map(|slot| {
                slot.get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| LoadError::schema("Invalid slot found."))
            })
            .collect()
    }

    /// Events that carry an `audio` property.
    pub fn audio_events(&self) -> LoadResult<Vec<AudioEvent>> {
        let Some(events) = self.json.get("events") else {
            return Ok(Vec::new());
        };
        let events = events
            .as_object()
            .ok_or_else(|| LoadError::schema("Invalid event list found."))?;

        let mut result = Vec::new();
        for (name, value) in events {
            let event = value
                .as_object()
                .ok_or_else(|| LoadError::schema(format!("Invalid event '{}' found.", name)))?;
            let Some(audio) = event.get("audio").and_then(Value::as_str) else {
                continue;
            };
            result.push(AudioEvent {
                name: name.clone(),
                relative_audio_path: audio.to_string(),
                dialog: event
                    .get("string")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }
        Ok(result)
    }

    /// Attachment names of a slot across all skins, without duplicates.
    ///
    /// Handles both the object-form skins of Spine 3.7 and the array-form
    /// skins of Spine 3.8+.
    pub fn slot_attachment_names(&self, slot: &str) -> Vec<String> {
        let skins: Vec<&Map<String, Value>> = match self.json.get("skins") {
            Some(Value::Object(skins)) => skins.values().filter_map(Value::as_object).collect(),
            Some(Value::Array(skins)) => skins
                .iter()
                .filter_map(|skin| skin.get("attachments").and_then(Value::as_object))
                .collect(),
            _ => Vec::new(),
        };

        let mut names: Vec<String> = Vec::new();
        for skin in skins {
            let Some(attachments) = skin.get(slot).and_then(Value::as_object) else {
                continue;
            };
            for name in attachments.keys() {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    /// Names of the animations already in the file.
    pub fn animation_names(&self) -> Vec<String> {
        self.json
            .get("animations")
            .and_then(Value::as_object)
            .map(|animations| animations.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Insert or replace a lip-sync animation.
    ///
    /// Cue times are floored to whole frames. The animation also keys the
    /// audio event at time zero so Spine plays the sound with it.
    pub fn write_animation(
        &mut self,
        animation_name: &str,
        event_name: &str,
        mouth_slot: &str,
        naming: &MouthNaming,
        cues: &[MouthCue],
    ) {
        let frame_duration = 1.0 / self.frame_rate();
        let keys: Vec<Value> = cues
            .iter()
            .map(|cue| {
                let frame = (cue.time / frame_duration).floor().max(0.0);
                json!({
                    "time": round_time(frame * frame_duration),
                    "name": naming.name_for(cue.shape),
                })
            })
            .collect();

        let mut slots = Map::new();
        slots.insert(mouth_slot.to_string(), json!({ "attachment": keys }));

        let animation = json!({
            "slots": Value::Object(slots),
            "events": [
                { "time": 0.0, "name": event_name, "string": "" }
            ],
        });

        let animations = self
            .json
            .entry("animations")
            .or_insert_with(|| Value::Object(Map::new()));
        if !animations.is_object() {
            *animations = Value::Object(Map::new());
        }
        if let Value::Object(animations) = animations {
            animations.insert(animation_name.to_string(), animation);
        }
    }

    /// Serialize with Spine-style pretty printing.
    pub fn to_pretty_string(&self) -> SpineResult<String> {
        Ok(serde_json::to_string_pretty(&self.json)?)
    }

    /// Write the document back to its file atomically.
    pub fn save(&self) -> SpineResult<()> {
        let mut content = self.to_pretty_string()?;
        content.push('\n');

        // Write atomically via temp file
        let temp_file = self.path.with_extension("json.tmp");
        fs::write(&temp_file, &content)
            .map_err(|e| SpineError::io("writing", &temp_file, e))?;
        fs::rename(&temp_file, &self.path)
            .map_err(|e| SpineError::io("replacing", &self.path, e))?;

        tracing::debug!("Saved Spine JSON to {}", self.path.display());
        Ok(())
    }
}

/// Lexically normalize `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push("..");
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    if result.as_os_str().is_empty() {
        result.push(".");
    }
    result
}

fn round_time(seconds: f64) -> f64 {
    (seconds * 1_000_000.0).round() / 1_000_000.0
}
