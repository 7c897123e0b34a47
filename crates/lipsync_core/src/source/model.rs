//! Validated character file model.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::errors::{LoadError, LoadResult};
use crate::models::{MouthNaming, MouthShape};
use crate::spine::{AudioEvent, SpineDocument};

static NEXT_LOAD_ID: AtomicU64 = AtomicU64::new(1);

/// Turn path text as typed or pasted by a user into a path.
///
/// Surrounding whitespace and double quotes (as added by "copy as path"
/// on some platforms) are removed. Blank input is reported as not found.
pub fn parse_path_input(input: &str) -> LoadResult<PathBuf> {
    let trimmed = input.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim();

    if unquoted.is_empty() {
        return Err(LoadError::not_found("", "No input file specified."));
    }
    Ok(PathBuf::from(unquoted))
}

/// Loaded character file with everything derived from it.
///
/// Instances are never mutated. Selecting another slot produces a new
/// model, so a reader holding an `Arc<SourceFileModel>` always sees one
/// consistent set of fields.
#[derive(Debug, Clone)]
pub struct SourceFileModel {
    load_id: u64,
    path: PathBuf,
    document: SpineDocument,
    slots: Vec<String>,
    selected_slot: Option<String>,
    mouth_naming: Option<MouthNaming>,
    mouth_shapes: Vec<MouthShape>,
    slot_error: Option<String>,
    shapes_error: Option<String>,
    audio_dir: PathBuf,
    audio_events: Vec<AudioEvent>,
}

impl SourceFileModel {
    /// Load and validate a character file.
    ///
    /// The initial slot is the first one whose name mentions "mouth",
    /// falling back to the first slot.
    pub fn load(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoadError::not_found(path, "File does not exist."));
        }

        let document = SpineDocument::open(path)?;
        let slots = document.slots()?;
        let audio_dir = document.audio_dir()?;
        let audio_events = document.audio_events()?;
        let initial_slot = guess_mouth_slot(&slots);

        let model = Self {
            load_id: NEXT_LOAD_ID.fetch_add(1, Ordering::Relaxed),
            path: path.to_path_buf(),
            document,
            slots,
            selected_slot: None,
            mouth_naming: None,
            mouth_shapes: Vec::new(),
            slot_error: None,
            shapes_error: None,
            audio_dir,
            audio_events,
        }
        .with_selection(initial_slot);

        tracing::info!(
            "Loaded '{}': {} slots, {} audio events, valid={}",
            model.path.display(),
            model.slots.len(),
            model.audio_events.len(),
            model.is_valid()
        );
        Ok(model)
    }

    /// Model with a different mouth slot selected.
    ///
    /// Unknown names are accepted and reported through `slot_error`.
    pub fn select_slot(&self, name: &str) -> Self {
        self.clone().with_selection(Some(name.to_string()))
    }

    fn with_selection(mut self, slot: Option<String>) -> Self {
        let known_slot = slot.as_ref().filter(|s| self.slots.contains(s));
        let attachments = known_slot
            .map(|s| self.document.slot_attachment_names(s))
            .unwrap_or_default();

        let naming = MouthNaming::guess(&attachments);
        let shapes: Vec<MouthShape> = MouthShape::all()
            .iter()
            .copied()
            .filter(|shape| attachments.contains(&naming.name_for(*shape)))
            .collect();

        self.slot_error = if self.slots.is_empty() {
            Some("No slots found.".to_string())
        } else {
            match &slot {
                None => Some("No mouth slot selected.".to_string()),
                Some(name) if known_slot.is_none() => {
                    Some(format!("Slot '{}' does not exist.", name))
                }
                Some(_) => None,
            }
        };
        self.shapes_error = shapes_error(&shapes);
        self.mouth_naming = (!attachments.is_empty()).then_some(naming);
        self.mouth_shapes = shapes;
        self.selected_slot = slot;
        self
    }

    /// Identifies one load from disk; kept across slot selection.
    pub fn load_id(&self) -> u64 {
        self.load_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &SpineDocument {
        &self.document
    }

    /// Slot names in file order.
    pub fn slots(&self) -> &[String] {
        &self.slots
    }

    pub fn selected_slot(&self) -> Option<&str> {
        self.selected_slot.as_deref()
    }

    /// Naming guessed from the selected slot, `None` when unknown.
    pub fn mouth_naming(&self) -> Option<&MouthNaming> {
        self.mouth_naming.as_ref()
    }

    /// Text shown for the naming field.
    pub fn mouth_naming_display(&self) -> String {
        self.mouth_naming
            .as_ref()
            .map(MouthNaming::display_string)
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn mouth_shapes(&self) -> &[MouthShape] {
        &self.mouth_shapes
    }

    /// Extended shapes (`G`, `H`, `X`) the character provides.
    pub fn extended_shapes(&self) -> Vec<MouthShape> {
        self.mouth_shapes
            .iter()
            .copied()
            .filter(MouthShape::is_extended)
            .collect()
    }

    /// Text shown for the shapes field.
    pub fn mouth_shapes_display(&self) -> String {
        if self.mouth_shapes.is_empty() {
            "none".to_string()
        } else {
            self.mouth_shapes
                .iter()
                .map(MouthShape::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        }
    }

    pub fn slot_error(&self) -> Option<&str> {
        self.slot_error.as_deref()
    }

    pub fn shapes_error(&self) -> Option<&str> {
        self.shapes_error.as_deref()
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    pub fn audio_events(&self) -> &[AudioEvent] {
        &self.audio_events
    }

    /// Resolved audio file of an event, `None` if the file is missing.
    pub fn audio_file_path(&self, event: &AudioEvent) -> Option<PathBuf> {
        let path = self.audio_dir.join(&event.relative_audio_path);
        path.is_file().then_some(path)
    }

    /// Whether animations can be generated for this file.
    pub fn is_valid(&self) -> bool {
        self.slot_error.is_none() && self.shapes_error.is_none()
    }
}

fn guess_mouth_slot(slots: &[String]) -> Option<String> {
    slots
        .iter()
        .find(|slot| slot.to_lowercase().contains("mouth"))
        .or_else(|| slots.first())
        .cloned()
}

fn shapes_error(shapes: &[MouthShape]) -> Option<String> {
    if shapes.is_empty() {
        return Some("No mouth shapes found.".to_string());
    }
    let missing: Vec<&str> = MouthShape::basic()
        .iter()
        .filter(|shape| !shapes.contains(shape))
        .map(MouthShape::as_str)
        .collect();
    if missing.is_empty() {
        None
    } else {
        Some(format!("Mouth shapes {} are missing.", missing.join(", ")))
    }
}
