//! Mouth shapes and the naming conventions that map them to attachments.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A Rhubarb mouth shape.
///
/// `A`–`F` are the basic shapes every character must provide. `G`, `H`
/// and `X` are optional extended shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MouthShape {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    X,
}

impl MouthShape {
    /// All shapes in canonical order.
    pub fn all() -> &'static [MouthShape] {
        &[
            Self::A,
            Self::B,
            Self::C,
            Self::D,
            Self::E,
            Self::F,
            Self::G,
            Self::H,
            Self::X,
        ]
    }

    /// Shapes a character must provide.
    pub fn basic() -> &'static [MouthShape] {
        &[Self::A, Self::B, Self::C, Self::D, Self::E, Self::F]
    }

    /// Whether this is one of the optional extended shapes.
    pub fn is_extended(&self) -> bool {
        matches!(self, Self::G | Self::H | Self::X)
    }

    /// Single-letter name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
            Self::G => "G",
            Self::H => "H",
            Self::X => "X",
        }
    }

    /// Parse a shape letter as emitted by rhubarb (`"A"`, `"X"`, ...).
    pub fn from_letter(value: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|shape| shape.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for MouthShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Letter casing used for the shape part of attachment names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MouthShapeCasing {
    #[default]
    Upper,
    Lower,
}

impl MouthShapeCasing {
    /// Guess the casing from the shape part of one attachment name.
    fn guess(shape_name: &str) -> Self {
        match shape_name.trim().chars().next() {
            Some(c) if !c.is_lowercase() => Self::Upper,
            _ => Self::Lower,
        }
    }
}

/// Naming convention mapping mouth shapes to slot attachment names.
///
/// An attachment name is `prefix + shape + suffix`, with the shape letter
/// in the given casing (`mouth_A`, `mouth-a-open`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MouthNaming {
    pub prefix: String,
    pub suffix: String,
    pub casing: MouthShapeCasing,
}

impl MouthNaming {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>, casing: MouthShapeCasing) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            casing,
        }
    }

    /// Infer the naming convention from the attachment names of a slot.
    ///
    /// The prefix and suffix are the parts common to all names; the
    /// casing is taken from whatever is left of the first name.
    pub fn guess(names: &[String]) -> Self {
        let Some(first) = names.first() else {
            return Self::new("", "", MouthShapeCasing::guess(""));
        };

        let prefix = common_prefix(names);
        let suffix = common_suffix(names);
        if prefix.len() + suffix.len() >= first.len() {
            return Self::new(prefix, "", MouthShapeCasing::guess(""));
        }

        let shape_name = &first[prefix.len()..first.len() - suffix.len()];
        let casing = MouthShapeCasing::guess(shape_name);
        Self::new(prefix, suffix, casing)
    }

    /// Attachment name for a shape under this convention.
    pub fn name_for(&self, shape: MouthShape) -> String {
        let letter = match self.casing {
            MouthShapeCasing::Upper => shape.as_str().to_uppercase(),
            MouthShapeCasing::Lower => shape.as_str().to_lowercase(),
        };
        format!("{}{}{}", self.prefix, letter, self.suffix)
    }

    /// Human-readable description, e.g. `"mouth_<UPPER-CASE SHAPE NAME>"`.
    pub fn display_string(&self) -> String {
        let placeholder = match self.casing {
            MouthShapeCasing::Upper => "<UPPER-CASE SHAPE NAME>",
            MouthShapeCasing::Lower => "<lower-case shape name>",
        };
        format!("\"{}{}{}\"", self.prefix, placeholder, self.suffix)
    }
}

fn common_prefix(names: &[String]) -> String {
    let Some(first) = names.first() else {
        return String::new();
    };
    let mut len = first.len();
    for name in &names[1..] {
        len = first
            .char_indices()
            .zip(name.chars())
            .take_while(|((_, a), b)| a == b)
            .map(|((i, a), _)| i + a.len_utf8())
            .last()
            .unwrap_or(0)
            .min(len);
    }
    first[..len].to_string()
}

fn common_suffix(names: &[String]) -> String {
    let Some(first) = names.first() else {
        return String::new();
    };
    let mut start = 0;
    for name in &names[1..] {
        let matched: usize = first
            .chars()
            .rev()
            .zip(name.chars().rev())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a.len_utf8())
            .sum();
        start = start.max(first.len() - matched);
    }
    first[start..].to_string()
}

/// A mouth shape starting at a point in time (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouthCue {
    pub time: f64,
    pub shape: MouthShape,
}

impl MouthCue {
    pub fn new(time: f64, shape: MouthShape) -> Self {
        Self { time, shape }
    }
}
