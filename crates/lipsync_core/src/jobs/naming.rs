//! Animation naming around event names.

use serde::{Deserialize, Serialize};

/// Default prefix for generated animations.
pub const DEFAULT_ANIMATION_PREFIX: &str = "say_";

/// Prefix and suffix that turn an event name into an animation name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationNaming {
    pub prefix: String,
    pub suffix: String,
}

impl AnimationNaming {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Animation name for an event.
    pub fn animation_name(&self, event_name: &str) -> String {
        format!("{}{}{}", self.prefix, event_name, self.suffix)
    }
}

impl Default for AnimationNaming {
    fn default() -> Self {
        Self::new(DEFAULT_ANIMATION_PREFIX, "")
    }
}
