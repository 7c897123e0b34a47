//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::jobs::{AnimationNaming, DEFAULT_ANIMATION_PREFIX};
use crate::logging::LogLevel;
use crate::state::{StoreOptions, DEFAULT_PROGRESS_MIN_DELTA};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Animation naming.
    #[serde(default)]
    pub naming: NamingSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Job scheduling.
    #[serde(default)]
    pub scheduler: SchedulerSettings,

    /// Lip-sync engine.
    #[serde(default)]
    pub engine: EngineSettings,
}

impl Settings {
    /// Store options derived from these settings.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            progress_min_delta: self.scheduler.progress_min_delta,
            naming: self.naming.to_naming(),
        }
    }
}

/// Paths to tools, files and folders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Rhubarb executable; empty means look it up on `PATH`.
    #[serde(default)]
    pub rhubarb_binary: String,

    /// Last character file that was opened.
    #[serde(default)]
    pub last_file: String,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            rhubarb_binary: String::new(),
            last_file: String::new(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Naming of generated animations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingSettings {
    #[serde(default = "default_animation_prefix")]
    pub animation_prefix: String,

    #[serde(default)]
    pub animation_suffix: String,
}

fn default_animation_prefix() -> String {
    DEFAULT_ANIMATION_PREFIX.to_string()
}

impl NamingSettings {
    pub fn to_naming(&self) -> AnimationNaming {
        AnimationNaming::new(&self.animation_prefix, &self.animation_suffix)
    }
}

impl Default for NamingSettings {
    fn default() -> Self {
        Self {
            animation_prefix: default_animation_prefix(),
            animation_suffix: String::new(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is not set.
    #[serde(default)]
    pub level: LogLevel,

    /// Also write a daily log file into the logs folder.
    #[serde(default)]
    pub log_to_file: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            log_to_file: false,
        }
    }
}

/// Job scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Minimum progress step between published progress events.
    #[serde(default = "default_progress_min_delta")]
    pub progress_min_delta: f64,
}

fn default_progress_min_delta() -> f64 {
    DEFAULT_PROGRESS_MIN_DELTA
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            progress_min_delta: default_progress_min_delta(),
        }
    }
}

/// Lip-sync engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// How often a running engine checks for cancellation, in milliseconds.
    #[serde(default = "default_cancel_poll_ms")]
    pub cancel_poll_ms: u64,
}

fn default_cancel_poll_ms() -> u64 {
    50
}

impl EngineSettings {
    pub fn cancel_poll_interval(&self) -> Duration {
        Duration::from_millis(self.cancel_poll_ms.max(1))
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cancel_poll_ms: default_cancel_poll_ms(),
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Naming,
    Logging,
    Scheduler,
    Engine,
}

impl ConfigSection {
    /// All sections, in file order.
    pub fn all() -> &'static [ConfigSection] {
        &[
            ConfigSection::Paths,
            ConfigSection::Naming,
            ConfigSection::Logging,
            ConfigSection::Scheduler,
            ConfigSection::Engine,
        ]
    }

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Naming => "naming",
            ConfigSection::Logging => "logging",
            ConfigSection::Scheduler => "scheduler",
            ConfigSection::Engine => "engine",
        }
    }

    /// Comment written above the section.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Tools, files and folders",
            ConfigSection::Naming => "Names of generated animations",
            ConfigSection::Logging => "Logging configuration",
            ConfigSection::Scheduler => "Job scheduling",
            ConfigSection::Engine => "Lip-sync engine",
        }
    }
}
