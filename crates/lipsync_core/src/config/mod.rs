//! Configuration management for the lip-sync tools.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use lipsync_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/settings.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Prefix: {}", config.settings().naming.animation_prefix);
//!
//! config.settings_mut().naming.animation_prefix = "talk_".to_string();
//! config.update_section(ConfigSection::Naming).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, EngineSettings, LoggingSettings, NamingSettings, PathSettings,
    SchedulerSettings, Settings,
};
