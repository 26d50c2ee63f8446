//! Configuration Module
//!
//! Configuration loading for the updater service.

mod settings;

pub use settings::{
    ConfigError, DEFAULT_INTERVAL, DEFAULT_LIMIT, IntervalSettings, MAX_LIMIT, ServerSettings,
    UpdaterConfig,
};
