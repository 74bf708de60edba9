//! Configuration module for nlsql.
//!
//! Handles the settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, AiSettings, CostSettings, EngineSettings, HybridSettings, Settings,
    SettingsError, SettingsResult, CONFIG_ENV,
};
