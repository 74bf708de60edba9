//! TOML-based configuration for nlsql.
//!
//! Supports a config file (nlsql.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! enabled = true
//! strategy = "hybrid"
//!
//! [engine]
//! max_depth = 5
//!
//! [hybrid]
//! threshold = 0.7
//!
//! [ai]
//! provider = "openai"
//! api_key = "${OPENAI_API_KEY}"
//! model = "gpt-4o-mini"
//! max_tokens = 1000
//! temperature = 0.2
//! timeout_seconds = 30
//!
//! [cost]
//! warn_threshold = 0.10
//! max_per_request = 0.50
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ai::cost::{DEFAULT_MAX_PER_REQUEST, DEFAULT_WARN_THRESHOLD};
use crate::ai::ProviderConfig;
use crate::graph::DEFAULT_MAX_DEPTH;
use crate::orchestrator::{Strategy, DEFAULT_THRESHOLD};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "NLSQL_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Master switch for translation.
    pub enabled: bool,

    /// Strategy used when a request does not name one.
    pub strategy: Strategy,

    pub engine: EngineSettings,

    pub hybrid: HybridSettings,

    /// Remote generator configuration.
    pub ai: AiSettings,

    /// Spend guard for remote calls.
    pub cost: CostSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy: Strategy::default(),
            engine: EngineSettings::default(),
            hybrid: HybridSettings::default(),
            ai: AiSettings::default(),
            cost: CostSettings::default(),
        }
    }
}

/// Local engine settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Maximum relation hops when searching for join paths.
    pub max_depth: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HybridSettings {
    /// Local results at or above this confidence skip the remote call.
    pub threshold: f64,
}

impl Default for HybridSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Remote generator settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AiSettings {
    /// openai, anthropic, mistral, grok or gemini. Unset disables remote
    /// generation.
    pub provider: Option<String>,

    /// API key (supports ${ENV_VAR} expansion). Falls back to the provider's
    /// conventional variable, e.g. `OPENAI_API_KEY`.
    pub api_key: Option<String>,

    /// Model override; each provider has a default.
    pub model: Option<String>,

    /// Base URL override, for proxies and compatible endpoints.
    pub base_url: Option<String>,

    pub max_tokens: u32,

    pub temperature: f64,

    /// Whole-request HTTP timeout.
    pub timeout_seconds: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: None,
            api_key: None,
            model: None,
            base_url: None,
            max_tokens: ProviderConfig::DEFAULT_MAX_TOKENS,
            temperature: ProviderConfig::DEFAULT_TEMPERATURE,
            timeout_seconds: 30,
        }
    }
}

/// Cost guard thresholds, in USD per request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CostSettings {
    /// Above this the request proceeds with a warning.
    pub warn_threshold: f64,

    /// Above this the request is refused before any network call.
    pub max_per_request: f64,
}

impl Default for CostSettings {
    fn default() -> Self {
        Self {
            warn_threshold: DEFAULT_WARN_THRESHOLD,
            max_per_request: DEFAULT_MAX_PER_REQUEST,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SettingsResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> SettingsResult<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `NLSQL_CONFIG`
    /// 2. `./nlsql.toml`
    /// 3. `~/.config/nlsql/config.toml`
    pub fn load() -> SettingsResult<Self> {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("nlsql.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("nlsql").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Check value ranges.
    pub fn validate(&self) -> SettingsResult<()> {
        if !(0.0..=1.0).contains(&self.hybrid.threshold) {
            return Err(SettingsError::InvalidConfig(format!(
                "hybrid.threshold must be between 0.0 and 1.0, got {}",
                self.hybrid.threshold
            )));
        }
        if !(100..=4000).contains(&self.ai.max_tokens) {
            return Err(SettingsError::InvalidConfig(format!(
                "ai.max_tokens must be between 100 and 4000, got {}",
                self.ai.max_tokens
            )));
        }
        if !(0.0..=2.0).contains(&self.ai.temperature) {
            return Err(SettingsError::InvalidConfig(format!(
                "ai.temperature must be between 0.0 and 2.0, got {}",
                self.ai.temperature
            )));
        }
        if self.ai.timeout_seconds == 0 {
            return Err(SettingsError::InvalidConfig(
                "ai.timeout_seconds must be positive".to_string(),
            ));
        }
        if self.cost.warn_threshold < 0.0 || self.cost.max_per_request < 0.0 {
            return Err(SettingsError::InvalidConfig(
                "cost thresholds must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A lone `$` is kept.
pub fn expand_env_vars(s: &str) -> SettingsResult<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                result.push('$');
                continue;
            }
            name
        };

        let value = env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name))?;
        result.push_str(&value);
    }

    Ok(result)
}
