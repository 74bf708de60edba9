//! Remote model-backed SQL generation.
//!
//! - [`provider`] - provider catalogue and wire formats
//! - [`transport`] - the HTTP seam
//! - [`prompt`] - schema narrowing and prompt text
//! - [`cost`] - pricing and the spend guard
//! - [`remote`] - [`RemoteGenerator`], tying the above together

pub mod cost;
pub mod prompt;
pub mod provider;
pub mod remote;
pub mod transport;

use std::env;
use std::sync::Arc;
use std::time::Duration;

pub use cost::{estimate_tokens, pricing, CostEstimator, Pricing};
pub use prompt::{build_prompt, BuiltPrompt};
pub use provider::{Completion, Provider, ProviderConfig, Usage};
pub use remote::{ProviderError, ProviderResult, RemoteGenerator};
pub use transport::{ChatTransport, HttpRequest, HttpTransport, TransportError, TransportResult};

use crate::config::{expand_env_vars, Settings, SettingsError, SettingsResult};

/// Build the remote generator described by `[ai]`, if a provider is named.
///
/// The API key comes from `ai.api_key` (with `${VAR}` expansion) or, when
/// unset, from the provider's conventional environment variable. A missing
/// key still yields a generator; it reports itself unavailable.
pub fn from_settings(settings: &Settings) -> SettingsResult<Option<RemoteGenerator>> {
    let Some(name) = settings.ai.provider.as_deref() else {
        return Ok(None);
    };
    let provider: Provider = name.parse().map_err(SettingsError::InvalidConfig)?;

    let api_key = match &settings.ai.api_key {
        Some(raw) => expand_env_vars(raw)?,
        None => env::var(provider.api_key_env()).unwrap_or_default(),
    };

    let mut config = ProviderConfig::for_provider(provider, api_key);
    if let Some(model) = &settings.ai.model {
        config = config.with_model(model);
    }
    if let Some(base_url) = &settings.ai.base_url {
        config = config.with_base_url(expand_env_vars(base_url)?);
    }
    config.max_tokens = settings.ai.max_tokens;
    config.temperature = settings.ai.temperature;

    let transport = HttpTransport::new(Duration::from_secs(settings.ai.timeout_seconds))
        .map_err(|e| SettingsError::InvalidConfig(e.to_string()))?;
    let estimator = CostEstimator::new(settings.cost.warn_threshold, settings.cost.max_per_request);

    tracing::debug!(
        provider = %provider,
        model = %config.model,
        timeout_seconds = settings.ai.timeout_seconds,
        "configured remote generator"
    );
    Ok(Some(RemoteGenerator::new(
        provider,
        config,
        Arc::new(transport),
        estimator,
    )))
}
