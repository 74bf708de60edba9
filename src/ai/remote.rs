//! Remote, model-backed SQL generation.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;

use crate::generator::SqlGenerator;
use crate::result::{
    CostEstimate, ErrorKind, Translation, TranslationFailure, TranslationResult,
};
use crate::schema::Schema;
use crate::sql::ensure_select;

use super::cost::{estimate_tokens, CostEstimator};
use super::prompt::build_prompt;
use super::provider::{Provider, ProviderConfig, Usage};
use super::transport::{excerpt, ChatTransport, TransportError};

/// Context size assumed by [`SqlGenerator::estimate_cost`], before the
/// schema is known.
const DEFAULT_CONTEXT_TOKENS: u64 = 2000;

const DEFAULT_CONFIDENCE: f64 = 0.8;

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{0}")]
    Response(String),

    #[error("Failed to parse {provider} response as JSON. Response: {excerpt}")]
    InvalidJson { provider: String, excerpt: String },

    #[error("Generated SQL was rejected: {0}")]
    InvalidSql(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// The JSON object the model is asked to return.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelReply {
    #[serde(default)]
    pub sql: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Decode the reply directly, or from the first fenced JSON block.
pub fn parse_reply(provider: Provider, content: &str) -> ProviderResult<ModelReply> {
    if let Ok(reply) = serde_json::from_str::<ModelReply>(content) {
        return Ok(reply);
    }
    FENCED_JSON
        .captures(content)
        .and_then(|caps| serde_json::from_str::<ModelReply>(&caps[1]).ok())
        .ok_or_else(|| ProviderError::InvalidJson {
            provider: provider.display_name().to_string(),
            excerpt: excerpt(content),
        })
}

/// A generator backed by one remote provider.
pub struct RemoteGenerator {
    provider: Provider,
    config: ProviderConfig,
    transport: Arc<dyn ChatTransport>,
    estimator: CostEstimator,
}

impl RemoteGenerator {
    pub fn new(
        provider: Provider,
        config: ProviderConfig,
        transport: Arc<dyn ChatTransport>,
        estimator: CostEstimator,
    ) -> Self {
        Self {
            provider,
            config,
            transport,
            estimator,
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn not_configured(&self) -> TranslationResult {
        let key = self.provider.key();
        TranslationFailure::new(
            ErrorKind::NotConfigured(key.to_string()),
            format!(
                "{} is not configured. Please set your API key in the nlsql configuration.",
                self.provider.display_name()
            ),
            format!("{}-unavailable", key),
        )
        .with_suggestions(vec![
            format!("Set provider = \"{}\" in the [ai] section of nlsql.toml", key),
            format!("Set api_key = \"${{{}}}\" in the [ai] section", self.provider.api_key_env()),
            format!("Export {} in your environment", self.provider.api_key_env()),
        ])
        .into()
    }

    async fn call(&self, system: &str, user: &str) -> ProviderResult<(ModelReply, Option<Usage>)> {
        let request = self.provider.build_request(&self.config, system, user)?;
        let body = self.transport.post_json(&request).await?;
        let completion = self.provider.extract(body).map_err(ProviderError::Response)?;

        let reply = parse_reply(self.provider, &completion.content).inspect_err(|_| {
            tracing::error!(
                provider = %self.provider,
                content_length = completion.content.len(),
                "failed to parse model response"
            );
        })?;
        ensure_select(&reply.sql).map_err(ProviderError::InvalidSql)?;
        Ok((reply, completion.usage))
    }
}

#[async_trait]
impl SqlGenerator for RemoteGenerator {
    async fn generate(&self, prompt: &str, schema: &Schema) -> TranslationResult {
        if !self.is_available() {
            return self.not_configured();
        }

        let built = build_prompt(prompt, schema);
        tracing::debug!(
            provider = %self.provider,
            system_prompt_length = built.system.len(),
            user_prompt_length = built.user.len(),
            entities = ?built.entities,
            "built prompt"
        );

        let context_tokens = estimate_tokens(&built.system);
        let estimate = self.estimator.estimate(prompt, &self.config.model, context_tokens);

        if self.estimator.exceeds_maximum(&estimate) {
            tracing::warn!(
                provider = %self.provider,
                estimate = estimate.amount,
                max = self.estimator.max_per_request(),
                "generation blocked: cost exceeds maximum"
            );
            return TranslationResult::failure(
                ErrorKind::CostExceeded,
                format!("Estimated cost (${:.4}) exceeds maximum allowed", estimate.amount),
                self.config.model.clone(),
            );
        }

        let mut warnings = vec![];
        if self.estimator.should_warn(&estimate) {
            tracing::warn!(
                provider = %self.provider,
                estimate = estimate.amount,
                model = %self.config.model,
                "generation cost warning"
            );
            warnings.push(format!(
                "Estimated cost (${:.4}) exceeds the warning threshold (${:.4})",
                estimate.amount,
                self.estimator.warn_threshold()
            ));
        }

        let (reply, usage) = match self.call(&built.system, &built.user).await {
            Ok(done) => done,
            Err(e) => {
                tracing::error!(
                    provider = %self.provider,
                    model = %self.config.model,
                    error = %e,
                    "SQL generation failed"
                );
                let mut failure = TranslationFailure::new(
                    ErrorKind::Provider(self.provider.key().to_string()),
                    format!("{} generation failed: {}", self.provider.display_name(), e),
                    self.config.model.clone(),
                );
                failure.warnings = warnings;
                return failure.into();
            }
        };

        let cost = match usage {
            Some(usage) => self.estimator.actual(&usage, &self.config.model),
            None => self.estimator.unreported(&estimate),
        };

        let sql_lower = reply.sql.to_lowercase();
        let entities: Vec<String> = schema
            .entities
            .iter()
            .filter(|e| sql_lower.contains(&e.table().to_lowercase()))
            .map(|e| e.name.clone())
            .collect();

        let mut translation = Translation::new(
            reply.sql,
            reply.confidence.unwrap_or(DEFAULT_CONFIDENCE),
            self.config.model.clone(),
        );
        translation.explanation = reply.explanation;
        translation.entities = entities;
        translation.cost = Some(cost);
        translation.warnings = warnings;

        tracing::info!(
            provider = %self.provider,
            model = %self.config.model,
            cost = translation.cost.as_ref().map(|c| c.actual).unwrap_or_default(),
            confidence = translation.confidence,
            "SQL generation successful"
        );
        translation.into()
    }

    fn estimate_cost(&self, prompt: &str) -> CostEstimate {
        self.estimator
            .estimate(prompt, &self.config.model, DEFAULT_CONTEXT_TOKENS)
    }

    fn is_available(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }

    fn model_name(&self) -> String {
        self.config.model.clone()
    }
}
