//! Strategy selection between the local engine and a remote generator.
//!
//! ```text
//! local   → LocalGenerator only
//! ai      → remote generator only
//! hybrid  → local; remote when local fails or scores below the threshold
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ai::{self, Provider};
use crate::config::{Settings, SettingsResult};
use crate::engine::LocalGenerator;
use crate::generator::SqlGenerator;
use crate::result::{CostEstimate, ErrorKind, TranslationFailure, TranslationResult};
use crate::schema::Schema;

pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Provider reported when a strategy has no generator to run.
const NO_PROVIDER: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Local,
    Ai,
    #[default]
    Hybrid,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Local, Strategy::Ai, Strategy::Hybrid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Local => "local",
            Strategy::Ai => "ai",
            Strategy::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Strategy::Local),
            "ai" => Ok(Strategy::Ai),
            "hybrid" => Ok(Strategy::Hybrid),
            other => Err(format!(
                "Unknown strategy '{}': expected local, ai or hybrid",
                other
            )),
        }
    }
}

/// Every strategy's result for one prompt.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub results: Vec<(Strategy, TranslationResult)>,
    /// Highest-confidence successful strategy, if any succeeded.
    pub best: Option<Strategy>,
}

impl Comparison {
    pub fn get(&self, strategy: Strategy) -> Option<&TranslationResult> {
        self.results
            .iter()
            .find(|(s, _)| *s == strategy)
            .map(|(_, r)| r)
    }

    pub fn best_result(&self) -> Option<&TranslationResult> {
        self.best.and_then(|s| self.get(s))
    }
}

pub struct Orchestrator {
    enabled: bool,
    strategy: Strategy,
    threshold: f64,
    local: Arc<dyn SqlGenerator>,
    ai: Option<Arc<dyn SqlGenerator>>,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(Arc::new(LocalGenerator::new()))
    }
}

impl Orchestrator {
    /// Hybrid orchestration over `local` with no remote generator.
    pub fn new(local: Arc<dyn SqlGenerator>) -> Self {
        Self {
            enabled: true,
            strategy: Strategy::default(),
            threshold: DEFAULT_THRESHOLD,
            local,
            ai: None,
        }
    }

    /// Build from settings, wiring a remote generator when `[ai]` names a
    /// provider.
    pub fn from_settings(settings: &Settings) -> SettingsResult<Self> {
        let local = LocalGenerator::new().with_max_depth(settings.engine.max_depth);
        let mut orchestrator = Self::new(Arc::new(local))
            .with_enabled(settings.enabled)
            .with_strategy(settings.strategy)
            .with_threshold(settings.hybrid.threshold);

        if let Some(remote) = ai::from_settings(settings)? {
            orchestrator = orchestrator.with_ai(Arc::new(remote));
        }
        Ok(orchestrator)
    }

    pub fn with_ai(mut self, ai: Arc<dyn SqlGenerator>) -> Self {
        self.ai = Some(ai);
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// The configured remote generator, if it can be called.
    fn available_ai(&self) -> Option<&Arc<dyn SqlGenerator>> {
        self.ai.as_ref().filter(|ai| ai.is_available())
    }

    pub fn is_ai_available(&self) -> bool {
        self.available_ai().is_some()
    }

    pub fn ai_model_name(&self) -> Option<String> {
        self.available_ai().map(|ai| ai.model_name())
    }

    /// Translate `prompt` with `strategy`, or the configured default.
    pub async fn generate(
        &self,
        prompt: &str,
        schema: &Schema,
        strategy: Option<Strategy>,
    ) -> TranslationResult {
        if !self.enabled {
            return TranslationResult::failure(
                ErrorKind::FeatureDisabled,
                "Natural Language to SQL is disabled in the configuration.",
                NO_PROVIDER,
            );
        }

        let strategy = strategy.unwrap_or(self.strategy);
        tracing::info!(
            strategy = %strategy,
            prompt_length = prompt.chars().count(),
            entity_count = schema.entities.len(),
            "NL to SQL generation started"
        );

        match strategy {
            Strategy::Local => self.local.generate(prompt, schema).await,
            Strategy::Ai => self.generate_ai(prompt, schema).await,
            Strategy::Hybrid => self.generate_hybrid(prompt, schema).await,
        }
    }

    async fn generate_ai(&self, prompt: &str, schema: &Schema) -> TranslationResult {
        match self.available_ai() {
            Some(ai) => {
                tracing::debug!(model = %ai.model_name(), "using AI generator");
                ai.generate(prompt, schema).await
            }
            None => ai_not_configured(),
        }
    }

    async fn generate_hybrid(&self, prompt: &str, schema: &Schema) -> TranslationResult {
        let local = self.local.generate(prompt, schema).await;
        if local.is_success() && local.confidence() >= self.threshold {
            tracing::debug!(confidence = local.confidence(), "local result accepted");
            return local;
        }

        let Some(ai) = self.available_ai() else {
            tracing::debug!("local result below threshold, no AI generator available");
            return local;
        };

        tracing::debug!(
            confidence = local.confidence(),
            threshold = self.threshold,
            model = %ai.model_name(),
            "falling back to AI generator"
        );
        let remote = ai.generate(prompt, schema).await;
        pick_hybrid(local, remote)
    }

    /// Estimated spend for `prompt`. `None` when the strategy would call an
    /// unavailable remote generator.
    pub fn estimate_cost(&self, prompt: &str, strategy: Option<Strategy>) -> Option<CostEstimate> {
        match strategy.unwrap_or(self.strategy) {
            Strategy::Local => Some(self.local.estimate_cost(prompt)),
            Strategy::Ai | Strategy::Hybrid => {
                self.available_ai().map(|ai| ai.estimate_cost(prompt))
            }
        }
    }

    /// Run every strategy and report which scored best.
    ///
    /// The local and remote generators each run once, concurrently; the
    /// hybrid entry applies the hybrid policy to their results.
    pub async fn compare(&self, prompt: &str, schema: &Schema) -> Comparison {
        if !self.enabled {
            let disabled = self.generate(prompt, schema, None).await;
            return Comparison {
                results: Strategy::ALL
                    .iter()
                    .map(|s| (*s, disabled.clone()))
                    .collect(),
                best: None,
            };
        }

        let (local, remote) = futures::join!(
            self.local.generate(prompt, schema),
            self.generate_ai(prompt, schema)
        );

        let hybrid = if (local.is_success() && local.confidence() >= self.threshold)
            || !self.is_ai_available()
        {
            local.clone()
        } else {
            pick_hybrid(local.clone(), remote.clone())
        };

        let results = vec![
            (Strategy::Local, local),
            (Strategy::Ai, remote),
            (Strategy::Hybrid, hybrid),
        ];
        let best = results
            .iter()
            .filter(|(_, r)| r.is_success())
            .fold(None::<(Strategy, f64)>, |best, (s, r)| match best {
                Some((_, c)) if c >= r.confidence() => best,
                _ => Some((*s, r.confidence())),
            })
            .map(|(s, _)| s);

        tracing::info!(best = ?best, "strategy comparison finished");
        Comparison { results, best }
    }
}

/// The successful result with the higher confidence; local on ties and when
/// neither succeeded.
fn pick_hybrid(local: TranslationResult, remote: TranslationResult) -> TranslationResult {
    match (local.is_success(), remote.is_success()) {
        (_, false) => local,
        (false, true) => remote,
        (true, true) if remote.confidence() > local.confidence() => remote,
        (true, true) => local,
    }
}

fn ai_not_configured() -> TranslationResult {
    let supported: Vec<&str> = Provider::ALL.iter().map(|p| p.key()).collect();
    TranslationFailure::new(
        ErrorKind::AiNotConfigured,
        "Natural Language to SQL requires an AI provider to be configured.",
        NO_PROVIDER,
    )
    .with_suggestions(vec![
        "Configure an AI provider in the [ai] section of nlsql.toml".to_string(),
        "Example: provider = \"openai\"".to_string(),
        "Set the corresponding API key: api_key = \"${OPENAI_API_KEY}\"".to_string(),
        format!("Supported providers: {}", supported.join(", ")),
    ])
    .into()
}
