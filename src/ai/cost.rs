//! Token cost estimation for remote generation.
//!
//! Prices are USD per 1,000 tokens. Token counts before a call are a rough
//! `ceil(chars / 4)`; after a call the provider-reported usage is used.

use crate::result::{CostEstimate, CostInfo};

use super::provider::Usage;

/// Per-1k-token prices for one model family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    pub input: f64,
    pub output: f64,
}

const fn price(input: f64, output: f64) -> Pricing {
    Pricing { input, output }
}

/// Model prefix → price. Lookup is exact first, then longest prefix.
static PRICING: &[(&str, Pricing)] = &[
    // OpenAI
    ("gpt-4o", price(0.0025, 0.01)),
    ("gpt-4o-mini", price(0.00015, 0.0006)),
    ("gpt-4-turbo", price(0.01, 0.03)),
    ("gpt-4", price(0.03, 0.06)),
    ("gpt-3.5-turbo", price(0.0005, 0.0015)),
    // Anthropic
    ("claude-3-opus", price(0.015, 0.075)),
    ("claude-3-sonnet", price(0.003, 0.015)),
    ("claude-3-5-sonnet", price(0.003, 0.015)),
    ("claude-3-haiku", price(0.00025, 0.00125)),
    ("claude-3-5-haiku", price(0.0008, 0.004)),
    // Google Gemini
    ("gemini-2.5-pro", price(0.00125, 0.005)),
    ("gemini-2.5-flash", price(0.000075, 0.0003)),
    ("gemini-2.0-flash", price(0.000075, 0.0003)),
    ("gemini-2.0-flash-lite", price(0.000035, 0.00014)),
    // Mistral
    ("mistral-large", price(0.004, 0.012)),
    ("mistral-medium", price(0.0027, 0.0081)),
    ("mistral-small", price(0.001, 0.003)),
    // xAI
    ("grok-beta", price(0.005, 0.015)),
    ("grok-2", price(0.005, 0.015)),
    // self-hosted
    ("ollama", price(0.0, 0.0)),
];

const DEFAULT_PRICING: Pricing = price(0.001, 0.003);

pub const CHARS_PER_TOKEN: u64 = 4;
pub const ESTIMATED_OUTPUT_TOKENS: u64 = 500;
pub const DEFAULT_WARN_THRESHOLD: f64 = 0.10;
pub const DEFAULT_MAX_PER_REQUEST: f64 = 0.50;

const CURRENCY: &str = "USD";

/// Price lookup for `model`: exact match, then the longest matching prefix,
/// then the default.
pub fn pricing(model: &str) -> Pricing {
    if let Some((_, p)) = PRICING.iter().find(|(key, _)| *key == model) {
        return *p;
    }
    PRICING
        .iter()
        .filter(|(key, _)| model.starts_with(key))
        .max_by_key(|(key, _)| key.len())
        .map(|(_, p)| *p)
        .unwrap_or(DEFAULT_PRICING)
}

/// `ceil(chars / 4)`; empty text is zero tokens.
pub fn estimate_tokens(text: &str) -> u64 {
    let chars = text.chars().count() as u64;
    chars.div_ceil(CHARS_PER_TOKEN)
}

fn cost(pricing: Pricing, input_tokens: u64, output_tokens: u64) -> f64 {
    (input_tokens as f64 / 1000.0) * pricing.input + (output_tokens as f64 / 1000.0) * pricing.output
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimator {
    warn_threshold: f64,
    max_per_request: f64,
}

impl Default for CostEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_WARN_THRESHOLD, DEFAULT_MAX_PER_REQUEST)
    }
}

impl CostEstimator {
    pub fn new(warn_threshold: f64, max_per_request: f64) -> Self {
        Self {
            warn_threshold,
            max_per_request,
        }
    }

    pub fn warn_threshold(&self) -> f64 {
        self.warn_threshold
    }

    pub fn max_per_request(&self) -> f64 {
        self.max_per_request
    }

    /// Estimate before calling: prompt tokens plus `context_tokens` of
    /// schema context in, a fixed 500 tokens out.
    pub fn estimate(&self, prompt: &str, model: &str, context_tokens: u64) -> CostEstimate {
        let input_tokens = estimate_tokens(prompt) + context_tokens;
        let output_tokens = ESTIMATED_OUTPUT_TOKENS;

        CostEstimate {
            amount: cost(pricing(model), input_tokens, output_tokens),
            currency: CURRENCY.to_string(),
            model: model.to_string(),
            estimated_input_tokens: input_tokens,
            estimated_output_tokens: output_tokens,
        }
    }

    /// Cost from reported usage, alongside the estimate for the same input.
    pub fn actual(&self, usage: &Usage, model: &str) -> CostInfo {
        let estimate = self.estimate("", model, usage.prompt_tokens);
        CostInfo {
            estimated: estimate.amount,
            actual: cost(pricing(model), usage.prompt_tokens, usage.completion_tokens),
            currency: CURRENCY.to_string(),
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }

    /// Cost record when the provider reported no usage.
    pub fn unreported(&self, estimate: &CostEstimate) -> CostInfo {
        CostInfo {
            estimated: estimate.amount,
            actual: estimate.amount,
            currency: estimate.currency.clone(),
            input_tokens: 0,
            output_tokens: 0,
            total_tokens: 0,
        }
    }

    pub fn should_warn(&self, estimate: &CostEstimate) -> bool {
        estimate.amount > self.warn_threshold
    }

    pub fn exceeds_maximum(&self, estimate: &CostEstimate) -> bool {
        estimate.amount > self.max_per_request
    }
}
