//! The seam every SQL generator implements.

use async_trait::async_trait;

use crate::result::{CostEstimate, TranslationResult};
use crate::schema::Schema;

/// A source of SQL for a natural-language prompt: the local rule engine or a
/// remote model.
#[async_trait]
pub trait SqlGenerator: Send + Sync {
    /// Translate `prompt` against `schema`. Failures are returned as
    /// [`TranslationResult::Failure`], never as panics or errors.
    async fn generate(&self, prompt: &str, schema: &Schema) -> TranslationResult;

    /// Cost of running `prompt`; zero for local generation.
    fn estimate_cost(&self, prompt: &str) -> CostEstimate;

    /// Is the generator configured and usable?
    fn is_available(&self) -> bool;

    /// Model or rule-set identifier, e.g. `gpt-4o` or `local-rule-based`.
    fn model_name(&self) -> String;
}
