use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use nlsql::generator::SqlGenerator;
use nlsql::orchestrator::{Orchestrator, Strategy};
use nlsql::result::{CostEstimate, Translation, TranslationResult};
use nlsql::schema::{Schema, SchemaEntity};

/// Always answers with the same SQL and confidence.
struct Scripted {
    provider: &'static str,
    confidence: f64,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(provider: &'static str, confidence: f64) -> Arc<Self> {
        Arc::new(Self {
            provider,
            confidence,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SqlGenerator for Scripted {
    async fn generate(&self, _prompt: &str, _schema: &Schema) -> TranslationResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut t = Translation::new("SELECT u.* FROM \"user\" u", self.confidence, self.provider);
        t.entities = vec!["User".to_string()];
        t.into()
    }

    fn estimate_cost(&self, _prompt: &str) -> CostEstimate {
        CostEstimate {
            amount: 0.0,
            currency: "USD".to_string(),
            model: self.provider.to_string(),
            estimated_input_tokens: 0,
            estimated_output_tokens: 0,
        }
    }

    fn is_available(&self) -> bool {
        true
    }

    fn model_name(&self) -> String {
        self.provider.to_string()
    }
}

fn schema() -> Schema {
    Schema::new(vec![SchemaEntity::new("User", "user").with_field("email", "string")])
}

#[tokio::test]
async fn test_low_confidence_local_without_ai_is_returned_unchanged() {
    let local = Scripted::new("local", 0.4);
    let orchestrator = Orchestrator::new(local.clone()).with_threshold(0.7);

    let result = orchestrator.generate("users", &schema(), Some(Strategy::Hybrid)).await;

    let TranslationResult::Success(t) = result else {
        panic!("expected the local result");
    };
    assert_eq!(t.provider, "local");
    assert_eq!(t.confidence, 0.4);
    assert!(t.warnings.is_empty());
    assert_eq!(local.calls(), 1);
}

#[tokio::test]
async fn test_low_confidence_local_triggers_ai() {
    let local = Scripted::new("local", 0.4);
    let ai = Scripted::new("gpt-4o-mini", 0.85);
    let orchestrator = Orchestrator::new(local.clone())
        .with_ai(ai.clone())
        .with_threshold(0.7);

    let result = orchestrator.generate("users", &schema(), None).await;

    assert_eq!(ai.calls(), 1);
    assert_eq!(result.provider(), "gpt-4o-mini");
    assert_eq!(result.confidence(), 0.85);
}

#[tokio::test]
async fn test_threshold_is_inclusive() {
    let ai = Scripted::new("gpt-4o-mini", 0.99);
    let orchestrator = Orchestrator::new(Scripted::new("local", 0.7))
        .with_ai(ai.clone())
        .with_threshold(0.7);

    let result = orchestrator.generate("users", &schema(), None).await;

    assert_eq!(result.provider(), "local");
    assert_eq!(ai.calls(), 0);
}

#[tokio::test]
async fn test_explicit_local_strategy_never_calls_ai() {
    let ai = Scripted::new("gpt-4o-mini", 0.99);
    let orchestrator = Orchestrator::new(Scripted::new("local", 0.1)).with_ai(ai.clone());

    let result = orchestrator.generate("users", &schema(), Some(Strategy::Local)).await;

    assert_eq!(result.provider(), "local");
    assert_eq!(ai.calls(), 0);
}

#[tokio::test]
async fn test_real_local_engine_in_hybrid_mode() {
    let orchestrator = Orchestrator::default();

    let result = orchestrator
        .generate("show users with email containing gmail", &schema(), None)
        .await;

    assert!(result.is_success());
    assert_eq!(result.provider(), "local");
    assert!(result.sql().unwrap().contains("LIKE '%gmail%'"));
}
