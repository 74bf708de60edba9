use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use nlsql::ai::{
    ChatTransport, CostEstimator, HttpRequest, Provider, ProviderConfig, RemoteGenerator,
    TransportResult,
};
use nlsql::orchestrator::{Orchestrator, Strategy};
use nlsql::result::ErrorKind;
use nlsql::schema::{Schema, SchemaEntity};
use serde_json::{json, Value};

/// Counts calls and answers with a fixed chat-completions body.
struct CountingTransport {
    calls: AtomicUsize,
}

impl CountingTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatTransport for CountingTransport {
    async fn post_json(&self, _request: &HttpRequest) -> TransportResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({
            "choices": [{"message": {"content": "{\"sql\": \"SELECT u.email FROM users u\", \"confidence\": 0.9}"}}],
            "usage": {"prompt_tokens": 800, "completion_tokens": 40, "total_tokens": 840}
        }))
    }
}

fn schema() -> Schema {
    Schema::new(vec![SchemaEntity::new("User", "users").with_field("email", "string")])
}

fn gpt4(transport: Arc<CountingTransport>, estimator: CostEstimator) -> RemoteGenerator {
    RemoteGenerator::new(
        Provider::OpenAi,
        ProviderConfig::for_provider(Provider::OpenAi, "sk-test").with_model("gpt-4"),
        transport,
        estimator,
    )
}

#[tokio::test]
async fn test_cost_above_maximum_makes_no_call() {
    let transport = CountingTransport::new();
    // 500 estimated output tokens alone cost $0.03 on gpt-4
    let remote = gpt4(transport.clone(), CostEstimator::new(0.005, 0.01));
    let orchestrator = Orchestrator::default().with_ai(Arc::new(remote));

    let result = orchestrator
        .generate("user emails", &schema(), Some(Strategy::Ai))
        .await;

    assert_eq!(result.error(), Some(&ErrorKind::CostExceeded));
    assert_eq!(result.provider(), "gpt-4");
    assert_eq!(transport.calls(), 0);
    let json = result.to_json();
    assert!(json["message"]
        .as_str()
        .unwrap()
        .ends_with("exceeds maximum allowed"));
}

#[tokio::test]
async fn test_cost_above_warning_proceeds_with_warning() {
    let transport = CountingTransport::new();
    let remote = gpt4(transport.clone(), CostEstimator::new(0.01, 10.0));
    let orchestrator = Orchestrator::default().with_ai(Arc::new(remote));

    let result = orchestrator
        .generate("user emails", &schema(), Some(Strategy::Ai))
        .await;

    assert!(result.is_success());
    assert_eq!(transport.calls(), 1);
    assert_eq!(result.warnings().len(), 1);
    assert!(result.warnings()[0].contains("warning threshold"));

    let cost = result.cost().unwrap();
    assert_eq!(cost.input_tokens, 800);
    assert_eq!(cost.total_tokens, 840);
    // 800 in at $0.03/1k plus 40 out at $0.06/1k
    assert!((cost.actual - 0.0264).abs() < 1e-9);
}

#[tokio::test]
async fn test_cheap_request_has_no_warning() {
    let transport = CountingTransport::new();
    let remote = gpt4(transport.clone(), CostEstimator::new(5.0, 10.0));

    let orchestrator = Orchestrator::default().with_ai(Arc::new(remote));
    let result = orchestrator
        .generate("user emails", &schema(), Some(Strategy::Ai))
        .await;

    assert!(result.is_success());
    assert!(result.warnings().is_empty());
    assert_eq!(transport.calls(), 1);
}

#[test]
fn test_orchestrator_estimate_matches_guard_inputs() {
    let remote = gpt4(CountingTransport::new(), CostEstimator::default());
    let orchestrator = Orchestrator::default().with_ai(Arc::new(remote));

    let estimate = orchestrator.estimate_cost("abcdefgh", Some(Strategy::Ai)).unwrap();
    assert_eq!(estimate.model, "gpt-4");
    assert_eq!(estimate.estimated_input_tokens, 2002);
    assert_eq!(estimate.estimated_output_tokens, 500);
}
