use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nlsql::ai::{
    ChatTransport, CostEstimator, HttpRequest, Provider, ProviderConfig, RemoteGenerator,
    TransportResult,
};
use nlsql::generator::SqlGenerator;
use nlsql::result::{ErrorKind, TranslationResult};
use nlsql::schema::{Relation, RelationKind, Schema, SchemaEntity};
use serde_json::{json, Value};

/// Records every request and replies with `reply`.
struct Recording {
    reply: Value,
    requests: Mutex<Vec<HttpRequest>>,
}

impl Recording {
    fn new(reply: Value) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requests: Mutex::new(vec![]),
        })
    }

    fn only_request(&self) -> HttpRequest {
        let requests = self.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        requests[0].clone()
    }
}

#[async_trait]
impl ChatTransport for Recording {
    async fn post_json(&self, request: &HttpRequest) -> TransportResult<Value> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.reply.clone())
    }
}

fn schema() -> Schema {
    Schema::new(vec![
        SchemaEntity::new("User", "app_user")
            .with_field("id", "integer")
            .with_field("email", "string"),
        SchemaEntity::new("Address", "address")
            .with_field("city", "string")
            .with_relation(Relation::new("user", "User", RelationKind::ManyToOne)),
    ])
}

fn generator(provider: Provider, transport: Arc<Recording>) -> RemoteGenerator {
    RemoteGenerator::new(
        provider,
        ProviderConfig::for_provider(provider, "key-123"),
        transport,
        CostEstimator::default(),
    )
}

#[tokio::test]
async fn test_anthropic_fenced_reply() {
    let transport = Recording::new(json!({
        "content": [{
            "type": "text",
            "text": "Sure.\n```json\n{\"sql\": \"SELECT a.city FROM address a INNER JOIN app_user u ON a.user_id = u.id\", \"explanation\": \"Cities of users\", \"confidence\": 0.75}\n```"
        }],
        "usage": {"input_tokens": 900, "output_tokens": 60}
    }));
    let anthropic = generator(Provider::Anthropic, transport.clone());

    let TranslationResult::Success(t) = anthropic.generate("cities of users", &schema()).await
    else {
        panic!("expected success");
    };

    assert_eq!(t.provider, "claude-3-5-sonnet-20241022");
    assert_eq!(t.confidence, 0.75);
    assert_eq!(t.explanation, "Cities of users");
    assert_eq!(t.entities, vec!["User", "Address"]);
    assert_eq!(t.cost.as_ref().unwrap().total_tokens, 960);

    let request = transport.only_request();
    assert_eq!(request.url, "https://api.anthropic.com/v1/messages");
    assert!(request
        .headers
        .contains(&("x-api-key".to_string(), "key-123".to_string())));
    assert_eq!(request.body["max_tokens"], json!(1000));
    let system = request.body["system"].as_str().unwrap();
    assert!(system.contains("\"table\": \"app_user\""));
    assert!(system.contains("\"target\": \"User\""));
}

#[tokio::test]
async fn test_gemini_request_and_usage() {
    let transport = Recording::new(json!({
        "candidates": [{"content": {"parts": [{"text": "{\"sql\": \"SELECT email FROM app_user\"}"}]}}],
        "usageMetadata": {"promptTokenCount": 300, "candidatesTokenCount": 20, "totalTokenCount": 320}
    }));
    let gemini = generator(Provider::Gemini, transport.clone());

    let result = gemini.generate("user emails", &schema()).await;

    assert!(result.is_success());
    assert_eq!(result.confidence(), 0.8);
    assert_eq!(result.cost().unwrap().output_tokens, 20);

    let request = transport.only_request();
    assert_eq!(
        request.url,
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent?key=key-123"
    );
    assert_eq!(request.body["generationConfig"]["maxOutputTokens"], json!(1000));
    assert!(request.body["systemInstruction"]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .ends_with("You must respond with valid JSON only, no other text."));
}

#[tokio::test]
async fn test_unparseable_reply_is_provider_error() {
    let transport = Recording::new(json!({
        "choices": [{"message": {"content": "I cannot help with that."}}]
    }));
    let grok = generator(Provider::Grok, transport);

    let TranslationResult::Failure(f) = grok.generate("user emails", &schema()).await else {
        panic!("expected failure");
    };

    assert_eq!(f.error, ErrorKind::Provider("grok".to_string()));
    assert_eq!(f.error.code(), "GROK_ERROR");
    assert!(f
        .message
        .starts_with("Grok generation failed: Failed to parse Grok response as JSON."));
    assert!(f.message.ends_with("Response: I cannot help with that."));
}

#[tokio::test]
async fn test_mistral_without_key_is_not_configured() {
    let transport = Recording::new(json!({}));
    let mistral = RemoteGenerator::new(
        Provider::Mistral,
        ProviderConfig::for_provider(Provider::Mistral, ""),
        transport.clone(),
        CostEstimator::default(),
    );

    let result = mistral.generate("user emails", &schema()).await;

    assert_eq!(result.error().unwrap().code(), "MISTRAL_NOT_CONFIGURED");
    assert_eq!(result.provider(), "mistral-unavailable");
    assert!(transport.requests.lock().unwrap().is_empty());
}
