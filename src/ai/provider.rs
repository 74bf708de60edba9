//! Remote model providers and their wire formats.
//!
//! OpenAI, Mistral and Grok share the chat-completions shape. Anthropic uses
//! the messages API and Gemini `generateContent`; both are told to answer in
//! JSON through the prompt instead of a response format flag.

use std::fmt;
use std::str::FromStr;

use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Value};

use super::transport::{HttpRequest, TransportError, TransportResult};

/// Appended to the prompt for providers without a JSON response mode.
const JSON_ONLY: &str = "\n\nYou must respond with valid JSON only, no other text.";

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAi,
    Anthropic,
    Mistral,
    Grok,
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 5] = [
        Provider::OpenAi,
        Provider::Anthropic,
        Provider::Mistral,
        Provider::Grok,
        Provider::Gemini,
    ];

    /// Lower-case configuration key (`openai`).
    pub fn key(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Mistral => "mistral",
            Provider::Grok => "grok",
            Provider::Gemini => "gemini",
        }
    }

    /// Human-readable name used in messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OpenAI",
            Provider::Anthropic => "Anthropic",
            Provider::Mistral => "Mistral",
            Provider::Grok => "Grok",
            Provider::Gemini => "Gemini",
        }
    }

    /// Conventional environment variable holding the API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::Mistral => "MISTRAL_API_KEY",
            Provider::Grok => "XAI_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Anthropic => "https://api.anthropic.com/v1",
            Provider::Mistral => "https://api.mistral.ai/v1",
            Provider::Grok => "https://api.x.ai/v1",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4-turbo",
            Provider::Anthropic => "claude-3-5-sonnet-20241022",
            Provider::Mistral => "mistral-large-latest",
            Provider::Grok => "grok-beta",
            Provider::Gemini => "gemini-2.0-flash",
        }
    }

    /// Build the HTTP request for one system/user prompt pair.
    pub fn build_request(
        &self,
        config: &ProviderConfig,
        system: &str,
        user: &str,
    ) -> TransportResult<HttpRequest> {
        let base = config.base_url.trim_end_matches('/');
        Ok(match self {
            Provider::OpenAi | Provider::Mistral | Provider::Grok => HttpRequest {
                url: format!("{}/chat/completions", base),
                headers: vec![(
                    "Authorization".to_string(),
                    format!("Bearer {}", config.api_key),
                )],
                body: json!({
                    "model": config.model,
                    "messages": [
                        {"role": "system", "content": system},
                        {"role": "user", "content": user},
                    ],
                    "max_tokens": config.max_tokens,
                    "temperature": config.temperature,
                    "response_format": {"type": "json_object"},
                }),
            },
            Provider::Anthropic => HttpRequest {
                url: format!("{}/messages", base),
                headers: vec![
                    ("x-api-key".to_string(), config.api_key.clone()),
                    ("anthropic-version".to_string(), ANTHROPIC_VERSION.to_string()),
                ],
                body: json!({
                    "model": config.model,
                    "max_tokens": config.max_tokens,
                    "temperature": config.temperature,
                    "system": system,
                    "messages": [
                        {"role": "user", "content": format!("{}{}", user, JSON_ONLY)},
                    ],
                }),
            },
            Provider::Gemini => HttpRequest {
                url: gemini_url(base, &config.model, &config.api_key)?,
                headers: vec![],
                body: json!({
                    "contents": [
                        {"role": "user", "parts": [{"text": user}]},
                    ],
                    "systemInstruction": {
                        "parts": [{"text": format!("{}{}", system, JSON_ONLY)}],
                    },
                    "generationConfig": {
                        "temperature": config.temperature,
                        "maxOutputTokens": config.max_tokens,
                        "responseMimeType": "application/json",
                    },
                }),
            },
        })
    }

    /// Pull the reply text and token usage out of a response body.
    pub fn extract(&self, body: Value) -> Result<Completion, String> {
        match self {
            Provider::OpenAi | Provider::Mistral | Provider::Grok => extract_chat(body),
            Provider::Anthropic => extract_anthropic(body),
            Provider::Gemini => extract_gemini(body),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "mistral" => Ok(Provider::Mistral),
            "grok" | "xai" => Ok(Provider::Grok),
            "gemini" | "google" => Ok(Provider::Gemini),
            other => Err(format!("Unknown AI provider: {}", other)),
        }
    }
}

/// Connection parameters for one provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl ProviderConfig {
    pub const DEFAULT_MAX_TOKENS: u32 = 1000;
    pub const DEFAULT_TEMPERATURE: f64 = 0.2;

    /// Provider defaults with the given key.
    pub fn for_provider(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: provider.default_model().to_string(),
            base_url: provider.default_base_url().to_string(),
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            temperature: Self::DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Provider-reported token usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    /// Build usage, defaulting the total to the sum of the parts.
    pub fn new(prompt_tokens: u64, completion_tokens: u64, total_tokens: Option<u64>) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: total_tokens.unwrap_or(prompt_tokens + completion_tokens),
        }
    }
}

/// Reply text plus usage, when reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub usage: Option<Usage>,
}

/// `{base}/models/{model}:generateContent?key={api_key}` with the model as an
/// encoded path segment and the key as an encoded query parameter.
fn gemini_url(base: &str, model: &str, api_key: &str) -> TransportResult<String> {
    let invalid = |detail: String| TransportError::Request(format!("invalid base URL '{}': {}", base, detail));

    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("cannot carry a path".to_string()))?
        .pop_if_empty()
        .push("models")
        .push(&format!("{}:generateContent", model));
    url.query_pairs_mut().append_pair("key", api_key);
    Ok(url.into())
}

fn extract_chat(body: Value) -> Result<Completion, String> {
    #[derive(Deserialize)]
    struct Message {
        #[serde(default)]
        content: Option<String>,
    }
    #[derive(Deserialize)]
    struct Choice {
        message: Message,
    }
    #[derive(Deserialize)]
    struct ChatUsage {
        #[serde(default)]
        prompt_tokens: u64,
        #[serde(default)]
        completion_tokens: u64,
        #[serde(default)]
        total_tokens: Option<u64>,
    }
    #[derive(Deserialize)]
    struct ChatResponse {
        #[serde(default)]
        choices: Vec<Choice>,
        #[serde(default)]
        usage: Option<ChatUsage>,
    }

    let response: ChatResponse =
        serde_json::from_value(body).map_err(|e| format!("Unexpected response shape: {}", e))?;
    Ok(Completion {
        content: response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default(),
        usage: response
            .usage
            .map(|u| Usage::new(u.prompt_tokens, u.completion_tokens, u.total_tokens)),
    })
}

fn extract_anthropic(body: Value) -> Result<Completion, String> {
    #[derive(Deserialize)]
    struct ContentBlock {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        text: Option<String>,
    }
    #[derive(Deserialize)]
    struct MessagesUsage {
        #[serde(default)]
        input_tokens: u64,
        #[serde(default)]
        output_tokens: u64,
    }
    #[derive(Deserialize)]
    struct MessagesResponse {
        #[serde(default)]
        content: Vec<ContentBlock>,
        #[serde(default)]
        usage: Option<MessagesUsage>,
    }

    let response: MessagesResponse =
        serde_json::from_value(body).map_err(|e| format!("Unexpected response shape: {}", e))?;
    Ok(Completion {
        content: response
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect::<String>(),
        usage: response
            .usage
            .map(|u| Usage::new(u.input_tokens, u.output_tokens, None)),
    })
}

fn extract_gemini(body: Value) -> Result<Completion, String> {
    #[derive(Deserialize)]
    struct Part {
        #[serde(default)]
        text: Option<String>,
    }
    #[derive(Deserialize)]
    struct Content {
        #[serde(default)]
        parts: Vec<Part>,
    }
    #[derive(Deserialize)]
    struct Candidate {
        content: Content,
    }
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct UsageMetadata {
        #[serde(default)]
        prompt_token_count: u64,
        #[serde(default)]
        candidates_token_count: u64,
        #[serde(default)]
        total_token_count: Option<u64>,
    }
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct GenerateResponse {
        #[serde(default)]
        candidates: Vec<Candidate>,
        #[serde(default)]
        usage_metadata: Option<UsageMetadata>,
    }

    let response: GenerateResponse =
        serde_json::from_value(body).map_err(|e| format!("Unexpected response shape: {}", e))?;
    Ok(Completion {
        content: response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text)
            .unwrap_or_default(),
        usage: response.usage_metadata.map(|u| {
            Usage::new(
                u.prompt_token_count,
                u.candidates_token_count,
                u.total_token_count,
            )
        }),
    })
}
