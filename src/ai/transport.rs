//! HTTP seam for remote generators.
//!
//! [`ChatTransport`] posts a JSON body and returns the decoded JSON reply.
//! [`HttpTransport`] is the reqwest implementation; tests substitute their
//! own to observe or script calls.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

/// Longest response excerpt kept in error messages.
const MAX_BODY_EXCERPT: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid JSON in response: {0}")]
    Decode(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// A JSON POST request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn post_json(&self, request: &HttpRequest) -> TransportResult<Value>;
}

/// reqwest-backed transport with a whole-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn post_json(&self, request: &HttpRequest) -> TransportResult<Value> {
        let mut builder = self
            .client
            .post(&request.url)
            .header("content-type", "application/json")
            .json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status,
                body: excerpt(&body),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// First 500 characters of `text`.
pub fn excerpt(text: &str) -> String {
    text.chars().take(MAX_BODY_EXCERPT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_counts_characters() {
        let long = "é".repeat(600);
        assert_eq!(excerpt(&long).chars().count(), 500);
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn test_status_error_message() {
        let err = TransportError::Status {
            status: 401,
            body: "invalid key".into(),
        };
        assert_eq!(err.to_string(), "API error 401: invalid key");
    }

    #[test]
    fn test_client_builds() {
        assert!(HttpTransport::new(Duration::from_secs(5)).is_ok());
    }
}
