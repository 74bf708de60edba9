//! Translation results, error kinds and cost records.
//!
//! A [`TranslationResult`] is either a [`Translation`] or a
//! [`TranslationFailure`]; the flat JSON shape consumers expect is produced by
//! [`TranslationResult::to_json`].

use std::fmt;

use serde::{Serialize, Serializer};

/// Machine-readable failure category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    EntityNotFound,
    NoPathFound,
    ParserError,
    AiNotConfigured,
    /// A specific provider has no usable credentials (`OPENAI_NOT_CONFIGURED`).
    NotConfigured(String),
    CostExceeded,
    /// A provider call failed or returned unusable output (`OPENAI_ERROR`).
    Provider(String),
    FeatureDisabled,
}

impl ErrorKind {
    pub fn code(&self) -> String {
        match self {
            ErrorKind::EntityNotFound => "ENTITY_NOT_FOUND".to_string(),
            ErrorKind::NoPathFound => "NO_PATH_FOUND".to_string(),
            ErrorKind::ParserError => "PARSER_ERROR".to_string(),
            ErrorKind::AiNotConfigured => "AI_NOT_CONFIGURED".to_string(),
            ErrorKind::NotConfigured(p) => format!("{}_NOT_CONFIGURED", p.to_uppercase()),
            ErrorKind::CostExceeded => "COST_EXCEEDED".to_string(),
            ErrorKind::Provider(p) => format!("{}_ERROR", p.to_uppercase()),
            ErrorKind::FeatureDisabled => "FEATURE_DISABLED".to_string(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code())
    }
}

/// Pre-call cost estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    pub amount: f64,
    pub currency: String,
    pub model: String,
    pub estimated_input_tokens: u64,
    pub estimated_output_tokens: u64,
}

/// Estimated and provider-reported cost of one generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostInfo {
    pub estimated: f64,
    pub actual: f64,
    pub currency: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

/// A successful translation.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub sql: String,
    pub confidence: f64,
    pub explanation: String,
    pub entities: Vec<String>,
    pub paths: Vec<String>,
    pub provider: String,
    pub cost: Option<CostInfo>,
    pub warnings: Vec<String>,
}

impl Translation {
    pub fn new(sql: impl Into<String>, confidence: f64, provider: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            confidence: confidence.clamp(0.0, 1.0),
            explanation: String::new(),
            entities: vec![],
            paths: vec![],
            provider: provider.into(),
            cost: None,
            warnings: vec![],
        }
    }
}

/// A failed translation.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationFailure {
    pub error: ErrorKind,
    pub message: String,
    pub suggestions: Vec<String>,
    pub provider: String,
    pub warnings: Vec<String>,
}

impl TranslationFailure {
    pub fn new(error: ErrorKind, message: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            error,
            message: message.into(),
            suggestions: vec![],
            provider: provider.into(),
            warnings: vec![],
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TranslationResult {
    Success(Translation),
    Failure(TranslationFailure),
}

#[derive(Serialize)]
struct ResultView<'r> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    sql: Option<&'r str>,
    confidence: f64,
    explanation: &'r str,
    entities: &'r [String],
    paths: &'r [String],
    provider: &'r str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cost: Option<&'r CostInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'r ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'r str>,
    suggestions: &'r [String],
    warnings: &'r [String],
}

impl TranslationResult {
    pub fn failure(error: ErrorKind, message: impl Into<String>, provider: impl Into<String>) -> Self {
        TranslationResult::Failure(TranslationFailure::new(error, message, provider))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TranslationResult::Success(_))
    }

    /// Confidence of a success; failures score 0.
    pub fn confidence(&self) -> f64 {
        match self {
            TranslationResult::Success(t) => t.confidence,
            TranslationResult::Failure(_) => 0.0,
        }
    }

    pub fn sql(&self) -> Option<&str> {
        match self {
            TranslationResult::Success(t) => Some(&t.sql),
            TranslationResult::Failure(_) => None,
        }
    }

    pub fn provider(&self) -> &str {
        match self {
            TranslationResult::Success(t) => &t.provider,
            TranslationResult::Failure(f) => &f.provider,
        }
    }

    pub fn error(&self) -> Option<&ErrorKind> {
        match self {
            TranslationResult::Success(_) => None,
            TranslationResult::Failure(f) => Some(&f.error),
        }
    }

    pub fn cost(&self) -> Option<&CostInfo> {
        match self {
            TranslationResult::Success(t) => t.cost.as_ref(),
            TranslationResult::Failure(_) => None,
        }
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            TranslationResult::Success(t) => &t.warnings,
            TranslationResult::Failure(f) => &f.warnings,
        }
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        match self {
            TranslationResult::Success(t) => t.warnings.push(warning.into()),
            TranslationResult::Failure(f) => f.warnings.push(warning.into()),
        }
    }

    /// Flat JSON object: `success`, `sql`, `confidence`, `explanation`,
    /// `entities`, `paths`, `provider`, then `cost` on success or
    /// `error`/`message` on failure, plus `suggestions` and `warnings`.
    pub fn to_json(&self) -> serde_json::Value {
        let view = match self {
            TranslationResult::Success(t) => ResultView {
                success: true,
                sql: Some(&t.sql),
                confidence: t.confidence,
                explanation: &t.explanation,
                entities: &t.entities,
                paths: &t.paths,
                provider: &t.provider,
                cost: t.cost.as_ref(),
                error: None,
                message: None,
                suggestions: &[],
                warnings: &t.warnings,
            },
            TranslationResult::Failure(f) => ResultView {
                success: false,
                sql: None,
                confidence: 0.0,
                explanation: "",
                entities: &[],
                paths: &[],
                provider: &f.provider,
                cost: None,
                error: Some(&f.error),
                message: Some(&f.message),
                suggestions: &f.suggestions,
                warnings: &f.warnings,
            },
        };
        serde_json::to_value(view).unwrap_or_default()
    }
}

impl From<Translation> for TranslationResult {
    fn from(t: Translation) -> Self {
        TranslationResult::Success(t)
    }
}

impl From<TranslationFailure> for TranslationResult {
    fn from(f: TranslationFailure) -> Self {
        TranslationResult::Failure(f)
    }
}
