//! Error type for the translation pipeline.
//!
//! Pipeline stages return [`EngineResult`]; the local generator turns these
//! into failure results at the public boundary.

use crate::result::ErrorKind;

/// Errors raised while translating a prompt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Could not identify the main entity in your query. Try mentioning an entity name explicitly.")]
    EntityNotFound { suggestions: Vec<String> },

    #[error("No relation path from {from} to {to} within {max_depth} hops")]
    NoPath {
        from: String,
        to: String,
        max_depth: usize,
    },

    #[error("Error parsing query: {0}")]
    Parse(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::EntityNotFound { .. } => ErrorKind::EntityNotFound,
            EngineError::NoPath { .. } => ErrorKind::NoPathFound,
            EngineError::Parse(_) => ErrorKind::ParserError,
        }
    }

    pub fn suggestions(&self) -> Vec<String> {
        match self {
            EngineError::EntityNotFound { suggestions } => suggestions.clone(),
            EngineError::NoPath { from, to, .. } => vec![
                format!("Add a relation between {} and {}", from, to),
                "Rephrase the request to mention directly related entities".to_string(),
            ],
            EngineError::Parse(_) => vec![],
        }
    }
}
