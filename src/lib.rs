//! # nlsql
//!
//! Schema-aware translation of natural-language requests into SQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Orchestrator (strategy)                 │
//! │          local │ ai │ hybrid, with a cost guard          │
//! └─────────────────────────────────────────────────────────┘
//!            │                                │
//!            ▼ [engine]                       ▼ [ai]
//! ┌───────────────────────────┐  ┌───────────────────────────┐
//! │ tokenize → select/where   │  │ prompt → provider request │
//! │ → QueryPlan → join paths  │  │ → JSON reply → validated  │
//! │ → SQL                     │  │   SELECT                  │
//! └───────────────────────────┘  └───────────────────────────┘
//!            │                                │
//!            └──────────────┬─────────────────┘
//!                           ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │          TranslationResult (success │ failure)           │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod ai;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod graph;
pub mod nlp;
pub mod orchestrator;
pub mod plan;
pub mod result;
pub mod schema;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::engine::LocalGenerator;
    pub use crate::generator::SqlGenerator;
    pub use crate::orchestrator::{Orchestrator, Strategy};
    pub use crate::result::{ErrorKind, Translation, TranslationFailure, TranslationResult};
    pub use crate::schema::{Field, Relation, RelationKind, Schema, SchemaEntity};
}

pub use engine::LocalGenerator;
pub use orchestrator::{Orchestrator, Strategy};
pub use result::TranslationResult;
pub use schema::Schema;
