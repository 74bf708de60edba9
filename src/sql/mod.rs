//! SQL generation module.
//!
//! - [`quote`] - identifier and literal quoting
//! - [`builder`] - renders a [`QueryPlan`](crate::plan::QueryPlan) as SQL text
//! - [`validate`] - sqlparser round-trip checks

pub mod builder;
pub mod quote;
pub mod validate;

pub use builder::build_sql;
pub use quote::{quote_ident, quote_string};
pub use validate::{ensure_select, validate_sql};
