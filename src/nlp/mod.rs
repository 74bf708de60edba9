//! Natural-language front end: tokenizer, lexicon, resolver and parsers.
//!
//! ```text
//! prompt → tokenize → parse_select ─┐
//!                   → parse_conditions ─→ QueryPlan
//! ```

pub mod conditions;
pub mod lexicon;
pub mod operator;
pub mod resolver;
pub mod select;
pub mod tokenizer;

pub use conditions::{parse_conditions, Clauses};
pub use lexicon::Lexicon;
pub use resolver::Resolver;
pub use select::{parse_select, Selection};
pub use tokenizer::{tokenize, TokenizedPrompt};
