//! SQL validation using sqlparser-rs.
//!
//! Generated SQL is checked for syntax, and SQL returned by a remote model
//! must additionally be a single read-only query.

use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// Parse `sql` and return the statements, or the parser's message.
pub fn validate_sql(sql: &str) -> Result<Vec<Statement>, String> {
    Parser::parse_sql(&GenericDialect {}, sql).map_err(|e| format!("Invalid SQL: {}\nSQL: {}", e, sql))
}

/// Accept exactly one SELECT (query) statement.
pub fn ensure_select(sql: &str) -> Result<(), String> {
    let statements = validate_sql(sql)?;
    match statements.as_slice() {
        [Statement::Query(_)] => Ok(()),
        [] => Err("SQL is empty".to_string()),
        [_] => Err("Only SELECT queries are allowed".to_string()),
        _ => Err(format!("Expected a single statement, found {}", statements.len())),
    }
}
