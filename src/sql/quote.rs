//! Identifier and string literal quoting.

/// Words that must be quoted when used as identifiers.
const RESERVED: &[&str] = &[
    "user", "order", "group", "select", "from", "where", "limit", "table",
];

/// Does the identifier need double quotes?
pub fn needs_quoting(ident: &str) -> bool {
    ident.is_empty()
        || !ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        || RESERVED.iter().any(|w| w.eq_ignore_ascii_case(ident))
}

/// Quote an identifier with double quotes (ANSI style) when required.
pub fn quote_ident(ident: &str) -> String {
    if needs_quoting(ident) {
        quote_double(ident)
    } else {
        ident.to_string()
    }
}

/// Unconditionally double-quote an identifier.
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a string with single quotes (standard SQL).
pub fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
