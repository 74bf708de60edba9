//! Phrase-aware tokenizer.
//!
//! Known multi-word phrases ("greater than or equal to", "order by", ...)
//! come out as single tokens with internal spaces, so downstream parsers can
//! match them without re-assembling words.

use std::sync::LazyLock;

use regex::Regex;

/// Phrases kept atomic by the tokenizer.
pub const PHRASES: &[&str] = &[
    // connectors
    "where",
    "with",
    "when",
    "whose",
    "for",
    "having",
    // clause modifiers
    "order by",
    "sort by",
    "group by",
    "limit",
    // operators
    "greater than or equal to",
    "less than or equal to",
    "not equal to",
    "greater than",
    "more than",
    "less than",
    "at least",
    "no more than",
    "starts with",
    "ends with",
    "equal to",
    "like",
    "contains",
    // field qualification
    "of",
];

/// Joins the words of a protected phrase while the input is split.
const JOINER: char = '\u{1f}';

/// Characters dropped from every token.
const PUNCTUATION: &[char] = &['"', ',', ';', '(', ')', '!', '?'];

/// Symbolic comparison operators, longest first.
const SYMBOLS: &[&str] = &[">=", "<=", "<>", "!=", ">", "<", "="];

/// Phrase patterns, longest phrase first so compound operators are
/// protected before their prefixes.
static PHRASE_PATTERNS: LazyLock<Vec<(Regex, String)>> = LazyLock::new(|| {
    let mut phrases: Vec<&str> = PHRASES.to_vec();
    phrases.sort_by(|a, b| b.len().cmp(&a.len()));
    phrases
        .into_iter()
        .filter_map(|phrase| {
            let pattern = format!(r"\b{}\b", regex::escape(phrase));
            let joined = phrase.replace(' ', &JOINER.to_string());
            Regex::new(&pattern).ok().map(|re| (re, joined))
        })
        .collect()
});

static SYMBOL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">=|<=|<>|!=|>|<|=").unwrap());

/// Result of tokenizing a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedPrompt {
    /// The trimmed input, original casing.
    pub raw: String,
    /// Lower-cased tokens; phrase tokens contain spaces.
    pub tokens: Vec<String>,
}

impl TokenizedPrompt {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Split a prompt into lower-cased tokens.
///
/// Empty or whitespace-only input yields an empty token list.
pub fn tokenize(input: &str) -> TokenizedPrompt {
    let raw = input.trim().to_string();
    if raw.is_empty() {
        return TokenizedPrompt { raw, tokens: vec![] };
    }

    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| *c != JOINER)
        .collect();
    let mut text = format!(" {} ", SYMBOL_PATTERN.replace_all(&cleaned, " $0 "));

    for (pattern, joined) in PHRASE_PATTERNS.iter() {
        text = pattern.replace_all(&text, joined.as_str()).into_owned();
    }

    let tokens = text
        .split_whitespace()
        .filter_map(clean_token)
        .map(|t| t.replace(JOINER, " "))
        .collect();

    TokenizedPrompt { raw, tokens }
}

fn clean_token(token: &str) -> Option<String> {
    if SYMBOLS.contains(&token) {
        return Some(token.to_string());
    }

    let stripped: String = token.chars().filter(|c| !PUNCTUATION.contains(c)).collect();
    let trimmed = stripped.trim_end_matches('.');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Match `words` against the tokens starting at `start`, consuming whole
/// tokens. Returns the number of tokens consumed.
///
/// A phrase token such as `"order by"` matches the words `["order", "by"]`
/// in one token, and so do the two tokens `"order"`, `"by"`.
pub fn match_words(tokens: &[String], start: usize, words: &[&str]) -> Option<usize> {
    let mut matched = 0;
    let mut consumed = 0;

    for token in tokens.iter().skip(start) {
        for word in token.split(' ').filter(|w| !w.is_empty()) {
            if matched >= words.len() || word != words[matched] {
                return None;
            }
            matched += 1;
        }
        consumed += 1;
        if matched == words.len() {
            return Some(consumed);
        }
    }

    None
}

/// Index of the first token position where `words` matches.
pub fn find_words(tokens: &[String], words: &[&str]) -> Option<(usize, usize)> {
    (0..tokens.len()).find_map(|i| match_words(tokens, i, words).map(|len| (i, len)))
}
