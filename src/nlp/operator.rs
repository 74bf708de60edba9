//! Natural-language operator phrases.

use crate::plan::{LikeAnchor, Operator};

use super::tokenizer::match_words;

/// An operator phrase and what it normalizes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorPhrase {
    pub words: &'static [&'static str],
    pub operator: Operator,
    pub anchor: LikeAnchor,
}

const fn op(words: &'static [&'static str], operator: Operator) -> OperatorPhrase {
    OperatorPhrase {
        words,
        operator,
        anchor: LikeAnchor::Contains,
    }
}

const fn like(words: &'static [&'static str], anchor: LikeAnchor) -> OperatorPhrase {
    OperatorPhrase {
        words,
        operator: Operator::Like,
        anchor,
    }
}

/// Operator table, compound phrases before their prefixes.
pub static OPERATOR_PHRASES: &[OperatorPhrase] = &[
    op(&["greater", "than", "or", "equal", "to"], Operator::Gte),
    op(&["less", "than", "or", "equal", "to"], Operator::Lte),
    op(&["not", "equal", "to"], Operator::Ne),
    op(&["no", "more", "than"], Operator::Lte),
    op(&["greater", "than"], Operator::Gt),
    op(&["more", "than"], Operator::Gt),
    op(&["less", "than"], Operator::Lt),
    op(&["at", "least"], Operator::Gte),
    like(&["starts", "with"], LikeAnchor::StartsWith),
    like(&["ends", "with"], LikeAnchor::EndsWith),
    op(&["equal", "to"], Operator::Eq),
    op(&["is", "not"], Operator::Ne),
    op(&["not", "in"], Operator::NotIn),
    OperatorPhrase {
        words: &["not", "like"],
        operator: Operator::NotLike,
        anchor: LikeAnchor::Contains,
    },
    like(&["like"], LikeAnchor::Contains),
    like(&["contains"], LikeAnchor::Contains),
    like(&["containing"], LikeAnchor::Contains),
    op(&["in"], Operator::In),
    op(&["is"], Operator::Eq),
    op(&["over"], Operator::Gt),
    op(&["under"], Operator::Lt),
    op(&[">="], Operator::Gte),
    op(&["<="], Operator::Lte),
    op(&["<>"], Operator::Ne),
    op(&["!="], Operator::Ne),
    op(&[">"], Operator::Gt),
    op(&["<"], Operator::Lt),
    op(&["="], Operator::Eq),
];

/// Located operator inside a condition group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorSpan {
    pub operator: Operator,
    pub anchor: LikeAnchor,
    /// Index of the first token of the operator.
    pub start: usize,
    /// Number of tokens the operator covers.
    pub len: usize,
}

/// Find the earliest operator in `tokens`; at the same position the phrase
/// with the most words wins.
///
/// A copula (`is`, `is not`) directly followed by another operator phrase
/// takes that phrase's meaning, negated after `is not`: "is greater than"
/// is `>`, "is not in" is `NOT IN`.
pub fn find_operator(tokens: &[String]) -> Option<OperatorSpan> {
    let (start, (phrase, len)) =
        (0..tokens.len()).find_map(|start| longest_at(tokens, start).map(|m| (start, m)))?;

    let mut span = OperatorSpan {
        operator: phrase.operator,
        anchor: phrase.anchor,
        start,
        len,
    };

    let negate = match phrase.words {
        ["is"] => false,
        ["is", "not"] => true,
        _ => return Some(span),
    };
    if let Some((next, next_len)) = longest_at(tokens, start + len) {
        span.operator = if negate {
            next.operator.negated()
        } else {
            next.operator
        };
        span.anchor = next.anchor;
        span.len += next_len;
    }

    Some(span)
}

/// The phrase with the most words matching at `start`, and the tokens it covers.
fn longest_at(tokens: &[String], start: usize) -> Option<(&'static OperatorPhrase, usize)> {
    let mut best: Option<(&'static OperatorPhrase, usize)> = None;
    for phrase in OPERATOR_PHRASES {
        let Some(len) = match_words(tokens, start, phrase.words) else {
            continue;
        };
        if best.map_or(true, |(b, _)| phrase.words.len() > b.words.len()) {
            best = Some((phrase, len));
        }
    }
    best
}
