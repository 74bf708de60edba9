//! Entity-name inflection for lexicon variants.
//!
//! Plurals follow a small fixed English rule set, with irregular forms
//! available separately; singulars use the `inflector` crate after the
//! irregular table.

use inflector::Inflector;

/// Irregular nouns common in schema names.
static IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("analysis", "analyses"),
    ("criterion", "criteria"),
    ("datum", "data"),
    ("medium", "media"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
];

/// Pluralize a word with the lexicon's naive English rules.
///
/// Words already ending in `s` are returned unchanged, a consonant followed by
/// `y` becomes `ies`, `ch`/`sh`/`x`/`z` take `es`, everything else takes `s`.
/// The result is lower-cased.
pub fn pluralize(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.is_empty() {
        return lower;
    }

    if lower.ends_with('s') {
        return lower;
    }

    if let Some(stem) = lower.strip_suffix('y') {
        let vowel_before = stem
            .chars()
            .last()
            .is_some_and(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'));
        if !vowel_before {
            return format!("{}ies", stem);
        }
    }

    if ["ch", "sh", "x", "z"].iter().any(|s| lower.ends_with(s)) {
        return format!("{}es", lower);
    }

    format!("{}s", lower)
}

/// Irregular plural of `word`, if it has one. Plurals map to themselves.
pub fn irregular_plural(word: &str) -> Option<&'static str> {
    let lower = word.to_lowercase();
    IRREGULAR_PLURALS
        .iter()
        .find(|(singular, plural)| lower == *singular || lower == *plural)
        .map(|(_, plural)| *plural)
}

/// Singularize a word, handling irregulars first then falling back to inflector.
///
/// The result is lower-cased.
pub fn singularize(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.is_empty() {
        return lower;
    }

    for (singular, plural) in IRREGULAR_PLURALS {
        if lower == *plural || lower == *singular {
            return singular.to_string();
        }
    }

    lower.to_singular()
}
