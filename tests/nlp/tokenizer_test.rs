use nlsql::nlp::tokenize;

fn toks(input: &str) -> Vec<String> {
    tokenize(input).tokens
}

#[test]
fn test_every_operator_phrase_is_atomic() {
    let phrases = [
        "greater than or equal to",
        "less than or equal to",
        "not equal to",
        "greater than",
        "less than",
        "at least",
        "no more than",
        "starts with",
        "ends with",
        "contains",
    ];

    for phrase in phrases {
        let tokens = toks(&format!("price {} 10", phrase));
        assert_eq!(tokens, vec!["price", phrase, "10"], "phrase: {}", phrase);
    }
}

#[test]
fn test_modifier_phrases_are_atomic() {
    assert_eq!(
        toks("list users order by email limit 3"),
        vec!["list", "users", "order by", "email", "limit", "3"]
    );
    assert_eq!(
        toks("Users GROUP BY status"),
        vec!["users", "group by", "status"]
    );
}

#[test]
fn test_mixed_symbols_and_phrases() {
    assert_eq!(
        toks("users where age>=18 and name starts with Jo"),
        vec!["users", "where", "age", ">=", "18", "and", "name", "starts with", "jo"]
    );
}

#[test]
fn test_whitespace_only_prompt() {
    let prompt = tokenize("\n\t  ");
    assert!(prompt.is_empty());
    assert_eq!(prompt.raw, "");
}
