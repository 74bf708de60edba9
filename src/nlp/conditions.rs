//! WHERE, ORDER BY, GROUP BY and LIMIT parsing.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{EngineError, EngineResult};
use crate::plan::{Condition, Connector, LikeAnchor, Operator, OrderBy, Predicate, SortDir, Value};
use crate::schema::{FieldType, SchemaEntity};

use super::lexicon::is_connector;
use super::operator::find_operator;
use super::resolver::Resolver;
use super::tokenizer::find_words;

const ORDER_BY: &[&[&str]] = &[&["order", "by"], &["sort", "by"]];
const GROUP_BY: &[&str] = &["group", "by"];
const LIMIT: &[&str] = &["limit"];

static NUMERIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-+]?\d+(\.\d+)?$").unwrap());

/// Largest LHS window tried when a group has no operator.
const MAX_LHS_WINDOW: usize = 3;

/// Output of the condition parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Clauses<'a> {
    pub conditions: Vec<Condition<'a>>,
    pub order_by: Option<OrderBy>,
    pub group_by: Vec<String>,
    pub limit: Option<u64>,
    /// Condition groups dropped because their field could not be resolved.
    pub unresolved: usize,
}

/// Parse the condition clause and the trailing modifiers.
///
/// The clause opens at the first connector token and runs to the earliest
/// ORDER BY / SORT BY / GROUP BY / LIMIT. Modifiers are recognized even when
/// the prompt has no connector.
pub fn parse_conditions<'a>(
    tokens: &[String],
    resolver: &Resolver<'_, 'a>,
    main_entity: &'a SchemaEntity,
) -> EngineResult<Clauses<'a>> {
    let connector = tokens.iter().position(|t| is_connector(t));
    let tail = match connector {
        Some(idx) => &tokens[idx + 1..],
        None => tokens,
    };

    let stop = modifier_start(tail).unwrap_or(tail.len());
    let clause = if connector.is_some() {
        &tail[..stop]
    } else {
        &[][..]
    };
    let modifiers = &tail[stop..];

    let parser = ConditionParser {
        resolver,
        main_entity,
    };
    let (conditions, unresolved) = parser.parse_clause(clause);

    Ok(Clauses {
        conditions,
        order_by: parser.parse_order_by(modifiers),
        group_by: parser.parse_group_by(modifiers),
        limit: parse_limit(modifiers)?,
        unresolved,
    })
}

fn modifier_start(tokens: &[String]) -> Option<usize> {
    ORDER_BY
        .iter()
        .copied()
        .chain([GROUP_BY, LIMIT])
        .filter_map(|words| find_words(tokens, words).map(|(start, _)| start))
        .min()
}

struct ConditionParser<'r, 'l, 'a> {
    resolver: &'r Resolver<'l, 'a>,
    main_entity: &'a SchemaEntity,
}

enum Part<'t> {
    Group(&'t [String]),
    Connector(Connector),
}

impl<'r, 'l, 'a> ConditionParser<'r, 'l, 'a> {
    /// Returns the condition list and the number of dropped groups.
    ///
    /// Connectors never lead, trail, or repeat in the output; a connector
    /// next to a dropped group attaches to the next resolved predicate.
    fn parse_clause(&self, clause: &[String]) -> (Vec<Condition<'a>>, usize) {
        let mut conditions: Vec<Condition<'a>> = vec![];
        let mut pending: Option<Connector> = None;
        let mut unresolved = 0;

        for part in split_connectors(clause) {
            match part {
                Part::Connector(c) => {
                    pending.get_or_insert(c);
                }
                Part::Group(group) => match self.parse_group(group) {
                    Some(predicate) => {
                        if !conditions.is_empty() {
                            conditions.push(Condition::Connector(pending.unwrap_or(Connector::And)));
                        }
                        conditions.push(Condition::Predicate(predicate));
                        pending = None;
                    }
                    None => {
                        tracing::debug!(group = %group.join(" "), "dropping unresolved condition");
                        unresolved += 1;
                    }
                },
            }
        }

        (conditions, unresolved)
    }

    fn parse_group(&self, group: &[String]) -> Option<Predicate<'a>> {
        let (field, operator, anchor, rhs) = match find_operator(group) {
            Some(span) => {
                let lhs = &group[..span.start];
                let field = self.resolver.resolve_field(lhs, Some(self.main_entity))?;
                (
                    field,
                    span.operator,
                    span.anchor,
                    &group[span.start + span.len..],
                )
            }
            None => {
                // "field value" with an implicit '='
                let widest = MAX_LHS_WINDOW.min(group.len());
                (1..=widest).rev().find_map(|w| {
                    self.resolver
                        .resolve_field(&group[..w], Some(self.main_entity))
                        .map(|field| (field, Operator::Eq, LikeAnchor::Contains, &group[w..]))
                })?
            }
        };

        let kind = field
            .entity
            .field(field.field)
            .map(|f| f.kind())
            .unwrap_or(FieldType::String);

        let value = if operator.is_list() {
            let items: Vec<String> = rhs
                .iter()
                .map(|t| unquote(t))
                .filter(|t| !t.is_empty())
                .map(|t| coerce_value(&t, kind))
                .collect();
            if items.is_empty() {
                return None;
            }
            Value::List(items)
        } else {
            let raw = unquote(&rhs.join(" "));
            if raw.is_empty() {
                if kind != FieldType::Boolean || operator != Operator::Eq {
                    return None;
                }
                Value::literal("TRUE")
            } else {
                Value::literal(coerce_value(&raw, kind))
            }
        };

        Some(Predicate {
            entity: field.entity,
            field: field.field,
            operator,
            value,
            anchor,
        })
    }

    fn parse_order_by(&self, tokens: &[String]) -> Option<OrderBy> {
        let (start, len) = ORDER_BY.iter().find_map(|words| find_words(tokens, words))?;
        let field = tokens.get(start + len)?;
        let direction = match tokens.get(start + len + 1).map(|t| t.as_str()) {
            Some("desc") | Some("descending") => SortDir::Desc,
            _ => SortDir::Asc,
        };
        Some(OrderBy {
            field: self.main_field_name(field),
            direction,
        })
    }

    fn parse_group_by(&self, tokens: &[String]) -> Vec<String> {
        find_words(tokens, GROUP_BY)
            .and_then(|(start, len)| tokens.get(start + len))
            .map(|field| vec![self.main_field_name(field)])
            .unwrap_or_default()
    }

    /// Canonical spelling when the main entity owns the field, raw token otherwise.
    fn main_field_name(&self, token: &str) -> String {
        self.main_entity
            .field(token)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| token.to_string())
    }
}

fn parse_limit(tokens: &[String]) -> EngineResult<Option<u64>> {
    let Some((start, len)) = find_words(tokens, LIMIT) else {
        return Ok(None);
    };
    match tokens.get(start + len) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|_| EngineError::Parse(format!("LIMIT expects a whole number, got '{}'", raw))),
    }
}

fn split_connectors(tokens: &[String]) -> Vec<Part<'_>> {
    let mut parts = vec![];
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        let connector = match token.as_str() {
            "and" => Connector::And,
            "or" => Connector::Or,
            _ => continue,
        };
        if i > start {
            parts.push(Part::Group(&tokens[start..i]));
        }
        parts.push(Part::Connector(connector));
        start = i + 1;
    }

    if start < tokens.len() {
        parts.push(Part::Group(&tokens[start..]));
    }
    parts
}

fn unquote(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('"').unwrap_or(trimmed);
    let trimmed = trimmed.strip_prefix('\'').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('\'').unwrap_or(trimmed);
    trimmed.to_string()
}

/// Render a literal for a field of the given type.
///
/// Booleans map `true/1/yes/y` and `false/0/no/n`; numbers that do not look
/// numeric become `0`; everything else is single-quoted.
pub fn coerce_value(raw: &str, kind: FieldType) -> String {
    match kind {
        FieldType::Boolean => match raw.to_lowercase().as_str() {
            "true" | "1" | "yes" | "y" => "TRUE".to_string(),
            "false" | "0" | "no" | "n" => "FALSE".to_string(),
            _ => crate::sql::quote::quote_string(raw),
        },
        FieldType::Number => {
            if NUMERIC.is_match(raw) {
                raw.to_string()
            } else {
                "0".to_string()
            }
        }
        _ => crate::sql::quote::quote_string(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::lexicon::Lexicon;
    use crate::nlp::tokenizer::tokenize;
    use crate::schema::Schema;

    fn schema() -> Schema {
        Schema::new(vec![
            SchemaEntity::new("User", "user")
                .with_field("name", "string")
                .with_field("age", "integer")
                .with_field("active", "boolean")
                .with_field("city", "string")
                .with_field("createdAt", "datetime"),
            SchemaEntity::new("Address", "address").with_field("zip", "string"),
        ])
    }

    fn parse<'a>(schema: &'a Schema, prompt: &str) -> EngineResult<Clauses<'a>> {
        let lexicon = Lexicon::build(schema);
        let resolver = Resolver::new(&lexicon);
        let main = schema.entity("User").unwrap();
        parse_conditions(&tokenize(prompt).tokens, &resolver, main)
    }

    fn render(clauses: &Clauses<'_>) -> Vec<String> {
        clauses
            .conditions
            .iter()
            .map(|c| match c {
                Condition::Predicate(p) => format!("{} {} {}", p.field, p.operator, p.value),
                Condition::Connector(c) => c.as_sql().to_string(),
            })
            .collect()
    }

    #[test]
    fn test_condition_round_trip() {
        let schema = schema();
        let clauses = parse(&schema, "where age > 18 and active = true").unwrap();

        assert_eq!(clauses.conditions.len(), 3);
        match &clauses.conditions[0] {
            Condition::Predicate(p) => {
                assert_eq!(p.field, "age");
                assert_eq!(p.operator, Operator::Gt);
                assert_eq!(p.value, Value::literal("18"));
            }
            other => panic!("expected predicate, got {:?}", other),
        }
        assert_eq!(clauses.conditions[1], Condition::Connector(Connector::And));
        match &clauses.conditions[2] {
            Condition::Predicate(p) => {
                assert_eq!(p.field, "active");
                assert_eq!(p.operator, Operator::Eq);
                assert_eq!(p.value, Value::literal("TRUE"));
            }
            other => panic!("expected predicate, got {:?}", other),
        }
    }

    #[test]
    fn test_natural_language_operators() {
        let schema = schema();
        let clauses = parse(
            &schema,
            "users whose age greater than or equal to 21 or name is not bob",
        )
        .unwrap();
        assert_eq!(render(&clauses), vec!["age >= 21", "OR", "name <> 'bob'"]);
    }

    #[test]
    fn test_copula_before_operator_phrase() {
        let schema = schema();

        let clauses = parse(&schema, "users whose age is greater than 18").unwrap();
        assert_eq!(render(&clauses), vec!["age > 18"]);

        let clauses = parse(&schema, "users whose age is at least 21").unwrap();
        assert_eq!(render(&clauses), vec!["age >= 21"]);

        let clauses = parse(&schema, "users whose name is like jo").unwrap();
        assert_eq!(render(&clauses), vec!["name LIKE 'jo'"]);
        assert_eq!(clauses.unresolved, 0);
    }

    #[test]
    fn test_negated_copula_before_operator_phrase() {
        let schema = schema();

        let clauses = parse(&schema, "users whose city is not in paris rome").unwrap();
        assert_eq!(render(&clauses), vec!["city NOT IN ('paris', 'rome')"]);

        let clauses = parse(&schema, "users whose age is not equal to 30").unwrap();
        assert_eq!(render(&clauses), vec!["age <> 30"]);

        let clauses = parse(&schema, "users whose name is not like spam").unwrap();
        assert_eq!(render(&clauses), vec!["name NOT LIKE 'spam'"]);
    }

    #[test]
    fn test_implicit_equality() {
        let schema = schema();
        let clauses = parse(&schema, "users with city paris").unwrap();
        assert_eq!(render(&clauses), vec!["city = 'paris'"]);
    }

    #[test]
    fn test_bare_boolean_field() {
        let schema = schema();
        let clauses = parse(&schema, "users where active").unwrap();
        assert_eq!(render(&clauses), vec!["active = TRUE"]);
    }

    #[test]
    fn test_value_coercion() {
        assert_eq!(coerce_value("yes", FieldType::Boolean), "TRUE");
        assert_eq!(coerce_value("N", FieldType::Boolean), "FALSE");
        assert_eq!(coerce_value("maybe", FieldType::Boolean), "'maybe'");
        assert_eq!(coerce_value("-3.5", FieldType::Number), "-3.5");
        assert_eq!(coerce_value("ten", FieldType::Number), "0");
        assert_eq!(coerce_value("o'brien", FieldType::String), "'o''brien'");
        assert_eq!(coerce_value("2024-01-01", FieldType::Datetime), "'2024-01-01'");
    }

    #[test]
    fn test_quoted_value_is_unwrapped() {
        let schema = schema();
        let clauses = parse(&schema, "users where name = 'Ann'").unwrap();
        assert_eq!(render(&clauses), vec!["name = 'ann'"]);
    }

    #[test]
    fn test_in_list() {
        let schema = schema();
        let clauses = parse(&schema, "users where city in paris rome").unwrap();
        assert_eq!(render(&clauses), vec!["city IN ('paris', 'rome')"]);

        let clauses = parse(&schema, "users where age not in 1 2").unwrap();
        assert_eq!(render(&clauses), vec!["age NOT IN (1, 2)"]);
    }

    #[test]
    fn test_like_anchor_is_recorded() {
        let schema = schema();
        let clauses = parse(&schema, "users where name starts with jo").unwrap();
        let predicate = clauses.conditions[0].as_predicate().unwrap();
        assert_eq!(predicate.operator, Operator::Like);
        assert_eq!(predicate.anchor, LikeAnchor::StartsWith);
        assert_eq!(predicate.value, Value::literal("'jo'"));
    }

    #[test]
    fn test_dangling_connectors_dropped() {
        let schema = schema();
        let clauses = parse(&schema, "users where and age > 3 and or").unwrap();
        assert_eq!(render(&clauses), vec!["age > 3"]);

        let clauses = parse(&schema, "users where bogus > 1 and age > 3").unwrap();
        assert_eq!(render(&clauses), vec!["age > 3"]);
        assert_eq!(clauses.unresolved, 1);

        let clauses = parse(&schema, "users where age > 3 and bogus > 1 or age < 9").unwrap();
        assert_eq!(render(&clauses), vec!["age > 3", "AND", "age < 9"]);
        assert_eq!(clauses.unresolved, 1);
    }

    #[test]
    fn test_qualified_field_in_condition() {
        let schema = schema();
        let clauses = parse(&schema, "users where address.zip = 75001").unwrap();
        let predicate = clauses.conditions[0].as_predicate().unwrap();
        assert_eq!(predicate.entity.name, "Address");
        assert_eq!(predicate.value, Value::literal("'75001'"));
    }

    #[test]
    fn test_modifiers_after_conditions() {
        let schema = schema();
        let clauses = parse(
            &schema,
            "users where age > 18 order by createdat desc limit 10",
        )
        .unwrap();

        assert_eq!(render(&clauses), vec!["age > 18"]);
        assert_eq!(
            clauses.order_by,
            Some(OrderBy {
                field: "createdAt".to_string(),
                direction: SortDir::Desc
            })
        );
        assert_eq!(clauses.limit, Some(10));
    }

    #[test]
    fn test_modifiers_without_connector() {
        let schema = schema();
        let clauses = parse(&schema, "show users group by city sort by name limit 5").unwrap();

        assert!(clauses.conditions.is_empty());
        assert_eq!(clauses.group_by, vec!["city".to_string()]);
        assert_eq!(clauses.order_by.unwrap().direction, SortDir::Asc);
        assert_eq!(clauses.limit, Some(5));
    }

    #[test]
    fn test_malformed_limit_is_a_parse_error() {
        let schema = schema();
        let err = parse(&schema, "show users limit many").unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)));
    }

    #[test]
    fn test_no_connector_no_conditions() {
        let schema = schema();
        let clauses = parse(&schema, "show users").unwrap();
        assert!(clauses.conditions.is_empty());
        assert_eq!(clauses.unresolved, 0);
        assert_eq!(clauses.limit, None);
    }
}
