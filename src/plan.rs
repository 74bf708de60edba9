//! Query plan produced by the parsers and consumed by the SQL builder.

use std::fmt;

use crate::schema::SchemaEntity;

/// Normalized comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    Like,
    NotLike,
    In,
    NotIn,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "<>",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }

    pub fn is_like(&self) -> bool {
        matches!(self, Operator::Like | Operator::NotLike)
    }

    /// The operator matching exactly the rows this one rejects.
    pub fn negated(&self) -> Operator {
        match self {
            Operator::Eq => Operator::Ne,
            Operator::Ne => Operator::Eq,
            Operator::Gt => Operator::Lte,
            Operator::Lt => Operator::Gte,
            Operator::Gte => Operator::Lt,
            Operator::Lte => Operator::Gt,
            Operator::Like => Operator::NotLike,
            Operator::NotLike => Operator::Like,
            Operator::In => Operator::NotIn,
            Operator::NotIn => Operator::In,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Where the `%` wildcard goes for a LIKE predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LikeAnchor {
    #[default]
    Contains,
    StartsWith,
    EndsWith,
}

impl LikeAnchor {
    /// Wrap an unquoted value in wildcards.
    pub fn apply(&self, value: &str) -> String {
        match self {
            LikeAnchor::Contains => format!("%{}%", value),
            LikeAnchor::StartsWith => format!("{}%", value),
            LikeAnchor::EndsWith => format!("%{}", value),
        }
    }
}

/// A resolved `(entity, field)` reference. `field` is `*` for a wildcard
/// projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRef<'a> {
    pub entity: &'a SchemaEntity,
    pub field: &'a str,
}

impl<'a> FieldRef<'a> {
    pub fn new(entity: &'a SchemaEntity, field: &'a str) -> Self {
        Self { entity, field }
    }

    pub fn star(entity: &'a SchemaEntity) -> Self {
        Self { entity, field: "*" }
    }

    pub fn is_star(&self) -> bool {
        self.field == "*"
    }

    /// Same entity and same field, compared by entity identity.
    pub fn same_as(&self, other: &FieldRef<'_>) -> bool {
        self.entity.id() == other.entity.id() && self.field == other.field
    }
}

/// Right-hand side of a predicate, already rendered as SQL literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Literal(String),
    List(Vec<String>),
}

impl Value {
    pub fn literal(value: impl Into<String>) -> Self {
        Value::Literal(value.into())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Literal(v) => f.write_str(v),
            Value::List(items) => write!(f, "({})", items.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate<'a> {
    pub entity: &'a SchemaEntity,
    pub field: &'a str,
    pub operator: Operator,
    pub value: Value,
    /// Wildcard placement, only meaningful for LIKE.
    pub anchor: LikeAnchor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

/// One entry of the WHERE list: a predicate or a connector between two
/// predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition<'a> {
    Predicate(Predicate<'a>),
    Connector(Connector),
}

impl<'a> Condition<'a> {
    pub fn as_predicate(&self) -> Option<&Predicate<'a>> {
        match self {
            Condition::Predicate(p) => Some(p),
            Condition::Connector(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// ORDER BY target; the field is qualified with the main entity's alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDir,
}

/// Everything the SQL builder needs, built once per request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan<'a> {
    pub main_entity: &'a SchemaEntity,
    pub select_fields: Vec<FieldRef<'a>>,
    pub conditions: Vec<Condition<'a>>,
    pub order_by: Option<OrderBy>,
    pub group_by: Vec<String>,
    pub limit: Option<u64>,
    /// Condition groups that could not be resolved and were dropped.
    pub unresolved_conditions: usize,
}

impl<'a> QueryPlan<'a> {
    pub fn new(main_entity: &'a SchemaEntity) -> Self {
        Self {
            main_entity,
            select_fields: vec![],
            conditions: vec![],
            order_by: None,
            group_by: vec![],
            limit: None,
            unresolved_conditions: 0,
        }
    }

    pub fn predicates(&self) -> impl Iterator<Item = &Predicate<'a>> {
        self.conditions.iter().filter_map(|c| c.as_predicate())
    }

    /// Main entity, then select entities, then predicate entities, each once.
    pub fn required_entities(&self) -> Vec<&'a SchemaEntity> {
        let mut required: Vec<&'a SchemaEntity> = vec![self.main_entity];
        let candidates = self
            .select_fields
            .iter()
            .map(|f| f.entity)
            .chain(self.predicates().map(|p| p.entity));

        for entity in candidates {
            if !required.iter().any(|e| e.id() == entity.id()) {
                required.push(entity);
            }
        }
        required
    }
}
