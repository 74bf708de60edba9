//! Local, rule-based translation from natural language to SQL.
//!
//! ```text
//! Prompt → Tokenize → Select/Conditions → QueryPlan → Join Paths → SQL
//! ```
//!
//! # Example
//!
//! ```ignore
//! use nlsql::engine::LocalGenerator;
//! use nlsql::schema::{Schema, SchemaEntity};
//!
//! let schema = Schema::new(vec![
//!     SchemaEntity::new("User", "user").with_field("email", "string"),
//! ]);
//!
//! let result = LocalGenerator::new().translate("show users with email containing gmail", &schema);
//! println!("{}", result.sql().unwrap_or_default());
//! ```

use async_trait::async_trait;

use crate::error::{EngineError, EngineResult};
use crate::generator::SqlGenerator;
use crate::graph::{format_path, Path, SchemaGraph, DEFAULT_MAX_DEPTH};
use crate::nlp::{parse_conditions, parse_select, tokenize, Lexicon, Resolver};
use crate::plan::QueryPlan;
use crate::result::{CostEstimate, Translation, TranslationFailure, TranslationResult};
use crate::schema::Schema;
use crate::sql::build_sql;

// ============================================================================
// Constants
// ============================================================================

pub const LOCAL_MODEL_NAME: &str = "local-rule-based";
pub const LOCAL_PROVIDER: &str = "local";

/// Entity names offered when no main entity is found.
const MAX_SUGGESTIONS: usize = 5;

const BASE_CONFIDENCE: f64 = 0.7;
const CONDITION_BONUS: f64 = 0.1;
const FIELD_BONUS: f64 = 0.1;
const MAX_CONFIDENCE: f64 = 0.95;
const UNRESOLVED_PENALTY: f64 = 0.2;

// ============================================================================
// Generator
// ============================================================================

/// The rule-based generator. Stateless apart from the path depth bound, so
/// one instance can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct LocalGenerator {
    max_depth: usize,
}

impl Default for LocalGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalGenerator {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Bound join-path search to `max_depth` hops.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Translate a prompt, converting pipeline errors into a failure result.
    pub fn translate(&self, prompt: &str, schema: &Schema) -> TranslationResult {
        match self.run(prompt, schema) {
            Ok(translation) => TranslationResult::Success(translation),
            Err(e) => {
                tracing::debug!(error = %e, "local translation failed");
                TranslationFailure::new(e.kind(), e.to_string(), LOCAL_PROVIDER)
                    .with_suggestions(e.suggestions())
                    .into()
            }
        }
    }

    fn run(&self, prompt: &str, schema: &Schema) -> EngineResult<Translation> {
        let lexicon = Lexicon::build(schema);
        let resolver = Resolver::new(&lexicon);
        let tokens = tokenize(prompt).tokens;

        let plan = build_plan(&tokens, &resolver, schema)?;

        let graph = SchemaGraph::with_max_depth(schema, self.max_depth);
        let paths = join_paths(&graph, &plan)?;
        let sql = build_sql(&plan, &paths);

        let mut entities = vec![plan.main_entity.name.clone()];
        for field in &plan.select_fields {
            if !entities.contains(&field.entity.name) {
                entities.push(field.entity.name.clone());
            }
        }

        let mut translation = Translation::new(sql, confidence(&plan), LOCAL_PROVIDER);
        translation.explanation = explain(&plan);
        translation.entities = entities;
        translation.paths = paths.iter().map(format_path).collect();
        Ok(translation)
    }
}

#[async_trait]
impl SqlGenerator for LocalGenerator {
    async fn generate(&self, prompt: &str, schema: &Schema) -> TranslationResult {
        self.translate(prompt, schema)
    }

    fn estimate_cost(&self, _prompt: &str) -> CostEstimate {
        CostEstimate {
            amount: 0.0,
            currency: "USD".to_string(),
            model: LOCAL_MODEL_NAME.to_string(),
            estimated_input_tokens: 0,
            estimated_output_tokens: 0,
        }
    }

    fn is_available(&self) -> bool {
        true
    }

    fn model_name(&self) -> String {
        LOCAL_MODEL_NAME.to_string()
    }
}

// ============================================================================
// Pipeline stages
// ============================================================================

fn build_plan<'a>(
    tokens: &[String],
    resolver: &Resolver<'_, 'a>,
    schema: &'a Schema,
) -> EngineResult<QueryPlan<'a>> {
    let selection = parse_select(tokens, resolver);
    let Some(main_entity) = selection.main_entity else {
        return Err(EngineError::EntityNotFound {
            suggestions: schema
                .entities
                .iter()
                .take(MAX_SUGGESTIONS)
                .map(|e| e.name.clone())
                .collect(),
        });
    };

    let clauses = parse_conditions(tokens, resolver, main_entity)?;

    let mut plan = QueryPlan::new(main_entity);
    plan.select_fields = selection.select_fields;
    plan.conditions = clauses.conditions;
    plan.order_by = clauses.order_by;
    plan.group_by = clauses.group_by;
    plan.limit = clauses.limit;
    plan.unresolved_conditions = clauses.unresolved;
    Ok(plan)
}

/// Shortest path from the main entity to every other required entity.
fn join_paths<'a>(graph: &SchemaGraph<'a>, plan: &QueryPlan<'a>) -> EngineResult<Vec<Path<'a>>> {
    let main = plan.main_entity;
    plan.required_entities()
        .into_iter()
        .filter(|e| e.id() != main.id())
        .map(|target| {
            graph
                .shortest_path(main, target)
                .ok_or_else(|| EngineError::NoPath {
                    from: main.name.clone(),
                    to: target.name.clone(),
                    max_depth: graph.max_depth(),
                })
        })
        .collect()
}

/// Heuristic score: a base of 0.7, raised by conditions and explicit fields,
/// lowered for every condition group that had to be dropped.
fn confidence(plan: &QueryPlan<'_>) -> f64 {
    let mut score = BASE_CONFIDENCE;
    if !plan.conditions.is_empty() {
        score += CONDITION_BONUS;
    }
    if plan.select_fields.first().is_some_and(|f| !f.is_star()) {
        score += FIELD_BONUS;
    }
    score = score.min(MAX_CONFIDENCE);
    score -= UNRESOLVED_PENALTY * plan.unresolved_conditions as f64;
    score.clamp(0.0, 1.0)
}

fn explain(plan: &QueryPlan<'_>) -> String {
    let selected: Vec<String> = plan
        .select_fields
        .iter()
        .map(|f| format!("{}.{}", f.entity.name, f.field))
        .collect();

    let mut text = if selected.is_empty() {
        format!("This query retrieves {} records", plan.main_entity.name)
    } else {
        format!("This query retrieves {}", selected.join(", "))
    };

    let predicates: Vec<String> = plan
        .predicates()
        .map(|p| format!("{}.{} {} {}", p.entity.name, p.field, p.operator, p.value))
        .collect();
    if !predicates.is_empty() {
        text.push_str(" where ");
        text.push_str(&predicates.join(" and "));
    }

    if let Some(limit) = plan.limit {
        text.push_str(&format!(", limited to {} results", limit));
    }
    text.push('.');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ErrorKind;
    use crate::schema::{Relation, RelationKind, SchemaEntity};

    fn shop() -> Schema {
        Schema::new(vec![
            SchemaEntity::new("Customer", "customer")
                .with_field("id", "integer")
                .with_field("name", "string")
                .with_field("vip", "boolean"),
            SchemaEntity::new("Order", "order")
                .with_field("id", "integer")
                .with_field("total", "decimal")
                .with_relation(Relation::new("customer", "Customer", RelationKind::ManyToOne)),
            SchemaEntity::new("Warehouse", "warehouse").with_field("city", "string"),
        ])
    }

    fn success(result: TranslationResult) -> Translation {
        match result {
            TranslationResult::Success(t) => t,
            TranslationResult::Failure(f) => panic!("expected success, got {:?}", f),
        }
    }

    fn failure(result: TranslationResult) -> TranslationFailure {
        match result {
            TranslationResult::Failure(f) => f,
            TranslationResult::Success(t) => panic!("expected failure, got {:?}", t),
        }
    }

    #[test]
    fn test_join_through_relation() {
        let schema = shop();
        let t = success(LocalGenerator::new().translate(
            "list orders where name of customer = Alice order by total desc limit 5",
            &schema,
        ));

        assert_eq!(
            t.sql,
            "SELECT c.name, o.total\nFROM \"order\" o\nINNER JOIN customer c ON o.customer_id = c.id\n\
             WHERE\n  c.name = 'alice'\nORDER BY o.total DESC\nLIMIT 5"
        );
        assert_eq!(t.paths, vec!["Order → Customer"]);
        assert_eq!(t.entities, vec!["Order", "Customer"]);
        assert_eq!(
            t.explanation,
            "This query retrieves Customer.name, Order.total where Customer.name = 'alice', \
             limited to 5 results."
        );
        assert!((t.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_copula_comparison_keeps_its_operator() {
        let schema = shop();
        let t = success(LocalGenerator::new().translate(
            "show orders whose total is greater than 100",
            &schema,
        ));

        assert!(t.sql.ends_with("WHERE\n  o.total > 100"), "{}", t.sql);

        let t = success(LocalGenerator::new().translate(
            "show customers whose name is not like bot",
            &schema,
        ));
        assert!(t.sql.ends_with("c.name NOT LIKE '%bot%'"), "{}", t.sql);
    }

    #[test]
    fn test_entity_not_found_suggests_names() {
        let schema = shop();
        let f = failure(LocalGenerator::new().translate("show me something nice", &schema));

        assert_eq!(f.error, ErrorKind::EntityNotFound);
        assert_eq!(f.provider, "local");
        assert_eq!(f.suggestions, vec!["Customer", "Order", "Warehouse"]);
        assert!(f.message.starts_with("Could not identify the main entity"));
    }

    #[test]
    fn test_disconnected_entities_fail_with_no_path() {
        let schema = shop();
        let f = failure(LocalGenerator::new().translate("show orders where city = Paris", &schema));

        assert_eq!(f.error, ErrorKind::NoPathFound);
        assert!(f.suggestions[0].contains("Order"));
        assert!(f.suggestions[0].contains("Warehouse"));
    }

    #[test]
    fn test_malformed_limit_is_parser_error() {
        let schema = shop();
        let f = failure(LocalGenerator::new().translate("show customers limit ten", &schema));

        assert_eq!(f.error, ErrorKind::ParserError);
        assert!(f.message.starts_with("Error parsing query:"));
    }

    #[test]
    fn test_unresolved_conditions_lower_confidence() {
        let schema = shop();
        let t = success(LocalGenerator::new().translate(
            "show customers where vip and colour = red",
            &schema,
        ));

        assert!(t.sql.contains("c.vip = TRUE"));
        assert!(!t.sql.contains("colour"));
        // 0.9 before the dropped group's penalty
        assert!((t.confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_depth_bound_is_respected() {
        let schema = shop();
        let f = failure(
            LocalGenerator::new()
                .with_max_depth(0)
                .translate("show orders where name of customer = Bob", &schema),
        );
        assert_eq!(f.error, ErrorKind::NoPathFound);
    }

    #[tokio::test]
    async fn test_generator_trait() {
        let schema = shop();
        let local = LocalGenerator::new();

        assert!(local.is_available());
        assert_eq!(local.model_name(), "local-rule-based");
        assert_eq!(local.estimate_cost("anything").amount, 0.0);
        assert!(local.generate("show customers", &schema).await.is_success());
    }
}
