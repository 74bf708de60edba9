//! SQL text rendering for a resolved [`QueryPlan`].
//!
//! Clause order is fixed: SELECT, FROM, INNER JOIN(s), WHERE, GROUP BY,
//! ORDER BY, LIMIT. Each clause starts on its own line and WHERE puts every
//! predicate and connector on a separate line.

use std::collections::HashSet;

use crate::graph::Path;
use crate::plan::{Condition, LikeAnchor, Predicate, QueryPlan, Value};
use crate::schema::{Relation, RelationKind, SchemaEntity};

use super::quote::quote_ident;

/// Render `plan` joined along `paths`.
///
/// `paths` should hold one path from the main entity to each other required
/// entity. Chains with the same entity sequence are emitted once, and an
/// entity that is already joined is never joined again.
pub fn build_sql(plan: &QueryPlan<'_>, paths: &[Path<'_>]) -> String {
    let main = plan.main_entity;
    let chains = dedup_chains(paths);

    let mut aliases = Aliases::default();
    aliases.assign(main);
    for path in &chains {
        for entity in &path.entities {
            aliases.assign(entity);
        }
    }
    for entity in plan.required_entities() {
        aliases.assign(entity);
    }

    let mut lines = vec![
        format!("SELECT {}", render_projection(plan, &aliases)),
        format!("FROM {} {}", quote_ident(&main.table()), aliases.of(main)),
    ];
    lines.extend(render_joins(main, &chains, &aliases));

    if !plan.conditions.is_empty() {
        lines.push("WHERE".to_string());
        for condition in &plan.conditions {
            lines.push(match condition {
                Condition::Connector(c) => c.as_sql().to_string(),
                Condition::Predicate(p) => format!("  {}", render_predicate(p, &aliases)),
            });
        }
    }

    let main_alias = aliases.of(main);
    if !plan.group_by.is_empty() {
        let fields: Vec<String> = plan
            .group_by
            .iter()
            .map(|f| format!("{}.{}", main_alias, quote_ident(f)))
            .collect();
        lines.push(format!("GROUP BY {}", fields.join(", ")));
    }
    if let Some(order) = &plan.order_by {
        lines.push(format!(
            "ORDER BY {}.{} {}",
            main_alias,
            quote_ident(&order.field),
            order.direction.as_sql()
        ));
    }
    if let Some(limit) = plan.limit {
        lines.push(format!("LIMIT {}", limit));
    }

    lines.join("\n")
}

/// Table aliases keyed by entity id, first letter based with numeric
/// suffixes on collision (`u`, `u2`, `u3`).
#[derive(Debug, Default)]
struct Aliases {
    assigned: Vec<(String, String)>,
}

impl Aliases {
    fn assign(&mut self, entity: &SchemaEntity) {
        if self.lookup(entity).is_some() {
            return;
        }
        let base = entity
            .name
            .chars()
            .find(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase().to_string())
            .unwrap_or_else(|| "t".to_string());

        let mut alias = base.clone();
        let mut n = 2;
        while self.assigned.iter().any(|(_, a)| *a == alias) {
            alias = format!("{}{}", base, n);
            n += 1;
        }
        self.assigned.push((entity.id().to_string(), alias));
    }

    fn lookup(&self, entity: &SchemaEntity) -> Option<&str> {
        self.assigned
            .iter()
            .find(|(id, _)| id == entity.id())
            .map(|(_, a)| a.as_str())
    }

    fn of(&self, entity: &SchemaEntity) -> &str {
        self.lookup(entity).unwrap_or("t")
    }
}

fn dedup_chains<'p, 'a>(paths: &'p [Path<'a>]) -> Vec<&'p Path<'a>> {
    let mut seen = HashSet::new();
    paths
        .iter()
        .filter(|p| !p.is_empty())
        .filter(|p| seen.insert(p.key()))
        .collect()
}

fn render_projection(plan: &QueryPlan<'_>, aliases: &Aliases) -> String {
    if plan.select_fields.is_empty() {
        return format!("{}.*", aliases.of(plan.main_entity));
    }
    plan.select_fields
        .iter()
        .map(|f| {
            let alias = aliases.of(f.entity);
            if f.is_star() {
                format!("{}.*", alias)
            } else {
                format!("{}.{}", alias, quote_ident(f.field))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_joins(main: &SchemaEntity, chains: &[&Path<'_>], aliases: &Aliases) -> Vec<String> {
    let mut joined: HashSet<&str> = HashSet::from([main.id()]);
    let mut lines = vec![];

    for path in chains {
        for (idx, relation) in path.relations.iter().enumerate() {
            let (Some(from), Some(to)) = (path.entities.get(idx), path.entities.get(idx + 1)) else {
                continue;
            };
            if !joined.insert(to.id()) {
                continue;
            }
            lines.push(format!(
                "INNER JOIN {} {} ON {}",
                quote_ident(&to.table()),
                aliases.of(to),
                join_condition(relation, aliases.of(from), aliases.of(to))
            ));
        }
    }
    lines
}

/// ON clause for the edge `from -[relation]-> to`.
///
/// The owning side of a to-one relation carries `<field>_id`; every other
/// shape keys the target on `<mappedBy|field>_id`.
fn join_condition(relation: &Relation, from: &str, to: &str) -> String {
    let inverse_one_to_one = relation.kind == RelationKind::OneToOne
        && !relation.is_owning
        && relation.mapped_by.is_some();

    match relation.kind {
        RelationKind::OneToOne | RelationKind::ManyToOne if !inverse_one_to_one => format!(
            "{}.{} = {}.id",
            from,
            quote_ident(&format!("{}_id", relation.field)),
            to
        ),
        _ => {
            let fk = relation.mapped_by.as_deref().unwrap_or(&relation.field);
            format!("{}.{} = {}.id", to, quote_ident(&format!("{}_id", fk)), from)
        }
    }
}

fn render_predicate(predicate: &Predicate<'_>, aliases: &Aliases) -> String {
    let rhs = match (&predicate.operator, &predicate.value) {
        (op, Value::Literal(v)) if op.is_like() => like_pattern(v, predicate.anchor),
        (_, value) => value.to_string(),
    };
    format!(
        "{}.{} {} {}",
        aliases.of(predicate.entity),
        quote_ident(predicate.field),
        predicate.operator.as_sql(),
        rhs
    )
}

/// Wildcard a LIKE literal unless it already carries a `%`.
fn like_pattern(literal: &str, anchor: LikeAnchor) -> String {
    let escaped = match literal
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
    {
        Some(inner) => inner.to_string(),
        None => literal.replace('\'', "''"),
    };
    if escaped.contains('%') {
        format!("'{}'", escaped)
    } else {
        format!("'{}'", anchor.apply(&escaped))
    }
}
