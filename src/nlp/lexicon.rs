//! Per-request lexicon of entity and field names.

use std::collections::BTreeSet;

use crate::schema::inflection::{irregular_plural, pluralize, singularize};
use crate::schema::{Schema, SchemaEntity};

/// Tokens that open the condition clause.
pub const CONNECTORS: &[&str] = &["where", "with", "when", "whose", "for", "having"];

/// Leading verbs skipped by the select parser.
pub const SELECT_VERBS: &[&str] = &["show", "get", "list", "select", "find", "retrieve"];

pub fn is_connector(token: &str) -> bool {
    CONNECTORS.contains(&token)
}

/// Entity variants and field names, in schema order.
///
/// Built once from a schema and its aliases and never updated in place; a
/// schema or alias change means building a new lexicon.
#[derive(Debug, Clone)]
pub struct Lexicon<'a> {
    entities: Vec<LexiconEntry<'a>>,
}

#[derive(Debug, Clone)]
struct LexiconEntry<'a> {
    entity: &'a SchemaEntity,
    names: BTreeSet<String>,
    fields: BTreeSet<String>,
}

impl<'a> Lexicon<'a> {
    pub fn build(schema: &'a Schema) -> Self {
        let entities = schema
            .entities
            .iter()
            .map(|entity| LexiconEntry {
                entity,
                names: entity_variants(entity, schema.aliases_for(entity)),
                fields: entity.fields.iter().map(|f| f.name.to_lowercase()).collect(),
            })
            .collect();

        Self { entities }
    }

    pub fn entities(&self) -> impl Iterator<Item = &'a SchemaEntity> + '_ {
        self.entities.iter().map(|e| e.entity)
    }

    /// Variant set for an entity id.
    pub fn entity_names(&self, entity_id: &str) -> Option<&BTreeSet<String>> {
        self.entities
            .iter()
            .find(|e| e.entity.id() == entity_id)
            .map(|e| &e.names)
    }

    /// Lower-cased field names for an entity id.
    pub fn field_names(&self, entity_id: &str) -> Option<&BTreeSet<String>> {
        self.entities
            .iter()
            .find(|e| e.entity.id() == entity_id)
            .map(|e| &e.fields)
    }

    /// First entity (schema order) whose variant set contains `token`.
    pub fn resolve_entity(&self, token: &str) -> Option<&'a SchemaEntity> {
        let token = token.trim().to_lowercase();
        if token.is_empty() {
            return None;
        }
        self.entities
            .iter()
            .find(|e| e.names.contains(&token))
            .map(|e| e.entity)
    }
}

/// Name, table name, their naive plurals, irregular plurals and singulars,
/// de-underscored forms, and the entity's aliases, all lower-cased.
fn entity_variants(entity: &SchemaEntity, aliases: &[String]) -> BTreeSet<String> {
    let mut variants = BTreeSet::new();

    for base in [entity.name.to_lowercase(), entity.table().to_lowercase()] {
        if base.is_empty() {
            continue;
        }
        let compact = base.replace('_', "");
        variants.insert(pluralize(&base));
        if let Some(irregular) = irregular_plural(&base) {
            variants.insert(irregular.to_string());
        }
        variants.insert(singularize(&base));
        if compact != base && !compact.is_empty() {
            variants.insert(pluralize(&compact));
            variants.insert(compact);
        }
        variants.insert(base);
    }

    for alias in aliases {
        let alias = alias.trim().to_lowercase();
        if !alias.is_empty() {
            variants.insert(alias);
        }
    }

    variants.retain(|v| !v.is_empty());
    variants
}
