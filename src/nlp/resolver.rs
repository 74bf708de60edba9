//! Entity and field resolution against the lexicon.
//!
//! Field resolution order, first match wins:
//! 1. `<field> of <entity>`
//! 2. `<entity> <field>` or `<entity>.<field>`
//! 3. the bias entity, if it owns the field
//! 4. the first entity in schema order owning the field
//!
//! Field names compare case-insensitively and exactly.

use std::sync::LazyLock;

use regex::Regex;

use crate::plan::FieldRef;
use crate::schema::SchemaEntity;

use super::lexicon::Lexicon;

static FIELD_OF_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<field>\w+)\s+of\s+(?P<entity>\w+)$").unwrap());

static ENTITY_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<entity>\w+)(?:\s+|\.)(?P<field>\w+)$").unwrap());

pub struct Resolver<'l, 'a> {
    lexicon: &'l Lexicon<'a>,
}

impl<'l, 'a> Resolver<'l, 'a> {
    pub fn new(lexicon: &'l Lexicon<'a>) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &'l Lexicon<'a> {
        self.lexicon
    }

    pub fn resolve_entity(&self, token: &str) -> Option<&'a SchemaEntity> {
        self.lexicon.resolve_entity(token)
    }

    /// Resolve a window of tokens to a field, preferring `bias` over the
    /// schema-wide scan.
    pub fn resolve_field(
        &self,
        window: &[String],
        bias: Option<&'a SchemaEntity>,
    ) -> Option<FieldRef<'a>> {
        let joined = window.join(" ").trim().to_lowercase();
        if joined.is_empty() {
            return None;
        }

        if let Some(caps) = FIELD_OF_ENTITY.captures(&joined) {
            if let Some(found) = self.qualified(&caps["entity"], &caps["field"]) {
                return Some(found);
            }
        }

        if let Some(caps) = ENTITY_FIELD.captures(&joined) {
            if let Some(found) = self.qualified(&caps["entity"], &caps["field"]) {
                return Some(found);
            }
        }

        if let Some(found) = bias.and_then(|entity| owned_field(entity, &joined)) {
            return Some(found);
        }

        self.lexicon
            .entities()
            .find_map(|entity| owned_field(entity, &joined))
    }

    fn qualified(&self, entity_token: &str, field: &str) -> Option<FieldRef<'a>> {
        let entity = self.resolve_entity(entity_token)?;
        owned_field(entity, field)
    }
}

/// The entity's canonical spelling of `field`, if it has one.
fn owned_field<'a>(entity: &'a SchemaEntity, field: &str) -> Option<FieldRef<'a>> {
    entity
        .field(field)
        .map(|f| FieldRef::new(entity, f.name.as_str()))
}
