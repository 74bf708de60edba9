//! Schema graph supplied by the introspection collaborator.
//!
//! Entities, their fields and their relations are deserialized from the JSON
//! document the schema extractor emits. Both the camelCase keys of that
//! document and a few legacy spellings (`table`, `associations`,
//! `fieldName`, `targetEntity`) are accepted.

pub mod inflection;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Aliases keyed by entity id (fqcn, or name when no fqcn is known).
pub type AliasMap = BTreeMap<String, Vec<String>>;

/// Semantic category of a field, used to coerce literal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Datetime,
    Json,
    Other,
}

impl FieldType {
    /// Normalize a raw ORM/database type name.
    pub fn from_type_name(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "" | "string" | "text" | "ascii_string" | "guid" | "uuid" | "varchar" | "char" => {
                FieldType::String
            }
            "integer" | "int" | "bigint" | "smallint" | "float" | "double" | "decimal"
            | "number" | "numeric" | "real" => FieldType::Number,
            "bool" | "boolean" => FieldType::Boolean,
            "datetime" | "datetime_immutable" | "datetimetz" | "datetimetz_immutable" | "date"
            | "date_immutable" | "time" | "time_immutable" | "timestamp" => FieldType::Datetime,
            "json" | "jsonb" | "array" | "simple_array" | "object" => FieldType::Json,
            _ => FieldType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Datetime => "datetime",
            FieldType::Json => "json",
            FieldType::Other => "other",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_type_name() -> String {
    "string".to_string()
}

/// A mapped column of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    /// Raw type name as reported by the schema extractor.
    #[serde(rename = "type", default = "default_type_name")]
    pub type_name: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default, alias = "isPrimaryKey", alias = "primary")]
    pub primary_key: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            nullable: false,
            unique: false,
            length: None,
            primary_key: false,
        }
    }

    pub fn kind(&self) -> FieldType {
        FieldType::from_type_name(&self.type_name)
    }
}

/// Cardinality of a relation, from the declaring entity's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRelationKind")]
pub enum RelationKind {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

impl RelationKind {
    /// Doctrine's numeric association codes.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(RelationKind::OneToOne),
            2 => Some(RelationKind::ManyToOne),
            4 => Some(RelationKind::OneToMany),
            8 => Some(RelationKind::ManyToMany),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let compact: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match compact.as_str() {
            "onetoone" => Some(RelationKind::OneToOne),
            "manytoone" => Some(RelationKind::ManyToOne),
            "onetomany" => Some(RelationKind::OneToMany),
            "manytomany" => Some(RelationKind::ManyToMany),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::OneToOne => "OneToOne",
            RelationKind::ManyToOne => "ManyToOne",
            RelationKind::OneToMany => "OneToMany",
            RelationKind::ManyToMany => "ManyToMany",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRelationKind {
    Code(u8),
    Name(String),
}

impl TryFrom<RawRelationKind> for RelationKind {
    type Error = String;

    fn try_from(raw: RawRelationKind) -> Result<Self, Self::Error> {
        match raw {
            RawRelationKind::Code(code) => RelationKind::from_code(code)
                .ok_or_else(|| format!("unknown relation type code: {}", code)),
            RawRelationKind::Name(name) => RelationKind::from_name(&name)
                .ok_or_else(|| format!("unknown relation type: {}", name)),
        }
    }
}

/// A directed relation from the declaring entity to `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    #[serde(alias = "fieldName")]
    pub field: String,
    /// Target entity, by fqcn or name.
    #[serde(alias = "targetEntity")]
    pub target: String,
    #[serde(rename = "type")]
    pub kind: RelationKind,
    #[serde(default)]
    pub is_owning: bool,
    #[serde(default)]
    pub mapped_by: Option<String>,
    #[serde(default)]
    pub inversed_by: Option<String>,
    #[serde(default)]
    pub nullable: Option<bool>,
}

impl Relation {
    pub fn new(field: impl Into<String>, target: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            field: field.into(),
            target: target.into(),
            kind,
            is_owning: matches!(kind, RelationKind::ManyToOne),
            mapped_by: None,
            inversed_by: None,
            nullable: None,
        }
    }

    pub fn owning(mut self, is_owning: bool) -> Self {
        self.is_owning = is_owning;
        self
    }

    pub fn mapped_by(mut self, field: impl Into<String>) -> Self {
        self.mapped_by = Some(field.into());
        self
    }

    pub fn inversed_by(mut self, field: impl Into<String>) -> Self {
        self.inversed_by = Some(field.into());
        self
    }
}

/// A mapped entity (table) of the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaEntity {
    pub name: String,
    #[serde(default)]
    pub fqcn: Option<String>,
    #[serde(default, alias = "table")]
    pub table_name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default, alias = "associations")]
    pub relations: Vec<Relation>,
}

impl SchemaEntity {
    pub fn new(name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fqcn: None,
            table_name: table_name.into(),
            fields: vec![],
            relations: vec![],
        }
    }

    pub fn with_fqcn(mut self, fqcn: impl Into<String>) -> Self {
        self.fqcn = Some(fqcn.into());
        self
    }

    pub fn with_field(mut self, name: &str, type_name: &str) -> Self {
        self.fields.push(Field::new(name, type_name));
        self
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    /// Canonical identity: fqcn when present and non-empty, otherwise name.
    pub fn id(&self) -> &str {
        match self.fqcn.as_deref() {
            Some(fqcn) if !fqcn.is_empty() => fqcn,
            _ => &self.name,
        }
    }

    /// Physical table name, defaulting to the lower-cased entity name.
    pub fn table(&self) -> String {
        if self.table_name.is_empty() {
            self.name.to_lowercase()
        } else {
            self.table_name.clone()
        }
    }

    /// Case-insensitive exact field lookup.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Does `reference` (an fqcn or a name) designate this entity?
    pub fn matches_ref(&self, reference: &str) -> bool {
        !reference.is_empty()
            && (self.id() == reference
                || self.name == reference
                || self.fqcn.as_deref() == Some(reference))
    }
}

/// The schema graph plus the alias map for one translation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub entities: Vec<SchemaEntity>,
    #[serde(default)]
    pub aliases: AliasMap,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaDocument {
    Full(Schema),
    Entities(Vec<SchemaEntity>),
}

impl Schema {
    pub fn new(entities: Vec<SchemaEntity>) -> Self {
        Self {
            entities,
            aliases: AliasMap::new(),
        }
    }

    pub fn with_alias(mut self, entity_id: &str, alias: &str) -> Self {
        self.aliases
            .entry(entity_id.to_string())
            .or_default()
            .push(alias.to_string());
        self
    }

    /// Parse either `{"entities": [...], "aliases": {...}}` or a bare entity array.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let doc: SchemaDocument = serde_json::from_str(json)?;
        Ok(match doc {
            SchemaDocument::Full(schema) => schema,
            SchemaDocument::Entities(entities) => Schema::new(entities),
        })
    }

    /// Find an entity by fqcn or name.
    pub fn entity(&self, reference: &str) -> Option<&SchemaEntity> {
        self.entities
            .iter()
            .find(|e| e.id() == reference)
            .or_else(|| self.entities.iter().find(|e| e.matches_ref(reference)))
    }

    pub fn aliases_for(&self, entity: &SchemaEntity) -> &[String] {
        self.aliases
            .get(entity.id())
            .or_else(|| self.aliases.get(&entity.name))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}
