//! Prompt construction for remote generators.
//!
//! The prompt is analyzed to find the entities and fields it mentions; only
//! those entities plus their direct neighbours are serialized into the
//! system prompt. When nothing is recognized the whole schema is sent.

use serde_json::json;

use crate::nlp::{tokenize, Lexicon, Resolver};
use crate::plan::FieldRef;
use crate::schema::{Schema, SchemaEntity};

/// Words never treated as entity or field mentions.
const SQL_KEYWORDS: &[&str] = &[
    "select", "from", "where", "join", "left", "right", "inner", "outer", "on", "and", "or",
    "not", "in", "like", "is", "null", "order", "by", "group", "having", "limit", "offset", "as",
    "asc", "desc", "distinct", "count", "sum", "avg", "max", "min", "all", "any", "between",
    "case", "when", "then", "else", "end", "exists", "union", "except", "intersect",
];

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "of", "to", "for", "with", "at", "by", "from", "in", "into", "on", "onto",
    "off", "out", "over", "under", "again", "further", "then", "once", "here", "there", "when",
    "where", "why", "how", "all", "both", "each", "few", "more", "most", "other", "some", "such",
    "only", "own", "same", "so", "than", "too", "very", "can", "will", "just", "should", "now",
    "my", "your", "his", "her", "its", "our", "their", "what", "which", "who", "whom", "this",
    "that", "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have",
    "has", "had", "having", "do", "does", "did", "doing", "get", "show", "list", "find", "give",
    "give me", "retrieve", "fetch",
];

fn is_ignored(token: &str) -> bool {
    SQL_KEYWORDS.contains(&token) || STOP_WORDS.contains(&token)
}

/// Entities and fields a prompt refers to, in order of first mention.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis<'a> {
    pub tokens: Vec<String>,
    pub mentioned_entities: Vec<&'a SchemaEntity>,
    pub mentioned_fields: Vec<FieldRef<'a>>,
}

impl<'a> Analysis<'a> {
    pub fn is_empty(&self) -> bool {
        self.mentioned_entities.is_empty() && self.mentioned_fields.is_empty()
    }
}

/// The rendered prompt pair.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltPrompt {
    pub system: String,
    pub user: String,
    /// Names of the entities serialized into `system`.
    pub entities: Vec<String>,
}

/// Find mentioned entities and fields.
pub fn analyze<'a>(prompt: &str, schema: &'a Schema) -> Analysis<'a> {
    let lexicon = Lexicon::build(schema);
    let resolver = Resolver::new(&lexicon);
    let tokens = tokenize(prompt).tokens;

    let mut mentioned_entities: Vec<&'a SchemaEntity> = vec![];
    for token in tokens.iter().filter(|t| !is_ignored(t)) {
        if let Some(entity) = resolver.resolve_entity(token) {
            if !mentioned_entities.iter().any(|e| e.id() == entity.id()) {
                mentioned_entities.push(entity);
            }
        }
    }

    let mut mentioned_fields: Vec<FieldRef<'a>> = vec![];
    let mut push = |found: FieldRef<'a>| {
        if !mentioned_fields.iter().any(|f| f.same_as(&found)) {
            mentioned_fields.push(found);
        }
    };

    for (i, token) in tokens.iter().enumerate() {
        if is_ignored(token) {
            continue;
        }
        // "<field> of <entity>" and "<entity> <field>"
        if tokens.get(i + 1).is_some_and(|t| t == "of") && i + 3 <= tokens.len() {
            if let Some(found) = resolver.resolve_field(&tokens[i..i + 3], None) {
                push(found);
            }
        }
        if i + 2 <= tokens.len() && resolver.resolve_entity(token).is_some() {
            if let Some(found) = resolver.resolve_field(&tokens[i..i + 2], None) {
                push(found);
            }
        }
        // a bare field, owned by a mentioned entity first
        let owned = mentioned_entities
            .iter()
            .copied()
            .find_map(|e| e.field(token).map(|f| FieldRef::new(e, f.name.as_str())));
        if let Some(found) = owned.or_else(|| resolver.resolve_field(std::slice::from_ref(token), None)) {
            push(found);
        }
    }

    Analysis {
        tokens,
        mentioned_entities,
        mentioned_fields,
    }
}

/// Mentioned entities plus every entity with a relation pointing at one of
/// them, in schema order. Falls back to the full schema.
pub fn relevant_entities<'a>(analysis: &Analysis<'a>, schema: &'a Schema) -> Vec<&'a SchemaEntity> {
    if analysis.is_empty() {
        return schema.entities.iter().collect();
    }

    let mut mentioned: Vec<&str> = analysis.mentioned_entities.iter().map(|e| e.id()).collect();
    for field in &analysis.mentioned_fields {
        if !mentioned.contains(&field.entity.id()) {
            mentioned.push(field.entity.id());
        }
    }

    let relevant: Vec<&'a SchemaEntity> = schema
        .entities
        .iter()
        .filter(|entity| {
            mentioned.contains(&entity.id())
                || entity.relations.iter().any(|r| {
                    schema
                        .entity(&r.target)
                        .is_some_and(|target| mentioned.contains(&target.id()))
                })
        })
        .collect();

    if relevant.is_empty() {
        schema.entities.iter().collect()
    } else {
        relevant
    }
}

/// Pretty JSON description of `entities` for the system prompt.
pub fn schema_json(entities: &[&SchemaEntity]) -> String {
    let entities: Vec<serde_json::Value> = entities
        .iter()
        .map(|entity| {
            let fields: Vec<serde_json::Value> = entity
                .fields
                .iter()
                .map(|f| {
                    let type_name = if f.type_name.is_empty() {
                        "string"
                    } else {
                        f.type_name.as_str()
                    };
                    json!({
                        "name": f.name,
                        "type": type_name,
                        "nullable": f.nullable,
                        "primary": f.primary_key,
                    })
                })
                .collect();
            let relations: Vec<serde_json::Value> = entity
                .relations
                .iter()
                .map(|r| {
                    json!({
                        "field": r.field,
                        "target": r.target,
                        "type": r.kind.as_str(),
                        "mappedBy": r.mapped_by,
                        "inversedBy": r.inversed_by,
                    })
                })
                .collect();
            json!({
                "name": entity.name,
                "table": entity.table(),
                "fields": fields,
                "relations": relations,
            })
        })
        .collect();

    serde_json::to_string_pretty(&json!({ "entities": entities })).unwrap_or_default()
}

pub fn system_prompt(schema_json: &str) -> String {
    format!(
        r#"You are an SQL query generator.

Given the following database schema (JSON format) and a user request, your task is to produce a single, valid SQL query.

**Instructions:**
1. Analyze the user's request to identify:
   - Which tables (entities) are involved
   - Which fields should be selected
   - What conditions (WHERE clauses) are needed
   - What JOINs are required to connect entities

2. Generate clean SQL:
   - Use proper table aliases (e.g., `u` for User, `a` for Address)
   - Include only necessary JOINs
   - Use correct field names from the schema
   - Follow standard SQL syntax (MySQL/PostgreSQL compatible)

3. Return your response as a valid JSON object with this structure:
{{
  "sql": "SELECT ... FROM ... WHERE ...",
  "explanation": "Brief explanation of what this query does",
  "confidence": 0.85
}}

**Database Schema:**

{schema_json}

**Important:**
- Return ONLY the JSON object, nothing else
- Use table aliases for readability
- Ensure all field names match the schema exactly
- If the request is ambiguous, provide your best interpretation with lower confidence (< 0.7)"#
    )
}

pub fn user_prompt(request: &str) -> String {
    format!(
        "User request:\n\"{}\"\n\nGenerate the SQL query for this request based on the provided schema.",
        request
    )
}

/// Analyze, narrow the schema and render both prompts.
pub fn build_prompt(request: &str, schema: &Schema) -> BuiltPrompt {
    let analysis = analyze(request, schema);
    let relevant = relevant_entities(&analysis, schema);

    BuiltPrompt {
        system: system_prompt(&schema_json(&relevant)),
        user: user_prompt(request),
        entities: relevant.iter().map(|e| e.name.clone()).collect(),
    }
}
