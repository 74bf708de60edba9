//! Projection parsing: the main entity and the selected fields.

use crate::plan::FieldRef;
use crate::schema::SchemaEntity;

use super::lexicon::SELECT_VERBS;
use super::resolver::Resolver;

/// Largest token window tried for a field reference (`id of training`).
const MAX_WINDOW: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'a> {
    pub main_entity: Option<&'a SchemaEntity>,
    pub select_fields: Vec<FieldRef<'a>>,
}

/// Identify the main entity and projected fields.
///
/// The first token resolving to an entity fixes the main entity. Fields are
/// collected with a sliding window of up to three tokens, biased to the main
/// entity. When no entity token exists, the first resolved field's entity
/// becomes main. An entity with no resolved field projects `*`.
pub fn parse_select<'a>(tokens: &[String], resolver: &Resolver<'_, 'a>) -> Selection<'a> {
    let scan = match tokens.iter().position(|t| SELECT_VERBS.contains(&t.as_str())) {
        Some(idx) => &tokens[idx + 1..],
        None => tokens,
    };

    let mut main_entity = scan.iter().find_map(|t| resolver.resolve_entity(t));
    let mut select_fields: Vec<FieldRef<'a>> = vec![];

    for start in 0..scan.len() {
        let end = (start + MAX_WINDOW).min(scan.len());
        for stop in start + 1..=end {
            let Some(found) = resolver.resolve_field(&scan[start..stop], main_entity) else {
                continue;
            };
            if main_entity.is_none() {
                main_entity = Some(found.entity);
            }
            if !select_fields.iter().any(|f| f.same_as(&found)) {
                select_fields.push(found);
            }
        }
    }

    if select_fields.is_empty() {
        if let Some(entity) = main_entity {
            select_fields.push(FieldRef::star(entity));
        }
    }

    Selection {
        main_entity,
        select_fields,
    }
}
