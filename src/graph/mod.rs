//! SchemaGraph - directed relation graph over the schema entities.
//!
//! Built once per translation request. Nodes are entities, edges are the
//! relations they declare (entity → target). The module is organized into:
//! - `path`: breadth-first path search and per-request memoization

mod path;


use std::cell::RefCell;
use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::schema::{Relation, Schema, SchemaEntity};

pub use path::format_path;

/// Default hop bound for path search.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// A chain of entities connected by relations.
///
/// `relations[i]` leads from `entities[i]` to `entities[i + 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Path<'a> {
    pub entities: Vec<&'a SchemaEntity>,
    pub relations: Vec<&'a Relation>,
}

impl<'a> Path<'a> {
    /// Zero-length path from an entity to itself.
    pub fn trivial(entity: &'a SchemaEntity) -> Self {
        Self {
            entities: vec![entity],
            relations: vec![],
        }
    }

    /// Number of hops.
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn source(&self) -> Option<&'a SchemaEntity> {
        self.entities.first().copied()
    }

    pub fn target(&self) -> Option<&'a SchemaEntity> {
        self.entities.last().copied()
    }

    /// Ordered entity names, used to dedup chains.
    pub fn key(&self) -> String {
        self.entities
            .iter()
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>()
            .join(">")
    }
}

/// Relation graph for one request.
pub struct SchemaGraph<'a> {
    graph: DiGraph<&'a SchemaEntity, &'a Relation>,
    node_indices: HashMap<&'a str, NodeIndex>,
    max_depth: usize,
    shortest: RefCell<HashMap<(NodeIndex, NodeIndex), Option<Path<'a>>>>,
}

impl<'a> SchemaGraph<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self::with_max_depth(schema, DEFAULT_MAX_DEPTH)
    }

    /// Build the graph. Relations whose target matches no entity are skipped.
    pub fn with_max_depth(schema: &'a Schema, max_depth: usize) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();

        for entity in &schema.entities {
            let idx = graph.add_node(entity);
            node_indices.entry(entity.id()).or_insert(idx);
        }

        for entity in &schema.entities {
            let Some(&from) = node_indices.get(entity.id()) else {
                continue;
            };
            for relation in &entity.relations {
                let Some(target) = schema.entity(&relation.target) else {
                    tracing::debug!(
                        entity = %entity.name,
                        field = %relation.field,
                        target = %relation.target,
                        "skipping relation to unknown entity"
                    );
                    continue;
                };
                if let Some(&to) = node_indices.get(target.id()) {
                    graph.add_edge(from, to, relation);
                }
            }
        }

        Self {
            graph,
            node_indices,
            max_depth,
            shortest: RefCell::new(HashMap::new()),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn entity_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn relation_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn node(&self, entity: &SchemaEntity) -> Option<NodeIndex> {
        self.node_indices.get(entity.id()).copied()
    }
}
