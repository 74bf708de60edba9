//! Path finding for SchemaGraph.
//!
//! Paths drive JOIN generation: the SQL builder joins along the shortest
//! path from the main entity to every other entity a query touches.

use std::collections::{HashSet, VecDeque};

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::schema::SchemaEntity;

use super::{Path, SchemaGraph};

/// A BFS frontier entry. Each carries its own visited set so distinct simple
/// paths through shared nodes are all discovered.
struct Frontier {
    node: NodeIndex,
    nodes: Vec<NodeIndex>,
    edges: Vec<EdgeIndex>,
    visited: HashSet<NodeIndex>,
}

impl<'a> SchemaGraph<'a> {
    /// Find all simple paths from `source` to `target` of at most
    /// `max_depth` hops, shortest first.
    ///
    /// Outgoing relations are explored in declaration order, so ties keep
    /// discovery order. The same entity yields one zero-length path; unknown
    /// entities yield none.
    pub fn find_paths(&self, source: &SchemaEntity, target: &SchemaEntity) -> Vec<Path<'a>> {
        let (Some(from_idx), Some(to_idx)) = (self.node(source), self.node(target)) else {
            return vec![];
        };

        if from_idx == to_idx {
            return vec![Path::trivial(self.graph[from_idx])];
        }

        let mut results: Vec<Path<'a>> = vec![];
        let mut queue: VecDeque<Frontier> = VecDeque::new();
        queue.push_back(Frontier {
            node: from_idx,
            nodes: vec![from_idx],
            edges: vec![],
            visited: HashSet::from([from_idx]),
        });

        while let Some(current) = queue.pop_front() {
            if current.edges.len() >= self.max_depth {
                continue;
            }

            for edge_idx in self.outgoing(current.node) {
                let Some((_, neighbor)) = self.graph.edge_endpoints(edge_idx) else {
                    continue;
                };
                if current.visited.contains(&neighbor) {
                    continue;
                }

                let mut nodes = current.nodes.clone();
                nodes.push(neighbor);
                let mut edges = current.edges.clone();
                edges.push(edge_idx);

                if neighbor == to_idx {
                    results.push(self.materialize(&nodes, &edges));
                    continue;
                }

                let mut visited = current.visited.clone();
                visited.insert(neighbor);
                queue.push_back(Frontier {
                    node: neighbor,
                    nodes,
                    edges,
                    visited,
                });
            }
        }

        results.sort_by_key(|p| p.len());
        results
    }

    /// Shortest path between two entities, memoized for the graph's lifetime.
    pub fn shortest_path(&self, source: &SchemaEntity, target: &SchemaEntity) -> Option<Path<'a>> {
        let key = (self.node(source)?, self.node(target)?);

        if let Some(cached) = self.shortest.borrow().get(&key) {
            return cached.clone();
        }

        let found = self.find_paths(source, target).into_iter().next();
        self.shortest.borrow_mut().insert(key, found.clone());
        found
    }

    /// Check if any path exists within the depth bound.
    pub fn has_path(&self, source: &SchemaEntity, target: &SchemaEntity) -> bool {
        self.shortest_path(source, target).is_some()
    }

    /// Outgoing edges in insertion (declaration) order.
    fn outgoing(&self, node: NodeIndex) -> Vec<EdgeIndex> {
        let mut edges: Vec<EdgeIndex> = self.graph.edges(node).map(|e| e.id()).collect();
        edges.sort();
        edges
    }

    fn materialize(&self, nodes: &[NodeIndex], edges: &[EdgeIndex]) -> Path<'a> {
        Path {
            entities: nodes.iter().map(|&n| self.graph[n]).collect(),
            relations: edges.iter().map(|&e| self.graph[e]).collect(),
        }
    }
}

/// Render a path as `A → B → C`.
pub fn format_path(path: &Path<'_>) -> String {
    path.entities
        .iter()
        .map(|e| e.name.as_str())
        .collect::<Vec<_>>()
        .join(" → ")
}
