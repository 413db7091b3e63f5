//! Relationship graph - "must execute before" ordering between resources
//!
//! Vertices are catalog resources plus synthetic sentinels. Edges are
//! directed, optionally labelled, and never duplicated.

use petgraph::Direction;
use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;
use std::collections::HashMap;

use crate::catalog::{Catalog, ResourceId};
use crate::prioritizer::Prioritizer;
use crate::types::{EdgeLabel, PriorityKey, RelationshipParam, Tags};

/// Handle to a sentinel stored in a [`RelationshipGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SentinelId(usize);

/// A vertex of the relationship graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Vertex {
    Resource(ResourceId),
    Sentinel(SentinelId),
}

impl Vertex {
    pub fn as_resource(self) -> Option<ResourceId> {
        match self {
            Self::Resource(id) => Some(id),
            Self::Sentinel(_) => None,
        }
    }
}

impl From<ResourceId> for Vertex {
    fn from(id: ResourceId) -> Self {
        Self::Resource(id)
    }
}

/// Join point standing for "everything generated by X has completed"
///
/// Sentinels have no behavior; they exist only to carry edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinel {
    pub name: String,
    pub tags: Tags,
}

/// A directed edge: `source` runs before `target`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub source: Vertex,
    pub target: Vertex,
    pub label: Option<EdgeLabel>,
}

/// Mutable execution-order graph
///
/// Edge storage is a petgraph [`DiGraphMap`]; priorities and sentinels are
/// kept alongside it.
#[derive(Debug, Default)]
pub struct RelationshipGraph {
    graph: DiGraphMap<Vertex, Option<EdgeLabel>>,
    priorities: HashMap<Vertex, PriorityKey>,
    sentinels: Vec<Sentinel>,
}

impl RelationshipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the initial graph for a catalog
    ///
    /// Every resource becomes a vertex with a top-level priority, in
    /// catalog order. Relationship metaparameters become edges; refs that
    /// do not resolve in the catalog are skipped.
    pub fn from_catalog(catalog: &Catalog, prioritizer: &mut dyn Prioritizer) -> Self {
        let mut graph = Self::new();

        for &id in catalog.ordered() {
            let vertex = Vertex::Resource(id);
            let priority = prioritizer.generate_priority_for(vertex);
            graph.add_vertex(vertex, Some(priority));
        }

        for (id, resource) in catalog.iter() {
            for param in RelationshipParam::ALL {
                for target in resource.relationships(param) {
                    let Some(other) = catalog.resource(target) else {
                        log::warn!(
                            "{}: {} references unknown resource {}",
                            resource.reference(),
                            param,
                            target
                        );
                        continue;
                    };
                    let (source, target) = if param.is_outgoing() {
                        (id, other)
                    } else {
                        (other, id)
                    };
                    let label = param.is_refresh().then(EdgeLabel::refresh);
                    graph.add_edge(source.into(), target.into(), label);
                }
            }
        }

        log::debug!(
            "Built relationship graph: {} vertices, {} edges",
            graph.vertex_count(),
            graph.edge_count()
        );
        graph
    }

    /// Ensure a vertex exists
    ///
    /// A `None` priority never clears a priority recorded earlier.
    pub fn add_vertex(&mut self, vertex: Vertex, priority: Option<PriorityKey>) {
        self.graph.add_node(vertex);
        if let Some(priority) = priority {
            self.priorities.insert(vertex, priority);
        }
    }

    /// Store a sentinel and add it as a vertex
    pub fn add_sentinel(&mut self, sentinel: Sentinel, priority: Option<PriorityKey>) -> Vertex {
        let vertex = Vertex::Sentinel(SentinelId(self.sentinels.len()));
        self.sentinels.push(sentinel);
        self.add_vertex(vertex, priority);
        vertex
    }

    pub fn sentinel(&self, id: SentinelId) -> &Sentinel {
        &self.sentinels[id.0]
    }

    pub fn sentinels(&self) -> impl Iterator<Item = (Vertex, &Sentinel)> {
        self.sentinels
            .iter()
            .enumerate()
            .map(|(i, s)| (Vertex::Sentinel(SentinelId(i)), s))
    }

    /// Add `from → to`; returns false if that edge already existed
    ///
    /// Missing endpoints are added as vertices without a priority. An
    /// existing edge keeps its original label.
    pub fn add_edge(&mut self, from: Vertex, to: Vertex, label: Option<EdgeLabel>) -> bool {
        if self.graph.contains_edge(from, to) {
            return false;
        }
        self.graph.add_edge(from, to, label);
        true
    }

    pub fn edge_exists(&self, from: Vertex, to: Vertex) -> bool {
        self.graph.contains_edge(from, to)
    }

    /// Outgoing edges of a vertex, copied so the graph can be edited while
    /// walking them
    pub fn adjacent_out(&self, vertex: Vertex) -> Vec<Edge> {
        self.graph
            .edges(vertex)
            .map(|(source, target, label)| Edge {
                source,
                target,
                label: label.clone(),
            })
            .collect()
    }

    pub fn adjacent_in(&self, vertex: Vertex) -> Vec<Edge> {
        self.graph
            .neighbors_directed(vertex, Direction::Incoming)
            .map(|source| Edge {
                source,
                target: vertex,
                label: self.graph.edge_weight(source, vertex).cloned().flatten(),
            })
            .collect()
    }

    /// Remove an edge; returns false if it was not present
    pub fn remove_edge(&mut self, edge: &Edge) -> bool {
        self.graph.remove_edge(edge.source, edge.target).is_some()
    }

    pub fn contains_vertex(&self, vertex: Vertex) -> bool {
        self.graph.contains_node(vertex)
    }

    pub fn priority_of(&self, vertex: Vertex) -> Option<&PriorityKey> {
        self.priorities.get(&vertex)
    }

    /// Vertices in insertion order
    pub fn vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
        self.graph.nodes()
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.graph
            .all_edges()
            .map(|(source, target, label)| Edge {
                source,
                target,
                label: label.clone(),
            })
    }

    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }
}
