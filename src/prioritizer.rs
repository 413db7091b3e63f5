//! Priorities for relationship graph vertices
//!
//! Priorities only break ties between vertices that have no ordering edge
//! between them; the catalog order is unaffected.

use std::collections::HashMap;

use crate::graph::Vertex;
use crate::types::PriorityKey;

/// Assigns priority keys to graph vertices
pub trait Prioritizer: Send {
    /// Priority for a vertex that is not nested in anything
    ///
    /// Returns the recorded key if the vertex already has one.
    fn generate_priority_for(&mut self, vertex: Vertex) -> PriorityKey;

    /// Next free key inside `container`, not yet bound to a vertex
    ///
    /// The key sorts after the container and after anything previously
    /// placed in it, but before whatever followed the container.
    fn next_priority_in(&mut self, container: Vertex) -> PriorityKey;

    /// Bind a key obtained from [`next_priority_in`](Self::next_priority_in)
    fn assign_priority(&mut self, vertex: Vertex, key: PriorityKey);

    /// Priority for `child`, positioned inside `container`
    fn priority_contained_in(&mut self, container: Vertex, child: Vertex) -> PriorityKey {
        let key = self.next_priority_in(container);
        self.assign_priority(child, key.clone());
        key
    }

    /// Recorded priority of a vertex
    fn priority_of(&self, vertex: Vertex) -> Option<PriorityKey>;
}

/// Hands out keys in the order they are requested
#[derive(Debug, Default)]
pub struct SequentialPrioritizer {
    priorities: HashMap<Vertex, PriorityKey>,
    top_level: u32,
    nested: HashMap<Vertex, u32>,
}

impl SequentialPrioritizer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Prioritizer for SequentialPrioritizer {
    fn generate_priority_for(&mut self, vertex: Vertex) -> PriorityKey {
        if let Some(existing) = self.priorities.get(&vertex) {
            return existing.clone();
        }
        self.top_level += 1;
        let key = PriorityKey::top(self.top_level);
        self.priorities.insert(vertex, key.clone());
        key
    }

    fn next_priority_in(&mut self, container: Vertex) -> PriorityKey {
        let base = self.generate_priority_for(container);
        let counter = self.nested.entry(container).or_insert(0);
        *counter += 1;
        base.child(*counter)
    }

    fn assign_priority(&mut self, vertex: Vertex, key: PriorityKey) {
        self.priorities.insert(vertex, key);
    }

    fn priority_of(&self, vertex: Vertex) -> Option<PriorityKey> {
        self.priorities.get(&vertex).cloned()
    }
}
