use std::collections::{HashSet, VecDeque};

use crate::model::VertexId;

use super::Graph;

/// Breadth-first expansion around a vertex.
pub struct Adjacent {
    vertex: VertexId,
    max_level: usize,
}

impl Adjacent {
    /// Creates a new `Adjacent` query.
    #[must_use]
    pub fn new(vertex: VertexId, max_level: usize) -> Self {
        Self { vertex, max_level }
    }

    /// Executes the query, returning every vertex within `max_level` hops
    /// in breadth-first order. The starting vertex is not included.
    #[must_use]
    pub fn execute(&self, graph: &Graph) -> Vec<VertexId> {
        let mut seen: HashSet<VertexId> = HashSet::from([self.vertex]);
        let mut queue: VecDeque<(VertexId, usize)> = VecDeque::from([(self.vertex, 0)]);
        let mut found = Vec::new();

        while let Some((vertex, level)) = queue.pop_front() {
            if level == self.max_level {
                continue;
            }
            for hop in graph.neighbors(vertex) {
                if seen.insert(hop.vertex) {
                    found.push(hop.vertex);
                    queue.push_back((hop.vertex, level + 1));
                }
            }
        }
        found
    }
}
