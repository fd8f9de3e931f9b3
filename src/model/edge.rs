use super::strip::StripId;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for an edge in the vehicle model.
    pub struct EdgeId;
}

/// Where an edge receives its control signal from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalSource {
    /// A controller at this vertex injects signal into the edge.
    Controller(VertexId),
    /// Signal is chained from the end of another edge.
    Edge(EdgeId),
}

/// A structural edge carrying parallel LED strips.
#[derive(Debug, Clone)]
pub struct EdgeData {
    /// `<a>-<b>` with the lower vertex id first.
    pub label: String,
    pub vertices: [VertexId; 2],
    /// Length in microns.
    pub length: f64,
    pub strips: Vec<StripId>,
    pub signal_from: Option<SignalSource>,
    pub signal_to: Option<EdgeId>,
    /// Hops from the controller that feeds this edge's signal chain.
    pub depth: usize,
    pub build_priority: Option<u32>,
}

impl EdgeData {
    /// Returns `true` if `vertex` is one of the edge's endpoints.
    #[must_use]
    pub fn has_vertex(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }
}
