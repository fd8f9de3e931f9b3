mod adjacent;
mod min_distance;

pub use adjacent::Adjacent;
pub use min_distance::MinDistance;

use slotmap::SecondaryMap;

use crate::math::microns_to_feet;
use crate::model::{EdgeId, VehicleModel, VertexId};

/// One outgoing hop in the adjacency index.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor {
    pub vertex: VertexId,
    pub edge: EdgeId,
    /// Physical length of the edge, in microns.
    pub length: f64,
}

/// The vehicle model plus a vertex adjacency index over its edges.
///
/// Built once after loading; the geometry is read-only from here on.
#[derive(Debug)]
pub struct Graph {
    model: VehicleModel,
    adjacency: SecondaryMap<VertexId, Vec<Neighbor>>,
}

impl Graph {
    /// Wraps a fully loaded model and indexes its edges in both directions.
    #[must_use]
    pub fn new(model: VehicleModel) -> Self {
        let mut adjacency: SecondaryMap<VertexId, Vec<Neighbor>> = SecondaryMap::new();
        for (id, _) in model.vertices() {
            adjacency.insert(id, Vec::new());
        }
        for (edge, data) in model.edges() {
            let [a, b] = data.vertices;
            for (from, to) in [(a, b), (b, a)] {
                if let Some(list) = adjacency.get_mut(from) {
                    list.push(Neighbor {
                        vertex: to,
                        edge,
                        length: data.length,
                    });
                }
            }
        }
        Self { model, adjacency }
    }

    /// The underlying vehicle model.
    #[must_use]
    pub fn model(&self) -> &VehicleModel {
        &self.model
    }

    /// Hops leaving `vertex`; empty for an isolated or unknown vertex.
    #[must_use]
    pub fn neighbors(&self, vertex: VertexId) -> &[Neighbor] {
        self.adjacency.get(vertex).map_or(&[], Vec::as_slice)
    }

    /// Routed distance between two vertices, in microns.
    ///
    /// `f64::INFINITY` if no path exists.
    #[must_use]
    pub fn min_distance(&self, a: VertexId, b: VertexId) -> f64 {
        MinDistance::new(a, b).execute(self)
    }

    /// Routed distance between two vertices, in feet.
    #[must_use]
    pub fn min_distance_feet(&self, a: VertexId, b: VertexId) -> f64 {
        microns_to_feet(self.min_distance(a, b))
    }

    /// Vertices reachable within `max_level` hops of `vertex`.
    #[must_use]
    pub fn adjacent(&self, vertex: VertexId, max_level: usize) -> Vec<VertexId> {
        Adjacent::new(vertex, max_level).execute(self)
    }
}
