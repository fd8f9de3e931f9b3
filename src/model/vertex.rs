use crate::math::Point3;

slotmap::new_key_type! {
    /// Unique identifier for a vertex in the vehicle model.
    pub struct VertexId;
}

/// A structural vertex of the vehicle.
#[derive(Debug, Clone)]
pub struct VertexData {
    /// The numeric id used by the geometry files.
    pub label: u32,
    /// The 3D position of the vertex, in microns.
    pub point: Point3,
}

impl VertexData {
    /// Creates a new vertex at the given point.
    #[must_use]
    pub fn new(label: u32, point: Point3) -> Self {
        Self { label, point }
    }
}
