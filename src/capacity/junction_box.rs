use crate::model::VertexId;

use super::circuit::CircuitId;
use super::controller::ControllerId;
use super::outlet_bank::OutletRef;

slotmap::new_key_type! {
    /// Unique identifier for a junction box.
    pub struct JunctionBoxId;
}

/// A junction box mounted at a vertex.
///
/// Several boxes may share a vertex when local demand exceeds one box.
#[derive(Debug, Clone)]
pub struct JunctionBoxData {
    /// `<vertex>-<n>`.
    pub label: String,
    pub vertex: VertexId,
    pub circuits: Vec<CircuitId>,
    pub controllers: Vec<ControllerId>,
    /// The AC outlet powering this box, once assigned.
    pub outlet: Option<OutletRef>,
}
