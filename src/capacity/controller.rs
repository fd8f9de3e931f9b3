use crate::model::{EdgeId, PanelId, VertexId};

use super::junction_box::JunctionBoxId;

slotmap::new_key_type! {
    /// Unique identifier for a signal controller.
    pub struct ControllerId;
}

/// A signal controller located at a vertex.
///
/// `edges` only lists injection edges; edges chained from them draw no
/// extra channel.
#[derive(Debug, Clone)]
pub struct ControllerData {
    /// `<vertex>-<n>`.
    pub label: String,
    pub vertex: VertexId,
    pub edges: Vec<EdgeId>,
    pub panels: Vec<PanelId>,
    /// Running channel count: one per edge plus each panel's requirement.
    pub channels: usize,
    pub junction_box: Option<JunctionBoxId>,
}

impl ControllerData {
    /// Creates a controller with nothing assigned.
    #[must_use]
    pub fn new(label: String, vertex: VertexId) -> Self {
        Self {
            label,
            vertex,
            edges: Vec::new(),
            panels: Vec::new(),
            channels: 0,
            junction_box: None,
        }
    }

    /// Label as printed on the build sheets.
    #[must_use]
    pub fn decorated_label(&self) -> String {
        format!("C{}", self.label)
    }
}
