pub mod edge;
pub mod panel;
pub mod strip;
pub mod vertex;

pub use edge::{EdgeData, EdgeId, SignalSource};
pub use panel::{PanelData, PanelId, PanelKind};
pub use strip::{StripData, StripId, StripOwner};
pub use vertex::{VertexData, VertexId};

use std::collections::HashMap;

use slotmap::SlotMap;
use tracing::debug;

use crate::config::ElectricalParams;
use crate::error::{ModelError, Result};
use crate::math::{heron_area, straight_line_distance, triangle_centroid, Point3};

/// A point where a controller injects signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    Edge {
        edge: EdgeId,
        controller_vertex: VertexId,
    },
    Panel {
        panel: PanelId,
        controller_vertex: VertexId,
    },
}

impl Injection {
    /// The vertex the injecting controller sits at.
    #[must_use]
    pub fn controller_vertex(&self) -> VertexId {
        match *self {
            Self::Edge {
                controller_vertex, ..
            }
            | Self::Panel {
                controller_vertex, ..
            } => controller_vertex,
        }
    }
}

/// Central arena that owns the vehicle geometry and its signal chains.
///
/// Entities reference each other via typed IDs; file labels resolve to IDs
/// through direct lookup tables built on insertion.
#[derive(Debug)]
pub struct VehicleModel {
    electrical: ElectricalParams,
    vertices: SlotMap<VertexId, VertexData>,
    edges: SlotMap<EdgeId, EdgeData>,
    panels: SlotMap<PanelId, PanelData>,
    strips: SlotMap<StripId, StripData>,
    vertex_labels: HashMap<u32, VertexId>,
    edge_labels: HashMap<String, EdgeId>,
    edge_pairs: HashMap<(VertexId, VertexId), EdgeId>,
    panel_labels: HashMap<String, PanelId>,
    panel_corners: HashMap<[VertexId; 3], PanelId>,
    injections: Vec<Injection>,
}

/// Splits an `a-b` edge label into its two vertex ids.
#[must_use]
pub fn parse_edge_label(label: &str) -> Option<(u32, u32)> {
    let (a, b) = label.trim().split_once('-')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

fn canonical_edge_label(a: u32, b: u32) -> String {
    format!("{}-{}", a.min(b), a.max(b))
}

fn ordered_pair(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn sorted_corners(mut corners: [VertexId; 3]) -> [VertexId; 3] {
    corners.sort();
    corners
}

impl VehicleModel {
    /// Creates an empty model whose strips are sized by `electrical`.
    #[must_use]
    pub fn new(electrical: ElectricalParams) -> Self {
        Self {
            electrical,
            vertices: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            panels: SlotMap::with_key(),
            strips: SlotMap::with_key(),
            vertex_labels: HashMap::new(),
            edge_labels: HashMap::new(),
            edge_pairs: HashMap::new(),
            panel_labels: HashMap::new(),
            panel_corners: HashMap::new(),
            injections: Vec::new(),
        }
    }

    /// The electrical constants strips were sized with.
    #[must_use]
    pub fn electrical(&self) -> &ElectricalParams {
        &self.electrical
    }

    // --- Vertex operations ---

    /// Inserts a vertex and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if a vertex with the same label already exists.
    pub fn add_vertex(&mut self, label: u32, point: Point3) -> Result<VertexId> {
        if self.vertex_labels.contains_key(&label) {
            return Err(ModelError::DuplicateEntity(format!("vertex {label}")).into());
        }
        let id = self.vertices.insert(VertexData::new(label, point));
        self.vertex_labels.insert(label, id);
        Ok(id)
    }

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData> {
        self.vertices
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound(format!("vertex {id:?}")).into())
    }

    /// Resolves a file label to a vertex ID.
    ///
    /// # Errors
    ///
    /// Returns an error if no vertex carries the label.
    pub fn vertex_by_label(&self, label: u32) -> Result<VertexId> {
        self.vertex_labels
            .get(&label)
            .copied()
            .ok_or_else(|| ModelError::EntityNotFound(format!("vertex {label}")).into())
    }

    /// The file label of a vertex, or `0` for an unknown ID.
    #[must_use]
    pub fn vertex_label(&self, id: VertexId) -> u32 {
        self.vertices.get(id).map_or(0, |v| v.label)
    }

    /// Iterates over all vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &VertexData)> {
        self.vertices.iter()
    }

    // --- Edge operations ---

    /// Inserts the edge between two labelled vertices, cutting its strips.
    ///
    /// # Errors
    ///
    /// Returns an error if either vertex is unknown, the endpoints
    /// coincide, or the edge already exists.
    pub fn add_edge(&mut self, a: u32, b: u32) -> Result<EdgeId> {
        let label = canonical_edge_label(a, b);
        if a == b {
            return Err(ModelError::InvalidEdge {
                edge: label,
                reason: "both endpoints are the same vertex".into(),
            }
            .into());
        }
        if self.edge_labels.contains_key(&label) {
            return Err(ModelError::DuplicateEntity(format!("edge {label}")).into());
        }
        let va = self.vertex_by_label(a.min(b))?;
        let vb = self.vertex_by_label(a.max(b))?;
        let length = straight_line_distance(&self.vertex(va)?.point, &self.vertex(vb)?.point);

        let strip_current =
            length * self.electrical.leds_per_micron * self.electrical.max_current_per_led;
        let strips_per_edge = self.electrical.strips_per_edge;

        let id = self.edges.insert(EdgeData {
            label: label.clone(),
            vertices: [va, vb],
            length,
            strips: Vec::with_capacity(strips_per_edge),
            signal_from: None,
            signal_to: None,
            depth: 0,
            build_priority: None,
        });
        let strips: Vec<StripId> = (0..strips_per_edge)
            .map(|index| {
                self.strips.insert(StripData {
                    label: format!("{label}-{index}"),
                    owner: StripOwner::Edge { edge: id, index },
                    current: strip_current,
                })
            })
            .collect();
        if let Some(edge) = self.edges.get_mut(id) {
            edge.strips = strips;
        }
        self.edge_labels.insert(label, id);
        self.edge_pairs.insert(ordered_pair(va, vb), id);
        Ok(id)
    }

    /// Returns a reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeData> {
        self.edges
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound(format!("edge {id:?}")).into())
    }

    /// Resolves an `a-b` label (either vertex order) to an edge ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the label is malformed or names no edge.
    pub fn edge_by_label(&self, label: &str) -> Result<EdgeId> {
        parse_edge_label(label)
            .and_then(|(a, b)| self.edge_labels.get(&canonical_edge_label(a, b)))
            .copied()
            .ok_or_else(|| ModelError::EntityNotFound(format!("edge {label}")).into())
    }

    /// The edge joining two vertices, if there is one.
    #[must_use]
    pub fn edge_between(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.edge_pairs.get(&ordered_pair(a, b)).copied()
    }

    /// Iterates over all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> {
        self.edges.iter()
    }

    // --- Panel operations ---

    /// Inserts a lit panel over three labelled vertices, cutting its strips.
    ///
    /// # Errors
    ///
    /// Returns an error if a corner is unknown, the corners are not
    /// distinct, or the panel label is taken.
    pub fn add_panel(&mut self, label: &str, corners: [u32; 3]) -> Result<PanelId> {
        if self.panel_labels.contains_key(label) {
            return Err(ModelError::DuplicateEntity(format!("panel {label}")).into());
        }
        let vertices = [
            self.vertex_by_label(corners[0])?,
            self.vertex_by_label(corners[1])?,
            self.vertex_by_label(corners[2])?,
        ];
        let key = sorted_corners(vertices);
        if key[0] == key[1] || key[1] == key[2] {
            return Err(ModelError::InvalidPanel {
                panel: label.into(),
                reason: "corners are not three distinct vertices".into(),
            }
            .into());
        }
        let [a, b, c] = [
            self.vertex(vertices[0])?.point,
            self.vertex(vertices[1])?.point,
            self.vertex(vertices[2])?.point,
        ];
        let area = heron_area(&a, &b, &c);
        let num_leds = area * self.electrical.leds_per_square_micron;
        let max_current = num_leds * self.electrical.max_current_per_led;

        let id = self.panels.insert(PanelData {
            label: label.into(),
            vertices,
            area,
            centroid: triangle_centroid(&a, &b, &c),
            num_leds,
            max_current,
            strips: Vec::new(),
            kind: PanelKind::Lit,
            channels_required: 1,
            controller_vertex: None,
            signal_in_vertex: None,
        });
        self.cut_panel_strips(id)?;
        self.panel_labels.insert(label.into(), id);
        self.panel_corners.insert(key, id);
        Ok(id)
    }

    fn cut_panel_strips(&mut self, id: PanelId) -> Result<()> {
        let cap = self.electrical.panel_strip_current();
        let panel = self
            .panels
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound(format!("panel {id:?}")))?;
        let label = panel.label.clone();
        let currents = panel::split_panel_current(panel.max_current, cap);
        let strips: Vec<StripId> = currents
            .into_iter()
            .enumerate()
            .map(|(index, current)| {
                self.strips.insert(StripData {
                    label: format!("{label}-{index}"),
                    owner: StripOwner::Panel { panel: id, index },
                    current,
                })
            })
            .collect();
        if let Some(panel) = self.panels.get_mut(id) {
            panel.strips = strips;
        }
        Ok(())
    }

    /// Returns a reference to the panel data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn panel(&self, id: PanelId) -> Result<&PanelData> {
        self.panels
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound(format!("panel {id:?}")).into())
    }

    /// Resolves a panel label to its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if no panel carries the label.
    pub fn panel_by_label(&self, label: &str) -> Result<PanelId> {
        self.panel_labels
            .get(label)
            .copied()
            .ok_or_else(|| ModelError::EntityNotFound(format!("panel {label}")).into())
    }

    /// The panel spanning exactly these three vertices, in any order.
    #[must_use]
    pub fn panel_with_vertices(&self, corners: [VertexId; 3]) -> Option<PanelId> {
        self.panel_corners.get(&sorted_corners(corners)).copied()
    }

    /// Iterates over all panels in insertion order.
    pub fn panels(&self) -> impl Iterator<Item = (PanelId, &PanelData)> {
        self.panels.iter()
    }

    // --- Strip operations ---

    /// Returns a reference to the strip data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the model.
    pub fn strip(&self, id: StripId) -> Result<&StripData> {
        self.strips
            .get(id)
            .ok_or_else(|| ModelError::EntityNotFound(format!("strip {id:?}")).into())
    }

    /// Iterates over all strips.
    pub fn strips(&self) -> impl Iterator<Item = (StripId, &StripData)> {
        self.strips.iter()
    }

    /// Number of strips in the model.
    #[must_use]
    pub fn strip_count(&self) -> usize {
        self.strips.len()
    }

    // --- Signal chains ---

    /// Records where an edge receives its signal from.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge already has an upstream, if the
    /// upstream edge already feeds another edge, or if the edge would feed
    /// itself.
    pub fn set_edge_signal(
        &mut self,
        edge: EdgeId,
        source: SignalSource,
        build_priority: Option<u32>,
    ) -> Result<()> {
        let label = self.edge(edge)?.label.clone();
        if self.edge(edge)?.signal_from.is_some() {
            return Err(ModelError::SignalConflict {
                edge: label,
                reason: "signal source assigned twice".into(),
            }
            .into());
        }
        match source {
            SignalSource::Edge(upstream) if upstream == edge => {
                return Err(ModelError::SignalCycle(label).into());
            }
            SignalSource::Edge(upstream) => {
                let up = self
                    .edges
                    .get_mut(upstream)
                    .ok_or_else(|| ModelError::EntityNotFound(format!("edge {upstream:?}")))?;
                if let Some(existing) = up.signal_to {
                    if existing != edge {
                        return Err(ModelError::SignalConflict {
                            edge: up.label.clone(),
                            reason: format!("already feeds another edge besides {label}"),
                        }
                        .into());
                    }
                }
                up.signal_to = Some(edge);
            }
            SignalSource::Controller(controller_vertex) => {
                self.vertex(controller_vertex)?;
                self.injections.push(Injection::Edge {
                    edge,
                    controller_vertex,
                });
            }
        }
        if let Some(data) = self.edges.get_mut(edge) {
            data.signal_from = Some(source);
            data.build_priority = build_priority;
        }
        Ok(())
    }

    /// Applies a row of the panel signal file.
    ///
    /// Unlit panels lose their strips; panels with channels and a
    /// controller vertex become controller injections.
    ///
    /// # Errors
    ///
    /// Returns an error if the panel or a named vertex is unknown.
    pub fn set_panel_signal(
        &mut self,
        panel: PanelId,
        kind: PanelKind,
        channels_required: usize,
        controller_vertex: Option<VertexId>,
        signal_in_vertex: Option<VertexId>,
    ) -> Result<()> {
        for v in controller_vertex.iter().chain(signal_in_vertex.iter()) {
            self.vertex(*v)?;
        }
        let data = self
            .panels
            .get_mut(panel)
            .ok_or_else(|| ModelError::EntityNotFound(format!("panel {panel:?}")))?;
        data.kind = kind;
        data.channels_required = channels_required;
        data.controller_vertex = controller_vertex;
        data.signal_in_vertex = signal_in_vertex;
        if kind == PanelKind::Unlit {
            for strip in std::mem::take(&mut data.strips) {
                self.strips.remove(strip);
            }
        }
        if let Some(controller_vertex) = controller_vertex {
            if channels_required > 0 {
                self.injections.push(Injection::Panel {
                    panel,
                    controller_vertex,
                });
            }
        }
        Ok(())
    }

    /// Controller injection points, in the order they were loaded.
    #[must_use]
    pub fn injections(&self) -> &[Injection] {
        &self.injections
    }

    /// Computes every edge's depth in its signal chain.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SignalCycle`] if following upstream links
    /// from some edge never reaches a controller or an unfed edge.
    pub fn resolve_signal_depths(&mut self) -> Result<()> {
        let limit = self.edges.len();
        let mut depths = Vec::with_capacity(limit);
        for (id, edge) in &self.edges {
            let mut depth = 0;
            let mut current = edge.signal_from;
            while let Some(SignalSource::Edge(upstream)) = current {
                depth += 1;
                if depth > limit {
                    return Err(ModelError::SignalCycle(edge.label.clone()).into());
                }
                current = self.edge(upstream)?.signal_from;
            }
            depths.push((id, depth));
        }
        for (id, depth) in depths {
            if let Some(edge) = self.edges.get_mut(id) {
                edge.depth = depth;
            }
        }
        debug!(edges = limit, "resolved signal depths");
        Ok(())
    }

    /// The endpoint where an edge's signal enters.
    ///
    /// For an injected edge this is the endpoint nearest (straight-line)
    /// to the controller; for a chained edge, the vertex it shares with
    /// its upstream edge; otherwise the first endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge or a referenced entity is unknown.
    pub fn signal_in_vertex(&self, id: EdgeId) -> Result<VertexId> {
        let edge = self.edge(id)?;
        let [a, b] = edge.vertices;
        match edge.signal_from {
            Some(SignalSource::Controller(controller)) => {
                let origin = self.vertex(controller)?.point;
                let da = straight_line_distance(&self.vertex(a)?.point, &origin);
                let db = straight_line_distance(&self.vertex(b)?.point, &origin);
                Ok(if db < da { b } else { a })
            }
            Some(SignalSource::Edge(upstream)) => {
                let up = self.edge(upstream)?;
                Ok(edge
                    .vertices
                    .iter()
                    .copied()
                    .find(|v| up.has_vertex(*v))
                    .unwrap_or(a))
            }
            None => Ok(a),
        }
    }
}
