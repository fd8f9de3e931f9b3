use tracing::debug;

use crate::capacity::{CircuitId, WiringPlan};
use crate::config::PlacementParams;
use crate::error::{ModelError, Result};
use crate::graph::Graph;
use crate::model::PanelId;

use super::candidates::panel_strip_candidates;
use super::pending_strips;

/// Counts from one panel placement pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelPlacement {
    pub strips_placed: usize,
    pub boxes_created: usize,
}

/// Assigns every pending strip of a set of panels, one strip at a time.
///
/// Each strip goes to the most utilized circuit that still fits it. A strip
/// with no candidate gets a new box at the panel's first corner.
pub struct PlacePanels<'a> {
    panels: Vec<PanelId>,
    params: &'a PlacementParams,
}

impl<'a> PlacePanels<'a> {
    /// Creates a new `PlacePanels` operation over `panels`.
    #[must_use]
    pub fn new(panels: Vec<PanelId>, params: &'a PlacementParams) -> Self {
        Self { panels, params }
    }

    /// Executes the placement.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PlacementError::CapacityExceeded`] if a
    /// strip does not fit even an empty circuit.
    pub fn execute(&self, graph: &Graph, plan: &mut WiringPlan) -> Result<PanelPlacement> {
        let model = graph.model();
        let mut summary = PanelPlacement::default();

        for &panel in &self.panels {
            let data = model.panel(panel)?;
            for strip in pending_strips(plan, &data.strips) {
                let current = model.strip(strip)?.current;
                let candidates = panel_strip_candidates(graph, plan, panel, current, self.params)?;
                let circuit = if let Some(best) = most_utilized(plan, &candidates)? {
                    best
                } else {
                    let corner = data.vertices[0];
                    let created = plan.add_junction_box(corner, model.vertex_label(corner));
                    summary.boxes_created += 1;
                    debug!(
                        panel = %data.label,
                        junction_box = %plan.junction_box(created)?.label,
                        "placed new junction box for panel"
                    );
                    plan.junction_box(created)?
                        .circuits
                        .first()
                        .copied()
                        .ok_or_else(|| ModelError::EntityNotFound("circuit 0".into()))?
                };
                plan.assign_strip(model, strip, circuit)?;
                summary.strips_placed += 1;
            }
        }
        Ok(summary)
    }
}

fn most_utilized(plan: &WiringPlan, candidates: &[CircuitId]) -> Result<Option<CircuitId>> {
    let mut best: Option<(f64, CircuitId)> = None;
    for &candidate in candidates {
        let utilization = plan.circuit(candidate)?.utilization();
        if best.map_or(true, |(u, _)| utilization > u) {
            best = Some((utilization, candidate));
        }
    }
    Ok(best.map(|(_, c)| c))
}
