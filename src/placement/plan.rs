use tracing::{info, warn};

use crate::capacity::{CapacityLimits, WiringPlan};
use crate::config::PlannerParams;
use crate::error::Result;
use crate::graph::Graph;
use crate::mirror::MirrorAssignments;
use crate::model::{EdgeId, PanelId, VehicleModel, VertexId};

use super::controllers::{AssignControllers, PopulateControllers, ValidateControllerDistances};
use super::integrity::CheckIntegrity;
use super::outlets::AssignOutletBanks;
use super::place_edges::PlaceEdges;
use super::place_panels::PlacePanels;
use super::pending_strips;

/// Returns `true` if a vertex lies in the seed quadrant (x <= 0, z >= 0).
///
/// # Errors
///
/// Returns an error if the vertex is unknown.
pub fn in_seed_quadrant(model: &VehicleModel, vertex: VertexId) -> Result<bool> {
    let p = model.vertex(vertex)?.point;
    Ok(p.x <= 0.0 && p.z >= 0.0)
}

/// Runs the whole planning pipeline over a loaded vehicle.
///
/// Controllers are populated from the signal chains, the seed quadrant is
/// placed and mirrored, anything still unassigned is placed in a
/// completion pass, and then controllers and boxes are housed and powered.
/// The finished plan is checked for consistency before it is returned.
pub struct PlanWiring<'a> {
    params: &'a PlannerParams,
}

impl<'a> PlanWiring<'a> {
    /// Creates a new `PlanWiring` operation.
    #[must_use]
    pub fn new(params: &'a PlannerParams) -> Self {
        Self { params }
    }

    /// Executes the pipeline.
    ///
    /// # Errors
    ///
    /// Any [`crate::error::PlacementError`] aborts the run.
    pub fn execute(&self, graph: &Graph) -> Result<WiringPlan> {
        let model = graph.model();
        let placement = &self.params.placement;
        let mut plan = WiringPlan::new(CapacityLimits::from(self.params));

        let controllers = PopulateControllers::new(placement).execute(model, &mut plan)?;
        info!(controllers, "populated controllers");

        let (seed_edges, seed_panels) = Self::seed_quadrant(model)?;
        let edges = PlaceEdges::new(seed_edges, placement).execute(graph, &mut plan)?;
        let panels = PlacePanels::new(seed_panels, placement).execute(graph, &mut plan)?;
        info!(
            edges = edges.edges_placed,
            chained = edges.edges_chained,
            panel_strips = panels.strips_placed,
            boxes = plan.box_count(),
            "seed pass done"
        );

        let mirrored = MirrorAssignments::new(placement.mirror_tolerance_microns)
            .execute(graph, &mut plan)?;
        info!(
            boxes = mirrored.boxes_created,
            strips = mirrored.strips_assigned,
            skipped = mirrored.strips_skipped,
            "mirrored seed quadrant"
        );

        let (rest_edges, rest_panels) = Self::unfinished(model, &plan);
        let edges = PlaceEdges::new(rest_edges, placement).execute(graph, &mut plan)?;
        let panels = PlacePanels::new(rest_panels, placement).execute(graph, &mut plan)?;
        info!(
            edges = edges.edges_placed,
            chained = edges.edges_chained,
            panel_strips = panels.strips_placed,
            boxes = plan.box_count(),
            "completion pass done"
        );

        AssignControllers::execute(graph, &mut plan)?;
        ValidateControllerDistances::new(placement).execute(graph, &plan)?;
        info!(controllers = plan.controller_count(), "housed controllers");

        let banks = &self.params.power.outlet_bank_vertices;
        if banks.is_empty() {
            warn!("no outlet banks configured; junction boxes left without AC power");
        } else {
            AssignOutletBanks::new(banks).execute(graph, &mut plan)?;
            info!(banks = banks.len(), "assigned outlets");
        }

        CheckIntegrity::execute(model, &plan)?;
        Ok(plan)
    }

    fn seed_quadrant(model: &VehicleModel) -> Result<(Vec<EdgeId>, Vec<PanelId>)> {
        let mut edges = Vec::new();
        for (id, edge) in model.edges() {
            if all_in_seed(model, &edge.vertices)? {
                edges.push(id);
            }
        }
        let mut panels = Vec::new();
        for (id, panel) in model.panels() {
            if all_in_seed(model, &panel.vertices)? {
                panels.push(id);
            }
        }
        Ok((edges, panels))
    }

    fn unfinished(model: &VehicleModel, plan: &WiringPlan) -> (Vec<EdgeId>, Vec<PanelId>) {
        let edges = model
            .edges()
            .filter(|(_, e)| !pending_strips(plan, &e.strips).is_empty())
            .map(|(id, _)| id)
            .collect();
        let panels = model
            .panels()
            .filter(|(_, p)| !pending_strips(plan, &p.strips).is_empty())
            .map(|(id, _)| id)
            .collect();
        (edges, panels)
    }
}

fn all_in_seed(model: &VehicleModel, vertices: &[VertexId]) -> Result<bool> {
    for &v in vertices {
        if !in_seed_quadrant(model, v)? {
            return Ok(false);
        }
    }
    Ok(true)
}
