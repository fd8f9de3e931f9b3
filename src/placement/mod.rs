//! Junction-box placement and the passes that complete a wiring plan.

mod candidates;
mod controllers;
mod integrity;
mod outlets;
mod packing;
mod place_edges;
mod place_panels;
mod plan;

#[cfg(test)]
pub(crate) mod fixtures;

pub use candidates::{
    allowed_box_vertices, edge_candidates, find_location_for_new_box, panel_strip_candidates,
};
pub use controllers::{AssignControllers, PopulateControllers, ValidateControllerDistances};
pub use integrity::CheckIntegrity;
pub use outlets::AssignOutletBanks;
pub use packing::{can_fit_strips, pack_edge_strips};
pub use place_edges::{EdgePlacement, PlaceEdges};
pub use place_panels::{PanelPlacement, PlacePanels};
pub use plan::{in_seed_quadrant, PlanWiring};

use crate::capacity::WiringPlan;
use crate::model::StripId;

/// Strips from `strips` that have no circuit yet, in order.
fn pending_strips(plan: &WiringPlan, strips: &[StripId]) -> Vec<StripId> {
    strips
        .iter()
        .copied()
        .filter(|&s| !plan.is_assigned(s))
        .collect()
}
