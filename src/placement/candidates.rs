use std::collections::{HashSet, VecDeque};

use crate::capacity::{CircuitId, JunctionBoxId, WiringPlan};
use crate::config::PlacementParams;
use crate::error::{PlacementError, Result};
use crate::graph::Graph;
use crate::math::feet_to_microns;
use crate::model::{EdgeId, PanelId, VertexId};

use super::packing::can_fit_strips;

/// Vertices where a box may be mounted: the crow's-nest platform and any
/// panel corner, where a panel hides the box from view.
///
/// # Errors
///
/// Returns an error if a configured crow's-nest vertex is unknown.
pub fn allowed_box_vertices(graph: &Graph, params: &PlacementParams) -> Result<HashSet<VertexId>> {
    let model = graph.model();
    let mut allowed = HashSet::new();
    for &label in &params.crows_nest_vertices {
        allowed.insert(model.vertex_by_label(label)?);
    }
    for (_, panel) in model.panels() {
        allowed.extend(panel.vertices);
    }
    Ok(allowed)
}

/// Returns `true` if the box can take strips drawing `currents`.
///
/// # Errors
///
/// Returns an error if the box is unknown.
pub fn box_can_fit(plan: &WiringPlan, junction_box: JunctionBoxId, currents: &[f64]) -> Result<bool> {
    Ok(can_fit_strips(&plan.circuit_headrooms(junction_box)?, currents))
}

/// Existing boxes that could power an edge's pending strips.
///
/// Boxes at either endpoint come first. Only if none fits are boxes within
/// `neighbor_search_hops` considered, and only where the routed distance to
/// an endpoint stays under the voltage-drop limit.
///
/// # Errors
///
/// Returns an error if the edge or a box is unknown.
pub fn edge_candidates(
    graph: &Graph,
    plan: &WiringPlan,
    edge: EdgeId,
    currents: &[f64],
    params: &PlacementParams,
) -> Result<Vec<JunctionBoxId>> {
    let data = graph.model().edge(edge)?;
    let mut candidates = Vec::new();
    for vertex in data.vertices {
        for &b in plan.boxes_at(vertex) {
            if box_can_fit(plan, b, currents)? {
                candidates.push(b);
            }
        }
    }
    if !candidates.is_empty() {
        return Ok(candidates);
    }

    let limit = feet_to_microns(params.voltage_drop_limit_feet);
    let mut seen: HashSet<VertexId> = data.vertices.into_iter().collect();
    for vertex in data.vertices {
        for nearby in graph.adjacent(vertex, params.neighbor_search_hops) {
            if !seen.insert(nearby) || plan.boxes_at(nearby).is_empty() {
                continue;
            }
            let close = data
                .vertices
                .iter()
                .any(|&end| graph.min_distance(nearby, end) < limit);
            if !close {
                continue;
            }
            for &b in plan.boxes_at(nearby) {
                if box_can_fit(plan, b, currents)? {
                    candidates.push(b);
                }
            }
        }
    }
    Ok(candidates)
}

/// Existing circuits that could take one panel strip of `current` amps.
///
/// Boxes at the panel's corners come first; failing that, boxes one hop
/// away whose routed distance to every corner is under the voltage-drop
/// limit.
///
/// # Errors
///
/// Returns an error if the panel, a box, or a circuit is unknown.
pub fn panel_strip_candidates(
    graph: &Graph,
    plan: &WiringPlan,
    panel: PanelId,
    current: f64,
    params: &PlacementParams,
) -> Result<Vec<CircuitId>> {
    let data = graph.model().panel(panel)?;
    let mut candidates = Vec::new();
    for vertex in data.vertices {
        collect_fitting_circuits(plan, vertex, current, &mut candidates)?;
    }
    if !candidates.is_empty() {
        return Ok(candidates);
    }

    let limit = feet_to_microns(params.voltage_drop_limit_feet);
    let mut seen: HashSet<VertexId> = data.vertices.into_iter().collect();
    for vertex in data.vertices {
        for hop in graph.neighbors(vertex) {
            if !seen.insert(hop.vertex) || plan.boxes_at(hop.vertex).is_empty() {
                continue;
            }
            let close = data
                .vertices
                .iter()
                .all(|&corner| graph.min_distance(hop.vertex, corner) < limit);
            if close {
                collect_fitting_circuits(plan, hop.vertex, current, &mut candidates)?;
            }
        }
    }
    Ok(candidates)
}

fn collect_fitting_circuits(
    plan: &WiringPlan,
    vertex: VertexId,
    current: f64,
    out: &mut Vec<CircuitId>,
) -> Result<()> {
    for &b in plan.boxes_at(vertex) {
        for &c in &plan.junction_box(b)?.circuits {
            if plan.circuit(c)?.fits(current) {
                out.push(c);
            }
        }
    }
    Ok(())
}

/// Breadth-first search outward from `start` for the nearest allowed
/// mounting vertex. Starting vertices are checked first, in order.
///
/// # Errors
///
/// Returns [`PlacementError::NoEligibleTarget`] if no allowed vertex is
/// reachable.
pub fn find_location_for_new_box(
    graph: &Graph,
    start: &[VertexId],
    allowed: &HashSet<VertexId>,
) -> Result<VertexId> {
    let mut visited: HashSet<VertexId> = start.iter().copied().collect();
    let mut queue: VecDeque<VertexId> = start.iter().copied().collect();
    while let Some(vertex) = queue.pop_front() {
        if allowed.contains(&vertex) {
            return Ok(vertex);
        }
        for hop in graph.neighbors(vertex) {
            if visited.insert(hop.vertex) {
                queue.push_back(hop.vertex);
            }
        }
    }
    let labels: Vec<String> = start
        .iter()
        .map(|v| graph.model().vertex_label(*v).to_string())
        .collect();
    Err(PlacementError::NoEligibleTarget(format!(
        "no concealable box location reachable from vertices {}",
        labels.join(", ")
    ))
    .into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::capacity::CapacityLimits;
    use crate::config::{ElectricalParams, PlannerParams};
    use crate::error::PlannerError;
    use crate::math::Point3;
    use crate::model::VehicleModel;

    const CURRENTS: [f64; 3] = [1.0, 1.0, 1.0];

    /// A straight run 1-2-3-4-5 along x, `spacing` feet between vertices.
    fn run(spacing: f64) -> Graph {
        let mut model = VehicleModel::new(ElectricalParams::default());
        for label in 1..=5 {
            let x = feet_to_microns(spacing * f64::from(label));
            model.add_vertex(label, Point3::new(x, 0.0, 0.0)).unwrap();
        }
        for label in 1..5 {
            model.add_edge(label, label + 1).unwrap();
        }
        Graph::new(model)
    }

    fn plan_with_box_at(graph: &Graph, label: u32) -> (WiringPlan, JunctionBoxId) {
        let mut plan = WiringPlan::new(CapacityLimits::from(&PlannerParams::default()));
        let vertex = graph.model().vertex_by_label(label).unwrap();
        let b = plan.add_junction_box(vertex, label);
        (plan, b)
    }

    fn candidates_for_first_edge(graph: &Graph, plan: &WiringPlan) -> Vec<JunctionBoxId> {
        let edge = graph.model().edge_by_label("1-2").unwrap();
        edge_candidates(graph, plan, edge, &CURRENTS, &PlacementParams::default()).unwrap()
    }

    #[test]
    fn endpoint_box_is_preferred() {
        let graph = run(1.0);
        let (mut plan, at_endpoint) = plan_with_box_at(&graph, 2);
        let v4 = graph.model().vertex_by_label(4).unwrap();
        plan.add_junction_box(v4, 4);
        assert_eq!(candidates_for_first_edge(&graph, &plan), vec![at_endpoint]);
    }

    #[test]
    fn box_two_hops_away_within_drop_limit() {
        let graph = run(1.0);
        let (plan, b) = plan_with_box_at(&graph, 4);
        assert_eq!(candidates_for_first_edge(&graph, &plan), vec![b]);
    }

    #[test]
    fn box_two_hops_away_beyond_drop_limit() {
        // 20 ft from the nearer endpoint.
        let graph = run(10.0);
        let (plan, _) = plan_with_box_at(&graph, 4);
        assert!(candidates_for_first_edge(&graph, &plan).is_empty());
    }

    #[test]
    fn box_three_hops_away_is_out_of_reach() {
        let graph = run(1.0);
        let (plan, _) = plan_with_box_at(&graph, 5);
        assert!(candidates_for_first_edge(&graph, &plan).is_empty());
    }

    /// Panel over 1-2-3 with a spur from 3 to 4 of `spur` feet.
    fn panel_with_spur(spur: f64) -> (Graph, PanelId) {
        let mut model = VehicleModel::new(ElectricalParams::default());
        let ft = feet_to_microns;
        model.add_vertex(1, Point3::new(0.0, 0.0, 0.0)).unwrap();
        model.add_vertex(2, Point3::new(ft(1.0), 0.0, 0.0)).unwrap();
        model.add_vertex(3, Point3::new(0.0, ft(1.0), 0.0)).unwrap();
        model.add_vertex(4, Point3::new(0.0, ft(1.0 + spur), 0.0)).unwrap();
        for (a, b) in [(1, 2), (2, 3), (1, 3), (3, 4)] {
            model.add_edge(a, b).unwrap();
        }
        let panel = model.add_panel("P1", [1, 2, 3]).unwrap();
        (Graph::new(model), panel)
    }

    #[test]
    fn panel_falls_back_to_neighbouring_box() {
        let (graph, panel) = panel_with_spur(2.0);
        let (plan, b) = plan_with_box_at(&graph, 4);
        let found =
            panel_strip_candidates(&graph, &plan, panel, 5.0, &PlacementParams::default()).unwrap();
        assert_eq!(found, plan.junction_box(b).unwrap().circuits);
    }

    #[test]
    fn panel_ignores_neighbour_beyond_drop_limit() {
        let (graph, panel) = panel_with_spur(20.0);
        let (plan, _) = plan_with_box_at(&graph, 4);
        let found =
            panel_strip_candidates(&graph, &plan, panel, 5.0, &PlacementParams::default()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn new_box_goes_to_nearest_allowed_vertex() {
        let graph = run(1.0);
        let v = |l| graph.model().vertex_by_label(l).unwrap();
        let allowed: HashSet<VertexId> = [v(4), v(5)].into_iter().collect();
        assert_eq!(find_location_for_new_box(&graph, &[v(1), v(2)], &allowed).unwrap(), v(4));
    }

    #[test]
    fn new_box_without_allowed_vertex_is_fatal() {
        let graph = run(1.0);
        let start = [graph.model().vertex_by_label(1).unwrap()];
        let result = find_location_for_new_box(&graph, &start, &HashSet::new());
        assert!(matches!(
            result,
            Err(PlannerError::Placement(PlacementError::NoEligibleTarget(_)))
        ));
    }
}
