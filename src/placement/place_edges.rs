use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::capacity::{CircuitId, JunctionBoxId, WiringPlan};
use crate::config::PlacementParams;
use crate::error::{PlacementError, Result};
use crate::graph::Graph;
use crate::model::EdgeId;

use super::candidates::{allowed_box_vertices, edge_candidates, find_location_for_new_box};
use super::packing::pack_edge_strips;
use super::pending_strips;

/// Counts from one edge placement pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgePlacement {
    /// Edges whose strips were packed through candidate search.
    pub edges_placed: usize,
    /// Edges that rode along on their upstream edge's circuits.
    pub edges_chained: usize,
    pub boxes_created: usize,
}

/// Assigns every pending strip of a set of edges to junction-box circuits.
///
/// Edges are visited in non-decreasing signal depth so an upstream edge is
/// always placed before the edges chained from it. After an edge is placed,
/// its downstream edge is put on the same circuits when they still have
/// room, keeping a continuous signal run on one circuit.
pub struct PlaceEdges<'a> {
    edges: Vec<EdgeId>,
    params: &'a PlacementParams,
}

impl<'a> PlaceEdges<'a> {
    /// Creates a new `PlaceEdges` operation over `edges`.
    #[must_use]
    pub fn new(edges: Vec<EdgeId>, params: &'a PlacementParams) -> Self {
        Self { edges, params }
    }

    /// Executes the placement.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::NoEligibleTarget`] if a new box is needed
    /// but no mounting point is reachable, and
    /// [`PlacementError::CapacityExceeded`] if a strip is too large for an
    /// empty circuit.
    pub fn execute(&self, graph: &Graph, plan: &mut WiringPlan) -> Result<EdgePlacement> {
        let model = graph.model();
        let mut order = Vec::with_capacity(self.edges.len());
        for &edge in &self.edges {
            let data = model.edge(edge)?;
            order.push((data.depth, data.label.clone(), edge));
        }
        order.sort();
        let working: HashSet<EdgeId> = self.edges.iter().copied().collect();
        let allowed = allowed_box_vertices(graph, self.params)?;
        let mut summary = EdgePlacement::default();

        for (_, label, edge) in order {
            let pending = pending_strips(plan, &model.edge(edge)?.strips);
            if pending.is_empty() {
                continue;
            }
            let mut currents = Vec::with_capacity(pending.len());
            for &strip in &pending {
                currents.push(model.strip(strip)?.current);
            }

            let candidates = edge_candidates(graph, plan, edge, &currents, self.params)?;
            let target = if let Some(best) = most_utilized(plan, &candidates)? {
                best
            } else {
                let vertex =
                    find_location_for_new_box(graph, &model.edge(edge)?.vertices, &allowed)?;
                let created = plan.add_junction_box(vertex, model.vertex_label(vertex));
                summary.boxes_created += 1;
                debug!(
                    edge = %label,
                    junction_box = %plan.junction_box(created)?.label,
                    "placed new junction box"
                );
                created
            };

            let circuits = plan.junction_box(target)?.circuits.clone();
            let slots = pack_edge_strips(&plan.circuit_headrooms(target)?, &currents)
                .ok_or_else(|| PlacementError::CapacityExceeded {
                    target: format!("edge {label}"),
                    requested: currents.iter().copied().fold(0.0, f64::max),
                    available: 0.0,
                })?;
            for (strip, slot) in pending.into_iter().zip(slots) {
                plan.assign_strip(model, strip, circuits[slot])?;
            }
            summary.edges_placed += 1;
            summary.edges_chained += chain_downstream(graph, plan, edge, &working)?;
        }
        Ok(summary)
    }
}

/// The candidate with the highest average utilization; the first wins ties.
fn most_utilized(plan: &WiringPlan, candidates: &[JunctionBoxId]) -> Result<Option<JunctionBoxId>> {
    let mut best: Option<(f64, JunctionBoxId)> = None;
    for &candidate in candidates {
        let utilization = plan.box_utilization(candidate)?;
        if best.map_or(true, |(u, _)| utilization > u) {
            best = Some((utilization, candidate));
        }
    }
    Ok(best.map(|(_, b)| b))
}

/// Follows `signal_to` links from `edge`, putting each downstream edge's
/// strips on the circuits of the matching upstream strips while they fit.
/// Stops at the first edge outside `working`, already touched, or too
/// heavy. Returns the number of edges chained.
fn chain_downstream(
    graph: &Graph,
    plan: &mut WiringPlan,
    edge: EdgeId,
    working: &HashSet<EdgeId>,
) -> Result<usize> {
    let model = graph.model();
    let mut upstream = edge;
    let mut chained = 0;

    while let Some(downstream) = model.edge(upstream)?.signal_to {
        if !working.contains(&downstream) {
            break;
        }
        let up_strips = &model.edge(upstream)?.strips;
        let down_strips = &model.edge(downstream)?.strips;
        if up_strips.len() != down_strips.len() || down_strips.iter().any(|s| plan.is_assigned(*s))
        {
            break;
        }
        let Some(targets) = up_strips
            .iter()
            .map(|s| plan.strip_circuit(*s))
            .collect::<Option<Vec<CircuitId>>>()
        else {
            break;
        };

        let mut extra: HashMap<CircuitId, f64> = HashMap::new();
        for (&strip, &circuit) in down_strips.iter().zip(&targets) {
            *extra.entry(circuit).or_default() += model.strip(strip)?.current;
        }
        let mut fits = true;
        for (&circuit, &amps) in &extra {
            fits &= plan.circuit(circuit)?.fits(amps);
        }
        if !fits {
            break;
        }

        for (&strip, &circuit) in down_strips.iter().zip(&targets) {
            plan.assign_strip(model, strip, circuit)?;
        }
        debug!(
            from = %model.edge(upstream)?.label,
            to = %model.edge(downstream)?.label,
            "chained edge onto upstream circuits"
        );
        chained += 1;
        upstream = downstream;
    }
    Ok(chained)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::capacity::CapacityLimits;
    use crate::config::PlannerParams;
    use crate::placement::fixtures::symmetric_vehicle;

    fn pod_edges(graph: &Graph) -> Vec<EdgeId> {
        ["10-12", "11-12", "10-11"]
            .iter()
            .map(|l| graph.model().edge_by_label(l).unwrap())
            .collect()
    }

    #[test]
    fn new_box_goes_to_nearest_concealed_vertex() {
        let graph = Graph::new(symmetric_vehicle());
        let params = PlannerParams::default().placement;
        let params = PlacementParams {
            crows_nest_vertices: Vec::new(),
            ..params
        };
        let mut plan = WiringPlan::new(CapacityLimits::from(&PlannerParams::default()));
        let spoke = graph.model().edge_by_label("0-20").unwrap();
        let summary = PlaceEdges::new(vec![spoke], &params)
            .execute(&graph, &mut plan)
            .unwrap();
        assert_eq!(summary.boxes_created, 1);
        let (_, b) = plan.junction_boxes().next().unwrap();
        assert_eq!(b.label, "20-0");
    }

    #[test]
    fn chain_follows_signal_order() {
        let graph = Graph::new(symmetric_vehicle());
        let mut params = PlannerParams::default();
        params.placement.crows_nest_vertices = Vec::new();
        let mut plan = WiringPlan::new(CapacityLimits::from(&params));
        let summary = PlaceEdges::new(pod_edges(&graph), &params.placement)
            .execute(&graph, &mut plan)
            .unwrap();
        assert_eq!(summary.edges_placed, 1);
        assert_eq!(summary.edges_chained, 2);
        assert_eq!(plan.box_count(), 1);
    }

    #[test]
    fn chain_breaks_when_circuits_are_full() {
        let graph = Graph::new(symmetric_vehicle());
        let mut params = PlannerParams::default();
        params.placement.crows_nest_vertices = Vec::new();
        params.electrical.circuit_max_current = 2.0;
        let mut plan = WiringPlan::new(CapacityLimits::from(&params));
        let summary = PlaceEdges::new(pod_edges(&graph), &params.placement)
            .execute(&graph, &mut plan)
            .unwrap();
        assert_eq!(summary.edges_placed, 3);
        assert_eq!(summary.edges_chained, 0);
        assert_eq!(plan.box_count(), 1);
        for (_, circuit) in plan.circuits() {
            assert!(circuit.current <= 2.0);
        }
    }
}
