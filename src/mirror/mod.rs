//! Replicates one quadrant's junction boxes onto its symmetric twins.
//!
//! The vehicle is symmetric about the x = 0 and z = 0 planes. A box placed
//! for the seed quadrant is copied to the mirrored vertex under each
//! reflection, and every strip it powers is matched to the mirrored strip,
//! which goes onto the same-index circuit of the copy.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::capacity::{JunctionBoxId, WiringPlan};
use crate::error::Result;
use crate::graph::Graph;
use crate::math::{straight_line_distance, Point3, CURRENT_TOLERANCE};
use crate::model::{StripId, StripOwner, VehicleModel, VertexId};

/// A coordinate-sign reflection of the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reflection {
    /// Negates z (port/starboard).
    FlipZ,
    /// Negates x (fore/aft).
    FlipX,
    FlipBoth,
}

impl Reflection {
    /// Every reflection, in the order mirroring applies them.
    pub const ALL: [Self; 3] = [Self::FlipZ, Self::FlipX, Self::FlipBoth];

    /// Reflects a point.
    #[must_use]
    pub fn apply(self, point: &Point3) -> Point3 {
        match self {
            Self::FlipZ => Point3::new(point.x, point.y, -point.z),
            Self::FlipX => Point3::new(-point.x, point.y, point.z),
            Self::FlipBoth => Point3::new(-point.x, point.y, -point.z),
        }
    }
}

/// Maps every vertex to the vertex nearest its reflection, if one lies
/// within `tolerance` microns.
#[must_use]
pub fn mirror_vertices(
    model: &VehicleModel,
    reflection: Reflection,
    tolerance: f64,
) -> HashMap<VertexId, VertexId> {
    let mut map = HashMap::new();
    for (id, vertex) in model.vertices() {
        let target = reflection.apply(&vertex.point);
        let mut best: Option<(f64, VertexId)> = None;
        for (candidate, other) in model.vertices() {
            let d = straight_line_distance(&target, &other.point);
            if d <= tolerance && best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, candidate));
            }
        }
        if let Some((_, mirrored)) = best {
            map.insert(id, mirrored);
        }
    }
    map
}

/// The strip occupying the same position on the mirrored edge or panel.
///
/// # Errors
///
/// Returns an error if the strip or its owner is unknown.
pub fn mirrored_strip(
    model: &VehicleModel,
    strip: StripId,
    map: &HashMap<VertexId, VertexId>,
) -> Result<Option<StripId>> {
    let data = model.strip(strip)?;
    let owner_strips = match data.owner {
        StripOwner::Edge { edge, .. } => {
            let [a, b] = model.edge(edge)?.vertices;
            let (Some(&ma), Some(&mb)) = (map.get(&a), map.get(&b)) else {
                return Ok(None);
            };
            match model.edge_between(ma, mb) {
                Some(e) => &model.edge(e)?.strips,
                None => return Ok(None),
            }
        }
        StripOwner::Panel { panel, .. } => {
            let [a, b, c] = model.panel(panel)?.vertices;
            let (Some(&ma), Some(&mb), Some(&mc)) = (map.get(&a), map.get(&b), map.get(&c)) else {
                return Ok(None);
            };
            match model.panel_with_vertices([ma, mb, mc]) {
                Some(p) => &model.panel(p)?.strips,
                None => return Ok(None),
            }
        }
    };
    Ok(owner_strips.get(data.index()).copied())
}

/// Counts from one mirroring run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorSummary {
    pub boxes_created: usize,
    pub strips_assigned: usize,
    /// Mirrored strips that did not fit the matching circuit.
    pub strips_skipped: usize,
}

/// Copies the boxes present at the start of the run across every
/// reflection.
///
/// Boxes whose vertex has no counterpart, or mirrors onto itself, are
/// skipped. A copy is only created when at least one mirrored strip fits
/// it, so running the operation again creates nothing.
pub struct MirrorAssignments {
    tolerance: f64,
}

impl MirrorAssignments {
    /// Creates a new `MirrorAssignments` operation matching vertices within
    /// `tolerance` microns.
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Executes the mirroring.
    ///
    /// # Errors
    ///
    /// Returns an error if an entity referenced by the plan is unknown.
    pub fn execute(&self, graph: &Graph, plan: &mut WiringPlan) -> Result<MirrorSummary> {
        let model = graph.model();
        let sources = plan.junction_box_ids();
        let mut summary = MirrorSummary::default();

        for reflection in Reflection::ALL {
            let map = mirror_vertices(model, reflection, self.tolerance);
            for &source in &sources {
                let source_vertex = plan.junction_box(source)?.vertex;
                let Some(&target_vertex) = map.get(&source_vertex) else {
                    continue;
                };
                if target_vertex == source_vertex {
                    continue;
                }
                let accepted = Self::fitting_strips(model, plan, source, &map, &mut summary)?;
                if accepted.is_empty() {
                    continue;
                }
                let copy = plan.add_junction_box(target_vertex, model.vertex_label(target_vertex));
                summary.boxes_created += 1;
                debug!(
                    ?reflection,
                    from = %plan.junction_box(source)?.label,
                    to = %plan.junction_box(copy)?.label,
                    "mirrored junction box"
                );
                for (index, mirrored) in accepted {
                    let slot = plan.junction_box(copy)?.circuits[index];
                    plan.assign_strip(model, mirrored, slot)?;
                    summary.strips_assigned += 1;
                }
            }
        }
        Ok(summary)
    }

    /// Unassigned mirrored strips of `source` that fit the same-index
    /// circuit of a fresh copy, paired with that index. Strips that do not
    /// fit are counted as skipped.
    fn fitting_strips(
        model: &VehicleModel,
        plan: &WiringPlan,
        source: JunctionBoxId,
        map: &HashMap<VertexId, VertexId>,
        summary: &mut MirrorSummary,
    ) -> Result<Vec<(usize, StripId)>> {
        let capacity = plan.limits().circuit_max_current + CURRENT_TOLERANCE;
        let mut loads: HashMap<usize, f64> = HashMap::new();
        let mut taken: HashSet<StripId> = HashSet::new();
        let mut accepted = Vec::new();
        for (index, &circuit) in plan.junction_box(source)?.circuits.iter().enumerate() {
            for strip in plan.circuit(circuit)?.strips() {
                let Some(mirrored) = mirrored_strip(model, strip, map)? else {
                    continue;
                };
                if plan.is_assigned(mirrored) || !taken.insert(mirrored) {
                    continue;
                }
                let current = model.strip(mirrored)?.current;
                let load = loads.entry(index).or_insert(0.0);
                if *load + current > capacity {
                    warn!(
                        strip = %model.strip(mirrored)?.label,
                        circuit = index,
                        "mirrored strip does not fit; leaving it for completion"
                    );
                    summary.strips_skipped += 1;
                    continue;
                }
                *load += current;
                accepted.push((index, mirrored));
            }
        }
        Ok(accepted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::capacity::CapacityLimits;
    use crate::config::PlannerParams;
    use crate::placement::fixtures::symmetric_vehicle;

    fn strips(model: &VehicleModel, edge: &str) -> Vec<StripId> {
        model
            .edge(model.edge_by_label(edge).unwrap())
            .unwrap()
            .strips
            .clone()
    }

    #[test]
    fn reflections_negate_the_right_axes() {
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(Reflection::FlipZ.apply(&p), Point3::new(1.0, 2.0, -3.0));
        assert_eq!(Reflection::FlipX.apply(&p), Point3::new(-1.0, 2.0, 3.0));
        assert_eq!(Reflection::FlipBoth.apply(&p), Point3::new(-1.0, 2.0, -3.0));
    }

    #[test]
    fn vertices_match_within_tolerance() {
        let graph = Graph::new(symmetric_vehicle());
        let model = graph.model();
        let map = mirror_vertices(model, Reflection::FlipZ, 1_000.0);
        let v = |l| model.vertex_by_label(l).unwrap();
        assert_eq!(map[&v(10)], v(20));
        assert_eq!(map[&v(0)], v(0));
        let mirrored = mirrored_strip(model, strips(model, "10-11")[2], &map).unwrap();
        assert_eq!(mirrored, Some(strips(model, "20-21")[2]));
    }

    #[test]
    fn mirroring_copies_circuits_and_is_idempotent() {
        let graph = Graph::new(symmetric_vehicle());
        let model = graph.model();
        let mut plan = WiringPlan::new(CapacityLimits::from(&PlannerParams::default()));
        let v10 = model.vertex_by_label(10).unwrap();
        let source = plan.add_junction_box(v10, 10);
        let circuits = plan.junction_box(source).unwrap().circuits.clone();
        for (i, strip) in strips(model, "10-11").into_iter().enumerate() {
            plan.assign_strip(model, strip, circuits[i + 4]).unwrap();
        }

        let op = MirrorAssignments::new(1_000.0);
        let first = op.execute(&graph, &mut plan).unwrap();
        assert_eq!(first.boxes_created, 3);
        assert_eq!(first.strips_assigned, 9);
        assert_eq!(first.strips_skipped, 0);

        for (edge, vertex) in [("20-21", 20), ("30-31", 30), ("40-41", 40)] {
            for (i, strip) in strips(model, edge).into_iter().enumerate() {
                let circuit = plan.strip_circuit(strip).unwrap();
                let data = plan.circuit(circuit).unwrap();
                assert_eq!(data.index, i + 4);
                let owner = plan.junction_box(data.junction_box).unwrap();
                assert_eq!(owner.vertex, model.vertex_by_label(vertex).unwrap());
            }
        }

        let second = op.execute(&graph, &mut plan).unwrap();
        assert_eq!(second, MirrorSummary::default());
        assert_eq!(plan.box_count(), 4);
    }

    /// One strip per edge; the z-mirror of `1-2` is 500 microns longer, so
    /// its strip draws a little more than a full circuit.
    fn lopsided_pair() -> (Graph, PlannerParams) {
        let mut params = PlannerParams::default();
        params.electrical.strips_per_edge = 1;
        let mut m = VehicleModel::new(params.electrical.clone());
        m.add_vertex(1, Point3::new(1_000_000.0, 0.0, 1_000_000.0)).unwrap();
        m.add_vertex(2, Point3::new(1_000_000.0, 0.0, 3_000_000.0)).unwrap();
        m.add_vertex(3, Point3::new(1_000_000.0, 0.0, -1_000_000.0)).unwrap();
        m.add_vertex(4, Point3::new(1_000_000.0, 0.0, -3_000_500.0)).unwrap();
        let source = m.add_edge(1, 2).unwrap();
        let full = m.edge(source).unwrap().strips[0];
        params.electrical.circuit_max_current = m.strip(full).unwrap().current;
        m.add_edge(3, 4).unwrap();
        (Graph::new(m), params)
    }

    #[test]
    fn oversized_mirror_strip_leaves_no_empty_box() {
        let (graph, params) = lopsided_pair();
        let model = graph.model();
        let mut plan = WiringPlan::new(CapacityLimits::from(&params));
        let v1 = model.vertex_by_label(1).unwrap();
        let source = plan.add_junction_box(v1, 1);
        let circuit = plan.junction_box(source).unwrap().circuits[0];
        plan.assign_strip(model, strips(model, "1-2")[0], circuit).unwrap();

        let op = MirrorAssignments::new(1_000.0);
        let skipped_only = MirrorSummary {
            strips_skipped: 1,
            ..MirrorSummary::default()
        };
        assert_eq!(op.execute(&graph, &mut plan).unwrap(), skipped_only);
        assert_eq!(plan.box_count(), 1);
        assert!(!plan.is_assigned(strips(model, "3-4")[0]));

        assert_eq!(op.execute(&graph, &mut plan).unwrap(), skipped_only);
        assert_eq!(plan.box_count(), 1);
    }

    #[test]
    fn self_mirrored_box_is_skipped() {
        let graph = Graph::new(symmetric_vehicle());
        let model = graph.model();
        let mut plan = WiringPlan::new(CapacityLimits::from(&PlannerParams::default()));
        let center = model.vertex_by_label(0).unwrap();
        let b = plan.add_junction_box(center, 0);
        let circuit = plan.junction_box(b).unwrap().circuits[0];
        plan.assign_strip(model, strips(model, "0-10")[0], circuit).unwrap();
        let summary = MirrorAssignments::new(1_000.0).execute(&graph, &mut plan).unwrap();
        assert_eq!(summary, MirrorSummary::default());
    }
}
