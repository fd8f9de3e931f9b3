use std::collections::HashMap;

use tracing::{debug, warn};

use crate::capacity::{ControllerId, JunctionBoxId, WiringPlan};
use crate::config::PlacementParams;
use crate::error::{PlacementError, Result};
use crate::graph::Graph;
use crate::math::microns_to_feet;
use crate::model::{Injection, VehicleModel, VertexId};

/// Creates controllers for every injection point and hands out channels.
///
/// Injections are walked in load order. At each controller vertex the most
/// recently created controller keeps taking injections until the next one
/// would overflow its channels; then a fresh controller is allocated there.
pub struct PopulateControllers<'a> {
    params: &'a PlacementParams,
}

impl<'a> PopulateControllers<'a> {
    /// Creates a new `PopulateControllers` operation.
    #[must_use]
    pub fn new(params: &'a PlacementParams) -> Self {
        Self { params }
    }

    /// Executes the operation, returning the number of controllers created.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::CapacityExceeded`] if a single panel needs
    /// more channels than any controller has.
    pub fn execute(&self, model: &VehicleModel, plan: &mut WiringPlan) -> Result<usize> {
        let max = self.params.max_channels_per_controller;
        let before = plan.controller_count();

        for injection in model.injections() {
            let channels = match *injection {
                Injection::Edge { .. } => 1,
                Injection::Panel { panel, .. } => model.panel(panel)?.channels_required,
            };
            if channels > max {
                let label = match *injection {
                    Injection::Panel { panel, .. } => model.panel(panel)?.label.clone(),
                    Injection::Edge { edge, .. } => model.edge(edge)?.label.clone(),
                };
                #[allow(clippy::cast_precision_loss)]
                let (requested, available) = (channels as f64, max as f64);
                return Err(PlacementError::CapacityExceeded {
                    target: format!("controller channels for {label}"),
                    requested,
                    available,
                }
                .into());
            }

            let vertex = injection.controller_vertex();
            let reusable = match plan.controllers_at(vertex).last() {
                Some(&last) if plan.controller_fits(last, channels)? => Some(last),
                _ => None,
            };
            let controller = match reusable {
                Some(c) => c,
                None => plan.add_controller(vertex, model.vertex_label(vertex)),
            };
            match *injection {
                Injection::Edge { edge, .. } => plan.drive_edge(controller, edge)?,
                Injection::Panel { panel, .. } => plan.drive_panel(controller, panel, channels)?,
            }
        }

        let created = plan.controller_count() - before;
        if let Some(expected) = self.params.expected_controller_count {
            if plan.controller_count() != expected {
                warn!(
                    expected,
                    actual = plan.controller_count(),
                    "controller count differs from the expected total"
                );
            }
        }
        Ok(created)
    }
}

/// Houses every controller in the nearest junction box with a free slot.
///
/// Distance is routed from the controller's vertex to the box's vertex.
/// Ties go to the box with fewer controllers, then to the older box.
pub struct AssignControllers;

impl AssignControllers {
    /// Executes the assignment.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::NoEligibleTarget`] if a controller has no
    /// reachable box with a free controller slot.
    pub fn execute(graph: &Graph, plan: &mut WiringPlan) -> Result<()> {
        let max = plan.limits().max_controllers_per_box;
        let boxes = plan.junction_box_ids();
        let mut distances: HashMap<(VertexId, VertexId), f64> = HashMap::new();
        let pending: Vec<ControllerId> = plan
            .controllers()
            .filter(|(_, c)| c.junction_box.is_none())
            .map(|(id, _)| id)
            .collect();

        for controller in pending {
            let from = plan.controller(controller)?.vertex;
            let mut best: Option<(f64, usize, JunctionBoxId)> = None;
            for &b in &boxes {
                let data = plan.junction_box(b)?;
                let housed = data.controllers.len();
                if housed >= max {
                    continue;
                }
                let distance = *distances
                    .entry((from, data.vertex))
                    .or_insert_with(|| graph.min_distance(from, data.vertex));
                if !distance.is_finite() {
                    continue;
                }
                let better = best.map_or(true, |(d, n, _)| {
                    distance < d || (distance <= d && housed < n)
                });
                if better {
                    best = Some((distance, housed, b));
                }
            }
            let Some((distance, _, target)) = best else {
                return Err(PlacementError::NoEligibleTarget(format!(
                    "no junction box with a free slot for controller {}",
                    plan.controller(controller)?.decorated_label()
                ))
                .into());
            };
            plan.house_controller(controller, target)?;
            debug!(
                controller = %plan.controller(controller)?.decorated_label(),
                junction_box = %plan.junction_box(target)?.label,
                feet = microns_to_feet(distance),
                "housed controller"
            );
        }
        Ok(())
    }
}

/// Checks that no controller sits too far from the first pixel it drives.
pub struct ValidateControllerDistances<'a> {
    params: &'a PlacementParams,
}

impl<'a> ValidateControllerDistances<'a> {
    /// Creates a new `ValidateControllerDistances` operation.
    #[must_use]
    pub fn new(params: &'a PlacementParams) -> Self {
        Self { params }
    }

    /// Executes the check.
    ///
    /// The first driven item is the controller's first edge, or its first
    /// panel when it drives no edge. An edge's first pixel is at its
    /// signal-in vertex; a panel's at its named signal-in vertex or, if
    /// none, its nearest corner.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::DistanceValidationFailure`] naming the
    /// controller and the edge or panel.
    pub fn execute(&self, graph: &Graph, plan: &WiringPlan) -> Result<()> {
        let model = graph.model();
        let limit = self.params.max_controller_to_pixel_feet;

        for (_, controller) in plan.controllers() {
            let from = controller.vertex;
            let (target, distance) = if let Some(&edge) = controller.edges.first() {
                let entry = model.signal_in_vertex(edge)?;
                (
                    format!("edge {}", model.edge(edge)?.label),
                    graph.min_distance_feet(from, entry),
                )
            } else if let Some(&panel) = controller.panels.first() {
                let data = model.panel(panel)?;
                let distance = match data.signal_in_vertex {
                    Some(entry) => graph.min_distance_feet(from, entry),
                    None => data
                        .vertices
                        .iter()
                        .map(|&corner| graph.min_distance_feet(from, corner))
                        .fold(f64::INFINITY, f64::min),
                };
                (format!("panel {}", data.label), distance)
            } else {
                continue;
            };

            if distance > limit {
                return Err(PlacementError::DistanceValidationFailure {
                    controller: controller.decorated_label(),
                    target,
                    distance_feet: distance,
                    limit_feet: limit,
                }
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::capacity::CapacityLimits;
    use crate::config::{ElectricalParams, PlannerParams};
    use crate::error::PlannerError;
    use crate::math::{feet_to_microns, Point3};
    use crate::model::{PanelKind, SignalSource};

    /// A straight line of vertices one foot apart.
    fn line(n: u32) -> VehicleModel {
        let mut m = VehicleModel::new(ElectricalParams::default());
        for label in 0..n {
            m.add_vertex(label, Point3::new(feet_to_microns(f64::from(label)), 0.0, 0.0))
                .unwrap();
        }
        for label in 1..n {
            m.add_edge(label - 1, label).unwrap();
        }
        m
    }

    fn plan() -> WiringPlan {
        WiringPlan::new(CapacityLimits::from(&PlannerParams::default()))
    }

    #[test]
    fn ninth_injection_opens_a_second_controller() {
        let mut m = line(11);
        let v0 = m.vertex_by_label(0).unwrap();
        let edges: Vec<_> = m.edges().map(|(id, _)| id).collect();
        for &e in &edges[..9] {
            m.set_edge_signal(e, SignalSource::Controller(v0), None).unwrap();
        }
        let mut p = plan();
        let params = PlacementParams::default();
        let created = PopulateControllers::new(&params).execute(&m, &mut p).unwrap();
        assert_eq!(created, 2);
        let labels: Vec<_> = p.controllers().map(|(_, c)| c.label.clone()).collect();
        assert_eq!(labels, vec!["0-0", "0-1"]);
        let channels: Vec<_> = p.controllers().map(|(_, c)| c.channels).collect();
        assert_eq!(channels, vec![8, 1]);
    }

    #[test]
    fn oversized_panel_is_rejected() {
        let mut m = line(3);
        m.add_vertex(9, Point3::new(0.0, 300_000.0, 0.0)).unwrap();
        let panel = m.add_panel("P", [0, 1, 9]).unwrap();
        let v0 = m.vertex_by_label(0).unwrap();
        m.set_panel_signal(panel, PanelKind::Lit, 9, Some(v0), None).unwrap();
        let params = PlacementParams::default();
        let err = PopulateControllers::new(&params)
            .execute(&m, &mut plan())
            .unwrap_err();
        assert!(matches!(
            err,
            PlannerError::Placement(PlacementError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn controllers_go_to_nearest_box_until_full() {
        let m = line(6);
        let graph = Graph::new(m);
        let model = graph.model();
        let v0 = model.vertex_by_label(0).unwrap();
        let v5 = model.vertex_by_label(5).unwrap();
        let mut p = plan();
        let near = p.add_junction_box(v0, 0);
        let far = p.add_junction_box(v5, 5);
        for _ in 0..5 {
            p.add_controller(v0, 0);
        }
        AssignControllers::execute(&graph, &mut p).unwrap();
        assert_eq!(p.junction_box(near).unwrap().controllers.len(), 4);
        assert_eq!(p.junction_box(far).unwrap().controllers.len(), 1);
    }

    #[test]
    fn no_box_is_fatal() {
        let graph = Graph::new(line(2));
        let v0 = graph.model().vertex_by_label(0).unwrap();
        let mut p = plan();
        p.add_controller(v0, 0);
        let err = AssignControllers::execute(&graph, &mut p).unwrap_err();
        assert!(matches!(
            err,
            PlannerError::Placement(PlacementError::NoEligibleTarget(_))
        ));
    }

    #[test]
    fn distant_controller_fails_validation() {
        let mut m = line(12);
        let far_edge = m.edge_by_label("10-11").unwrap();
        let near_edge = m.edge_by_label("0-1").unwrap();
        let v0 = m.vertex_by_label(0).unwrap();
        m.set_edge_signal(near_edge, SignalSource::Controller(v0), None).unwrap();
        let graph = Graph::new(m);
        let params = PlacementParams::default();

        let mut p = plan();
        PopulateControllers::new(&params)
            .execute(graph.model(), &mut p)
            .unwrap();
        ValidateControllerDistances::new(&params)
            .execute(&graph, &p)
            .unwrap();

        let c = p.add_controller(v0, 0);
        p.drive_edge(c, far_edge).unwrap();
        let err = ValidateControllerDistances::new(&params)
            .execute(&graph, &p)
            .unwrap_err();
        assert!(matches!(
            err,
            PlannerError::Placement(PlacementError::DistanceValidationFailure { .. })
        ));
    }
}
