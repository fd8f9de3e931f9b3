use std::collections::BTreeMap;
use std::fmt;

use crate::capacity::WiringPlan;
use crate::error::Result;
use crate::model::VehicleModel;

/// Load on the boxes sharing one vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLoad {
    pub vertex: u32,
    pub boxes: Vec<String>,
    pub amps: f64,
    /// Mean circuit utilization over every box at the vertex.
    pub utilization: f64,
}

/// What one controller drives and where it is housed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerLoad {
    pub controller: String,
    pub junction_box: Option<String>,
    pub channels: usize,
    pub edges: Vec<String>,
    pub panels: Vec<String>,
}

/// Per-vertex and per-controller summary of a plan.
#[derive(Debug, Clone)]
pub struct UtilizationReport {
    /// Ordered by vertex label.
    pub vertices: Vec<VertexLoad>,
    pub box_count: usize,
    pub total_amps: f64,
    pub average_utilization: f64,
    pub controllers: Vec<ControllerLoad>,
}

impl UtilizationReport {
    /// Summarizes a plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan references unknown entities.
    pub fn build(model: &VehicleModel, plan: &WiringPlan) -> Result<Self> {
        let mut by_vertex: BTreeMap<u32, (Vec<String>, f64, f64)> = BTreeMap::new();
        for (id, junction_box) in plan.junction_boxes() {
            let entry = by_vertex
                .entry(model.vertex_label(junction_box.vertex))
                .or_default();
            entry.0.push(junction_box.label.clone());
            entry.1 += plan.box_current(id)?;
            entry.2 += plan.box_utilization(id)?;
        }

        #[allow(clippy::cast_precision_loss)]
        let vertices: Vec<VertexLoad> = by_vertex
            .into_iter()
            .map(|(vertex, (boxes, amps, utilization))| VertexLoad {
                vertex,
                utilization: utilization / boxes.len() as f64,
                boxes,
                amps,
            })
            .collect();

        let box_count = plan.box_count();
        let total_amps = vertices.iter().map(|v| v.amps).sum();
        let mut utilization_sum = 0.0;
        for (id, _) in plan.junction_boxes() {
            utilization_sum += plan.box_utilization(id)?;
        }
        #[allow(clippy::cast_precision_loss)]
        let average_utilization = if box_count == 0 {
            0.0
        } else {
            utilization_sum / box_count as f64
        };

        let mut controllers = Vec::with_capacity(plan.controller_count());
        for (_, controller) in plan.controllers() {
            let junction_box = match controller.junction_box {
                Some(b) => Some(plan.junction_box(b)?.label.clone()),
                None => None,
            };
            let mut edges = Vec::with_capacity(controller.edges.len());
            for &edge in &controller.edges {
                edges.push(model.edge(edge)?.label.clone());
            }
            let mut panels = Vec::with_capacity(controller.panels.len());
            for &panel in &controller.panels {
                panels.push(model.panel(panel)?.label.clone());
            }
            controllers.push(ControllerLoad {
                controller: controller.decorated_label(),
                junction_box,
                channels: controller.channels,
                edges,
                panels,
            });
        }

        Ok(Self {
            vertices,
            box_count,
            total_amps,
            average_utilization,
            controllers,
        })
    }
}

impl fmt::Display for UtilizationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Junction boxes:")?;
        for v in &self.vertices {
            writeln!(
                f,
                "  vertex {:>4}: {} box(es) [{}], {:.2} A, {:.1}% utilized",
                v.vertex,
                v.boxes.len(),
                v.boxes.join(", "),
                v.amps,
                v.utilization * 100.0
            )?;
        }
        writeln!(
            f,
            "  {} vertices, {} boxes, {:.2} A total, {:.1}% average utilization",
            self.vertices.len(),
            self.box_count,
            self.total_amps,
            self.average_utilization * 100.0
        )?;
        writeln!(f, "Controllers:")?;
        for c in &self.controllers {
            writeln!(
                f,
                "  {} in {}: {} channel(s), edges [{}], panels [{}]",
                c.controller,
                c.junction_box.as_deref().unwrap_or("-"),
                c.channels,
                c.edges.join(", "),
                c.panels.join(", ")
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::capacity::CapacityLimits;
    use crate::config::PlannerParams;
    use crate::placement::fixtures::symmetric_vehicle;
    use approx::assert_relative_eq;

    #[test]
    fn loads_group_by_vertex() {
        let model = symmetric_vehicle();
        let mut plan = WiringPlan::new(CapacityLimits::from(&PlannerParams::default()));
        let v10 = model.vertex_by_label(10).unwrap();
        let first = plan.add_junction_box(v10, 10);
        plan.add_junction_box(v10, 10);
        let edge = model.edge_by_label("10-11").unwrap();
        let strips = model.edge(edge).unwrap().strips.clone();
        let circuit = plan.junction_box(first).unwrap().circuits[0];
        for strip in strips {
            plan.assign_strip(&model, strip, circuit).unwrap();
        }
        let c = plan.add_controller(v10, 10);
        plan.drive_edge(c, edge).unwrap();
        plan.house_controller(c, first).unwrap();

        let report = UtilizationReport::build(&model, &plan).unwrap();
        assert_eq!(report.vertices.len(), 1);
        let load = &report.vertices[0];
        assert_eq!(load.boxes, vec!["10-0", "10-1"]);
        let amps = model.strip(model.edge(edge).unwrap().strips[0]).unwrap().current * 3.0;
        assert_relative_eq!(load.amps, amps, epsilon = 1e-9);
        assert_relative_eq!(load.utilization, amps / 15.0 / 16.0 / 2.0, epsilon = 1e-9);
        assert_relative_eq!(report.average_utilization, load.utilization, epsilon = 1e-9);
        assert_eq!(report.controllers[0].edges, vec!["10-11"]);
        assert_eq!(report.controllers[0].junction_box.as_deref(), Some("10-0"));
        assert!(report.to_string().contains("C10-0"));
    }
}
