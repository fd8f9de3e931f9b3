use std::fmt;

use tracing::warn;

use crate::capacity::WiringPlan;
use crate::config::CableParams;
use crate::error::Result;
use crate::graph::Graph;
use crate::math::{microns_to_feet, straight_line_distance};
use crate::model::{PanelId, SignalSource, StripOwner};

/// Cable counts per length bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CableManifest {
    /// `(upper bound in feet, count)`, ascending.
    pub buckets: Vec<(u32, usize)>,
    /// Cables longer than the largest bucket.
    pub overflow: usize,
}

impl CableManifest {
    /// Total number of cables, overflow included.
    #[must_use]
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|&(_, n)| n).sum::<usize>() + self.overflow
    }
}

/// Sorts cable lengths (feet) into `<= 5`, `<= 10`, ... buckets.
#[must_use]
pub fn bucket_cable_lengths(lengths: &[f64], params: &CableParams) -> CableManifest {
    let bounds: Vec<u32> = (1..=params.bucket_count)
        .map(|i| i * params.bucket_width_feet)
        .collect();
    let mut buckets: Vec<(u32, usize)> = bounds.iter().map(|&b| (b, 0)).collect();
    let mut overflow = 0;
    for &length in lengths {
        match buckets
            .iter_mut()
            .find(|(bound, _)| length <= f64::from(*bound))
        {
            Some((_, count)) => *count += 1,
            None => {
                warn!(feet = length, "cable is longer than the largest bucket");
                overflow += 1;
            }
        }
    }
    CableManifest { buckets, overflow }
}

/// Low-voltage runs from boxes to the strips they power.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerRuns {
    /// Run lengths in feet.
    pub lengths: Vec<f64>,
    pub gender_changers: usize,
    pub y_connectors: usize,
}

/// Low-voltage cable runs for every circuit.
///
/// An edge strip whose upstream edge shares the circuit rides on that
/// edge's cable. Every other edge strip gets a routed run to the edge's
/// nearest endpoint, and needs a gender changer when that endpoint is not
/// where the signal enters. Each distinct panel on a circuit gets one
/// straight-line run to its centroid.
///
/// # Errors
///
/// Returns an error if the plan references unknown entities.
pub fn power_cable_lengths(graph: &Graph, plan: &WiringPlan) -> Result<PowerRuns> {
    let model = graph.model();
    let mut runs = PowerRuns::default();

    for (_, junction_box) in plan.junction_boxes() {
        let origin = junction_box.vertex;
        for &circuit_id in &junction_box.circuits {
            let circuit = plan.circuit(circuit_id)?;
            let mut edges = Vec::with_capacity(circuit.edge_strips.len());
            for &strip in &circuit.edge_strips {
                if let StripOwner::Edge { edge, .. } = model.strip(strip)?.owner {
                    edges.push(edge);
                }
            }

            let mut chained = 0;
            for &edge in &edges {
                let data = model.edge(edge)?;
                if let Some(SignalSource::Edge(upstream)) = data.signal_from {
                    if edges.contains(&upstream) {
                        chained += 1;
                        continue;
                    }
                }
                let [a, b] = data.vertices;
                let (da, db) = (
                    graph.min_distance_feet(origin, a),
                    graph.min_distance_feet(origin, b),
                );
                let (nearest, length) = if db < da { (b, db) } else { (a, da) };
                if nearest != model.signal_in_vertex(edge)? {
                    runs.gender_changers += 1;
                }
                runs.lengths.push(length);
            }
            runs.y_connectors += edges.len().saturating_sub(1 + chained);

            let origin_point = model.vertex(origin)?.point;
            let mut panels: Vec<PanelId> = Vec::new();
            for &strip in &circuit.panel_strips {
                if let StripOwner::Panel { panel, .. } = model.strip(strip)?.owner {
                    if !panels.contains(&panel) {
                        panels.push(panel);
                        let centroid = model.panel(panel)?.centroid;
                        runs.lengths
                            .push(microns_to_feet(straight_line_distance(&centroid, &origin_point)));
                    }
                }
            }
        }
    }
    Ok(runs)
}

/// Routed network runs from each box to the controllers it houses.
///
/// # Errors
///
/// Returns an error if the plan references unknown entities.
pub fn ethernet_cable_lengths(graph: &Graph, plan: &WiringPlan) -> Result<Vec<f64>> {
    let mut lengths = Vec::new();
    for (_, junction_box) in plan.junction_boxes() {
        for &controller in &junction_box.controllers {
            let vertex = plan.controller(controller)?.vertex;
            lengths.push(graph.min_distance_feet(junction_box.vertex, vertex));
        }
    }
    Ok(lengths)
}

/// Routed AC runs from each powered box to its outlet bank, plus the
/// rigging allowance.
///
/// # Errors
///
/// Returns an error if the plan references unknown entities.
pub fn ac_power_cable_lengths(
    graph: &Graph,
    plan: &WiringPlan,
    params: &CableParams,
) -> Result<Vec<f64>> {
    let mut lengths = Vec::new();
    for (_, junction_box) in plan.junction_boxes() {
        let Some(outlet) = junction_box.outlet else {
            continue;
        };
        let bank = plan.outlet_bank(outlet.bank)?;
        lengths.push(
            graph.min_distance_feet(junction_box.vertex, bank.vertex)
                + params.ac_rigging_allowance_feet,
        );
    }
    Ok(lengths)
}

/// 5V runs from each box to the controllers it houses.
///
/// A co-located controller still needs a one-foot lead. Every length is
/// scaled by the fudge factor.
///
/// # Errors
///
/// Returns an error if the plan references unknown entities.
pub fn controller_power_cable_lengths(
    graph: &Graph,
    plan: &WiringPlan,
    params: &CableParams,
) -> Result<Vec<f64>> {
    Ok(ethernet_cable_lengths(graph, plan)?
        .into_iter()
        .map(|feet| {
            let feet = if feet <= 0.0 { 1.0 } else { feet };
            feet * params.controller_power_fudge_factor
        })
        .collect())
}

/// Every cable manifest for a finished plan.
#[derive(Debug, Clone)]
pub struct CableReport {
    pub power: CableManifest,
    pub gender_changers: usize,
    pub y_connectors: usize,
    pub ethernet: CableManifest,
    pub ac_power: CableManifest,
    pub controller_power: CableManifest,
}

impl CableReport {
    /// Measures and buckets every cable class.
    ///
    /// # Errors
    ///
    /// Returns an error if the plan references unknown entities.
    pub fn build(graph: &Graph, plan: &WiringPlan, params: &CableParams) -> Result<Self> {
        let power = power_cable_lengths(graph, plan)?;
        Ok(Self {
            power: bucket_cable_lengths(&power.lengths, params),
            gender_changers: power.gender_changers,
            y_connectors: power.y_connectors,
            ethernet: bucket_cable_lengths(&ethernet_cable_lengths(graph, plan)?, params),
            ac_power: bucket_cable_lengths(&ac_power_cable_lengths(graph, plan, params)?, params),
            controller_power: bucket_cable_lengths(
                &controller_power_cable_lengths(graph, plan, params)?,
                params,
            ),
        })
    }
}

fn write_manifest(f: &mut fmt::Formatter<'_>, title: &str, manifest: &CableManifest) -> fmt::Result {
    writeln!(f, "{title} ({} cables):", manifest.total())?;
    for &(bound, count) in &manifest.buckets {
        if count > 0 {
            writeln!(f, "  <= {bound:>3} ft: {count}")?;
        }
    }
    if manifest.overflow > 0 {
        writeln!(f, "  longer:     {}", manifest.overflow)?;
    }
    Ok(())
}

impl fmt::Display for CableReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_manifest(f, "Low-voltage power", &self.power)?;
        writeln!(f, "  gender changers: {}", self.gender_changers)?;
        writeln!(f, "  Y connectors: {}", self.y_connectors)?;
        write_manifest(f, "Controller ethernet", &self.ethernet)?;
        write_manifest(f, "AC power", &self.ac_power)?;
        write_manifest(f, "5V controller power", &self.controller_power)
    }
}
