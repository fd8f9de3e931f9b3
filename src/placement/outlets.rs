use tracing::debug;

use crate::capacity::{OutletBankId, WiringPlan};
use crate::error::{PlacementError, Result};
use crate::graph::Graph;

/// Powers every junction box from an AC outlet.
///
/// Banks are created at the given vertex labels. Each box, in creation
/// order, takes the routed-nearest bank that still has a free outlet and
/// claims an outlet on that bank's least-loaded circuit.
pub struct AssignOutletBanks<'a> {
    bank_vertices: &'a [u32],
}

impl<'a> AssignOutletBanks<'a> {
    /// Creates a new `AssignOutletBanks` operation.
    #[must_use]
    pub fn new(bank_vertices: &'a [u32]) -> Self {
        Self { bank_vertices }
    }

    /// Executes the assignment.
    ///
    /// # Errors
    ///
    /// Returns an error if a bank vertex is unknown, and
    /// [`PlacementError::NoEligibleTarget`] if some box cannot reach a
    /// bank with a free outlet.
    pub fn execute(&self, graph: &Graph, plan: &mut WiringPlan) -> Result<()> {
        let model = graph.model();
        if plan.outlet_banks().next().is_none() {
            for &label in self.bank_vertices {
                let vertex = model.vertex_by_label(label)?;
                plan.add_outlet_bank(vertex, label);
            }
        }
        let banks: Vec<OutletBankId> = plan.outlet_banks().map(|(id, _)| id).collect();

        for junction_box in plan.junction_box_ids() {
            let data = plan.junction_box(junction_box)?;
            if data.outlet.is_some() {
                continue;
            }
            let from = data.vertex;
            let mut best: Option<(f64, OutletBankId)> = None;
            for &bank in &banks {
                let bank_data = plan.outlet_bank(bank)?;
                if !bank_data.has_free_outlet() {
                    continue;
                }
                let distance = graph.min_distance(from, bank_data.vertex);
                if distance.is_finite() && best.map_or(true, |(d, _)| distance < d) {
                    best = Some((distance, bank));
                }
            }
            let Some((_, bank)) = best else {
                return Err(PlacementError::NoEligibleTarget(format!(
                    "no outlet bank with a free outlet for junction box {}",
                    plan.junction_box(junction_box)?.label
                ))
                .into());
            };
            let outlet = plan.claim_outlet(bank, junction_box)?;
            debug!(
                junction_box = %plan.junction_box(junction_box)?.label,
                bank = %plan.outlet_bank(bank)?.decorated_label(),
                circuit = outlet.circuit,
                "claimed outlet"
            );
        }
        Ok(())
    }
}
