use crate::capacity::WiringPlan;
use crate::error::{PlacementError, Result};
use crate::math::CURRENT_TOLERANCE;
use crate::model::{Injection, VehicleModel};

/// Final consistency checks over a finished plan.
///
/// None of these should ever fire once placement succeeded; each one
/// compares two independently maintained views of the same fact.
pub struct CheckIntegrity;

impl CheckIntegrity {
    /// Executes every check.
    ///
    /// # Errors
    ///
    /// Returns [`PlacementError::DataIntegrityMismatch`] describing the
    /// first disagreement found.
    pub fn execute(model: &VehicleModel, plan: &WiringPlan) -> Result<()> {
        check_channels(model, plan)?;
        check_strips(model, plan)?;
        check_circuits(model, plan)?;
        check_housing(plan)?;
        check_power(plan)?;
        Ok(())
    }
}

fn mismatch(message: String) -> crate::error::PlannerError {
    PlacementError::DataIntegrityMismatch(message).into()
}

fn check_channels(model: &VehicleModel, plan: &WiringPlan) -> Result<()> {
    let mut expected = 0;
    for injection in model.injections() {
        expected += match *injection {
            Injection::Edge { .. } => 1,
            Injection::Panel { panel, .. } => model.panel(panel)?.channels_required,
        };
    }
    let counted: usize = plan.controllers().map(|(_, c)| c.channels).sum();
    let driven: usize = plan
        .controllers()
        .map(|(_, c)| c.edges.len())
        .sum::<usize>()
        + plan
            .controllers()
            .flat_map(|(_, c)| c.panels.iter())
            .map(|&p| model.panel(p).map_or(0, |d| d.channels_required))
            .sum::<usize>();
    if expected != counted || counted != driven {
        return Err(mismatch(format!(
            "channel totals disagree: {expected} injected, {counted} reserved, {driven} driven"
        )));
    }
    Ok(())
}

fn check_strips(model: &VehicleModel, plan: &WiringPlan) -> Result<()> {
    for (id, strip) in model.strips() {
        let Some(circuit) = plan.strip_circuit(id) else {
            return Err(mismatch(format!("strip {} has no circuit", strip.label)));
        };
        let data = plan.circuit(circuit)?;
        let listed = data.strips().filter(|&s| s == id).count();
        if listed != 1 {
            return Err(mismatch(format!(
                "strip {} is listed {listed} times on {}",
                strip.label,
                plan.circuit_label(circuit)?
            )));
        }
    }
    let listed: usize = plan.circuits().map(|(_, c)| c.strips().count()).sum();
    if listed != model.strip_count() || plan.assigned_strip_count() != model.strip_count() {
        return Err(mismatch(format!(
            "{} strips in the model but {listed} listed on circuits",
            model.strip_count()
        )));
    }
    Ok(())
}

fn check_circuits(model: &VehicleModel, plan: &WiringPlan) -> Result<()> {
    for (id, circuit) in plan.circuits() {
        let mut total = 0.0;
        for strip in circuit.strips() {
            total += model.strip(strip)?.current;
        }
        if (total - circuit.current).abs() > CURRENT_TOLERANCE * 1e3
            || circuit.current > circuit.max_current + CURRENT_TOLERANCE
        {
            return Err(mismatch(format!(
                "circuit {} carries {:.3} A but its strips draw {total:.3} A (max {:.3})",
                plan.circuit_label(id)?,
                circuit.current,
                circuit.max_current
            )));
        }
    }
    Ok(())
}

fn check_housing(plan: &WiringPlan) -> Result<()> {
    for (_, controller) in plan.controllers() {
        if controller.junction_box.is_none() {
            return Err(mismatch(format!(
                "controller {} is not housed",
                controller.decorated_label()
            )));
        }
    }
    Ok(())
}

fn check_power(plan: &WiringPlan) -> Result<()> {
    if plan.outlet_banks().next().is_none() {
        return Ok(());
    }
    for (_, junction_box) in plan.junction_boxes() {
        if junction_box.outlet.is_none() {
            return Err(mismatch(format!(
                "junction box {} has no AC outlet",
                junction_box.label
            )));
        }
    }
    Ok(())
}
