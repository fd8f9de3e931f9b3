use crate::math::CURRENT_TOLERANCE;
use crate::model::StripId;

use super::junction_box::JunctionBoxId;

slotmap::new_key_type! {
    /// Unique identifier for a junction-box circuit.
    pub struct CircuitId;
}

/// A fused circuit inside a junction box.
///
/// `current` is the running sum of assigned strips and never exceeds
/// `max_current`.
#[derive(Debug, Clone)]
pub struct CircuitData {
    pub junction_box: JunctionBoxId,
    /// Position within the box; mirrored boxes reuse the same index.
    pub index: usize,
    pub max_current: f64,
    pub current: f64,
    pub edge_strips: Vec<StripId>,
    pub panel_strips: Vec<StripId>,
}

impl CircuitData {
    /// Creates an empty circuit.
    #[must_use]
    pub fn new(junction_box: JunctionBoxId, index: usize, max_current: f64) -> Self {
        Self {
            junction_box,
            index,
            max_current,
            current: 0.0,
            edge_strips: Vec::new(),
            panel_strips: Vec::new(),
        }
    }

    /// Amps still available.
    #[must_use]
    pub fn headroom(&self) -> f64 {
        self.max_current - self.current
    }

    /// Assigned current over capacity.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        self.current / self.max_current
    }

    /// Returns `true` if another `amps` keeps the circuit within capacity.
    #[must_use]
    pub fn fits(&self, amps: f64) -> bool {
        self.current + amps <= self.max_current + CURRENT_TOLERANCE
    }

    /// Every strip on the circuit, edges first.
    pub fn strips(&self) -> impl Iterator<Item = StripId> + '_ {
        self.edge_strips.iter().chain(&self.panel_strips).copied()
    }
}
