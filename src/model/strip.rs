use super::edge::EdgeId;
use super::panel::PanelId;

slotmap::new_key_type! {
    /// Unique identifier for a strip in the vehicle model.
    pub struct StripId;
}

/// The edge or panel a strip is cut from, and its position within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripOwner {
    Edge { edge: EdgeId, index: usize },
    Panel { panel: PanelId, index: usize },
}

/// An independently assignable run of LEDs.
///
/// Strips are the atomic unit of circuit assignment. Which circuit a strip
/// ends up on is recorded by the wiring plan, not here.
#[derive(Debug, Clone)]
pub struct StripData {
    /// `<owner label>-<index>`.
    pub label: String,
    pub owner: StripOwner,
    /// Worst-case draw in amps.
    pub current: f64,
}

impl StripData {
    /// Position of the strip within its owner.
    #[must_use]
    pub fn index(&self) -> usize {
        match self.owner {
            StripOwner::Edge { index, .. } | StripOwner::Panel { index, .. } => index,
        }
    }
}
