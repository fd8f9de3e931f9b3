use crate::math::Point3;

use super::strip::StripId;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for a panel in the vehicle model.
    pub struct PanelId;
}

/// Whether a panel carries LEDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Lit,
    Unlit,
}

impl PanelKind {
    /// Parses the type column of the panel signal file. Anything other
    /// than `unlit` is treated as lit.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "unlit" => Self::Unlit,
            _ => Self::Lit,
        }
    }
}

/// A triangular panel spanning three vertices.
#[derive(Debug, Clone)]
pub struct PanelData {
    pub label: String,
    pub vertices: [VertexId; 3],
    /// Area in square microns.
    pub area: f64,
    pub centroid: Point3,
    pub num_leds: f64,
    /// Worst-case draw of the whole panel, in amps.
    pub max_current: f64,
    pub strips: Vec<StripId>,
    pub kind: PanelKind,
    pub channels_required: usize,
    pub controller_vertex: Option<VertexId>,
    /// Where the data line enters the panel, when the signal file names it.
    pub signal_in_vertex: Option<VertexId>,
}

impl PanelData {
    /// Returns `true` if `vertex` is one of the panel's corners.
    #[must_use]
    pub fn has_vertex(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }
}

/// Splits `total` amps into strips no larger than `cap`: as many full
/// strips as fit, then the remainder. A zero remainder adds no strip.
#[must_use]
pub fn split_panel_current(total: f64, cap: f64) -> Vec<f64> {
    if total <= 0.0 || cap <= 0.0 {
        return Vec::new();
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let full = (total / cap).floor() as usize;
    let mut currents = vec![cap; full];
    #[allow(clippy::cast_precision_loss)]
    let remainder = total - cap * full as f64;
    if remainder > crate::math::CURRENT_TOLERANCE {
        currents.push(remainder);
    }
    currents
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn splits_into_full_strips_and_remainder() {
        let currents = split_panel_current(30.0, 12.0);
        assert_eq!(currents.len(), 3);
        assert_relative_eq!(currents[0], 12.0);
        assert_relative_eq!(currents[1], 12.0);
        assert_relative_eq!(currents[2], 6.0, epsilon = 1e-9);
    }

    #[test]
    fn exact_multiple_has_no_empty_strip() {
        assert_eq!(split_panel_current(24.0, 12.0).len(), 2);
    }

    #[test]
    fn small_panel_is_one_strip() {
        let currents = split_panel_current(3.5, 12.0);
        assert_eq!(currents.len(), 1);
        assert_relative_eq!(currents[0], 3.5);
    }

    #[test]
    fn kind_parsing() {
        assert_eq!(PanelKind::parse("lit"), PanelKind::Lit);
        assert_eq!(PanelKind::parse("10.7.3.1#2"), PanelKind::Lit);
        assert_eq!(PanelKind::parse("Unlit"), PanelKind::Unlit);
        assert_eq!(PanelKind::parse("dark"), PanelKind::Lit);
        assert_eq!(PanelKind::parse("solid"), PanelKind::Lit);
    }
}
