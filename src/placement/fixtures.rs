//! Small hand-built vehicles shared by the placement tests.

#![allow(clippy::unwrap_used)]

use crate::config::ElectricalParams;
use crate::math::{feet_to_microns, Point3};
use crate::model::{PanelKind, SignalSource, VehicleModel};

/// Four triangular pods, one per quadrant, each tied to a center vertex.
///
/// Pod `q` (10, 20, 30, 40) has vertices `q`, `q+1`, `q+2`, a lit panel over
/// them, and a controller at `q` feeding `q-(q+1)`, which chains on to
/// `(q+1)-(q+2)` and then `q-(q+2)`. Pod 10 sits in the seed quadrant; 20
/// is its z-mirror, 30 its x-mirror, and 40 its mirror in both.
#[must_use]
pub fn symmetric_vehicle() -> VehicleModel {
    let mut m = VehicleModel::new(ElectricalParams::default());
    let ft = feet_to_microns;
    m.add_vertex(0, Point3::origin()).unwrap();
    let pods = [(10, -1.0, 1.0), (20, -1.0, -1.0), (30, 1.0, 1.0), (40, 1.0, -1.0)];
    for &(q, sx, sz) in &pods {
        m.add_vertex(q, Point3::new(ft(2.0 * sx), 0.0, ft(2.0 * sz))).unwrap();
        m.add_vertex(q + 1, Point3::new(ft(2.0 * sx), ft(3.0), ft(2.0 * sz)))
            .unwrap();
        m.add_vertex(q + 2, Point3::new(ft(4.0 * sx), 0.0, ft(2.0 * sz)))
            .unwrap();
    }
    for &(q, _, _) in &pods {
        m.add_edge(0, q).unwrap();
        let first = m.add_edge(q, q + 1).unwrap();
        let second = m.add_edge(q + 1, q + 2).unwrap();
        let third = m.add_edge(q, q + 2).unwrap();
        let controller = m.vertex_by_label(q).unwrap();
        m.set_edge_signal(first, SignalSource::Controller(controller), None)
            .unwrap();
        m.set_edge_signal(second, SignalSource::Edge(first), None).unwrap();
        m.set_edge_signal(third, SignalSource::Edge(second), None).unwrap();
        let panel = m.add_panel(&format!("P{q}"), [q, q + 1, q + 2]).unwrap();
        m.set_panel_signal(panel, PanelKind::Lit, 1, Some(controller), None)
            .unwrap();
    }
    m.resolve_signal_depths().unwrap();
    m
}
