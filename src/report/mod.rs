//! Human-readable summaries of a finished plan.

mod cable_lengths;
mod utilization;

pub use cable_lengths::{
    ac_power_cable_lengths, bucket_cable_lengths, controller_power_cable_lengths,
    ethernet_cable_lengths, power_cable_lengths, CableManifest, CableReport, PowerRuns,
};
pub use utilization::{ControllerLoad, UtilizationReport, VertexLoad};
