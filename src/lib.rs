pub mod capacity;
pub mod config;
pub mod error;
pub mod graph;
pub mod io;
pub mod math;
pub mod mirror;
pub mod model;
pub mod placement;
pub mod report;

pub use config::PlannerParams;
pub use error::{PlannerError, Result};
pub use graph::Graph;
pub use placement::PlanWiring;
