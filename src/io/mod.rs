//! Loading a vehicle from its geometry directory.

mod tsv;

pub use tsv::{
    read_edge_signal_paths, read_edges, read_panel_signal_paths, read_panels, read_vertices,
};

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::ElectricalParams;
use crate::error::{InputError, Result};
use crate::model::VehicleModel;

/// Paths of the files describing one vehicle.
#[derive(Debug, Clone)]
pub struct VehicleFiles {
    pub vertices: PathBuf,
    pub edges: PathBuf,
    pub panels: PathBuf,
    pub edge_signals: Option<PathBuf>,
    pub panel_signals: Option<PathBuf>,
}

impl VehicleFiles {
    /// The standard file names inside `dir`. Signal files are optional and
    /// only picked up when present.
    #[must_use]
    pub fn from_dir(dir: &Path) -> Self {
        let present = |name: &str| Some(dir.join(name)).filter(|p| p.is_file());
        Self {
            vertices: dir.join("vertexes.txt"),
            edges: dir.join("edges.txt"),
            panels: dir.join("panels.txt"),
            edge_signals: present("edge_signal_paths.tsv"),
            panel_signals: present("panel_signal_paths.tsv"),
        }
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path).map_err(InputError::from)?))
}

/// Builds a vehicle model from its files and resolves signal depths.
///
/// # Errors
///
/// Returns an error if a file cannot be read or contains invalid rows.
pub fn load_model(files: &VehicleFiles, electrical: ElectricalParams) -> Result<VehicleModel> {
    let mut model = VehicleModel::new(electrical);
    let vertices = read_vertices(open(&files.vertices)?, &mut model)?;
    let edges = read_edges(open(&files.edges)?, &mut model)?;
    let panels = read_panels(open(&files.panels)?, &mut model)?;
    info!(vertices, edges, panels, "loaded geometry");

    if let Some(path) = &files.edge_signals {
        let rows = read_edge_signal_paths(open(path)?, &mut model)?;
        info!(rows, "loaded edge signal paths");
    }
    if let Some(path) = &files.panel_signals {
        let rows = read_panel_signal_paths(open(path)?, &mut model)?;
        info!(rows, "loaded panel signal paths");
    }

    let unsignalled = model
        .edges()
        .filter(|(_, e)| e.signal_from.is_none())
        .count();
    if unsignalled > 0 {
        warn!(edges = unsignalled, "edges have no signal path");
    }
    model.resolve_signal_depths()?;
    Ok(model)
}
