//! powerplan CLI - junction-box and cable planning for a vehicle geometry.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use powerplan::io::{load_model, VehicleFiles};
use powerplan::report::{CableReport, UtilizationReport};
use powerplan::{Graph, PlanWiring, PlannerParams};

#[derive(Parser)]
#[command(name = "powerplan")]
#[command(about = "Plan LED power distribution for a vehicle geometry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Place junction boxes, assign controllers and outlets, and print
    /// the cable manifests
    Plan {
        /// Directory holding vertexes.txt, edges.txt, panels.txt and the
        /// signal path files
        #[arg(long)]
        geometry: PathBuf,
        /// TOML file overriding the default planning parameters
        #[arg(long)]
        config: Option<PathBuf>,
        /// Vertex of an AC outlet bank (repeatable; replaces the configured list)
        #[arg(long = "outlet-bank")]
        outlet_banks: Vec<u32>,
    },
    /// Print the routed distance between two vertices, in feet
    Distance {
        #[arg(long)]
        geometry: PathBuf,
        a: u32,
        b: u32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Plan {
            geometry,
            config,
            outlet_banks,
        } => run_plan(&geometry, config.as_deref(), outlet_banks),
        Commands::Distance { geometry, a, b } => run_distance(&geometry, a, b),
    }
}

fn load_graph(geometry: &Path, params: &PlannerParams) -> Result<Graph> {
    let files = VehicleFiles::from_dir(geometry);
    let model = load_model(&files, params.electrical.clone())
        .with_context(|| format!("Failed to load vehicle from {}", geometry.display()))?;
    Ok(Graph::new(model))
}

fn run_plan(geometry: &Path, config: Option<&Path>, outlet_banks: Vec<u32>) -> Result<()> {
    let mut params = match config {
        Some(path) => PlannerParams::from_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => PlannerParams::default(),
    };
    if !outlet_banks.is_empty() {
        params.power.outlet_bank_vertices = outlet_banks;
    }
    params.validate()?;

    let graph = load_graph(geometry, &params)?;
    let plan = PlanWiring::new(&params).execute(&graph)?;

    print!("{}", UtilizationReport::build(graph.model(), &plan)?);
    println!();
    print!("{}", CableReport::build(&graph, &plan, &params.cables)?);
    Ok(())
}

fn run_distance(geometry: &Path, a: u32, b: u32) -> Result<()> {
    let graph = load_graph(geometry, &PlannerParams::default())?;
    let model = graph.model();
    let feet = graph.min_distance_feet(model.vertex_by_label(a)?, model.vertex_by_label(b)?);
    if feet.is_finite() {
        println!("{a} -> {b}: {feet:.2} ft");
    } else {
        println!("{a} -> {b}: unreachable");
    }
    Ok(())
}
