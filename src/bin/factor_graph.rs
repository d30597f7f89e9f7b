//! Factor graph diagnostics CLI
//!
//! Runs the layout pipeline over dataset files and prints the result as JSON.
//!
//! Usage:
//!   cargo run --features cli --bin factor-graph -- layout \
//!     --data data/overview.yaml \
//!     --detailed-data data/detailed.yaml \
//!     --level detailed \
//!     --focus ai-capability --hops 2 \
//!     --density low
//!
//!   cargo run --features cli --bin factor-graph -- categories --data data/overview.yaml
//!
//! Set `RUST_LOG=factor_graph=debug` to see load diagnostics and pass summaries.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use factor_graph::config::{LayoutAlgorithm, LayoutConfig};
use factor_graph::graph::{
    DetailLevel, EdgeDensity, GraphCatalog, GraphFilters, GraphModel, LayoutInput,
    LayoutOrchestrator, SubgraphExtractor,
};

/// Factor graph layout diagnostics
#[derive(Parser, Debug)]
#[command(name = "factor-graph")]
#[command(about = "Lay out and inspect causal factor graphs")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute a layout and print it as JSON
    Layout {
        /// Overview dataset (YAML or JSON)
        #[arg(long, short = 'd', env = "FACTOR_GRAPH_DATA")]
        data: PathBuf,

        /// Detailed dataset; the overview dataset is reused when omitted
        #[arg(long)]
        detailed_data: Option<PathBuf>,

        /// Layout config file (YAML or JSON)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Detail level: overview or detailed
        #[arg(long, default_value = "overview")]
        level: String,

        /// Lay out only the neighborhood of this node
        #[arg(long)]
        focus: Option<String>,

        /// Neighborhood radius for --focus
        #[arg(long, default_value_t = 1)]
        hops: usize,

        /// Edge density: minimal, low, medium, high or all
        #[arg(long)]
        density: Option<String>,

        /// Override the configured layout algorithm
        #[arg(long)]
        algorithm: Option<String>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List the categories of a dataset
    Categories {
        /// Dataset (YAML or JSON)
        #[arg(long, short = 'd', env = "FACTOR_GRAPH_DATA")]
        data: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Layout {
            data,
            detailed_data,
            config,
            level,
            focus,
            hops,
            density,
            algorithm,
            pretty,
        } => {
            let mut config = match config {
                Some(path) => load_config(&path)?,
                None => LayoutConfig::default(),
            };
            if let Some(algorithm) = algorithm {
                config.layout_algorithm = LayoutAlgorithm::parse(&algorithm)
                    .ok_or_else(|| anyhow!("Unknown layout algorithm '{}'", algorithm))?;
            }
            let level = DetailLevel::parse(&level)
                .ok_or_else(|| anyhow!("Unknown detail level '{}'", level))?;

            let overview = load_model(&data)?;
            let detailed = match detailed_data {
                Some(path) => load_model(&path)?,
                None => overview.clone(),
            };
            let catalog = GraphCatalog::new(overview, detailed);
            let model = catalog.model(level);

            let mut filters = GraphFilters::with_defaults(&config);
            if let Some(density) = density {
                let parsed = EdgeDensity::parse(&density)
                    .ok_or_else(|| anyhow!("Unknown edge density '{}'", density))?;
                filters.set_edge_density(parsed);
            }

            let orchestrator = LayoutOrchestrator::new(model);
            let output = match focus {
                Some(focal) => {
                    let neighborhood = SubgraphExtractor::new(&catalog).extract(&focal, hops, level);
                    if neighborhood.is_empty() {
                        tracing::warn!(focal = %focal, "Focus node not found at {}", level.as_str());
                    }
                    let view = orchestrator
                        .filter_engine()
                        .restrict(&neighborhood.view, &filters);
                    orchestrator.layout(LayoutInput::Prepared(view), &config)
                }
                None => orchestrator.layout(LayoutInput::Filters(&filters), &config),
            };

            for warning in &output.warnings {
                eprintln!("warning [{}]: {}", warning.code, warning.message);
            }
            let json = if pretty {
                serde_json::to_string_pretty(&output)?
            } else {
                serde_json::to_string(&output)?
            };
            println!("{}", json);
        }
        Command::Categories { data } => {
            let model = load_model(&data)?;
            for category in model.list_categories() {
                println!(
                    "{:<24} {:<14} {:>5}  {}",
                    category.id,
                    category.kind.as_str(),
                    category.node_count,
                    category.label
                );
            }
            let report = model.report();
            if !report.is_clean() {
                eprintln!(
                    "{} dangling edges dropped, {} duplicate nodes, {} duplicate edges",
                    report.dropped_edges, report.duplicate_nodes, report.duplicate_edges
                );
            }
        }
    }

    Ok(())
}

fn load_model(path: &Path) -> Result<GraphModel> {
    GraphModel::from_path(path).with_context(|| format!("Loading dataset {}", path.display()))
}

fn load_config(path: &Path) -> Result<LayoutConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Reading config {}", path.display()))?;
    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => LayoutConfig::from_json_str(&content),
        _ => LayoutConfig::from_yaml_str(&content),
    };
    config.with_context(|| format!("Parsing config {}", path.display()))
}
