//! Patchbay CLI - inspect, check and edit graph documents.

mod catalog;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use patchbay_config::{PatchbayConfig, paths};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "patchbay")]
#[command(author, version, about = "Patchbay graph document tool", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available node types and their ports
    Types(commands::types::TypesArgs),

    /// Synchronize a graph document against an in-memory host and report its state
    Check(commands::check::CheckArgs),

    /// Add a node to a graph document
    Add(commands::add::AddArgs),

    /// Insert a node into an existing edge
    Splice(commands::splice::SpliceArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PatchbayConfig::load(path)?,
        None => PatchbayConfig::load_or_default(paths::default_config_path())?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Types(args) => commands::types::run(args),
        Commands::Check(args) => commands::check::run(args, &config),
        Commands::Add(args) => commands::add::run(args, &config),
        Commands::Splice(args) => commands::splice::run(args, &config),
    }
}
