//! Edge splicing command.

use std::path::PathBuf;

use clap::Args;
use patchbay_config::PatchbayConfig;
use patchbay_core::{NodeId, SpliceOutcome, SpliceRejection, layout};

use super::common::{load_store, write_store};
use crate::catalog::demo_catalog;

#[derive(Args)]
pub struct SpliceArgs {
    /// Graph document (JSON)
    pub document: PathBuf,

    /// Upstream node of the edge
    #[arg(long)]
    pub from: u32,

    /// Downstream node of the edge
    #[arg(long)]
    pub to: u32,

    /// Node type to insert
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub type_name: String,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: SpliceArgs, config: &PatchbayConfig) -> anyhow::Result<()> {
    let catalog = demo_catalog();
    let mut store = load_store(&args.document, config.layout.grid)?;

    let edge = store
        .find_edge(NodeId(args.from), NodeId(args.to))
        .ok_or_else(|| anyhow::anyhow!("No edge from node {} to node {}", args.from, args.to))?;

    match layout::splice(&mut store, &catalog, edge, &args.type_name, &config.layout)? {
        SpliceOutcome::Inserted { node, pushed } => {
            write_store(&store, args.output.as_deref())?;
            if let Some(path) = &args.output {
                println!(
                    "Inserted node {} ({}) into {}, moved {} downstream nodes, wrote {}",
                    node,
                    args.type_name,
                    edge,
                    pushed.len(),
                    path.display()
                );
            }
            Ok(())
        }
        SpliceOutcome::Rejected(rejection) => {
            anyhow::bail!("Cannot splice {}: {}", args.type_name, rejection_message(&rejection))
        }
    }
}

fn rejection_message(rejection: &SpliceRejection) -> String {
    match rejection {
        SpliceRejection::EdgeNotFound(edge) => format!("edge {edge} is not in the graph"),
        SpliceRejection::KindMismatch {
            side,
            expected,
            found: Some(found),
        } => format!(
            "its first {} port carries '{found}', the edge needs '{expected}'",
            side.name()
        ),
        SpliceRejection::KindMismatch {
            side,
            expected,
            found: None,
        } => format!(
            "it has no {} port, the edge needs '{expected}'",
            side.name()
        ),
    }
}
