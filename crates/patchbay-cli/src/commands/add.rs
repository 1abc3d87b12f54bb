//! Node insertion command.

use std::path::PathBuf;

use clap::Args;
use patchbay_config::PatchbayConfig;
use patchbay_core::Position;

use super::common::{load_store, parse_key_val, state_value, write_store};
use crate::catalog::demo_catalog;

#[derive(Args)]
pub struct AddArgs {
    /// Graph document (JSON)
    pub document: PathBuf,

    /// Node type to add
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub type_name: String,

    /// Horizontal position (snapped to the grid)
    #[arg(long, default_value = "0")]
    pub x: f32,

    /// Vertical position (snapped to the grid)
    #[arg(long, default_value = "0")]
    pub y: f32,

    /// State override as key=value (value parsed as JSON when possible)
    #[arg(long = "set", value_parser = parse_key_val)]
    pub state: Vec<(String, String)>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: AddArgs, config: &PatchbayConfig) -> anyhow::Result<()> {
    let catalog = demo_catalog();
    let mut store = load_store(&args.document, config.layout.grid)?;

    let id = store.add_node(&catalog, &args.type_name, Position::new(args.x, args.y))?;
    for (key, raw) in &args.state {
        store.set_state(id, key, state_value(raw))?;
    }

    write_store(&store, args.output.as_deref())?;
    if let Some(path) = &args.output
        && let Some(node) = store.node(id)
    {
        println!(
            "Added node {} ({}) at ({}, {}) to {}",
            id,
            node.type_name,
            node.x,
            node.y,
            path.display()
        );
    }
    Ok(())
}
