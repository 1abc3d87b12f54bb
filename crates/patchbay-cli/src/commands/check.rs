//! Graph document check command.
//!
//! Hydrates the document into a store, synchronizes it against a fresh
//! [`MemoryHost`], settles module loads, synchronizes again, and prints the
//! resulting node phases and edge connection state.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use std::path::PathBuf;

use clap::Args;
use patchbay_config::PatchbayConfig;
use patchbay_core::MemoryHost;
use patchbay_sync::{NodePhase, Synchronizer};

use super::common::load_store;
use crate::catalog::demo_catalog;

#[derive(Args)]
pub struct CheckArgs {
    /// Graph document (JSON)
    pub document: PathBuf,

    /// Exit with an error if any node failed or any edge stayed unconnected
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: CheckArgs, config: &PatchbayConfig) -> anyhow::Result<()> {
    let catalog = demo_catalog();
    let mut store = load_store(&args.document, config.layout.grid)?;
    store.validate()?;

    let mut host = MemoryHost::new();
    let mut sync = Synchronizer::with_settings(&config.modules);

    let first = sync.sync(&mut store, &catalog, &mut host);
    let settled = host.complete_loads();
    let report = sync.sync(&mut store, &catalog, &mut host);
    tracing::info!(
        constructed = first.constructed + report.constructed,
        settled,
        failed = first.failed + report.failed,
        "check complete"
    );

    println!("Nodes");
    println!("=====");
    println!();
    println!("  {:6}  {:12}  {:14}  {}", "Id", "Type", "Phase", "Detail");
    println!("  {:6}  {:12}  {:14}  {}", "--", "----", "-----", "------");
    let mut failed = 0;
    for node in store.nodes() {
        let phase = sync.phase(node.id);
        let detail = match phase {
            NodePhase::Failed => {
                failed += 1;
                sync.node_error(node.id)
                    .map(ToString::to_string)
                    .unwrap_or_default()
            }
            _ => sync.describe(node.id, &store).unwrap_or_default(),
        };
        println!(
            "  {:6}  {:12}  {:14}  {}",
            node.id.to_string(),
            node.type_name,
            phase.name(),
            detail
        );
    }

    println!();
    println!("Edges");
    println!("=====");
    println!();
    let mut pending = 0;
    for edge in store.edges() {
        let state = if sync.is_connected(edge) {
            "connected"
        } else {
            pending += 1;
            "pending"
        };
        println!("  {:24}  {}", edge.to_string(), state);
    }
    if store.edges().is_empty() {
        println!("  (none)");
    }

    println!();
    println!(
        "{} nodes, {} edges, {} failed, {} pending",
        store.node_count(),
        store.edge_count(),
        failed,
        pending
    );

    sync.shutdown(&mut host);

    if args.strict && (failed > 0 || pending > 0) {
        anyhow::bail!("{failed} failed nodes, {pending} pending edges");
    }
    Ok(())
}
