//! Node type listing command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use patchbay_core::PortDef;

use crate::catalog::{demo_catalog, description};

#[derive(Args)]
pub struct TypesArgs {
    /// Show details for a specific type
    #[arg(value_name = "TYPE")]
    type_name: Option<String>,
}

pub fn run(args: TypesArgs) -> anyhow::Result<()> {
    let catalog = demo_catalog();

    if let Some(name) = &args.type_name {
        let def = catalog.resolve(name)?;

        println!("{name}");
        println!("{}", "=".repeat(name.len()));
        println!();
        if let Some(text) = description(name) {
            println!("{text}");
            println!();
        }
        println!(
            "Size: {} x {}{}",
            def.dimensions.width,
            def.dimensions.height,
            if def.is_code_backed() { " (code-backed)" } else { "" }
        );
        println!();
        print_ports("Inputs", &def.ports.inputs);
        print_ports("Outputs", &def.ports.outputs);

        if let Some(state) = &def.default_state {
            println!("Default state:");
            println!();
            for (key, value) in state {
                println!("  {key:12}  {value}");
            }
        }
        return Ok(());
    }

    println!("Available Types");
    println!("===============");
    println!();
    println!("  {:12}  {:8}  {:8}  {}", "Name", "Inputs", "Outputs", "Description");
    println!("  {:12}  {:8}  {:8}  {}", "----", "------", "-------", "-----------");
    for (name, def) in catalog.iter() {
        println!(
            "  {:12}  {:8}  {:8}  {}",
            name,
            def.ports.inputs.len(),
            def.ports.outputs.len(),
            description(name).unwrap_or("")
        );
    }
    Ok(())
}

fn print_ports(title: &str, ports: &[PortDef]) {
    println!("{title}:");
    if ports.is_empty() {
        println!("  (none)");
    }
    for (index, port) in ports.iter().enumerate() {
        println!("  {index}  {:12}  {}", port.name, port.kind);
    }
    println!();
}
