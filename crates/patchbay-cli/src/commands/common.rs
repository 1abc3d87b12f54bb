//! Shared CLI helpers used across multiple commands.

use std::path::Path;

use anyhow::Context;
use patchbay_core::{GraphDocument, GraphStore};
use serde_json::Value;

/// Parse a `key=value` string for clap's `value_parser`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 {
        return Err(format!(
            "Invalid state format: '{}' (expected key=value)",
            s
        ));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}

/// Interpret a state value as JSON, falling back to a plain string.
pub fn state_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Read a graph document and hydrate a fresh store with it.
pub fn load_store(path: &Path, grid: f32) -> anyhow::Result<GraphStore> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let document = GraphDocument::from_json(&text)
        .with_context(|| format!("invalid graph document {}", path.display()))?;
    let mut store = GraphStore::new(grid);
    store.hydrate(document)?;
    Ok(store)
}

/// Write the store's contents to `output`, or to stdout when `None`.
pub fn write_store(store: &GraphStore, output: Option<&Path>) -> anyhow::Result<()> {
    let json = store.to_document().to_json_pretty()?;
    match output {
        Some(path) => std::fs::write(path, json + "\n")
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}
