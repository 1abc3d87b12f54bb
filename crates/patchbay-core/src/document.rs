//! The in-memory graph document shape.
//!
//! Persistence is handled elsewhere; this module only fixes the structural
//! shape `{ "nodes": { "<id>": NodeInstance }, "edges": [Edge] }` and offers
//! JSON conversion helpers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::node::{NodeId, NodeInstance};

/// Nodes keyed by id plus the edge list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Node instances keyed by id.
    #[serde(default)]
    pub nodes: BTreeMap<NodeId, NodeInstance>,
    /// Directed edges.
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphDocument {
    /// Parses a document from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Serializes the document as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
