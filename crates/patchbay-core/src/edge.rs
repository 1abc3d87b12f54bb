//! Directed edges between node ports.

use serde::{Deserialize, Serialize};

use crate::node::NodeId;
use crate::port::PortRef;

/// A directed connection from one node's out-port to another node's in-port.
///
/// At most one edge exists per `(output, input)` pair; the store treats a
/// repeated link as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    /// Source port (an output of `output.node`).
    pub output: PortRef,
    /// Destination port (an input of `input.node`).
    pub input: PortRef,
}

impl Edge {
    /// Creates an edge.
    pub const fn new(output: PortRef, input: PortRef) -> Self {
        Self { output, input }
    }

    /// Returns true if either endpoint belongs to `node`.
    pub fn touches(&self, node: NodeId) -> bool {
        self.output.node == node || self.input.node == node
    }
}

impl core::fmt::Display for Edge {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} -> {}", self.output, self.input)
    }
}
