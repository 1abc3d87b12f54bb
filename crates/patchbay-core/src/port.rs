//! Port definitions and port references.
//!
//! A port's `kind` is a signal-compatibility tag: two ports may be connected
//! only when their kinds are equal. Port references inside edges address a
//! port by its index in the owning type's input or output list.

use serde::{Deserialize, Serialize};

use crate::node::NodeId;

/// A named, kind-tagged connection point on a node type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortDef {
    /// Port name, used to look the port up on a constructed runtime unit.
    pub name: String,
    /// Compatibility tag, e.g. `"audio"`.
    pub kind: String,
}

impl PortDef {
    /// Creates a port definition.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// The input and output ports of a node type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PortSet {
    /// Input ports, in declaration order.
    #[serde(rename = "in", default)]
    pub inputs: Vec<PortDef>,
    /// Output ports, in declaration order.
    #[serde(rename = "out", default)]
    pub outputs: Vec<PortDef>,
}

impl PortSet {
    /// Creates a port set.
    pub fn new(inputs: Vec<PortDef>, outputs: Vec<PortDef>) -> Self {
        Self { inputs, outputs }
    }

    /// Returns the port at `index` on the given side.
    pub fn get(&self, direction: PortDirection, index: usize) -> Option<&PortDef> {
        match direction {
            PortDirection::Input => self.inputs.get(index),
            PortDirection::Output => self.outputs.get(index),
        }
    }

    /// Returns the first port on the given side.
    pub fn first(&self, direction: PortDirection) -> Option<&PortDef> {
        self.get(direction, 0)
    }
}

/// Which side of a node a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    /// Receives signal.
    Input,
    /// Emits signal.
    Output,
}

impl PortDirection {
    /// Returns the other side.
    pub const fn opposite(self) -> Self {
        match self {
            PortDirection::Input => PortDirection::Output,
            PortDirection::Output => PortDirection::Input,
        }
    }

    /// Lowercase name used in messages.
    pub const fn name(self) -> &'static str {
        match self {
            PortDirection::Input => "input",
            PortDirection::Output => "output",
        }
    }
}

/// A handle to one port of one node instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortRef {
    /// Node that owns the port.
    pub node: NodeId,
    /// Index into the node type's port list for the relevant direction.
    pub port: usize,
}

impl PortRef {
    /// Creates a port reference.
    pub const fn new(node: NodeId, port: usize) -> Self {
        Self { node, port }
    }
}

impl core::fmt::Display for PortRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.node, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_set_json_uses_in_out_keys() {
        let ports: PortSet = serde_json::from_str(
            r#"{"in":[{"name":"in","kind":"audio"}],"out":[{"name":"out","kind":"audio"}]}"#,
        )
        .unwrap();
        assert_eq!(ports.inputs.len(), 1);
        assert_eq!(ports.first(PortDirection::Output).unwrap().name, "out");
        assert!(ports.get(PortDirection::Input, 1).is_none());
    }

    #[test]
    fn opposite_direction() {
        assert_eq!(PortDirection::Input.opposite(), PortDirection::Output);
        assert_eq!(PortDirection::Output.opposite(), PortDirection::Input);
    }
}
