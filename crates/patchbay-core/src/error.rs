//! Error types for graph, host, and construction operations.
//!
//! Compatibility rejections (mismatched port kinds on link or splice) are
//! deliberately absent here: they are reported through
//! [`LinkOutcome`](crate::LinkOutcome) and
//! [`SpliceOutcome`](crate::layout::SpliceOutcome) as side-effect-free no-ops.

use thiserror::Error;

use crate::edge::Edge;
use crate::host::HostNodeId;
use crate::node::NodeId;

/// Errors raised by the graph store and type catalog.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    /// A node instance referenced a type name the catalog does not know.
    #[error("unknown node type '{name}' (valid types: {})", .valid.join(", "))]
    UnknownType {
        /// The type name that failed to resolve.
        name: String,
        /// Type names currently registered in the catalog.
        valid: Vec<String>,
    },

    /// The specified node was not found in the store.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// A port index is outside the port list of the node's type.
    #[error("node {node} has no {direction} port at index {port}")]
    PortOutOfRange {
        /// Node whose type was consulted.
        node: NodeId,
        /// "input" or "output".
        direction: &'static str,
        /// Offending port index.
        port: usize,
    },

    /// An edge references a node that no longer exists.
    ///
    /// Raised when hydrating a document whose edges point at absent nodes,
    /// and by [`GraphStore::validate`](crate::GraphStore::validate). The
    /// store's own mutations never leave one behind.
    #[error("edge {0} references a missing node")]
    DanglingEdge(Edge),

    /// An edge joins ports that do not exist or whose kinds differ.
    ///
    /// Reported by [`GraphStore::validate_ports`](crate::GraphStore::validate_ports)
    /// and when a splice cannot relink the edge it removed.
    #[error("edge {edge} is invalid: {reason}")]
    InvalidEdge {
        /// The offending edge.
        edge: Edge,
        /// What is wrong with it.
        reason: String,
    },
}

/// Errors reported by an execution [`Host`](crate::Host).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    /// The host has no node with this handle (never created or released).
    #[error("host node {0} does not exist")]
    UnknownNode(HostNodeId),

    /// No processor has been registered under this identity.
    #[error("no processor registered as '{0}'")]
    UnknownProcessor(String),

    /// The node exposes no parameter with this name.
    #[error("host node {node} has no parameter '{name}'")]
    UnknownParameter {
        /// Node that was queried.
        node: HostNodeId,
        /// Missing parameter name.
        name: String,
    },

    /// A disconnect was requested for a connection that does not exist.
    #[error("host nodes are not connected")]
    NotConnected,

    /// Any other host-side rejection, with the host's message.
    #[error("host rejected operation: {0}")]
    Rejected(String),
}

/// Errors a node type constructor may return.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstructError {
    /// The host refused one of the construction calls.
    #[error(transparent)]
    Host(#[from] HostError),

    /// A code-backed constructor ran without a resolved registration identity.
    #[error("code-backed node has no registration identity")]
    MissingRegistration,

    /// A state field had an unusable value.
    #[error("invalid state field '{key}': {reason}")]
    InvalidState {
        /// State key that was read.
        key: String,
        /// Why the value is unusable.
        reason: String,
    },
}
