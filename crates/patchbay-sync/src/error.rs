//! Errors attached to individual node instances.
//!
//! None of these abort a synchronizer pass. Each is stored against the node
//! it concerns and the pass moves on to the rest of the graph.

use patchbay_core::{ConstructError, GraphError};
use patchbay_modules::ModuleError;
use thiserror::Error;

/// Why a node instance has no runtime unit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NodeError {
    /// The node's type does not resolve in the catalog.
    #[error(transparent)]
    Configuration(#[from] GraphError),

    /// The type's constructor failed.
    #[error("construction failed: {0}")]
    Construction(#[from] ConstructError),

    /// The node's code module failed to load or register on the host.
    #[error("{}", .0.user_message())]
    Registration(#[from] ModuleError),
}
