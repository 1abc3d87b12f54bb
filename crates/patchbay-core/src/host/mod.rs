//! Execution host abstraction.
//!
//! The [`Host`] trait is the boundary between the graph core and the
//! processing context that actually renders audio on its own real-time
//! thread. The core only issues construct, connect, disconnect, and release
//! calls, each of which the host applies atomically.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │   GraphStore  ──events──▶  Sync  │
//! └──────────────┬───────────────────┘
//!                │ uses Host trait
//!                ▼
//! ┌──────────────────────────────────┐
//! │            Host trait            │
//! │ create / connect / load modules  │
//! └──────────────┬───────────────────┘
//!                │ implemented by
//!        ┌───────┴────────┐
//!        ▼                ▼
//! ┌─────────────┐  ┌─────────────┐
//! │ MemoryHost  │  │ platform    │
//! │ (in-process)│  │ hosts       │
//! └─────────────┘  └─────────────┘
//! ```
//!
//! ## Module registration
//!
//! Hosts enforce a register-once rule per processor identity per session.
//! Module loads are asynchronous: [`Host::begin_module_load`] returns a
//! [`LoadTicket`] that is polled with [`Host::poll_module_load`] until it
//! settles. Nothing in this trait blocks.

mod memory;

pub use memory::{MemoryHost, MemoryNode, SourceEvaluator};

use crate::error::HostError;

/// Identifies one processing context, used to key per-host caches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostId(pub u64);

/// Handle to a node living inside the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostNodeId(pub u64);

impl core::fmt::Display for HostNodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A connectable signal output of a host node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SignalOutput {
    /// Owning host node.
    pub node: HostNodeId,
    /// Output index on that node.
    pub index: u32,
}

impl SignalOutput {
    /// Creates an output handle.
    pub const fn new(node: HostNodeId, index: u32) -> Self {
        Self { node, index }
    }
}

/// A plain signal sink of a host node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SignalInput {
    /// Owning host node.
    pub node: HostNodeId,
    /// Input index on that node.
    pub index: u32,
}

impl SignalInput {
    /// Creates an input handle.
    pub const fn new(node: HostNodeId, index: u32) -> Self {
        Self { node, index }
    }
}

/// A control parameter of a host node.
///
/// Signals connected to a parameter are summed with its intrinsic value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParamRef {
    /// Owning host node.
    pub node: HostNodeId,
    /// Parameter name.
    pub name: String,
}

impl ParamRef {
    /// Creates a parameter handle.
    pub fn new(node: HostNodeId, name: impl Into<String>) -> Self {
        Self {
            node,
            name: name.into(),
        }
    }
}

/// The connection target behind a named input port of a runtime unit.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum InputPort {
    /// Plain signal sink; connections replace nothing.
    Signal(SignalInput),
    /// Control parameter; connections add to the intrinsic value.
    Parameter(ParamRef),
}

impl InputPort {
    /// Returns the host node the port belongs to.
    pub fn node(&self) -> HostNodeId {
        match self {
            InputPort::Signal(input) => input.node,
            InputPort::Parameter(param) => param.node,
        }
    }

    /// Returns the parameter handle if this is a parameter port.
    pub fn as_parameter(&self) -> Option<&ParamRef> {
        match self {
            InputPort::Parameter(param) => Some(param),
            InputPort::Signal(_) => None,
        }
    }
}

/// Ticket identifying one in-flight module load.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoadTicket(pub u64);

/// Progress of a module load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    /// Still compiling or registering.
    Pending,
    /// Loaded; its processor identity is registered.
    Loaded,
    /// The module failed to load or threw while registering. Carries the
    /// host's raw message.
    Failed(String),
}

/// A processing context that hosts constructed units.
///
/// Object-safe so that the synchronizer can drive any host through
/// `&mut dyn Host`.
pub trait Host {
    /// Identity of this processing context.
    fn host_id(&self) -> HostId;

    /// Creates a built-in host node of the given kind with initial parameter values.
    fn create_node(&mut self, kind: &str, params: &[(&str, f32)]) -> Result<HostNodeId, HostError>;

    /// Instantiates a processor previously registered under `identity`.
    fn create_processor(
        &mut self,
        identity: &str,
        params: &[(&str, f32)],
    ) -> Result<HostNodeId, HostError>;

    /// Starts a generator node.
    fn start(&mut self, node: HostNodeId) -> Result<(), HostError>;

    /// Reads a parameter's intrinsic value.
    fn param_value(&self, param: &ParamRef) -> Option<f32>;

    /// Writes a parameter's intrinsic value.
    fn set_param_value(&mut self, param: &ParamRef, value: f32) -> Result<(), HostError>;

    /// Connects a signal output to an input port.
    fn connect(&mut self, output: SignalOutput, input: &InputPort) -> Result<(), HostError>;

    /// Removes a connection made by [`connect()`](Self::connect).
    fn disconnect(&mut self, output: SignalOutput, input: &InputPort) -> Result<(), HostError>;

    /// Stops the node, drops every connection touching it, and frees it.
    ///
    /// Releasing an unknown node is a no-op.
    fn release(&mut self, node: HostNodeId);

    /// Starts loading module `source` from `url`, registering `identity` on success.
    fn begin_module_load(&mut self, url: &str, identity: &str, source: &str) -> LoadTicket;

    /// Polls a load started by [`begin_module_load()`](Self::begin_module_load).
    fn poll_module_load(&mut self, ticket: LoadTicket) -> LoadStatus;
}
