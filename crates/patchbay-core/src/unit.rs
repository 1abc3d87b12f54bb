//! Constructed runtime units.
//!
//! A [`RuntimeUnit`] is what a node type's constructor returns: named input
//! and output ports bound to host handles, the host nodes the unit owns, and
//! optional hooks. Inputs are tagged [`InputPort`]s so the synchronizer can
//! tell a parameter from a plain signal sink without inspecting host types.

use std::collections::BTreeMap;

use crate::error::HostError;
use crate::host::{Host, HostNodeId, InputPort, SignalOutput};
use crate::state::SharedState;

/// Reacts to a state change of the owning instance without reconstruction.
///
/// Receives the live state and the key that changed.
pub type StateHook = Box<dyn Fn(&SharedState, &str, &mut dyn Host) -> Result<(), HostError>>;

/// Produces a short UI summary of the unit from the live state.
pub type DescribeHook = Box<dyn Fn(&SharedState) -> String>;

/// The live object graph behind one node instance.
#[derive(Default)]
pub struct RuntimeUnit {
    inputs: BTreeMap<String, InputPort>,
    outputs: BTreeMap<String, SignalOutput>,
    owned: Vec<HostNodeId>,
    state_hook: Option<StateHook>,
    describe_hook: Option<DescribeHook>,
}

impl core::fmt::Debug for RuntimeUnit {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RuntimeUnit")
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("owned", &self.owned)
            .field("state_hook", &self.state_hook.is_some())
            .finish_non_exhaustive()
    }
}

impl RuntimeUnit {
    /// Creates a unit with no ports.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds input port `name`.
    pub fn with_input(mut self, name: impl Into<String>, port: InputPort) -> Self {
        self.inputs.insert(name.into(), port);
        self
    }

    /// Binds output port `name`.
    pub fn with_output(mut self, name: impl Into<String>, output: SignalOutput) -> Self {
        self.outputs.insert(name.into(), output);
        self
    }

    /// Records a host node the unit owns and must release on teardown.
    pub fn owning(mut self, node: HostNodeId) -> Self {
        if !self.owned.contains(&node) {
            self.owned.push(node);
        }
        self
    }

    /// Installs the state hook.
    pub fn on_state_change(
        mut self,
        hook: impl Fn(&SharedState, &str, &mut dyn Host) -> Result<(), HostError> + 'static,
    ) -> Self {
        self.state_hook = Some(Box::new(hook));
        self
    }

    /// Installs the describe hook.
    pub fn describe_with(mut self, hook: impl Fn(&SharedState) -> String + 'static) -> Self {
        self.describe_hook = Some(Box::new(hook));
        self
    }

    /// Looks up an input port by name.
    pub fn input(&self, name: &str) -> Option<&InputPort> {
        self.inputs.get(name)
    }

    /// Looks up an output port by name.
    pub fn output(&self, name: &str) -> Option<SignalOutput> {
        self.outputs.get(name).copied()
    }

    /// Returns all input ports.
    pub fn inputs(&self) -> &BTreeMap<String, InputPort> {
        &self.inputs
    }

    /// Returns all output ports.
    pub fn outputs(&self) -> &BTreeMap<String, SignalOutput> {
        &self.outputs
    }

    /// Returns the host nodes this unit owns.
    pub fn owned(&self) -> &[HostNodeId] {
        &self.owned
    }

    /// Forwards a state change to the state hook, if any.
    pub fn apply_state_change(
        &self,
        state: &SharedState,
        key: &str,
        host: &mut dyn Host,
    ) -> Result<(), HostError> {
        match &self.state_hook {
            Some(hook) => hook(state, key, host),
            None => Ok(()),
        }
    }

    /// Returns the describe hook's summary, if any.
    pub fn describe(&self, state: &SharedState) -> Option<String> {
        self.describe_hook.as_ref().map(|hook| hook(state))
    }

    /// Releases every owned host node, stopping generators and dropping
    /// their connections.
    pub fn teardown(self, host: &mut dyn Host) {
        for node in self.owned {
            host.release(node);
        }
    }
}
