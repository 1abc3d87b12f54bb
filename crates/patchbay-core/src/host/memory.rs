//! Deterministic in-process host.
//!
//! [`MemoryHost`] records nodes, parameter values, and connections instead of
//! rendering audio. Module loads stay pending until
//! [`complete_loads()`](MemoryHost::complete_loads) is called, which makes
//! the asynchronous resolution path reproducible in tests and in the CLI.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use super::{Host, HostId, HostNodeId, InputPort, LoadStatus, LoadTicket, ParamRef, SignalOutput};
use crate::error::HostError;

/// Evaluates module source during registration; `Err` carries the thrown message.
pub type SourceEvaluator = Box<dyn Fn(&str) -> Result<(), String>>;

static NEXT_HOST_ID: AtomicU64 = AtomicU64::new(1);

/// A node living in a [`MemoryHost`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryNode {
    /// Built-in kind, or the processor identity for processor nodes.
    pub kind: String,
    /// Intrinsic parameter values.
    pub params: BTreeMap<String, f32>,
    /// True once started.
    pub running: bool,
    /// True if created from a registered processor.
    pub processor: bool,
}

struct PendingLoad {
    ticket: LoadTicket,
    url: String,
    identity: String,
    source: String,
}

/// In-memory [`Host`] implementation.
pub struct MemoryHost {
    id: HostId,
    next_node: u64,
    nodes: BTreeMap<HostNodeId, MemoryNode>,
    connections: Vec<(SignalOutput, InputPort)>,
    /// Registered processor identity → module URL it came from.
    processors: HashMap<String, String>,
    next_ticket: u64,
    pending: Vec<PendingLoad>,
    settled: HashMap<LoadTicket, LoadStatus>,
    load_requests: Vec<String>,
    evaluator: SourceEvaluator,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryHost")
            .field("id", &self.id)
            .field("nodes", &self.nodes.len())
            .field("connections", &self.connections.len())
            .field("processors", &self.processors.len())
            .field("pending_loads", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl MemoryHost {
    /// Creates a host with a fresh [`HostId`] and the default source evaluator.
    pub fn new() -> Self {
        Self::with_id(HostId(NEXT_HOST_ID.fetch_add(1, Ordering::Relaxed)))
    }

    /// Creates a host with an explicit id.
    pub fn with_id(id: HostId) -> Self {
        Self {
            id,
            next_node: 0,
            nodes: BTreeMap::new(),
            connections: Vec::new(),
            processors: HashMap::new(),
            next_ticket: 0,
            pending: Vec::new(),
            settled: HashMap::new(),
            load_requests: Vec::new(),
            evaluator: Box::new(default_evaluator),
        }
    }

    /// Replaces the source evaluator used when completing module loads.
    pub fn with_evaluator(mut self, evaluator: impl Fn(&str) -> Result<(), String> + 'static) -> Self {
        self.evaluator = Box::new(evaluator);
        self
    }

    /// Settles every pending module load. Returns how many settled.
    ///
    /// A load whose identity is already registered fails, as the host only
    /// accepts each identity once per session.
    pub fn complete_loads(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for load in pending {
            let status = if self.processors.contains_key(&load.identity) {
                LoadStatus::Failed(format!(
                    "NotSupportedError: Failed to execute 'registerProcessor': the name \"{}\" is already registered",
                    load.identity
                ))
            } else {
                match (self.evaluator)(&load.source) {
                    Ok(()) => {
                        self.processors.insert(load.identity.clone(), load.url.clone());
                        LoadStatus::Loaded
                    }
                    Err(message) => LoadStatus::Failed(message),
                }
            };
            tracing::debug!(url = %load.url, identity = %load.identity, ?status, "module load settled");
            self.settled.insert(load.ticket, status);
        }
        count
    }

    /// Returns the node behind a handle.
    pub fn node(&self, id: HostNodeId) -> Option<&MemoryNode> {
        self.nodes.get(&id)
    }

    /// Returns the number of live (unreleased) nodes.
    pub fn live_node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns all live connections.
    pub fn connections(&self) -> &[(SignalOutput, InputPort)] {
        &self.connections
    }

    /// Returns true if `output` is connected to `input`.
    pub fn is_connected(&self, output: SignalOutput, input: &InputPort) -> bool {
        self.connections
            .iter()
            .any(|(o, i)| *o == output && i == input)
    }

    /// Returns how many connections feed `param`.
    pub fn connections_into(&self, param: &ParamRef) -> usize {
        self.connections
            .iter()
            .filter(|(_, i)| i.as_parameter() == Some(param))
            .count()
    }

    /// Returns how many times a load of `url` was requested.
    pub fn load_count(&self, url: &str) -> usize {
        self.load_requests.iter().filter(|u| *u == url).count()
    }

    /// Returns true if a processor is registered under `identity`.
    pub fn is_registered(&self, identity: &str) -> bool {
        self.processors.contains_key(identity)
    }

    /// Returns the number of loads that have not settled yet.
    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    fn insert_node(&mut self, kind: &str, params: &[(&str, f32)], processor: bool) -> HostNodeId {
        let id = HostNodeId(self.next_node);
        self.next_node += 1;
        self.nodes.insert(
            id,
            MemoryNode {
                kind: kind.to_string(),
                params: params
                    .iter()
                    .map(|(name, value)| ((*name).to_string(), *value))
                    .collect(),
                running: false,
                processor,
            },
        );
        id
    }

    fn check_input(&self, input: &InputPort) -> Result<(), HostError> {
        let node = self
            .nodes
            .get(&input.node())
            .ok_or(HostError::UnknownNode(input.node()))?;
        if let InputPort::Parameter(param) = input
            && !node.params.contains_key(&param.name)
        {
            return Err(HostError::UnknownParameter {
                node: param.node,
                name: param.name.clone(),
            });
        }
        Ok(())
    }
}

impl Host for MemoryHost {
    fn host_id(&self) -> HostId {
        self.id
    }

    fn create_node(&mut self, kind: &str, params: &[(&str, f32)]) -> Result<HostNodeId, HostError> {
        Ok(self.insert_node(kind, params, false))
    }

    fn create_processor(
        &mut self,
        identity: &str,
        params: &[(&str, f32)],
    ) -> Result<HostNodeId, HostError> {
        if !self.processors.contains_key(identity) {
            return Err(HostError::UnknownProcessor(identity.to_string()));
        }
        Ok(self.insert_node(identity, params, true))
    }

    fn start(&mut self, node: HostNodeId) -> Result<(), HostError> {
        let entry = self
            .nodes
            .get_mut(&node)
            .ok_or(HostError::UnknownNode(node))?;
        entry.running = true;
        Ok(())
    }

    fn param_value(&self, param: &ParamRef) -> Option<f32> {
        self.nodes.get(&param.node)?.params.get(&param.name).copied()
    }

    fn set_param_value(&mut self, param: &ParamRef, value: f32) -> Result<(), HostError> {
        let node = self
            .nodes
            .get_mut(&param.node)
            .ok_or(HostError::UnknownNode(param.node))?;
        let slot = node
            .params
            .get_mut(&param.name)
            .ok_or_else(|| HostError::UnknownParameter {
                node: param.node,
                name: param.name.clone(),
            })?;
        *slot = value;
        Ok(())
    }

    fn connect(&mut self, output: SignalOutput, input: &InputPort) -> Result<(), HostError> {
        if !self.nodes.contains_key(&output.node) {
            return Err(HostError::UnknownNode(output.node));
        }
        self.check_input(input)?;
        if !self.is_connected(output, input) {
            self.connections.push((output, input.clone()));
        }
        Ok(())
    }

    fn disconnect(&mut self, output: SignalOutput, input: &InputPort) -> Result<(), HostError> {
        let pos = self
            .connections
            .iter()
            .position(|(o, i)| *o == output && i == input)
            .ok_or(HostError::NotConnected)?;
        self.connections.remove(pos);
        Ok(())
    }

    fn release(&mut self, node: HostNodeId) {
        if self.nodes.remove(&node).is_some() {
            self.connections
                .retain(|(o, i)| o.node != node && i.node() != node);
        }
    }

    fn begin_module_load(&mut self, url: &str, identity: &str, source: &str) -> LoadTicket {
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;
        self.load_requests.push(url.to_string());
        self.pending.push(PendingLoad {
            ticket,
            url: url.to_string(),
            identity: identity.to_string(),
            source: source.to_string(),
        });
        ticket
    }

    fn poll_module_load(&mut self, ticket: LoadTicket) -> LoadStatus {
        if let Some(status) = self.settled.get(&ticket) {
            return status.clone();
        }
        if self.pending.iter().any(|load| load.ticket == ticket) {
            LoadStatus::Pending
        } else {
            LoadStatus::Failed(format!("unknown load ticket {}", ticket.0))
        }
    }
}

/// Fails registration when any line of the source is a `throw` statement.
fn default_evaluator(source: &str) -> Result<(), String> {
    for line in source.lines() {
        if let Some(rest) = line.trim().strip_prefix("throw ") {
            let message = rest
                .trim()
                .trim_end_matches(';')
                .trim_matches(|c| c == '"' || c == '\'');
            return Err(format!("Uncaught Error: {message}"));
        }
    }
    Ok(())
}
