//! Incremental reconciliation of the graph store against a host.
//!
//! Per node the synchronizer tracks one of four phases:
//!
//! ```text
//!                 type resolves                    unit built
//! (absent) ──NodeAdded──▶ Resolving ──load settles──▶ Constructed
//!    ▲                       │   code-backed only        │
//!    │                       ▼                           │
//!    └──── NodeRemoved ── Failed ◀── constructor error ──┘
//! ```
//!
//! Plain types skip `Resolving` and are built immediately. Removing a node,
//! changing its type, or changing its `code` tears the unit down; only the
//! last two rebuild it. Other state changes go to the unit's state hook and
//! never re-invoke the constructor.
//!
//! Edges are connected once both endpoint units exist and both port names
//! resolve. Until then an edge is pending, and it is retried whenever one of
//! its endpoints is (re)built.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use patchbay_core::{
    CODE_KEY, ConstructContext, ConstructError, Edge, GraphEvent, GraphStore, Host, InputPort,
    NodeId, NodeInstance, NodeTypeDef, ParamRef, PortDirection, PortRef, RuntimeUnit,
    SignalOutput, TypeCatalog,
};
use patchbay_modules::{
    LoadState, ModuleError, ModuleLoader, ModuleRegistry, ModuleSettings, ResolvedModule,
};

use crate::error::NodeError;
use crate::hold::ParamHolds;

/// Lifecycle phase of one node instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePhase {
    /// No runtime unit: never seen, or torn down after removal.
    Unconstructed,
    /// Waiting for the node's code module to load.
    Resolving,
    /// A runtime unit is live.
    Constructed,
    /// Construction failed; see [`Synchronizer::node_error`].
    Failed,
}

impl NodePhase {
    /// Lowercase name for display.
    pub fn name(self) -> &'static str {
        match self {
            NodePhase::Unconstructed => "unconstructed",
            NodePhase::Resolving => "resolving",
            NodePhase::Constructed => "constructed",
            NodePhase::Failed => "failed",
        }
    }
}

impl core::fmt::Display for NodePhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Counters for one [`Synchronizer::sync`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Store events consumed.
    pub events: usize,
    /// Runtime units built.
    pub constructed: usize,
    /// Runtime units torn down.
    pub torn_down: usize,
    /// Host connections made.
    pub connected: usize,
    /// Host connections removed.
    pub disconnected: usize,
    /// Node-isolated failures (construction, registration, host calls).
    pub failed: usize,
    /// Nodes still waiting for their module after the pass.
    pub resolving: usize,
    /// Store edges without a host connection after the pass.
    pub pending_edges: usize,
}

/// Logical module name used for a code-backed node's source.
pub fn module_name(id: NodeId) -> String {
    format!("node-{id}")
}

#[derive(Debug)]
enum Slot {
    Resolving(ResolvedModule),
    Constructed {
        unit: RuntimeUnit,
        registration: Option<String>,
    },
    Failed(NodeError),
}

#[derive(Debug)]
struct Connection {
    output: SignalOutput,
    input: InputPort,
}

#[derive(Default)]
struct Pass {
    report: SyncReport,
    built: BTreeSet<NodeId>,
}

/// Keeps runtime units and host connections consistent with a [`GraphStore`].
#[derive(Debug)]
pub struct Synchronizer {
    slots: BTreeMap<NodeId, Slot>,
    connections: HashMap<Edge, Connection>,
    holds: ParamHolds,
    registry: ModuleRegistry,
    loader: ModuleLoader,
    stale_types: BTreeSet<String>,
}

impl Default for Synchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Synchronizer {
    /// Creates a synchronizer with default module settings.
    pub fn new() -> Self {
        Self::with_settings(&ModuleSettings::default())
    }

    /// Creates a synchronizer whose registry and loader use `settings`.
    pub fn with_settings(settings: &ModuleSettings) -> Self {
        Self {
            slots: BTreeMap::new(),
            connections: HashMap::new(),
            holds: ParamHolds::default(),
            registry: ModuleRegistry::with_settings(settings),
            loader: ModuleLoader::with_settings(settings),
            stale_types: BTreeSet::new(),
        }
    }

    /// Drains the store's events and applies them to `host`.
    ///
    /// Removals in the batch are applied before anything else, so a deleted
    /// node's unit is gone before any construction the batch triggers. A
    /// failure on one node or edge is recorded and the pass continues.
    pub fn sync(
        &mut self,
        store: &mut GraphStore,
        catalog: &TypeCatalog,
        host: &mut dyn Host,
    ) -> SyncReport {
        let events = store.drain_events();
        let store: &GraphStore = store;
        let mut pass = Pass {
            report: SyncReport {
                events: events.len(),
                ..SyncReport::default()
            },
            built: BTreeSet::new(),
        };

        let (removals, updates): (Vec<GraphEvent>, Vec<GraphEvent>) =
            events.into_iter().partition(GraphEvent::is_removal);

        for event in removals {
            match event {
                GraphEvent::EdgeRemoved(edge) => self.disconnect_edge(edge, host, &mut pass.report),
                GraphEvent::NodeRemoved(id) => {
                    self.teardown(id, host, &mut pass.report);
                    self.registry.remove(&module_name(id));
                }
                _ => {}
            }
        }

        self.rebuild_stale_types(store, catalog, host, &mut pass);

        for event in updates {
            match event {
                GraphEvent::NodeAdded(id) => {
                    if !self.slots.contains_key(&id) {
                        self.build(id, store, catalog, host, &mut pass);
                    }
                }
                GraphEvent::NodeTypeChanged(id) => {
                    self.teardown(id, host, &mut pass.report);
                    self.build(id, store, catalog, host, &mut pass);
                }
                GraphEvent::StateChanged { node, key } => {
                    self.state_changed(node, &key, store, catalog, host, &mut pass);
                }
                GraphEvent::EdgeAdded(edge) => {
                    if store.contains_edge(&edge) {
                        self.connect_edge(edge, store, catalog, host, &mut pass.report);
                    }
                }
                GraphEvent::NodeMoved(_) | GraphEvent::NodeRemoved(_) | GraphEvent::EdgeRemoved(_) => {}
            }
        }

        self.poll_resolving(store, catalog, host, &mut pass);

        let waiting: Vec<Edge> = store
            .edges()
            .iter()
            .filter(|edge| {
                !self.connections.contains_key(edge)
                    && (pass.built.contains(&edge.output.node) || pass.built.contains(&edge.input.node))
            })
            .copied()
            .collect();
        for edge in waiting {
            self.connect_edge(edge, store, catalog, host, &mut pass.report);
        }

        let mut report = pass.report;
        report.resolving = self
            .slots
            .values()
            .filter(|slot| matches!(slot, Slot::Resolving(_)))
            .count();
        report.pending_edges = store
            .edges()
            .iter()
            .filter(|edge| !self.connections.contains_key(edge))
            .count();
        tracing::debug!(?report, "sync pass");
        report
    }

    /// Marks every node of `type_name` for reconstruction on the next pass.
    ///
    /// Call after replacing a definition with
    /// [`TypeCatalog::register_type`]. A type that no longer resolves leaves
    /// its nodes failed.
    pub fn invalidate_type(&mut self, type_name: &str) {
        self.stale_types.insert(type_name.to_string());
    }

    /// Disconnects everything and tears every unit down.
    pub fn shutdown(&mut self, host: &mut dyn Host) -> SyncReport {
        let mut report = SyncReport::default();
        let edges: Vec<Edge> = self.connections.keys().copied().collect();
        for edge in edges {
            self.disconnect_edge(edge, host, &mut report);
        }
        for (_, slot) in std::mem::take(&mut self.slots) {
            if let Slot::Constructed { unit, .. } = slot {
                unit.teardown(host);
                report.torn_down += 1;
            }
        }
        self.holds.clear();
        self.loader.forget_host(host.host_id());
        tracing::debug!(?report, "sync shutdown");
        report
    }

    // --- Queries ---

    /// Returns the lifecycle phase of a node.
    pub fn phase(&self, id: NodeId) -> NodePhase {
        match self.slots.get(&id) {
            None => NodePhase::Unconstructed,
            Some(Slot::Resolving(_)) => NodePhase::Resolving,
            Some(Slot::Constructed { .. }) => NodePhase::Constructed,
            Some(Slot::Failed(_)) => NodePhase::Failed,
        }
    }

    /// Returns a node's live runtime unit.
    pub fn unit(&self, id: NodeId) -> Option<&RuntimeUnit> {
        match self.slots.get(&id) {
            Some(Slot::Constructed { unit, .. }) => Some(unit),
            _ => None,
        }
    }

    /// Returns the registration identity a code-backed node's unit was built with.
    pub fn registration(&self, id: NodeId) -> Option<&str> {
        match self.slots.get(&id) {
            Some(Slot::Constructed { registration, .. }) => registration.as_deref(),
            Some(Slot::Resolving(module)) => Some(module.identity.as_str()),
            _ => None,
        }
    }

    /// Returns the error attached to a failed node.
    pub fn node_error(&self, id: NodeId) -> Option<&NodeError> {
        match self.slots.get(&id) {
            Some(Slot::Failed(err)) => Some(err),
            _ => None,
        }
    }

    /// Iterates over all failed nodes and their errors.
    pub fn errors(&self) -> impl Iterator<Item = (NodeId, &NodeError)> {
        self.slots.iter().filter_map(|(id, slot)| match slot {
            Slot::Failed(err) => Some((*id, err)),
            _ => None,
        })
    }

    /// Returns the unit's UI summary for a node, if it has one.
    pub fn describe(&self, id: NodeId, store: &GraphStore) -> Option<String> {
        let node = store.node(id)?;
        self.unit(id)?.describe(&node.state)
    }

    /// Returns true if `edge` has a live host connection.
    pub fn is_connected(&self, edge: &Edge) -> bool {
        self.connections.contains_key(edge)
    }

    /// Returns the number of live host connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Returns the intrinsic value saved for a parameter that has live
    /// connections.
    pub fn held_value(&self, param: &ParamRef) -> Option<f32> {
        self.holds.saved(param)
    }

    /// The module registry holding code-backed nodes' source.
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// The per-host module load cache.
    pub fn loader(&self) -> &ModuleLoader {
        &self.loader
    }

    // --- Node lifecycle ---

    fn build(
        &mut self,
        id: NodeId,
        store: &GraphStore,
        catalog: &TypeCatalog,
        host: &mut dyn Host,
        pass: &mut Pass,
    ) {
        let Some(node) = store.node(id) else {
            return;
        };
        let def = match catalog.resolve(&node.type_name) {
            Ok(def) => def,
            Err(err) => return self.fail(id, err.into(), pass),
        };

        if def.is_code_backed() {
            match code_source(node) {
                Ok(source) => self.begin_resolution(id, &source, host),
                Err(err) => self.fail(id, err.into(), pass),
            }
            return;
        }
        self.construct(id, &def, store, host, None, pass);
    }

    fn construct(
        &mut self,
        id: NodeId,
        def: &NodeTypeDef,
        store: &GraphStore,
        host: &mut dyn Host,
        registration: Option<String>,
        pass: &mut Pass,
    ) {
        let Some(node) = store.node(id) else {
            return;
        };
        let result = {
            let mut ctx =
                ConstructContext::new(id, node.state.clone(), host, registration.as_deref());
            def.construct(&mut ctx)
        };

        match result {
            Ok(unit) => {
                tracing::debug!("sync_construct: node {id} ({})", node.type_name);
                self.slots
                    .insert(id, Slot::Constructed { unit, registration });
                pass.report.constructed += 1;
                pass.built.insert(id);
            }
            Err(err) => self.fail(id, err.into(), pass),
        }
    }

    fn begin_resolution(&mut self, id: NodeId, source: &str, host: &mut dyn Host) {
        let name = module_name(id);
        self.registry.write(&name, source);
        match self.registry.resolve(&name) {
            Ok(module) => {
                self.loader.request(host, &module, source);
                tracing::debug!("sync_resolve: node {id} as {}", module.identity);
                self.slots.insert(id, Slot::Resolving(module));
            }
            Err(err) => {
                self.slots.insert(id, Slot::Failed(err.into()));
            }
        }
    }

    fn poll_resolving(
        &mut self,
        store: &GraphStore,
        catalog: &TypeCatalog,
        host: &mut dyn Host,
        pass: &mut Pass,
    ) {
        let resolving: Vec<(NodeId, ResolvedModule)> = self
            .slots
            .iter()
            .filter_map(|(id, slot)| match slot {
                Slot::Resolving(module) => Some((*id, module.clone())),
                _ => None,
            })
            .collect();

        for (id, requested) in resolving {
            let Ok(current) = self.registry.resolve(&requested.logical_name) else {
                continue;
            };
            if current.identity != requested.identity {
                tracing::debug!(
                    "sync_resolve: node {id} discarding stale {} for {}",
                    requested.identity,
                    current.identity
                );
                self.slots.insert(id, Slot::Resolving(current.clone()));
            }

            let state = match self.loader.poll(host, &current.source_url) {
                Some(state) => state,
                None => {
                    let source = self.registry.read(&current.logical_name).unwrap_or_default();
                    self.loader.request(host, &current, source)
                }
            };

            match state {
                LoadState::InFlight(_) => {}
                LoadState::Loaded => {
                    let Some(node) = store.node(id) else {
                        continue;
                    };
                    match catalog.resolve(&node.type_name) {
                        Ok(def) => {
                            self.construct(id, &def, store, host, Some(current.identity), pass);
                        }
                        Err(err) => self.fail(id, err.into(), pass),
                    }
                }
                LoadState::Failed(message) => {
                    self.fail(id, ModuleError::load_failed(&current.identity, message).into(), pass);
                }
            }
        }
    }

    fn state_changed(
        &mut self,
        id: NodeId,
        key: &str,
        store: &GraphStore,
        catalog: &TypeCatalog,
        host: &mut dyn Host,
        pass: &mut Pass,
    ) {
        let Some(node) = store.node(id) else {
            return;
        };

        if key == CODE_KEY
            && let Some(def) = catalog.get(&node.type_name)
            && def.is_code_backed()
        {
            match code_source(node) {
                Ok(source) => {
                    let changed = self.registry.write(&module_name(id), &source).is_new_version();
                    let failed = matches!(self.slots.get(&id), Some(Slot::Failed(_)));
                    if changed || failed {
                        tracing::debug!("sync_reload: node {id} source changed (failed: {failed})");
                        self.teardown(id, host, &mut pass.report);
                        self.begin_resolution(id, &source, host);
                    }
                }
                Err(err) => {
                    self.teardown(id, host, &mut pass.report);
                    self.fail(id, err.into(), pass);
                }
            }
            return;
        }

        if let Some(Slot::Constructed { unit, .. }) = self.slots.get(&id)
            && let Err(err) = unit.apply_state_change(&node.state, key, host)
        {
            tracing::warn!(node = %id, key, error = %err, "state hook failed");
            pass.report.failed += 1;
        }
    }

    fn rebuild_stale_types(
        &mut self,
        store: &GraphStore,
        catalog: &TypeCatalog,
        host: &mut dyn Host,
        pass: &mut Pass,
    ) {
        if self.stale_types.is_empty() {
            return;
        }
        let stale = std::mem::take(&mut self.stale_types);
        let ids: Vec<NodeId> = store
            .nodes()
            .filter(|node| stale.contains(&node.type_name))
            .map(|node| node.id)
            .collect();
        for id in ids {
            self.teardown(id, host, &mut pass.report);
            self.build(id, store, catalog, host, pass);
        }
    }

    fn teardown(&mut self, id: NodeId, host: &mut dyn Host, report: &mut SyncReport) {
        let touching: Vec<Edge> = self
            .connections
            .keys()
            .filter(|edge| edge.touches(id))
            .copied()
            .collect();
        for edge in touching {
            self.disconnect_edge(edge, host, report);
        }

        if let Some(Slot::Constructed { unit, .. }) = self.slots.remove(&id) {
            unit.teardown(host);
            report.torn_down += 1;
            tracing::debug!("sync_teardown: node {id}");
        }
    }

    fn fail(&mut self, id: NodeId, err: NodeError, pass: &mut Pass) {
        tracing::warn!(node = %id, error = %err, "node failed");
        pass.report.failed += 1;
        self.slots.insert(id, Slot::Failed(err));
    }

    // --- Edges ---

    fn connect_edge(
        &mut self,
        edge: Edge,
        store: &GraphStore,
        catalog: &TypeCatalog,
        host: &mut dyn Host,
        report: &mut SyncReport,
    ) {
        if self.connections.contains_key(&edge) {
            return;
        }
        let Some((output, input)) = self.endpoints(edge, store, catalog) else {
            tracing::trace!("sync_connect: {edge} pending");
            return;
        };

        if let Some(param) = input.as_parameter()
            && let Err(err) = self.holds.acquire(param, host)
        {
            tracing::warn!(%edge, error = %err, "parameter hold failed");
            report.failed += 1;
            return;
        }
        if let Err(err) = host.connect(output, &input) {
            tracing::warn!(%edge, error = %err, "connect failed");
            if let Some(param) = input.as_parameter()
                && let Err(err) = self.holds.release(param, host)
            {
                tracing::debug!(%edge, error = %err, "parameter restore failed");
            }
            report.failed += 1;
            return;
        }

        tracing::debug!("sync_connect: {edge}");
        self.connections.insert(edge, Connection { output, input });
        report.connected += 1;
    }

    fn disconnect_edge(&mut self, edge: Edge, host: &mut dyn Host, report: &mut SyncReport) {
        let Some(connection) = self.connections.remove(&edge) else {
            return;
        };
        if let Err(err) = host.disconnect(connection.output, &connection.input) {
            tracing::debug!(%edge, error = %err, "disconnect failed");
        }
        if let Some(param) = connection.input.as_parameter()
            && let Err(err) = self.holds.release(param, host)
        {
            tracing::debug!(%edge, error = %err, "parameter restore failed");
        }
        tracing::debug!("sync_disconnect: {edge}");
        report.disconnected += 1;
    }

    /// Maps an edge's port indices to the endpoint units' named ports.
    fn endpoints(
        &self,
        edge: Edge,
        store: &GraphStore,
        catalog: &TypeCatalog,
    ) -> Option<(SignalOutput, InputPort)> {
        let output_kind = store.port_kind(catalog, edge.output, PortDirection::Output).ok()?;
        let input_kind = store.port_kind(catalog, edge.input, PortDirection::Input).ok()?;
        if output_kind != input_kind {
            tracing::debug!("sync_connect: {edge} skipped, kind '{output_kind}' into '{input_kind}'");
            return None;
        }
        let output_name = port_name(store, catalog, edge.output, PortDirection::Output)?;
        let input_name = port_name(store, catalog, edge.input, PortDirection::Input)?;
        let output = self.unit(edge.output.node)?.output(output_name)?;
        let input = self.unit(edge.input.node)?.input(input_name)?.clone();
        Some((output, input))
    }
}

fn port_name<'c>(
    store: &GraphStore,
    catalog: &'c TypeCatalog,
    port: PortRef,
    direction: PortDirection,
) -> Option<&'c str> {
    let node = store.node(port.node)?;
    catalog
        .get(&node.type_name)?
        .ports
        .get(direction, port.port)
        .map(|def| def.name.as_str())
}

/// Reads a code-backed node's source. A missing field is empty source.
fn code_source(node: &NodeInstance) -> Result<String, ConstructError> {
    match node.state.get_str(CODE_KEY) {
        Some(source) => Ok(source),
        None if !node.state.contains(CODE_KEY) => Ok(String::new()),
        None => Err(ConstructError::InvalidState {
            key: CODE_KEY.to_string(),
            reason: "expected source text".to_string(),
        }),
    }
}
