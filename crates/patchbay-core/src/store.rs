//! Graph store: the declarative node/edge model and its mutations.
//!
//! [`GraphStore`] owns node instances and edges and exposes the structural
//! mutations the editor performs. Every mutation appends fine-grained
//! [`GraphEvent`]s to an internal queue which the synchronizer drains, so a
//! slider move on one node never causes the rest of the graph to be rebuilt.
//!
//! # Invariants
//!
//! - No edge references a node that is not in the store. [`delete_node()`]
//!   removes the node's edges in the same call, queuing their
//!   `EdgeRemoved` events before `NodeRemoved`.
//! - At most one edge exists per `(output, input)` pair.
//! - Every edge joins an output and an input whose kinds are equal. A
//!   retype through [`update_node()`] drops the node's edges that no longer
//!   satisfy this, queuing their `EdgeRemoved` events before
//!   `NodeTypeChanged`.
//!
//! [`delete_node()`]: GraphStore::delete_node
//! [`update_node()`]: GraphStore::update_node

use std::collections::BTreeMap;

use serde_json::Value;

use crate::catalog::TypeCatalog;
use crate::document::GraphDocument;
use crate::edge::Edge;
use crate::error::GraphError;
use crate::geometry::Position;
use crate::layout::{DEFAULT_GRID, snap};
use crate::node::{IdAllocator, NodeId, NodeInstance, NodeUpdate};
use crate::port::{PortDirection, PortRef};

/// A single observable change to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    /// A node instance was appended.
    NodeAdded(NodeId),
    /// A node instance was deleted (its edges were removed first).
    NodeRemoved(NodeId),
    /// A node's type name changed.
    NodeTypeChanged(NodeId),
    /// A node's position or dimensions changed.
    NodeMoved(NodeId),
    /// One key of a node's state was written.
    StateChanged {
        /// Node whose state changed.
        node: NodeId,
        /// Key that was written.
        key: String,
    },
    /// An edge was appended.
    EdgeAdded(Edge),
    /// An edge was removed.
    EdgeRemoved(Edge),
}

impl GraphEvent {
    /// Returns true for events that remove something from the graph.
    pub fn is_removal(&self) -> bool {
        matches!(self, GraphEvent::NodeRemoved(_) | GraphEvent::EdgeRemoved(_))
    }
}

/// Result of a [`GraphStore::link`] call.
///
/// Only `Linked` mutates the store. Rejections are side-effect free.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkOutcome {
    /// The edge was appended.
    Linked,
    /// An identical edge already exists.
    Duplicate,
    /// The port kinds differ.
    KindMismatch {
        /// Kind of the output port.
        output: String,
        /// Kind of the input port.
        input: String,
    },
    /// A referenced node, type, or port does not exist.
    InvalidEndpoint(GraphError),
}

impl LinkOutcome {
    /// Returns true if the edge was appended.
    pub fn is_linked(&self) -> bool {
        matches!(self, LinkOutcome::Linked)
    }
}

/// The live graph document.
#[derive(Debug)]
pub struct GraphStore {
    nodes: BTreeMap<NodeId, NodeInstance>,
    edges: Vec<Edge>,
    ids: IdAllocator,
    grid: f32,
    events: Vec<GraphEvent>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new(DEFAULT_GRID)
    }
}

impl GraphStore {
    /// Creates an empty store snapping placements to `grid`.
    pub fn new(grid: f32) -> Self {
        Self {
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            ids: IdAllocator::new(),
            grid,
            events: Vec::new(),
        }
    }

    /// Returns the grid unit.
    pub fn grid(&self) -> f32 {
        self.grid
    }

    // --- Node mutations ---

    /// Adds a node of type `type_name` at `position` (snapped to the grid).
    ///
    /// The type's default footprint and default state are copied by value.
    /// Fails with [`GraphError::UnknownType`] if the catalog lacks the type.
    pub fn add_node(
        &mut self,
        catalog: &TypeCatalog,
        type_name: &str,
        position: Position,
    ) -> Result<NodeId, GraphError> {
        let def = catalog.resolve(type_name)?;
        let id = self.ids.allocate();
        let node = NodeInstance {
            id,
            type_name: type_name.to_string(),
            x: snap(position.x, self.grid),
            y: snap(position.y, self.grid),
            dimensions: def.dimensions,
            state: def.initial_state(),
        };
        tracing::debug!("graph_add: node {id} ({type_name}) at ({}, {})", node.x, node.y);
        self.nodes.insert(id, node);
        self.events.push(GraphEvent::NodeAdded(id));
        Ok(id)
    }

    /// Deletes a node and every edge touching it.
    pub fn delete_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }

        let (removed, kept): (Vec<Edge>, Vec<Edge>) =
            self.edges.iter().partition(|edge| edge.touches(id));
        self.edges = kept;
        for edge in removed {
            self.events.push(GraphEvent::EdgeRemoved(edge));
        }

        self.nodes.remove(&id);
        self.events.push(GraphEvent::NodeRemoved(id));
        tracing::debug!("graph_remove: node {id}");
        Ok(())
    }

    /// Applies a partial update. Coordinates and dimensions are snapped.
    ///
    /// A type change must name a type known to `catalog`; otherwise the
    /// update fails with [`GraphError::UnknownType`] and nothing changes.
    /// After a type change, edges touching the node whose ports no longer
    /// exist or no longer share a kind are removed.
    pub fn update_node(
        &mut self,
        catalog: &TypeCatalog,
        id: NodeId,
        mut update: NodeUpdate,
    ) -> Result<(), GraphError> {
        let grid = self.grid;
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(GraphError::NodeNotFound(id))?;

        let new_type = update
            .type_name
            .take()
            .filter(|type_name| *type_name != node.type_name);
        if let Some(type_name) = &new_type {
            catalog.resolve(type_name)?;
        }

        let moved = apply_geometry(node, &update, grid);

        let retyped = match new_type {
            Some(type_name) => {
                tracing::debug!("graph_update: node {id} type {} → {type_name}", node.type_name);
                node.type_name = type_name;
                true
            }
            None => false,
        };

        if moved {
            self.events.push(GraphEvent::NodeMoved(id));
        }
        if retyped {
            self.prune_invalid_edges(catalog, id);
            self.events.push(GraphEvent::NodeTypeChanged(id));
        }
        Ok(())
    }

    /// Moves a node to `position` (snapped to the grid).
    ///
    /// Equivalent to [`update_node()`](Self::update_node) with only
    /// coordinates set, without needing the catalog.
    pub fn move_node(&mut self, id: NodeId, position: Position) -> Result<(), GraphError> {
        let grid = self.grid;
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(GraphError::NodeNotFound(id))?;
        if apply_geometry(node, &NodeUpdate::moved_to(position), grid) {
            self.events.push(GraphEvent::NodeMoved(id));
        }
        Ok(())
    }

    /// Removes edges touching `id` whose ports are out of range or whose
    /// kinds differ.
    fn prune_invalid_edges(&mut self, catalog: &TypeCatalog, id: NodeId) {
        let (invalid, kept): (Vec<Edge>, Vec<Edge>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|edge| edge.touches(id) && self.edge_problem(catalog, edge).is_some());
        self.edges = kept;
        for edge in invalid {
            tracing::debug!("graph_update: node {id} retype drops {edge}");
            self.events.push(GraphEvent::EdgeRemoved(edge));
        }
    }

    /// Describes why `edge` violates the port invariant, if it does.
    fn edge_problem(&self, catalog: &TypeCatalog, edge: &Edge) -> Option<String> {
        let output = match self.port_kind(catalog, edge.output, PortDirection::Output) {
            Ok(kind) => kind,
            Err(err) => return Some(err.to_string()),
        };
        let input = match self.port_kind(catalog, edge.input, PortDirection::Input) {
            Ok(kind) => kind,
            Err(err) => return Some(err.to_string()),
        };
        (output != input).then(|| format!("kind '{output}' does not match '{input}'"))
    }

    /// Writes one state key of a node, returning the previous value.
    pub fn set_state(
        &mut self,
        id: NodeId,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, GraphError> {
        let node = self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))?;
        let previous = node.state.set(key, value);
        self.events.push(GraphEvent::StateChanged {
            node: id,
            key: key.to_string(),
        });
        Ok(previous)
    }

    // --- Edge mutations ---

    /// Links an output port to an input port.
    ///
    /// Duplicates, kind mismatches, and references to missing nodes or
    /// out-of-range ports are rejected without touching the store.
    pub fn link(&mut self, catalog: &TypeCatalog, output: PortRef, input: PortRef) -> LinkOutcome {
        if let Err(rejection) = self.check_link(catalog, output, input) {
            tracing::debug!("graph_link: {output} → {input} rejected ({rejection:?})");
            return rejection;
        }
        let edge = Edge::new(output, input);
        self.edges.push(edge);
        self.events.push(GraphEvent::EdgeAdded(edge));
        tracing::debug!("graph_link: {edge}");
        LinkOutcome::Linked
    }

    /// Removes the edge `output → input` if present. Returns true if removed.
    pub fn unlink(&mut self, output: PortRef, input: PortRef) -> bool {
        let target = Edge::new(output, input);
        match self.edges.iter().position(|edge| *edge == target) {
            Some(pos) => {
                self.edges.remove(pos);
                self.events.push(GraphEvent::EdgeRemoved(target));
                tracing::debug!("graph_unlink: {target}");
                true
            }
            None => false,
        }
    }

    /// Checks whether `output → input` may be linked, without mutating.
    ///
    /// `Err` carries the outcome [`link()`](Self::link) would return.
    pub fn check_link(
        &self,
        catalog: &TypeCatalog,
        output: PortRef,
        input: PortRef,
    ) -> Result<(), LinkOutcome> {
        if self.contains_edge(&Edge::new(output, input)) {
            return Err(LinkOutcome::Duplicate);
        }
        let output_kind = self
            .port_kind(catalog, output, PortDirection::Output)
            .map_err(LinkOutcome::InvalidEndpoint)?;
        let input_kind = self
            .port_kind(catalog, input, PortDirection::Input)
            .map_err(LinkOutcome::InvalidEndpoint)?;
        if output_kind != input_kind {
            return Err(LinkOutcome::KindMismatch {
                output: output_kind.to_string(),
                input: input_kind.to_string(),
            });
        }
        Ok(())
    }

    /// Returns true if [`link()`](Self::link) would append `output → input`.
    pub fn can_link(&self, catalog: &TypeCatalog, output: PortRef, input: PortRef) -> bool {
        self.check_link(catalog, output, input).is_ok()
    }

    /// Resolves the kind of a port through the node's type.
    pub fn port_kind<'c>(
        &self,
        catalog: &'c TypeCatalog,
        port: PortRef,
        direction: PortDirection,
    ) -> Result<&'c str, GraphError> {
        let node = self
            .nodes
            .get(&port.node)
            .ok_or(GraphError::NodeNotFound(port.node))?;
        let def = catalog
            .get(&node.type_name)
            .ok_or_else(|| GraphError::UnknownType {
                name: node.type_name.clone(),
                valid: catalog.names(),
            })?;
        def.ports
            .get(direction, port.port)
            .map(|p| p.kind.as_str())
            .ok_or(GraphError::PortOutOfRange {
                node: port.node,
                direction: direction.name(),
                port: port.port,
            })
    }

    // --- Queries ---

    /// Returns a node instance.
    pub fn node(&self, id: NodeId) -> Option<&NodeInstance> {
        self.nodes.get(&id)
    }

    /// Iterates over nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeInstance> {
        self.nodes.values()
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns all edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns true if the exact edge exists.
    pub fn contains_edge(&self, edge: &Edge) -> bool {
        self.edges.contains(edge)
    }

    /// Finds the first edge from node `from` to node `to`, on any ports.
    pub fn find_edge(&self, from: NodeId, to: NodeId) -> Option<Edge> {
        self.edges
            .iter()
            .find(|edge| edge.output.node == from && edge.input.node == to)
            .copied()
    }

    /// Iterates over edges leaving `id`, in insertion order.
    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |edge| edge.output.node == id)
    }

    /// Iterates over edges arriving at `id`, in insertion order.
    pub fn incoming(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |edge| edge.input.node == id)
    }

    /// Returns the id the next [`add_node()`](Self::add_node) will allocate.
    pub fn next_id(&self) -> NodeId {
        self.ids.peek()
    }

    // --- Events ---

    /// Takes all queued events, oldest first.
    pub fn drain_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }

    /// Returns queued events without taking them.
    pub fn pending_events(&self) -> &[GraphEvent] {
        &self.events
    }

    // --- Documents ---

    /// Replaces the store's contents with `document`.
    ///
    /// Queues removal events for the previous contents, then additions for
    /// the new ones. The id allocator is reseeded to `max(ids) + 1`. Map keys
    /// win over the `id` field inside each node. Duplicate edges are
    /// collapsed; an edge referencing a node missing from the document
    /// fails the whole hydration and leaves the store unchanged.
    pub fn hydrate(&mut self, document: GraphDocument) -> Result<(), GraphError> {
        let GraphDocument { nodes, edges } = document;
        let nodes: BTreeMap<NodeId, NodeInstance> = nodes
            .into_iter()
            .map(|(id, mut node)| {
                node.id = id;
                (id, node)
            })
            .collect();

        let mut unique: Vec<Edge> = Vec::with_capacity(edges.len());
        for edge in edges {
            if !nodes.contains_key(&edge.output.node) || !nodes.contains_key(&edge.input.node) {
                return Err(GraphError::DanglingEdge(edge));
            }
            if !unique.contains(&edge) {
                unique.push(edge);
            }
        }

        for edge in std::mem::take(&mut self.edges) {
            self.events.push(GraphEvent::EdgeRemoved(edge));
        }
        for id in std::mem::take(&mut self.nodes).into_keys() {
            self.events.push(GraphEvent::NodeRemoved(id));
        }

        self.ids = IdAllocator::seeded_from(nodes.keys().copied());
        self.events
            .extend(nodes.keys().map(|id| GraphEvent::NodeAdded(*id)));
        self.events
            .extend(unique.iter().map(|edge| GraphEvent::EdgeAdded(*edge)));
        self.nodes = nodes;
        self.edges = unique;

        tracing::debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            next_id = %self.ids.peek(),
            "graph_hydrate"
        );
        Ok(())
    }

    /// Returns a detached copy of the current contents as a document.
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            nodes: self
                .nodes
                .iter()
                .map(|(id, node)| (*id, node.detached()))
                .collect(),
            edges: self.edges.clone(),
        }
    }

    /// Verifies the structural invariants.
    ///
    /// A failure here indicates a bug, not a user error.
    pub fn validate(&self) -> Result<(), GraphError> {
        for edge in &self.edges {
            if !self.nodes.contains_key(&edge.output.node)
                || !self.nodes.contains_key(&edge.input.node)
            {
                return Err(GraphError::DanglingEdge(*edge));
            }
        }
        Ok(())
    }

    /// Verifies the structural invariants plus the port invariant: every
    /// edge references in-range ports of equal kind.
    pub fn validate_ports(&self, catalog: &TypeCatalog) -> Result<(), GraphError> {
        self.validate()?;
        for edge in &self.edges {
            if let Some(reason) = self.edge_problem(catalog, edge) {
                return Err(GraphError::InvalidEdge {
                    edge: *edge,
                    reason,
                });
            }
        }
        Ok(())
    }
}

/// Applies the geometric fields of `update`. Returns true if anything changed.
fn apply_geometry(node: &mut NodeInstance, update: &NodeUpdate, grid: f32) -> bool {
    let before = (node.x, node.y, node.dimensions);
    if let Some(x) = update.x {
        node.x = snap(x, grid);
    }
    if let Some(y) = update.y {
        node.y = snap(y, grid);
    }
    if let Some(dims) = update.dimensions {
        let merged = node.dimensions.merged(dims);
        node.dimensions.width = snap(merged.width, grid);
        node.dimensions.height = snap(merged.height, grid);
    }
    before != (node.x, node.y, node.dimensions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NodeTypeDef;
    use crate::geometry::{Dimensions, DimensionsUpdate};
    use crate::port::{PortDef, PortSet};
    use crate::unit::RuntimeUnit;
    use serde_json::json;

    fn def(inputs: &[(&str, &str)], outputs: &[(&str, &str)], width: f32) -> NodeTypeDef {
        let ports = PortSet::new(
            inputs.iter().map(|(n, k)| PortDef::new(*n, *k)).collect(),
            outputs.iter().map(|(n, k)| PortDef::new(*n, *k)).collect(),
        );
        NodeTypeDef::new(ports, Dimensions::new(width, 60.0), |_| Ok(RuntimeUnit::new()))
    }

    fn catalog() -> TypeCatalog {
        let mut catalog = TypeCatalog::new();
        catalog.register_type(
            "osc",
            def(&[], &[("out", "audio")], 80.0).with_default_state(
                json!({"frequency": 440})
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
            ),
        );
        catalog.register_type(
            "gain",
            def(&[("in", "audio"), ("gain", "audio")], &[("out", "audio")], 180.0),
        );
        catalog.register_type("speaker", def(&[("in", "audio")], &[], 80.0));
        catalog.register_type("clock", def(&[], &[("tick", "trigger")], 80.0));
        catalog
    }

    fn out(node: NodeId, port: usize) -> PortRef {
        PortRef::new(node, port)
    }

    #[test]
    fn add_node_snaps_and_copies_defaults() {
        let catalog = catalog();
        let mut store = GraphStore::new(10.0);
        let id = store.add_node(&catalog, "osc", Position::new(13.0, 27.0)).unwrap();

        let node = store.node(id).unwrap();
        assert_eq!((node.x, node.y), (10.0, 30.0));
        assert_eq!(node.dimensions, Dimensions::new(80.0, 60.0));
        assert_eq!(node.state.get_f64("frequency"), Some(440.0));
        assert_eq!(store.drain_events(), vec![GraphEvent::NodeAdded(id)]);
    }

    #[test]
    fn add_unknown_type_fails_without_allocating() {
        let catalog = catalog();
        let mut store = GraphStore::default();
        let err = store
            .add_node(&catalog, "reverb", Position::default())
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownType { ref name, .. } if name == "reverb"));
        assert_eq!(store.next_id(), NodeId(0));
        assert!(store.pending_events().is_empty());
    }

    #[test]
    fn default_state_is_not_shared_between_instances() {
        let catalog = catalog();
        let mut store = GraphStore::default();
        let a = store.add_node(&catalog, "osc", Position::default()).unwrap();
        let b = store.add_node(&catalog, "osc", Position::default()).unwrap();
        store.set_state(a, "frequency", 110).unwrap();
        assert_eq!(store.node(b).unwrap().state.get_f64("frequency"), Some(440.0));
    }

    #[test]
    fn link_twice_is_idempotent() {
        let catalog = catalog();
        let mut store = GraphStore::default();
        let osc = store.add_node(&catalog, "osc", Position::default()).unwrap();
        let spk = store.add_node(&catalog, "speaker", Position::default()).unwrap();

        assert_eq!(store.link(&catalog, out(osc, 0), out(spk, 0)), LinkOutcome::Linked);
        assert_eq!(store.link(&catalog, out(osc, 0), out(spk, 0)), LinkOutcome::Duplicate);
        assert_eq!(store.edge_count(), 1);
    }

    #[test]
    fn link_kind_mismatch_is_rejected() {
        let catalog = catalog();
        let mut store = GraphStore::default();
        let clock = store.add_node(&catalog, "clock", Position::default()).unwrap();
        let spk = store.add_node(&catalog, "speaker", Position::default()).unwrap();
        store.drain_events();

        let outcome = store.link(&catalog, out(clock, 0), out(spk, 0));
        assert_eq!(
            outcome,
            LinkOutcome::KindMismatch {
                output: "trigger".to_string(),
                input: "audio".to_string(),
            }
        );
        assert_eq!(store.edge_count(), 0);
        assert!(store.pending_events().is_empty());
    }

    #[test]
    fn link_out_of_bounds_is_rejected() {
        let catalog = catalog();
        let mut store = GraphStore::default();
        let osc = store.add_node(&catalog, "osc", Position::default()).unwrap();
        let spk = store.add_node(&catalog, "speaker", Position::default()).unwrap();

        assert!(matches!(
            store.link(&catalog, out(osc, 1), out(spk, 0)),
            LinkOutcome::InvalidEndpoint(GraphError::PortOutOfRange { .. })
        ));
        assert!(matches!(
            store.link(&catalog, out(osc, 0), out(NodeId(99), 0)),
            LinkOutcome::InvalidEndpoint(GraphError::NodeNotFound(NodeId(99)))
        ));
        assert!(!store.can_link(&catalog, out(spk, 0), out(osc, 0)));
    }

    #[test]
    fn unlink_removes_first_match_only_once() {
        let catalog = catalog();
        let mut store = GraphStore::default();
        let osc = store.add_node(&catalog, "osc", Position::default()).unwrap();
        let spk = store.add_node(&catalog, "speaker", Position::default()).unwrap();
        store.link(&catalog, out(osc, 0), out(spk, 0));

        assert!(store.unlink(out(osc, 0), out(spk, 0)));
        assert!(!store.unlink(out(osc, 0), out(spk, 0)));
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn delete_node_cascades_edges_before_node_event() {
        let catalog = catalog();
        let mut store = GraphStore::default();
        let osc = store.add_node(&catalog, "osc", Position::default()).unwrap();
        let gain = store.add_node(&catalog, "gain", Position::default()).unwrap();
        let spk = store.add_node(&catalog, "speaker", Position::default()).unwrap();
        store.link(&catalog, out(osc, 0), out(gain, 0));
        store.link(&catalog, out(gain, 0), out(spk, 0));
        store.drain_events();

        store.delete_node(gain).unwrap();

        assert_eq!(store.edge_count(), 0);
        let events = store.drain_events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], GraphEvent::EdgeRemoved(_)));
        assert!(matches!(events[1], GraphEvent::EdgeRemoved(_)));
        assert_eq!(events[2], GraphEvent::NodeRemoved(gain));
        assert!(store.validate().is_ok());
    }

    #[test]
    fn delete_missing_node_fails() {
        let mut store = GraphStore::default();
        assert_eq!(
            store.delete_node(NodeId(3)),
            Err(GraphError::NodeNotFound(NodeId(3)))
        );
    }

    #[test]
    fn update_node_merges_fields() {
        let catalog = catalog();
        let mut store = GraphStore::new(10.0);
        let id = store.add_node(&catalog, "gain", Position::new(0.0, 0.0)).unwrap();
        store.drain_events();

        store
            .update_node(
                &catalog,
                id,
                NodeUpdate::resized(DimensionsUpdate {
                    width: Some(204.0),
                    height: None,
                }),
            )
            .unwrap();
        let node = store.node(id).unwrap();
        assert_eq!(node.dimensions, Dimensions::new(200.0, 60.0));
        assert_eq!(store.drain_events(), vec![GraphEvent::NodeMoved(id)]);

        store.update_node(&catalog, id, NodeUpdate::retyped("gain")).unwrap();
        assert!(store.drain_events().is_empty());

        store.update_node(&catalog, id, NodeUpdate::retyped("speaker")).unwrap();
        assert_eq!(store.drain_events(), vec![GraphEvent::NodeTypeChanged(id)]);
        assert_eq!(store.node(id).unwrap().type_name, "speaker");
    }

    #[test]
    fn retype_drops_edges_that_no_longer_fit() {
        let catalog = catalog();
        let mut store = GraphStore::default();
        let osc = store.add_node(&catalog, "osc", Position::default()).unwrap();
        let gain = store.add_node(&catalog, "gain", Position::default()).unwrap();
        let spk = store.add_node(&catalog, "speaker", Position::default()).unwrap();
        store.link(&catalog, out(osc, 0), out(gain, 1));
        store.link(&catalog, out(gain, 0), out(spk, 0));
        let into_gain = Edge::new(out(osc, 0), out(gain, 1));
        let from_gain = Edge::new(out(gain, 0), out(spk, 0));
        store.drain_events();

        // clock has no inputs and a trigger output
        store
            .update_node(&catalog, gain, NodeUpdate::retyped("clock"))
            .unwrap();

        assert_eq!(store.edge_count(), 0);
        assert_eq!(
            store.drain_events(),
            vec![
                GraphEvent::EdgeRemoved(into_gain),
                GraphEvent::EdgeRemoved(from_gain),
                GraphEvent::NodeTypeChanged(gain),
            ]
        );
        assert!(store.validate_ports(&catalog).is_ok());
    }

    #[test]
    fn retype_keeps_edges_that_still_fit() {
        let catalog = catalog();
        let mut store = GraphStore::default();
        let osc = store.add_node(&catalog, "osc", Position::default()).unwrap();
        let gain = store.add_node(&catalog, "gain", Position::default()).unwrap();
        store.link(&catalog, out(osc, 0), out(gain, 0));
        store.link(&catalog, out(osc, 0), out(gain, 1));
        store.drain_events();

        store
            .update_node(&catalog, gain, NodeUpdate::retyped("speaker"))
            .unwrap();

        assert_eq!(store.edges(), &[Edge::new(out(osc, 0), out(gain, 0))]);
        assert_eq!(
            store.drain_events(),
            vec![
                GraphEvent::EdgeRemoved(Edge::new(out(osc, 0), out(gain, 1))),
                GraphEvent::NodeTypeChanged(gain),
            ]
        );
    }

    #[test]
    fn retype_to_unknown_type_changes_nothing() {
        let catalog = catalog();
        let mut store = GraphStore::default();
        let osc = store.add_node(&catalog, "osc", Position::default()).unwrap();
        let spk = store.add_node(&catalog, "speaker", Position::default()).unwrap();
        store.link(&catalog, out(osc, 0), out(spk, 0));
        store.drain_events();

        let mut update = NodeUpdate::retyped("reverb");
        update.x = Some(100.0);
        let err = store.update_node(&catalog, spk, update).unwrap_err();

        assert!(matches!(err, GraphError::UnknownType { .. }));
        let node = store.node(spk).unwrap();
        assert_eq!((node.type_name.as_str(), node.x), ("speaker", 0.0));
        assert_eq!(store.edge_count(), 1);
        assert!(store.pending_events().is_empty());
    }

    #[test]
    fn validate_ports_reports_mismatched_hydrated_edge() {
        let catalog = catalog();
        let mut source = GraphStore::default();
        let clock = source.add_node(&catalog, "clock", Position::default()).unwrap();
        let spk = source.add_node(&catalog, "speaker", Position::default()).unwrap();
        let mut document = source.to_document();
        let edge = Edge::new(out(clock, 0), out(spk, 0));
        document.edges.push(edge);

        let mut store = GraphStore::default();
        store.hydrate(document).unwrap();

        assert!(store.validate().is_ok());
        assert!(matches!(
            store.validate_ports(&catalog),
            Err(GraphError::InvalidEdge { edge: found, .. }) if found == edge
        ));
    }

    #[test]
    fn set_state_emits_key() {
        let catalog = catalog();
        let mut store = GraphStore::default();
        let id = store.add_node(&catalog, "osc", Position::default()).unwrap();
        store.drain_events();

        let previous = store.set_state(id, "frequency", 220).unwrap();
        assert_eq!(previous, Some(json!(440)));
        assert_eq!(
            store.drain_events(),
            vec![GraphEvent::StateChanged {
                node: id,
                key: "frequency".to_string()
            }]
        );
    }

    #[test]
    fn hydrate_reseeds_ids_and_emits_events() {
        let catalog = catalog();
        let mut source = GraphStore::default();
        let osc = source.add_node(&catalog, "osc", Position::default()).unwrap();
        let spk = source.add_node(&catalog, "speaker", Position::default()).unwrap();
        source.link(&catalog, out(osc, 0), out(spk, 0));
        let doc = source.to_document();

        let mut store = GraphStore::default();
        store.add_node(&catalog, "gain", Position::default()).unwrap();
        store.drain_events();
        store.hydrate(doc).unwrap();

        let events = store.drain_events();
        assert_eq!(events[0], GraphEvent::NodeRemoved(NodeId(0)));
        assert_eq!(events.iter().filter(|e| matches!(e, GraphEvent::NodeAdded(_))).count(), 2);
        assert!(matches!(events.last(), Some(GraphEvent::EdgeAdded(_))));
        assert_eq!(store.next_id(), NodeId(2));
    }

    #[test]
    fn hydrate_rejects_dangling_edges() {
        let doc = GraphDocument {
            nodes: BTreeMap::new(),
            edges: vec![Edge::new(out(NodeId(0), 0), out(NodeId(1), 0))],
        };
        let mut store = GraphStore::default();
        assert!(matches!(store.hydrate(doc), Err(GraphError::DanglingEdge(_))));
        assert!(store.pending_events().is_empty());
    }
}
