//! Property-based tests for the graph store and layout engine.
//!
//! Tests delete cascading, link idempotence, kind checking across retypes,
//! grid snapping and splice spacing using proptest for randomized graphs.

use proptest::prelude::*;
use patchbay_core::layout::{self, snap, snap_up};
use patchbay_core::{
    Dimensions, GraphEvent, GraphStore, LayoutParams, LinkOutcome, NodeId, NodeTypeDef,
    NodeUpdate, PortDef, PortDirection, PortRef, PortSet, Position, RuntimeUnit, SpliceOutcome,
    TypeCatalog,
};

const TYPES: [&str; 4] = ["osc", "filter", "mixer", "clock"];

fn catalog() -> TypeCatalog {
    let def = |inputs: Vec<PortDef>, outputs: Vec<PortDef>| {
        NodeTypeDef::new(
            PortSet::new(inputs, outputs),
            Dimensions::new(80.0, 60.0),
            |_| Ok(RuntimeUnit::new()),
        )
    };
    let mut catalog = TypeCatalog::new();
    catalog.register_type("osc", def(vec![], vec![PortDef::new("out", "audio")]));
    catalog.register_type(
        "filter",
        def(
            vec![PortDef::new("in", "audio"), PortDef::new("cutoff", "audio")],
            vec![PortDef::new("out", "audio")],
        ),
    );
    catalog.register_type(
        "mixer",
        def(
            vec![
                PortDef::new("a", "audio"),
                PortDef::new("b", "audio"),
                PortDef::new("clock", "trigger"),
            ],
            vec![PortDef::new("out", "audio"), PortDef::new("tick", "trigger")],
        ),
    );
    catalog.register_type("clock", def(vec![], vec![PortDef::new("tick", "trigger")]));
    catalog
}

/// Builds a store from type indices and attempted links.
fn build(
    catalog: &TypeCatalog,
    types: &[usize],
    links: &[(usize, usize, usize, usize)],
) -> GraphStore {
    let mut store = GraphStore::default();
    for (i, ty) in types.iter().enumerate() {
        store
            .add_node(catalog, TYPES[*ty % TYPES.len()], Position::new(i as f32 * 100.0, 0.0))
            .unwrap();
    }
    let n = types.len() as u32;
    for &(from, out_port, to, in_port) in links {
        store.link(
            catalog,
            PortRef::new(NodeId(from as u32 % n), out_port),
            PortRef::new(NodeId(to as u32 % n), in_port),
        );
    }
    store
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Deleting any node removes exactly the edges touching it, queues their
    /// removals before the node's, and leaves no dangling edge behind.
    #[test]
    fn delete_cascades_completely(
        types in prop::collection::vec(0usize..4, 1..8),
        links in prop::collection::vec((0usize..8, 0usize..2, 0usize..8, 0usize..3), 0..20),
        victim in 0usize..8,
    ) {
        let catalog = catalog();
        let mut store = build(&catalog, &types, &links);
        let victim = NodeId((victim % types.len()) as u32);
        let touching = store.edges().iter().filter(|e| e.touches(victim)).count();
        let before = store.edge_count();
        store.drain_events();

        store.delete_node(victim).unwrap();

        prop_assert!(store.validate().is_ok());
        prop_assert!(store.edges().iter().all(|e| !e.touches(victim)));
        prop_assert_eq!(store.edge_count(), before - touching);
        let events = store.drain_events();
        prop_assert_eq!(events.len(), touching + 1);
        prop_assert_eq!(events.last(), Some(&GraphEvent::NodeRemoved(victim)));
    }

    /// Every stored edge joins ports of equal kind, and no pair appears twice.
    #[test]
    fn stored_edges_are_kind_checked_and_unique(
        types in prop::collection::vec(0usize..4, 1..8),
        links in prop::collection::vec((0usize..8, 0usize..2, 0usize..8, 0usize..3), 0..30),
    ) {
        let catalog = catalog();
        let store = build(&catalog, &types, &links);
        for (i, edge) in store.edges().iter().enumerate() {
            let out_kind = store.port_kind(&catalog, edge.output, PortDirection::Output).unwrap();
            let in_kind = store.port_kind(&catalog, edge.input, PortDirection::Input).unwrap();
            prop_assert_eq!(out_kind, in_kind);
            prop_assert!(!store.edges()[i + 1..].contains(edge));
        }
    }

    /// Retyping any node keeps every stored edge valid. Edges that survive
    /// were already present, and each dropped edge is queued for removal
    /// ahead of the type change.
    #[test]
    fn retype_keeps_edges_kind_checked(
        types in prop::collection::vec(0usize..4, 1..8),
        links in prop::collection::vec((0usize..8, 0usize..2, 0usize..8, 0usize..3), 0..30),
        target in 0usize..8,
        new_type in 0usize..4,
    ) {
        let catalog = catalog();
        let mut store = build(&catalog, &types, &links);
        let target = NodeId((target % types.len()) as u32);
        let before = store.edges().to_vec();
        let retyped = store.node(target).unwrap().type_name != TYPES[new_type];
        store.drain_events();

        store.update_node(&catalog, target, NodeUpdate::retyped(TYPES[new_type])).unwrap();

        prop_assert!(store.validate_ports(&catalog).is_ok());
        for edge in store.edges() {
            let out_kind = store.port_kind(&catalog, edge.output, PortDirection::Output).unwrap();
            let in_kind = store.port_kind(&catalog, edge.input, PortDirection::Input).unwrap();
            prop_assert_eq!(out_kind, in_kind);
            prop_assert!(before.contains(edge));
        }

        let events = store.drain_events();
        let dropped = before.len() - store.edge_count();
        if retyped {
            prop_assert_eq!(events.len(), dropped + 1);
            prop_assert_eq!(events.last(), Some(&GraphEvent::NodeTypeChanged(target)));
            for event in &events[..dropped] {
                let GraphEvent::EdgeRemoved(edge) = event else {
                    return Err(TestCaseError::fail("expected edge removal"));
                };
                prop_assert!(edge.touches(target));
            }
        } else {
            prop_assert!(events.is_empty());
            prop_assert_eq!(dropped, 0);
        }
    }

    /// Linking an existing edge again never changes the store.
    #[test]
    fn relinking_is_a_no_op(
        types in prop::collection::vec(0usize..4, 2..8),
        links in prop::collection::vec((0usize..8, 0usize..2, 0usize..8, 0usize..3), 1..20),
    ) {
        let catalog = catalog();
        let mut store = build(&catalog, &types, &links);
        let edges = store.edges().to_vec();
        store.drain_events();
        for edge in &edges {
            prop_assert_eq!(store.link(&catalog, edge.output, edge.input), LinkOutcome::Duplicate);
        }
        prop_assert_eq!(store.edges(), edges.as_slice());
        prop_assert!(store.pending_events().is_empty());
    }

    /// Snapped coordinates are grid multiples within half a grid unit;
    /// snapping up never lands below the input.
    #[test]
    fn snapping_stays_on_grid(value in -5000.0f32..5000.0f32, grid in 1u8..50) {
        let grid = f32::from(grid);
        let snapped = snap(value, grid);
        prop_assert!((snapped - value).abs() <= grid / 2.0 + 1e-3);
        prop_assert!(((snapped / grid).round() * grid - snapped).abs() < 1e-3);

        let up = snap_up(value, grid);
        prop_assert!(up + 1e-3 >= value);
        prop_assert!(up - value < grid + 1e-3);
    }

    /// After a splice, the inserted node is at least `min_gap` from its
    /// successor, no chain member overlaps the next, and the upstream node
    /// has not moved.
    #[test]
    fn splice_leaves_minimum_gap_downstream(
        gaps in prop::collection::vec(0u16..40, 2..6),
    ) {
        let catalog = catalog();
        let params = LayoutParams::default();
        let mut store = GraphStore::default();
        let mut x = 0.0;
        let mut ids = Vec::new();
        for (i, gap) in gaps.iter().enumerate() {
            let ty = if i == 0 { "osc" } else { "filter" };
            ids.push(store.add_node(&catalog, ty, Position::new(x, 0.0)).unwrap());
            x += 80.0 + f32::from(*gap) * 10.0;
        }
        for pair in ids.windows(2) {
            prop_assert!(store.link(&catalog, PortRef::new(pair[0], 0), PortRef::new(pair[1], 0)).is_linked());
        }
        let edge = store.find_edge(ids[0], ids[1]).unwrap();

        let outcome = layout::splice(&mut store, &catalog, edge, "filter", &params).unwrap();
        let SpliceOutcome::Inserted { node, .. } = outcome else {
            return Err(TestCaseError::fail("splice rejected"));
        };

        prop_assert_eq!(store.node(ids[0]).unwrap().x, 0.0);
        let mut current = node;
        for next in &ids[1..] {
            let left = store.node(current).unwrap().right();
            prop_assert!(store.node(*next).unwrap().x + 1e-3 >= left, "chain overlaps after splice");
            current = *next;
        }
        let inserted = store.node(node).unwrap();
        prop_assert!(store.node(ids[1]).unwrap().x + 1e-3 >= inserted.right() + params.min_gap);
        prop_assert_eq!(store.node_count(), ids.len() + 1);
        prop_assert_eq!(store.edge_count(), ids.len());
    }
}
