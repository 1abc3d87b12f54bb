//! Layout and autoformat engine.
//!
//! Only ever writes node positions through [`GraphStore::move_node`], so
//! layout changes reach the synchronizer through the same event path as any
//! other edit.
//!
//! # Grid snapping
//!
//! Every placement coordinate is rounded to the nearest multiple of the grid
//! unit: on add, drag, resize, and splice.
//!
//! # Edge splice
//!
//! Inserting node `N` into edge `A → B` removes the edge, adds `N`, and links
//! `A → N` and `N → B` through `N`'s first input and first output. Both kinds
//! must match before anything is mutated. `N` is centered in the gap between
//! `A` and `B` when the gap fits `N` plus `min_gap` on both sides, otherwise it
//! is placed `min_gap` after `A`.
//!
//! # Overlap resolution
//!
//! After a splice, the chain downstream of `N` is walked through each node's
//! first outgoing edge. A successor closer than `min_gap` to its predecessor's
//! right edge is pushed right by the deficit; the walk stops at the first
//! sufficient gap, at the end of the chain, or on revisiting a node. Nothing
//! upstream of the insertion point is moved.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{NodeTypeDef, TypeCatalog};
use crate::edge::Edge;
use crate::error::GraphError;
use crate::geometry::Position;
use crate::node::{NodeId, NodeInstance};
use crate::port::{PortDirection, PortRef};
use crate::store::GraphStore;

/// Default grid unit.
pub const DEFAULT_GRID: f32 = 10.0;

/// Default minimum horizontal gap between chained nodes.
pub const DEFAULT_MIN_GAP: f32 = 30.0;

/// Tolerance used when comparing snapped coordinates.
const SNAP_EPSILON: f32 = 1e-3;

/// Layout tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
    /// Grid unit every coordinate is snapped to.
    pub grid: f32,
    /// Minimum horizontal gap between a node and its downstream neighbour.
    pub min_gap: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            grid: DEFAULT_GRID,
            min_gap: DEFAULT_MIN_GAP,
        }
    }
}

/// Rounds `value` to the nearest multiple of `grid`.
///
/// A non-positive grid disables snapping.
#[inline]
pub fn snap(value: f32, grid: f32) -> f32 {
    if grid <= 0.0 {
        return value;
    }
    (value / grid).round() * grid
}

/// Rounds `value` to a multiple of `grid` that is not below it.
#[inline]
pub fn snap_up(value: f32, grid: f32) -> f32 {
    let snapped = snap(value, grid);
    if snapped + SNAP_EPSILON < value {
        snapped + grid
    } else {
        snapped
    }
}

/// Why a splice was refused. No mutation happened.
#[derive(Debug, Clone, PartialEq)]
pub enum SpliceRejection {
    /// The edge is not in the store.
    EdgeNotFound(Edge),
    /// The candidate's first port on `side` does not carry `expected`.
    KindMismatch {
        /// Side of the candidate that failed to match.
        side: PortDirection,
        /// Kind required by the edge.
        expected: String,
        /// Kind of the candidate's first port on that side, if it has one.
        found: Option<String>,
    },
}

/// Result of [`splice()`].
#[derive(Debug, Clone, PartialEq)]
pub enum SpliceOutcome {
    /// The node was inserted.
    Inserted {
        /// The new node.
        node: NodeId,
        /// Downstream nodes moved by overlap resolution, in walk order.
        pushed: Vec<NodeId>,
    },
    /// The splice was refused before any mutation.
    Rejected(SpliceRejection),
}

/// Returns true if `candidate` can be attached to a hovered port.
///
/// A hovered output needs the candidate's first input to share its kind, a
/// hovered input needs the candidate's first output to share it.
pub fn port_accepts_candidate(
    candidate: &NodeTypeDef,
    hovered_kind: &str,
    hovered_direction: PortDirection,
) -> bool {
    candidate.first_port_kind(hovered_direction.opposite()) == Some(hovered_kind)
}

/// Returns true if `candidate` can be spliced into `edge`.
pub fn edge_accepts_candidate(
    store: &GraphStore,
    catalog: &TypeCatalog,
    candidate: &NodeTypeDef,
    edge: &Edge,
) -> bool {
    let Ok(output_kind) = store.port_kind(catalog, edge.output, PortDirection::Output) else {
        return false;
    };
    let Ok(input_kind) = store.port_kind(catalog, edge.input, PortDirection::Input) else {
        return false;
    };
    splice_mismatch(candidate, output_kind, input_kind).is_none()
}

fn splice_mismatch(
    candidate: &NodeTypeDef,
    output_kind: &str,
    input_kind: &str,
) -> Option<SpliceRejection> {
    for (side, expected) in [
        (PortDirection::Input, output_kind),
        (PortDirection::Output, input_kind),
    ] {
        let found = candidate.first_port_kind(side);
        if found != Some(expected) {
            return Some(SpliceRejection::KindMismatch {
                side,
                expected: expected.to_string(),
                found: found.map(str::to_owned),
            });
        }
    }
    None
}

/// Computes where a node of `width` goes when spliced between `a` and `b`.
pub fn splice_position(
    a: &NodeInstance,
    b: &NodeInstance,
    width: f32,
    params: &LayoutParams,
) -> Position {
    let left = a.right();
    let gap = b.x - left;
    let x = if gap >= width + 2.0 * params.min_gap {
        left + (gap - width) / 2.0
    } else {
        left + params.min_gap
    };
    Position::new(snap(x, params.grid), snap(a.y, params.grid))
}

/// Inserts a node of `type_name` into `edge`.
///
/// Returns `Err` for configuration errors (unknown type) and structural
/// invariant violations; kind mismatches and missing edges are reported as
/// [`SpliceOutcome::Rejected`]. If either relink fails, the inserted node is
/// removed, `edge` is restored and [`GraphError::InvalidEdge`] is returned.
pub fn splice(
    store: &mut GraphStore,
    catalog: &TypeCatalog,
    edge: Edge,
    type_name: &str,
    params: &LayoutParams,
) -> Result<SpliceOutcome, GraphError> {
    let candidate = catalog.resolve(type_name)?;
    if !store.contains_edge(&edge) {
        return Ok(SpliceOutcome::Rejected(SpliceRejection::EdgeNotFound(edge)));
    }

    let output_kind = store.port_kind(catalog, edge.output, PortDirection::Output)?;
    let input_kind = store.port_kind(catalog, edge.input, PortDirection::Input)?;
    if let Some(rejection) = splice_mismatch(&candidate, output_kind, input_kind) {
        tracing::debug!("layout_splice: {type_name} into {edge} rejected ({rejection:?})");
        return Ok(SpliceOutcome::Rejected(rejection));
    }

    let a = store
        .node(edge.output.node)
        .ok_or(GraphError::DanglingEdge(edge))?;
    let b = store
        .node(edge.input.node)
        .ok_or(GraphError::DanglingEdge(edge))?;
    let position = splice_position(a, b, candidate.dimensions.width, params);

    store.unlink(edge.output, edge.input);
    let node = store.add_node(catalog, type_name, position)?;
    let upstream = store.link(catalog, edge.output, PortRef::new(node, 0));
    let downstream = store.link(catalog, PortRef::new(node, 0), edge.input);
    if !(upstream.is_linked() && downstream.is_linked()) {
        store.delete_node(node)?;
        store.link(catalog, edge.output, edge.input);
        tracing::debug!(
            "layout_splice: relink through {type_name} failed ({upstream:?}, {downstream:?}), restored {edge}"
        );
        return Err(GraphError::InvalidEdge {
            edge,
            reason: format!("splice through '{type_name}' could not relink ({upstream:?}, {downstream:?})"),
        });
    }

    let pushed = resolve_overlaps(store, node, params)?;
    tracing::debug!(
        "layout_splice: node {node} ({type_name}) into {edge} at ({}, {}), pushed {}",
        position.x,
        position.y,
        pushed.len()
    );
    Ok(SpliceOutcome::Inserted { node, pushed })
}

/// Pushes downstream nodes right until every gap along the chain starting at
/// `start` is at least `min_gap`. Returns the moved nodes in walk order.
pub fn resolve_overlaps(
    store: &mut GraphStore,
    start: NodeId,
    params: &LayoutParams,
) -> Result<Vec<NodeId>, GraphError> {
    let mut visited = HashSet::from([start]);
    let mut pushed = Vec::new();
    let mut current = start;

    loop {
        let Some(node) = store.node(current) else {
            break;
        };
        let required = node.right() + params.min_gap;
        let Some(next_id) = store.outgoing(current).next().map(|edge| edge.input.node) else {
            break;
        };
        if !visited.insert(next_id) {
            break;
        }
        let Some(next) = store.node(next_id) else {
            break;
        };
        if next.x + SNAP_EPSILON >= required {
            break;
        }

        let deficit = required - next.x;
        let target = Position::new(snap_up(next.x + deficit, params.grid), next.y);
        store.move_node(next_id, target)?;
        pushed.push(next_id);
        current = next_id;
    }

    Ok(pushed)
}
