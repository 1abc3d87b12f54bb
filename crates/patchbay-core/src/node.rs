//! Node identifiers and node instances.
//!
//! A [`NodeInstance`] is one placed, typed unit in the graph document. Its
//! `state` is a [`SharedState`] handle so that constructed runtime units can
//! read it live; see [`crate::state`].

use serde::{Deserialize, Serialize};

use crate::geometry::{Dimensions, DimensionsUpdate, Position};
use crate::state::SharedState;

/// Unique identifier for a node instance within a graph document.
///
/// Node IDs are allocated sequentially by the [`GraphStore`](crate::GraphStore)
/// and never reused within a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic node id allocator owned by the graph store.
///
/// Seeded from the largest existing id on hydration so that ids allocated
/// after a reload never collide with ids already in the document.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    /// Creates an allocator whose first id is `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator whose first id is `max(existing) + 1`.
    pub fn seeded_from(existing: impl IntoIterator<Item = NodeId>) -> Self {
        let next = existing
            .into_iter()
            .map(|id| id.0.saturating_add(1))
            .max()
            .unwrap_or(0);
        Self { next }
    }

    /// Allocates the next id.
    pub fn allocate(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Returns the id the next call to [`allocate()`](Self::allocate) yields.
    pub fn peek(&self) -> NodeId {
        NodeId(self.next)
    }
}

/// A placed node in the graph document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInstance {
    /// Identifier, unique within the document.
    pub id: NodeId,
    /// Name of the node's type in the [`TypeCatalog`](crate::TypeCatalog).
    #[serde(rename = "type")]
    pub type_name: String,
    /// Left edge, in grid-snapped canvas units.
    pub x: f32,
    /// Top edge, in grid-snapped canvas units.
    pub y: f32,
    /// Node footprint on the canvas.
    pub dimensions: Dimensions,
    /// Per-instance state, shared live with the constructed runtime unit.
    #[serde(default)]
    pub state: SharedState,
}

impl NodeInstance {
    /// Returns the node's top-left corner.
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    /// Returns the x coordinate of the node's right edge.
    pub fn right(&self) -> f32 {
        self.x + self.dimensions.width
    }

    /// Returns a copy whose state is detached from this instance's state.
    pub fn detached(&self) -> Self {
        Self {
            state: self.state.detached(),
            ..self.clone()
        }
    }
}

/// Partial update applied by [`GraphStore::update_node`](crate::GraphStore::update_node).
///
/// Position and type are shallow-merged; dimensions are merged field-wise so
/// that width or height can be updated alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeUpdate {
    /// New left edge.
    pub x: Option<f32>,
    /// New top edge.
    pub y: Option<f32>,
    /// New type name.
    pub type_name: Option<String>,
    /// Field-wise dimension update.
    pub dimensions: Option<DimensionsUpdate>,
}

impl NodeUpdate {
    /// An update that moves the node to `position`.
    pub fn moved_to(position: Position) -> Self {
        Self {
            x: Some(position.x),
            y: Some(position.y),
            ..Self::default()
        }
    }

    /// An update that only changes the x coordinate.
    pub fn x(x: f32) -> Self {
        Self {
            x: Some(x),
            ..Self::default()
        }
    }

    /// An update that changes the node's type.
    pub fn retyped(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }

    /// An update that resizes the node.
    pub fn resized(dimensions: DimensionsUpdate) -> Self {
        Self {
            dimensions: Some(dimensions),
            ..Self::default()
        }
    }

    /// Returns true if the update touches position or dimensions.
    pub fn touches_geometry(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.dimensions.is_some()
    }
}
