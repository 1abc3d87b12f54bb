//! Graph model, type catalog, host boundary and layout engine for patchbay.
//!
//! This crate holds the declarative half of the editor: a [`GraphStore`] of
//! typed node instances joined by kind-checked edges, the [`TypeCatalog`]
//! that defines what each node type is, and the [`Host`] trait through which
//! runtime units are built in a processing context.
//!
//! # Architecture
//!
//! ```text
//! TypeCatalog ──resolve──▶ GraphStore ──GraphEvent──▶ (patchbay-sync)
//!                              │                          │
//!                          layout::splice             Host trait
//!                          layout::resolve_overlaps       │
//!                                                     MemoryHost
//! ```
//!
//! The store never touches the host. Every mutation queues fine-grained
//! [`GraphEvent`]s which the synchronizer in `patchbay-sync` drains.
//!
//! # Example
//!
//! ```rust
//! use patchbay_core::{
//!     Dimensions, GraphStore, NodeTypeDef, PortDef, PortRef, PortSet, Position, RuntimeUnit,
//!     TypeCatalog,
//! };
//!
//! let mut catalog = TypeCatalog::new();
//! catalog.register_type(
//!     "osc",
//!     NodeTypeDef::new(
//!         PortSet::new(vec![], vec![PortDef::new("out", "audio")]),
//!         Dimensions::new(80.0, 60.0),
//!         |_| Ok(RuntimeUnit::new()),
//!     ),
//! );
//! catalog.register_type(
//!     "speaker",
//!     NodeTypeDef::new(
//!         PortSet::new(vec![PortDef::new("in", "audio")], vec![]),
//!         Dimensions::new(80.0, 60.0),
//!         |_| Ok(RuntimeUnit::new()),
//!     ),
//! );
//!
//! let mut store = GraphStore::default();
//! let osc = store.add_node(&catalog, "osc", Position::new(0.0, 0.0)).unwrap();
//! let spk = store.add_node(&catalog, "speaker", Position::new(320.0, 0.0)).unwrap();
//! assert!(store.link(&catalog, PortRef::new(osc, 0), PortRef::new(spk, 0)).is_linked());
//! assert_eq!(store.drain_events().len(), 3);
//! ```

pub mod catalog;
pub mod document;
pub mod edge;
pub mod error;
pub mod geometry;
pub mod host;
pub mod layout;
pub mod node;
pub mod port;
pub mod state;
pub mod store;
pub mod unit;

pub use catalog::{CODE_KEY, ConstructContext, Constructor, NodeTypeDef, TypeCatalog};
pub use document::GraphDocument;
pub use edge::Edge;
pub use error::{ConstructError, GraphError, HostError};
pub use geometry::{Dimensions, DimensionsUpdate, Position};
pub use host::{
    Host, HostId, HostNodeId, InputPort, LoadStatus, LoadTicket, MemoryHost, MemoryNode,
    ParamRef, SignalInput, SignalOutput, SourceEvaluator,
};
pub use layout::{LayoutParams, SpliceOutcome, SpliceRejection};
pub use node::{IdAllocator, NodeId, NodeInstance, NodeUpdate};
pub use port::{PortDef, PortDirection, PortRef, PortSet};
pub use state::SharedState;
pub use store::{GraphEvent, GraphStore, LinkOutcome};
pub use unit::{DescribeHook, RuntimeUnit, StateHook};
