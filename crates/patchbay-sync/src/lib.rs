//! Graph synchronization for patchbay.
//!
//! The [`Synchronizer`] drains [`GraphEvent`](patchbay_core::GraphEvent)s
//! from a [`GraphStore`](patchbay_core::GraphStore) and applies the minimal
//! set of construct, connect, disconnect, and teardown calls to a
//! [`Host`](patchbay_core::Host). A slider move never rebuilds a unit; a type
//! change or code edit rebuilds only the affected node.
//!
//! ## Architecture
//!
//! ```text
//! GraphStore ──drain_events──▶ Synchronizer ──▶ Host
//!                                 │    ▲
//!                    write/resolve│    │poll
//!                                 ▼    │
//!                       ModuleRegistry / ModuleLoader
//! ```
//!
//! ## Additive-value rule
//!
//! Signals into control parameters are summed with the parameter's own
//! value. The synchronizer zeroes a parameter when its first connection is
//! made and restores the saved value after its last connection goes away.
//!
//! # Example
//!
//! ```rust
//! use patchbay_core::{
//!     Dimensions, GraphStore, Host, InputPort, MemoryHost, NodeTypeDef, PortDef, PortRef,
//!     PortSet, Position, RuntimeUnit, SignalInput, SignalOutput, TypeCatalog,
//! };
//! use patchbay_sync::{NodePhase, Synchronizer};
//!
//! let mut catalog = TypeCatalog::new();
//! catalog.register_type(
//!     "osc",
//!     NodeTypeDef::new(
//!         PortSet::new(vec![], vec![PortDef::new("out", "audio")]),
//!         Dimensions::new(80.0, 60.0),
//!         |ctx| {
//!             let node = ctx.host().create_node("oscillator", &[("frequency", 440.0)])?;
//!             ctx.host().start(node)?;
//!             Ok(RuntimeUnit::new().with_output("out", SignalOutput::new(node, 0)).owning(node))
//!         },
//!     ),
//! );
//! catalog.register_type(
//!     "speaker",
//!     NodeTypeDef::new(
//!         PortSet::new(vec![PortDef::new("in", "audio")], vec![]),
//!         Dimensions::new(80.0, 60.0),
//!         |ctx| {
//!             let node = ctx.host().create_node("destination", &[])?;
//!             Ok(RuntimeUnit::new()
//!                 .with_input("in", InputPort::Signal(SignalInput::new(node, 0)))
//!                 .owning(node))
//!         },
//!     ),
//! );
//!
//! let mut store = GraphStore::default();
//! let mut host = MemoryHost::new();
//! let mut sync = Synchronizer::new();
//!
//! let osc = store.add_node(&catalog, "osc", Position::new(0.0, 0.0)).unwrap();
//! let spk = store.add_node(&catalog, "speaker", Position::new(320.0, 0.0)).unwrap();
//! store.link(&catalog, PortRef::new(osc, 0), PortRef::new(spk, 0));
//!
//! let report = sync.sync(&mut store, &catalog, &mut host);
//! assert_eq!(report.constructed, 2);
//! assert_eq!(report.connected, 1);
//! assert_eq!(sync.phase(osc), NodePhase::Constructed);
//! ```

mod error;
mod hold;
mod synchronizer;

pub use error::NodeError;
pub use synchronizer::{NodePhase, SyncReport, Synchronizer, module_name};
