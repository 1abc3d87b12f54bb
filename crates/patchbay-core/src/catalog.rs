//! Type catalog: node type definitions looked up by name.
//!
//! The catalog maps a type name to a [`NodeTypeDef`] holding the type's
//! ports, default state, default footprint, and constructor. It is supplied
//! by the embedding application; the core never invents definitions. The
//! only mutation the editor performs is "save as new type", exposed as
//! [`register_type()`](TypeCatalog::register_type) and
//! [`derive_type()`](TypeCatalog::derive_type) with last-write-wins semantics.
//!
//! # Example
//!
//! ```rust
//! use patchbay_core::{
//!     Dimensions, InputPort, NodeTypeDef, PortDef, PortSet, RuntimeUnit, SignalInput,
//!     TypeCatalog,
//! };
//!
//! let mut catalog = TypeCatalog::new();
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
//! assert!(catalog.get("speaker").is_some());
//! assert!(catalog.resolve("subwoofer").is_err());
//! ```

use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::{ConstructError, GraphError};
use crate::geometry::Dimensions;
use crate::host::Host;
use crate::node::NodeId;
use crate::port::{PortDirection, PortSet};
use crate::state::SharedState;
use crate::unit::RuntimeUnit;

/// State key whose presence in a type's default state marks it code-backed.
pub const CODE_KEY: &str = "code";

/// Builds a runtime unit for one node instance.
pub type Constructor = Rc<dyn Fn(&mut ConstructContext<'_>) -> Result<RuntimeUnit, ConstructError>>;

/// Everything a constructor may use while building a unit.
pub struct ConstructContext<'a> {
    node: NodeId,
    state: SharedState,
    host: &'a mut dyn Host,
    registration: Option<&'a str>,
}

impl<'a> ConstructContext<'a> {
    /// Creates a context. `registration` is the current registration
    /// identity for code-backed nodes.
    pub fn new(
        node: NodeId,
        state: SharedState,
        host: &'a mut dyn Host,
        registration: Option<&'a str>,
    ) -> Self {
        Self {
            node,
            state,
            host,
            registration,
        }
    }

    /// The node instance being constructed.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The live state of the instance (a shared handle, not a snapshot).
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// The execution host.
    pub fn host(&mut self) -> &mut (dyn Host + 'a) {
        &mut *self.host
    }

    /// The registration identity of the node's compiled module.
    pub fn registration(&self) -> Result<&'a str, ConstructError> {
        self.registration.ok_or(ConstructError::MissingRegistration)
    }

    /// Reads a numeric state field, falling back to `default` when absent.
    ///
    /// A present but non-numeric value is an error.
    pub fn number(&self, key: &str, default: f32) -> Result<f32, ConstructError> {
        match self.state.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_f64()
                .map(|v| v as f32)
                .ok_or_else(|| ConstructError::InvalidState {
                    key: key.to_string(),
                    reason: format!("expected a number, found {value}"),
                }),
        }
    }
}

/// Definition of one node type.
#[derive(Clone)]
pub struct NodeTypeDef {
    /// Input and output ports.
    pub ports: PortSet,
    /// State copied by value into each new instance.
    pub default_state: Option<Map<String, Value>>,
    /// Default footprint of new instances.
    pub dimensions: Dimensions,
    /// Builds the runtime unit.
    pub constructor: Constructor,
}

impl core::fmt::Debug for NodeTypeDef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NodeTypeDef")
            .field("ports", &self.ports)
            .field("default_state", &self.default_state)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl NodeTypeDef {
    /// Creates a definition without default state.
    pub fn new(
        ports: PortSet,
        dimensions: Dimensions,
        constructor: impl Fn(&mut ConstructContext<'_>) -> Result<RuntimeUnit, ConstructError>
        + 'static,
    ) -> Self {
        Self {
            ports,
            default_state: None,
            dimensions,
            constructor: Rc::new(constructor),
        }
    }

    /// Sets the default state.
    pub fn with_default_state(mut self, state: Map<String, Value>) -> Self {
        self.default_state = Some(state);
        self
    }

    /// Returns true if the default state carries a `code` field.
    pub fn is_code_backed(&self) -> bool {
        self.default_state
            .as_ref()
            .is_some_and(|state| state.contains_key(CODE_KEY))
    }

    /// Returns the kind of the first port on the given side.
    pub fn first_port_kind(&self, direction: PortDirection) -> Option<&str> {
        self.ports.first(direction).map(|port| port.kind.as_str())
    }

    /// Returns a fresh copy of the default state.
    pub fn initial_state(&self) -> SharedState {
        SharedState::from_map(self.default_state.clone().unwrap_or_default())
    }

    /// Invokes the constructor.
    pub fn construct(&self, ctx: &mut ConstructContext<'_>) -> Result<RuntimeUnit, ConstructError> {
        (self.constructor)(ctx)
    }
}

/// Name → definition table.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: BTreeMap<String, Rc<NodeTypeDef>>,
}

impl TypeCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks a type up by name.
    pub fn get(&self, name: &str) -> Option<&Rc<NodeTypeDef>> {
        self.types.get(name)
    }

    /// Looks a type up by name, reporting the valid names on failure.
    pub fn resolve(&self, name: &str) -> Result<Rc<NodeTypeDef>, GraphError> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| GraphError::UnknownType {
                name: name.to_string(),
                valid: self.names(),
            })
    }

    /// Registers `def` under `name`, replacing any existing definition.
    ///
    /// Returns the replaced definition.
    pub fn register_type(
        &mut self,
        name: impl Into<String>,
        def: NodeTypeDef,
    ) -> Option<Rc<NodeTypeDef>> {
        let name = name.into();
        let previous = self.types.insert(name.clone(), Rc::new(def));
        if previous.is_some() {
            tracing::info!(type_name = %name, "node type replaced");
        } else {
            tracing::debug!(type_name = %name, "node type registered");
        }
        previous
    }

    /// Saves `state` as the default state of a new type `name` that shares
    /// `base`'s ports, footprint, and constructor.
    pub fn derive_type(
        &mut self,
        name: impl Into<String>,
        base: &str,
        state: Map<String, Value>,
    ) -> Result<Option<Rc<NodeTypeDef>>, GraphError> {
        let def = (*self.resolve(base)?).clone().with_default_state(state);
        Ok(self.register_type(name, def))
    }

    /// Returns all registered type names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    /// Iterates over `(name, definition)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rc<NodeTypeDef>)> {
        self.types.iter().map(|(name, def)| (name.as_str(), def))
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
