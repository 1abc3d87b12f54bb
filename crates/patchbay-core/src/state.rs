//! Live per-instance node state.
//!
//! [`SharedState`] is a single-threaded handle to a JSON object. The graph
//! store owns the instance that holds it, and the synchronizer hands a clone
//! of the same handle to the node's constructor, so a runtime unit observes
//! every later state change without being rebuilt.
//!
//! Cloning a `SharedState` clones the handle. Use
//! [`detached()`](SharedState::detached) for an independent copy.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Shared, mutable JSON object state of one node instance.
#[derive(Debug, Clone, Default)]
pub struct SharedState(Rc<RefCell<Map<String, Value>>>);

impl SharedState {
    /// Wraps an owned object.
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(Rc::new(RefCell::new(map)))
    }

    /// Returns a clone of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    /// Returns the value under `key` as a number.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.borrow().get(key).and_then(Value::as_f64)
    }

    /// Returns the value under `key` as a string.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.0
            .borrow()
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_owned)
    }

    /// Returns true if `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value.into())
    }

    /// Runs `f` with read access to the underlying object.
    pub fn with<R>(&self, f: impl FnOnce(&Map<String, Value>) -> R) -> R {
        f(&self.0.borrow())
    }

    /// Returns an owned copy of the current contents.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.0.borrow().clone()
    }

    /// Returns an independent handle holding a copy of the current contents.
    pub fn detached(&self) -> Self {
        Self::from_map(self.snapshot())
    }

    /// Returns true if both handles point at the same state object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for SharedState {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *self.0.borrow() == *other.0.borrow()
    }
}

impl From<Map<String, Value>> for SharedState {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_map(map)
    }
}

impl Serialize for SharedState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.borrow().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SharedState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::deserialize(deserializer).map(Self::from_map)
    }
}
