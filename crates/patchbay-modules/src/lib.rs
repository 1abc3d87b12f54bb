//! Hot-reloadable module registry for patchbay.
//!
//! Code-backed node types run user-authored source that the execution host
//! compiles and registers under a processor identity. Hosts accept each
//! identity exactly once per session, so this crate versions source by
//! content and hands the host a fresh identity for every edit.
//!
//! # Features
//!
//! - **Registry**: [`ModuleRegistry`] stores source per logical name and
//!   issues `{name}_v{version}` identities
//! - **Loader**: [`ModuleLoader`] loads each `(host, url)` pair at most once
//! - **Error cleanup**: [`clean_host_error`] strips host-internal prefixes
//!
//! # Example
//!
//! ```rust
//! use patchbay_core::MemoryHost;
//! use patchbay_modules::{LoadState, ModuleLoader, ModuleRegistry};
//!
//! let mut registry = ModuleRegistry::new();
//! let mut loader = ModuleLoader::new();
//! let mut host = MemoryHost::new();
//!
//! registry.write("node-0", "process() {}");
//! let module = registry.resolve("node-0").unwrap();
//! assert_eq!(module.identity, "node-0_v1");
//!
//! let source = registry.read("node-0").unwrap();
//! assert!(loader.request(&mut host, &module, source).is_pending());
//! host.complete_loads();
//! assert_eq!(loader.poll(&mut host, &module.source_url), Some(LoadState::Loaded));
//! ```

mod error;
mod loader;
mod registry;
mod settings;

pub use error::{ModuleError, clean_host_error};
pub use loader::{LoadState, ModuleLoader};
pub use registry::{
    ModuleRegistry, ResolvedModule, SourceDigest, WriteOutcome, registration_identity,
    source_digest,
};
pub use settings::{DEFAULT_STRIP_PREFIXES, DEFAULT_URL_PREFIX, ModuleSettings};
