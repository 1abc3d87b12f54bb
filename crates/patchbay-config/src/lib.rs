//! Configuration for patchbay.
//!
//! Loads `patchbay.toml`, which tunes the layout engine, the module
//! registry, and logging. Every section and field is optional.
//!
//! ```toml
//! [layout]
//! grid = 10.0
//! min_gap = 30.0
//!
//! [modules]
//! url_prefix = "memory://modules/"
//! strip_error_prefixes = ["Uncaught ", "DOMException: ", "NotSupportedError: ", "AbortError: ", "Error: "]
//!
//! [logging]
//! filter = "info"
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use patchbay_config::{PatchbayConfig, paths};
//!
//! let config = PatchbayConfig::load_or_default(paths::default_config_path()).unwrap();
//! println!("grid unit: {}", config.layout.grid);
//! ```

mod config;
mod error;

/// Platform-specific configuration paths.
pub mod paths;

pub use config::{DEFAULT_LOG_FILTER, LoggingConfig, PatchbayConfig};
pub use error::ConfigError;
