//! Module registry and loader settings.

use serde::{Deserialize, Serialize};

/// Default URL prefix under which module sources are published to the host.
pub const DEFAULT_URL_PREFIX: &str = "memory://modules/";

/// Host message prefixes stripped from registration errors by default.
pub const DEFAULT_STRIP_PREFIXES: [&str; 5] = [
    "Uncaught ",
    "DOMException: ",
    "NotSupportedError: ",
    "AbortError: ",
    "Error: ",
];

/// Settings shared by [`ModuleRegistry`](crate::ModuleRegistry) and
/// [`ModuleLoader`](crate::ModuleLoader).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleSettings {
    /// Prefix prepended to registration identities to form source URLs.
    pub url_prefix: String,
    /// Prefixes removed from host error messages before they are shown.
    pub strip_error_prefixes: Vec<String>,
}

impl Default for ModuleSettings {
    fn default() -> Self {
        Self {
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
            strip_error_prefixes: DEFAULT_STRIP_PREFIXES
                .iter()
                .map(|prefix| (*prefix).to_string())
                .collect(),
        }
    }
}
