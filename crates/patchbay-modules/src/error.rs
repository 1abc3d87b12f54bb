//! Error types for module resolution and loading.

use thiserror::Error;

/// Errors raised by the module registry and loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    /// No source has been written under this logical name.
    #[error("unknown module '{0}'")]
    UnknownModule(String),

    /// The host failed to load or register the module.
    #[error("module '{identity}' failed to load: {message}")]
    LoadFailed {
        /// Registration identity of the failed load.
        identity: String,
        /// Host message with internal prefixes stripped.
        message: String,
    },
}

impl ModuleError {
    /// Create a load failure error.
    pub fn load_failed(identity: impl Into<String>, message: impl Into<String>) -> Self {
        ModuleError::LoadFailed {
            identity: identity.into(),
            message: message.into(),
        }
    }

    /// Returns the user-facing message for a load failure, or the display
    /// text for any other error.
    pub fn user_message(&self) -> String {
        match self {
            ModuleError::LoadFailed { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Strips host-internal prefixes such as `"Uncaught "` or `"DOMException: "`
/// from a host error message.
///
/// Prefixes are removed repeatedly, so `"Uncaught Error: boom"` becomes
/// `"boom"`. A message made entirely of prefixes is returned trimmed but
/// otherwise unchanged.
pub fn clean_host_error<S: AsRef<str>>(message: &str, prefixes: &[S]) -> String {
    let mut rest = message.trim();
    loop {
        let stripped = prefixes
            .iter()
            .map(AsRef::as_ref)
            .filter(|prefix| !prefix.is_empty())
            .find_map(|prefix| rest.strip_prefix(prefix));
        match stripped {
            Some(next) => rest = next.trim_start(),
            None => break,
        }
    }
    if rest.is_empty() {
        message.trim().to_string()
    } else {
        rest.to_string()
    }
}
