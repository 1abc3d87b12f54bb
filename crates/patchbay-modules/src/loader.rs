//! Per-host module load cache.
//!
//! Each `(host, url)` pair is loaded at most once, no matter how many nodes
//! ask for it or whether earlier requests are still in flight. Failed loads
//! stay cached as failures; since a URL embeds the registration identity, a
//! source edit produces a new URL and therefore a fresh load.

use std::collections::HashMap;

use patchbay_core::{Host, HostId, LoadStatus, LoadTicket};

use crate::error::{ModuleError, clean_host_error};
use crate::registry::ResolvedModule;
use crate::settings::ModuleSettings;

/// State of one cached load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Waiting for the host to settle the ticket.
    InFlight(LoadTicket),
    /// Loaded and registered.
    Loaded,
    /// Failed; carries the cleaned host message.
    Failed(String),
}

impl LoadState {
    /// Returns true while the host has not settled the load.
    pub fn is_pending(&self) -> bool {
        matches!(self, LoadState::InFlight(_))
    }

    /// Converts a settled failure into a [`ModuleError`] for `module`.
    pub fn into_result(self, module: &ResolvedModule) -> Option<Result<(), ModuleError>> {
        match self {
            LoadState::InFlight(_) => None,
            LoadState::Loaded => Some(Ok(())),
            LoadState::Failed(message) => {
                Some(Err(ModuleError::load_failed(&module.identity, message)))
            }
        }
    }
}

/// Load cache keyed by host and source URL.
#[derive(Debug, Clone, Default)]
pub struct ModuleLoader {
    loads: HashMap<(HostId, String), LoadState>,
    strip_prefixes: Vec<String>,
}

impl ModuleLoader {
    /// Creates a loader with the default error prefixes.
    pub fn new() -> Self {
        Self::with_settings(&ModuleSettings::default())
    }

    /// Creates a loader stripping the error prefixes from `settings`.
    pub fn with_settings(settings: &ModuleSettings) -> Self {
        Self {
            loads: HashMap::new(),
            strip_prefixes: settings.strip_error_prefixes.clone(),
        }
    }

    /// Requests `module` on `host`, starting a load only if this host has
    /// never been asked for the module's URL.
    pub fn request(&mut self, host: &mut dyn Host, module: &ResolvedModule, source: &str) -> LoadState {
        let key = (host.host_id(), module.source_url.clone());
        if let Some(state) = self.loads.get(&key) {
            tracing::trace!(url = %module.source_url, ?state, "module load cached");
            return state.clone();
        }

        let ticket = host.begin_module_load(&module.source_url, &module.identity, source);
        tracing::debug!(url = %module.source_url, identity = %module.identity, "module load started");
        let state = LoadState::InFlight(ticket);
        self.loads.insert(key, state.clone());
        state
    }

    /// Polls the host for the load of `url`, updating the cache once it settles.
    ///
    /// Returns `None` if `url` was never requested on this host.
    pub fn poll(&mut self, host: &mut dyn Host, url: &str) -> Option<LoadState> {
        let key = (host.host_id(), url.to_string());
        let state = self.loads.get_mut(&key)?;
        if let LoadState::InFlight(ticket) = *state {
            match host.poll_module_load(ticket) {
                LoadStatus::Pending => {}
                LoadStatus::Loaded => {
                    tracing::debug!(url, "module loaded");
                    *state = LoadState::Loaded;
                }
                LoadStatus::Failed(raw) => {
                    let message = clean_host_error(&raw, &self.strip_prefixes);
                    tracing::warn!(url, error = %message, "module load failed");
                    *state = LoadState::Failed(message);
                }
            }
        }
        Some(state.clone())
    }

    /// Returns the cached state of `url` on `host` without polling.
    pub fn state(&self, host: HostId, url: &str) -> Option<&LoadState> {
        self.loads.get(&(host, url.to_string()))
    }

    /// Drops every cached load for `host`. Returns how many were dropped.
    pub fn forget_host(&mut self, host: HostId) -> usize {
        let before = self.loads.len();
        self.loads.retain(|(id, _), _| *id != host);
        before - self.loads.len()
    }

    /// Returns the number of loads still in flight across all hosts.
    pub fn in_flight(&self) -> usize {
        self.loads.values().filter(|state| state.is_pending()).count()
    }
}
