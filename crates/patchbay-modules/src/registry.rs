//! Content-versioned module source table.
//!
//! Hosts accept each processor identity exactly once per session. The
//! registry lets source change arbitrarily often anyway: every write whose
//! content differs from the stored source bumps the module's version, and the
//! identity handed to the host embeds that version. An identity is therefore
//! never reused with different code.
//!
//! Versions are never recycled, not even after [`remove()`] or when the
//! source returns to an earlier text.
//!
//! [`remove()`]: ModuleRegistry::remove

use std::collections::HashMap;
use std::fmt::Write as _;

use sha2::{Digest, Sha256};

use crate::error::ModuleError;
use crate::settings::ModuleSettings;

/// SHA-256 digest of a module's source text.
pub type SourceDigest = [u8; 32];

/// Result of [`ModuleRegistry::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// First source for this name; carries the new version.
    Created(u32),
    /// Source changed; carries the new version.
    Updated(u32),
    /// Source identical to the stored text; version unchanged.
    Unchanged(u32),
}

impl WriteOutcome {
    /// The version after the write.
    pub fn version(self) -> u32 {
        match self {
            WriteOutcome::Created(v) | WriteOutcome::Updated(v) | WriteOutcome::Unchanged(v) => v,
        }
    }

    /// Returns true if the write produced a new registration identity.
    pub fn is_new_version(self) -> bool {
        !matches!(self, WriteOutcome::Unchanged(_))
    }
}

/// A module reference the host loader can act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    /// Logical module name.
    pub logical_name: String,
    /// Current version.
    pub version: u32,
    /// `{logical_name}_v{version}`.
    pub identity: String,
    /// URL the host loads the source from.
    pub source_url: String,
    /// Hex-encoded SHA-256 of the source.
    pub digest: String,
}

#[derive(Debug, Clone)]
struct ModuleEntry {
    source: String,
    digest: SourceDigest,
    version: u32,
}

/// Logical name → current source and version.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    entries: HashMap<String, ModuleEntry>,
    /// Highest version ever issued per name, kept across removals.
    issued: HashMap<String, u32>,
    url_prefix: String,
}

/// Formats the registration identity for `name` at `version`.
pub fn registration_identity(name: &str, version: u32) -> String {
    format!("{name}_v{version}")
}

/// Computes the SHA-256 digest of `source`.
pub fn source_digest(source: &str) -> SourceDigest {
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&Sha256::digest(source.as_bytes()));
    digest
}

fn hex(digest: &SourceDigest) -> String {
    digest.iter().fold(String::with_capacity(64), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}

impl ModuleRegistry {
    /// Creates an empty registry using the default URL prefix.
    pub fn new() -> Self {
        Self::with_settings(&ModuleSettings::default())
    }

    /// Creates an empty registry using the URL prefix from `settings`.
    pub fn with_settings(settings: &ModuleSettings) -> Self {
        Self {
            entries: HashMap::new(),
            issued: HashMap::new(),
            url_prefix: settings.url_prefix.clone(),
        }
    }

    /// Stores `source` under `name`.
    ///
    /// Identical source is a no-op; anything else issues the next version.
    pub fn write(&mut self, name: &str, source: &str) -> WriteOutcome {
        let digest = source_digest(source);
        if let Some(entry) = self.entries.get(name)
            && entry.digest == digest
            && entry.source == source
        {
            return WriteOutcome::Unchanged(entry.version);
        }

        let issued = self.issued.entry(name.to_string()).or_insert(0);
        *issued += 1;
        let version = *issued;
        let created = self
            .entries
            .insert(
                name.to_string(),
                ModuleEntry {
                    source: source.to_string(),
                    digest,
                    version,
                },
            )
            .is_none();

        tracing::debug!(module = name, version, "module source written");
        if created {
            WriteOutcome::Created(version)
        } else {
            WriteOutcome::Updated(version)
        }
    }

    /// Returns the current source of `name`.
    pub fn read(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|entry| entry.source.as_str())
    }

    /// Returns the current version of `name`.
    pub fn version(&self, name: &str) -> Option<u32> {
        self.entries.get(name).map(|entry| entry.version)
    }

    /// Resolves `name` to its current identity and source URL.
    pub fn resolve(&self, name: &str) -> Result<ResolvedModule, ModuleError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| ModuleError::UnknownModule(name.to_string()))?;
        let identity = registration_identity(name, entry.version);
        Ok(ResolvedModule {
            logical_name: name.to_string(),
            version: entry.version,
            source_url: format!("{}{identity}", self.url_prefix),
            identity,
            digest: hex(&entry.digest),
        })
    }

    /// Drops the source of `name`. Its version counter is retained so a
    /// later write never reissues an old identity.
    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    /// Returns true if `name` has source.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the number of modules with source.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no module has source.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
