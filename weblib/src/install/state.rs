//! Installed-file state.
//!
//! A side record mapping each installed destination file to the manifest
//! entry that owns it, persisted next to the manifest. Diffing the previous
//! generation against the new one after a restore is what drives orphan
//! cleanup: files owned by the prior state but absent from the new one are
//! deleted, unless another still-present entry claims them.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::host::HostInteraction;

/// File name of the persisted state, relative to the project root.
pub const STATE_FILE_NAME: &str = ".weblib-state.json";

/// Current state schema version.
const STATE_SCHEMA_VERSION: &str = "1.0";

/// Mapping from installed destination file to owning entry key.
///
/// Keys are project-relative forward-slash paths; values are
/// [`ManifestEntry::key`](crate::manifest::ManifestEntry::key) strings. The
/// map is sorted so saved state is canonical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledState {
    #[serde(default = "default_schema_version")]
    version: String,

    #[serde(default)]
    files: BTreeMap<String, String>,
}

fn default_schema_version() -> String {
    STATE_SCHEMA_VERSION.to_string()
}

impl Default for InstalledState {
    fn default() -> Self {
        Self::new()
    }
}

impl InstalledState {
    /// Create an empty state record.
    pub fn new() -> Self {
        Self {
            version: STATE_SCHEMA_VERSION.to_string(),
            files: BTreeMap::new(),
        }
    }

    /// Load the persisted state through the host.
    ///
    /// A missing or unreadable state file degrades to an empty state (a
    /// first install) rather than failing the restore.
    pub async fn load(host: &dyn HostInteraction) -> Self {
        let path = Path::new(STATE_FILE_NAME);
        match host.read_file(path).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(state) => state,
                Err(e) => {
                    warn!(error = %e, "installed-file state is corrupt, starting fresh");
                    Self::new()
                }
            },
            Ok(None) => Self::new(),
            Err(e) => {
                warn!(error = %e, "could not read installed-file state, starting fresh");
                Self::new()
            }
        }
    }

    /// Persist the state through the host.
    pub async fn save(&self, host: &dyn HostInteraction) -> io::Result<()> {
        let mut bytes = serde_json::to_vec_pretty(self).map_err(io::Error::other)?;
        bytes.push(b'\n');
        host.write_file(Path::new(STATE_FILE_NAME), &bytes).await
    }

    /// Record `owner` as owning `path`. A later record for the same path
    /// replaces the owner, matching last-declared-entry-wins on disk.
    pub fn record(&mut self, path: String, owner: String) {
        self.files.insert(path, owner);
    }

    /// The entry key owning a path, if any.
    pub fn owner(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Whether any entry owns the path.
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// All files owned by an entry key.
    pub fn files_owned_by(&self, owner: &str) -> Vec<String> {
        self.files
            .iter()
            .filter(|(_, key)| key.as_str() == owner)
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Remove a file record, returning its former owner.
    pub fn remove(&mut self, path: &str) -> Option<String> {
        self.files.remove(path)
    }

    /// Files present in `self` but absent from `next` — the orphans a
    /// cleanup pass should delete.
    pub fn orphans_against(&self, next: &InstalledState) -> Vec<String> {
        self.files
            .keys()
            .filter(|path| !next.contains(path))
            .cloned()
            .collect()
    }

    /// Iterate over `(path, owner)` records.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, o)| (p.as_str(), o.as_str()))
    }

    /// Number of tracked files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no files are tracked.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::DefaultHostInteraction;

    #[test]
    fn test_orphans_against_next_generation() {
        let mut prev = InstalledState::new();
        prev.record("lib/a.js".to_string(), "cdn:a:lib".to_string());
        prev.record("lib/b.js".to_string(), "cdn:a:lib".to_string());

        let mut next = InstalledState::new();
        next.record("lib/a.js".to_string(), "cdn:a:lib".to_string());

        assert_eq!(prev.orphans_against(&next), vec!["lib/b.js".to_string()]);
    }

    #[test]
    fn test_record_replaces_owner() {
        let mut state = InstalledState::new();
        state.record("lib/shared.js".to_string(), "cdn:a:lib".to_string());
        state.record("lib/shared.js".to_string(), "cdn:b:lib".to_string());

        assert_eq!(state.owner("lib/shared.js"), Some("cdn:b:lib"));
        assert_eq!(state.len(), 1);
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let host = DefaultHostInteraction::new(dir.path());

        let mut state = InstalledState::new();
        state.record("lib/a.js".to_string(), "cdn:a:lib".to_string());
        state.save(&host).await.unwrap();

        let loaded = InstalledState::load(&host).await;
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn test_corrupt_state_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let host = DefaultHostInteraction::new(dir.path());
        host.write_file(Path::new(STATE_FILE_NAME), b"{ not json")
            .await
            .unwrap();

        let loaded = InstalledState::load(&host).await;
        assert!(loaded.is_empty());
    }
}
