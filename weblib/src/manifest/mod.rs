//! Manifest model and persistence.
//!
//! The manifest is the persisted declaration of desired libraries: an
//! ordered list of entries plus a schema version tag, stored as JSON next
//! to the project. Declaration order is significant — it defines the
//! deterministic "last entry wins" resolution for conflicting files and the
//! order of every report.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "libraries": [
//!     {
//!       "provider": "cdn",
//!       "library": "jquery",
//!       "version": "3.3.1",
//!       "destination": "wwwroot/lib/jquery",
//!       "files": ["dist/jquery.min.js"]
//!     }
//!   ]
//! }
//! ```
//!
//! Loading tolerates unknown and missing optional fields; saving emits
//! canonical pretty JSON with fixed field order, so `save(load(x)) == x`
//! for any previously-saved manifest.

mod validate;

pub use validate::{validate, ValidationIssue};

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current manifest schema version.
pub const MANIFEST_SCHEMA_VERSION: &str = "1.0";

/// Default manifest file name.
pub const DEFAULT_MANIFEST_NAME: &str = "weblib.json";

/// Version marker requesting the newest available version on each restore.
pub const LATEST_VERSION: &str = "latest";

/// Errors from loading or saving a manifest.
///
/// A malformed manifest fails wholesale: partial manifests cannot be safely
/// reasoned about.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The document is not structurally valid manifest JSON.
    #[error("invalid manifest document: {0}")]
    Json(#[from] serde_json::Error),

    /// The manifest file could not be read or written.
    #[error("manifest IO error: {0}")]
    Io(#[from] io::Error),
}

/// One declared library: what to fetch, from where, and where to put it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Provider id (e.g. `"cdn"`, `"filesystem"`).
    pub provider: String,

    /// Library id within the provider.
    pub library: String,

    /// Version string, or [`LATEST_VERSION`] to re-resolve on each restore.
    #[serde(default = "default_version")]
    pub version: String,

    /// Destination directory, relative to the project root.
    pub destination: String,

    /// Explicit file subset; empty means "use the library's default subset".
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
}

fn default_version() -> String {
    LATEST_VERSION.to_string()
}

impl ManifestEntry {
    /// Whether the entry floats on the newest available version.
    pub fn is_latest(&self) -> bool {
        self.version.is_empty() || self.version == LATEST_VERSION
    }

    /// Stable ownership key for installed-file state.
    ///
    /// Deliberately version-free: bumping an entry's version must not orphan
    /// its files between state generations.
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.provider, self.library, self.destination)
    }

    /// Human-readable id for logs and reports.
    pub fn display_id(&self) -> String {
        format!("{}:{}@{}", self.provider, self.library, self.version)
    }

    /// Destination-relative path of one library file, with a normalized
    /// forward-slash join.
    pub fn destination_file(&self, library_path: &str) -> String {
        let destination = self.destination.trim_end_matches('/');
        if destination.is_empty() {
            library_path.to_string()
        } else {
            format!("{}/{}", destination, library_path)
        }
    }
}

/// The persisted declaration of desired libraries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Schema version tag.
    #[serde(default = "default_schema_version")]
    pub version: String,

    /// Declared libraries, in declaration order.
    #[serde(default)]
    pub libraries: Vec<ManifestEntry>,
}

fn default_schema_version() -> String {
    MANIFEST_SCHEMA_VERSION.to_string()
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

impl Manifest {
    /// Create an empty manifest at the current schema version.
    pub fn new() -> Self {
        Self {
            version: MANIFEST_SCHEMA_VERSION.to_string(),
            libraries: Vec::new(),
        }
    }

    /// Parse a manifest document.
    pub fn load(bytes: &[u8]) -> Result<Self, SchemaError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialize to canonical bytes (pretty JSON, fixed field order,
    /// trailing newline).
    pub fn save(&self) -> Result<Vec<u8>, SchemaError> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Load a manifest file from disk.
    pub async fn load_file(path: &Path) -> Result<Self, SchemaError> {
        let bytes = tokio::fs::read(path).await?;
        Self::load(&bytes)
    }

    /// Save the manifest to disk in canonical form.
    pub async fn save_file(&self, path: &Path) -> Result<(), SchemaError> {
        tokio::fs::write(path, self.save()?).await?;
        Ok(())
    }

    /// Find an entry by provider and library id.
    pub fn entry(&self, provider: &str, library: &str) -> Option<(usize, &ManifestEntry)> {
        self.libraries
            .iter()
            .enumerate()
            .find(|(_, e)| e.provider == provider && e.library == library)
    }

    /// Remove an entry by provider and library id.
    pub fn remove_entry(&mut self, provider: &str, library: &str) -> Option<ManifestEntry> {
        let index = self.entry(provider, library).map(|(i, _)| i)?;
        Some(self.libraries.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Manifest {
        Manifest {
            version: MANIFEST_SCHEMA_VERSION.to_string(),
            libraries: vec![
                ManifestEntry {
                    provider: "cdn".to_string(),
                    library: "jquery".to_string(),
                    version: "3.3.1".to_string(),
                    destination: "wwwroot/lib/jquery".to_string(),
                    files: vec!["dist/jquery.min.js".to_string()],
                },
                ManifestEntry {
                    provider: "filesystem".to_string(),
                    library: "vendor/mylib".to_string(),
                    version: LATEST_VERSION.to_string(),
                    destination: "wwwroot/lib/mylib".to_string(),
                    files: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn test_save_load_round_trips() {
        let manifest = sample();

        let bytes = manifest.save().unwrap();
        let loaded = Manifest::load(&bytes).unwrap();
        assert_eq!(loaded, manifest);

        // Canonical form is a fixed point: save(load(x)) == x.
        assert_eq!(loaded.save().unwrap(), bytes);
    }

    #[test]
    fn test_load_tolerates_unknown_and_missing_fields() {
        let bytes = br#"{
            "version": "1.0",
            "defaultProvider": "cdn",
            "libraries": [
                {"provider": "cdn", "library": "jquery", "destination": "lib"}
            ]
        }"#;

        let manifest = Manifest::load(bytes).unwrap();
        assert_eq!(manifest.libraries.len(), 1);
        assert!(manifest.libraries[0].is_latest());
        assert!(manifest.libraries[0].files.is_empty());
    }

    #[test]
    fn test_load_rejects_structurally_invalid_documents() {
        assert!(Manifest::load(br#"{"libraries": "nope"}"#).is_err());
        assert!(Manifest::load(b"not json").is_err());
    }

    #[test]
    fn test_entry_key_is_version_free() {
        let manifest = sample();
        let mut bumped = manifest.libraries[0].clone();
        bumped.version = "3.4.0".to_string();

        assert_eq!(manifest.libraries[0].key(), bumped.key());
    }

    #[test]
    fn test_destination_file_join() {
        let entry = &sample().libraries[0];
        assert_eq!(
            entry.destination_file("dist/jquery.min.js"),
            "wwwroot/lib/jquery/dist/jquery.min.js"
        );

        let mut root_entry = entry.clone();
        root_entry.destination = String::new();
        assert_eq!(root_entry.destination_file("a.js"), "a.js");
    }

    #[test]
    fn test_remove_entry() {
        let mut manifest = sample();

        let removed = manifest.remove_entry("cdn", "jquery").unwrap();
        assert_eq!(removed.library, "jquery");
        assert_eq!(manifest.libraries.len(), 1);
        assert!(manifest.remove_entry("cdn", "jquery").is_none());
    }
}
