//! Core provider and catalog types.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::host::BoxFuture;

/// Errors that can occur while talking to a provider's catalog.
///
/// Cloneable so results can be shared between coalesced in-flight requests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The requested library/version pair does not exist in the catalog.
    #[error("library not found: {id}@{version}")]
    LibraryNotFound { id: String, version: String },

    /// The provider could not be reached (network or IO failure).
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The version string is malformed or cannot be resolved.
    #[error("invalid version '{version}' for library '{id}'")]
    InvalidVersion { id: String, version: String },
}

/// A versioned bundle of files offered by one provider.
///
/// Libraries are read-only value objects returned by a [`Catalog`]; the
/// installation engine never mutates them. Files are keyed by their
/// forward-slash relative path; the flag marks membership in the provider's
/// default install subset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    provider_id: String,
    id: String,
    version: String,
    files: BTreeMap<String, bool>,
}

impl Library {
    /// Create a library value object.
    pub fn new(
        provider_id: impl Into<String>,
        id: impl Into<String>,
        version: impl Into<String>,
        files: BTreeMap<String, bool>,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            id: id.into(),
            version: version.into(),
            files,
        }
    }

    /// Id of the provider this library came from.
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// Library id within its provider.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Resolved version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// All file paths in the library, in sorted order.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// The default install subset.
    ///
    /// When the provider marks no file as default, the whole file list is
    /// the default subset.
    pub fn default_files(&self) -> Vec<String> {
        let defaults: Vec<String> = self
            .files
            .iter()
            .filter(|(_, default)| **default)
            .map(|(path, _)| path.clone())
            .collect();
        if defaults.is_empty() {
            self.files.keys().cloned().collect()
        } else {
            defaults
        }
    }

    /// Whether the library contains the given file path.
    pub fn contains_file(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Number of files in the library.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// The query interface a provider exposes for resolving library metadata
/// and content.
///
/// All calls are idempotent and safe to memoize by `(id, version)`; see
/// [`CatalogCache`](super::CatalogCache) for the memoizing wrapper every
/// registered provider gets.
pub trait Catalog: Send + Sync {
    /// Fetch library metadata for an exact version.
    fn get_library<'a>(
        &'a self,
        id: &'a str,
        version: &'a str,
    ) -> BoxFuture<'a, Result<Arc<Library>, ProviderError>>;

    /// Resolve the newest available version of a library.
    ///
    /// Prerelease versions are skipped unless `include_prerelease` is set.
    fn get_latest_version<'a>(
        &'a self,
        id: &'a str,
        include_prerelease: bool,
    ) -> BoxFuture<'a, Result<String, ProviderError>>;

    /// Fetch the content of one file in a library.
    fn fetch_file<'a>(
        &'a self,
        id: &'a str,
        version: &'a str,
        path: &'a str,
    ) -> BoxFuture<'a, Result<Vec<u8>, ProviderError>>;

    /// Search library ids by prefix, for interactive discovery.
    ///
    /// Not required by installation; providers without a search surface
    /// return an empty list.
    fn search<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Result<Vec<String>, ProviderError>>;
}

/// A named source of installable libraries.
///
/// Providers are constructed once per dependency context and are immutable
/// after construction.
pub trait Provider: Send + Sync {
    /// Unique provider id (e.g. `"cdn"`, `"filesystem"`).
    fn id(&self) -> &str;

    /// The catalog this provider exposes.
    fn catalog(&self) -> Arc<dyn Catalog>;

    /// How this provider's library ids encode a version, if at all.
    fn id_scheme(&self) -> IdScheme {
        IdScheme::Versioned
    }
}

/// Library id naming scheme of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdScheme {
    /// Combined ids carry a trailing `@version` (e.g. `jquery@3.3.1`).
    Versioned,
    /// Ids are opaque paths with no embedded version.
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library_with(files: &[(&str, bool)]) -> Library {
        let files = files
            .iter()
            .map(|(path, default)| (path.to_string(), *default))
            .collect();
        Library::new("cdn", "jquery", "3.3.1", files)
    }

    #[test]
    fn test_default_files_honors_flags() {
        let library = library_with(&[
            ("dist/jquery.js", false),
            ("dist/jquery.min.js", true),
            ("dist/jquery.slim.js", false),
        ]);

        assert_eq!(library.default_files(), vec!["dist/jquery.min.js"]);
    }

    #[test]
    fn test_default_files_falls_back_to_all() {
        let library = library_with(&[("a.js", false), ("b.js", false)]);

        assert_eq!(library.default_files(), vec!["a.js", "b.js"]);
    }

    #[test]
    fn test_contains_file() {
        let library = library_with(&[("dist/jquery.js", true)]);

        assert!(library.contains_file("dist/jquery.js"));
        assert!(!library.contains_file("dist/other.js"));
    }
}
