//! Coalescing catalog memoization.
//!
//! Catalog calls are idempotent per `(library, version)`, so every provider
//! registered in a dependency context is wrapped in a [`CatalogCache`]. The
//! cache serves two purposes:
//!
//! - **Memoization**: repeated resolutions of the same library hit the
//!   provider once.
//! - **Request coalescing**: a second concurrent request for a key that is
//!   already being fetched attaches to the in-flight call instead of
//!   triggering a duplicate fetch. `moka`'s `try_get_with` gives exactly
//!   these construct-once-per-key semantics; failed initializations are not
//!   cached, so a transient provider outage does not poison the key.

use std::sync::Arc;

use moka::future::Cache;

use super::types::{Catalog, IdScheme, Library, Provider, ProviderError};
use crate::host::BoxFuture;

/// Upper bound on memoized library metadata entries per provider.
const MAX_CACHED_LIBRARIES: u64 = 512;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct LibraryKey {
    id: String,
    version: String,
}

/// Memoizing, coalescing wrapper around a [`Catalog`].
///
/// Only exact `(id, version)` metadata lookups are cached. Latest-version
/// resolution is time-varying and file content is fetched at most once per
/// install anyway, so both pass straight through.
pub struct CatalogCache {
    inner: Arc<dyn Catalog>,
    libraries: Cache<LibraryKey, Arc<Library>>,
}

impl CatalogCache {
    /// Wrap a catalog.
    pub fn new(inner: Arc<dyn Catalog>) -> Self {
        Self {
            inner,
            libraries: Cache::builder().max_capacity(MAX_CACHED_LIBRARIES).build(),
        }
    }
}

impl Catalog for CatalogCache {
    fn get_library<'a>(
        &'a self,
        id: &'a str,
        version: &'a str,
    ) -> BoxFuture<'a, Result<Arc<Library>, ProviderError>> {
        Box::pin(async move {
            let key = LibraryKey {
                id: id.to_string(),
                version: version.to_string(),
            };
            self.libraries
                .try_get_with(key, self.inner.get_library(id, version))
                .await
                .map_err(|e: Arc<ProviderError>| (*e).clone())
        })
    }

    fn get_latest_version<'a>(
        &'a self,
        id: &'a str,
        include_prerelease: bool,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        self.inner.get_latest_version(id, include_prerelease)
    }

    fn fetch_file<'a>(
        &'a self,
        id: &'a str,
        version: &'a str,
        path: &'a str,
    ) -> BoxFuture<'a, Result<Vec<u8>, ProviderError>> {
        self.inner.fetch_file(id, version, path)
    }

    fn search<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Result<Vec<String>, ProviderError>> {
        self.inner.search(prefix)
    }
}

/// A provider whose catalog is wrapped in a [`CatalogCache`].
pub struct CachedProvider {
    inner: Arc<dyn Provider>,
    catalog: Arc<dyn Catalog>,
}

impl CachedProvider {
    /// Wrap a provider, memoizing its catalog.
    pub fn wrap(inner: Arc<dyn Provider>) -> Arc<dyn Provider> {
        let catalog: Arc<dyn Catalog> = Arc::new(CatalogCache::new(inner.catalog()));
        Arc::new(Self { inner, catalog })
    }
}

impl Provider for CachedProvider {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn catalog(&self) -> Arc<dyn Catalog> {
        Arc::clone(&self.catalog)
    }

    fn id_scheme(&self) -> IdScheme {
        self.inner.id_scheme()
    }
}
