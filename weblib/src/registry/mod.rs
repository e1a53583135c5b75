//! Dependency registry: per-manifest-path context cache.
//!
//! Every operation against a manifest needs the same assembled machinery: a
//! host interaction rooted at the project, the constructed provider set, and
//! initialized id naming. [`DependencyRegistry`] builds that once per
//! manifest path and hands out the cached [`DependencyContext`] afterwards.
//!
//! The cache is an explicit, injectable object rather than ambient global
//! state: embedders create one registry (usually for the process lifetime)
//! and share it. Construct-once-per-key is guaranteed by holding the map
//! lock across construction — a second concurrent call for the same
//! uninitialized path blocks until the first finishes, and never
//! double-constructs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::info;

use crate::host::{DefaultHostInteraction, HostInteraction};
use crate::provider::{
    default_factories, CachedProvider, LibraryIdResolver, Provider, ProviderError,
    ProviderFactory,
};

/// Errors fatal to context construction.
///
/// Everything past construction is reported per entry instead (see the
/// install report types); only a bad manifest path or a total provider
/// factory failure aborts an operation wholesale.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The manifest path has no usable parent directory.
    #[error("invalid manifest path '{path}'")]
    InvalidManifestPath { path: PathBuf },

    /// A provider factory failed to construct its provider.
    #[error("provider construction failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Assembled per-manifest machinery: host interaction plus provider set.
///
/// Contexts are immutable once constructed and shared via `Arc`.
pub struct DependencyContext {
    manifest_path: PathBuf,
    host: Arc<dyn HostInteraction>,
    providers: Vec<Arc<dyn Provider>>,
}

impl DependencyContext {
    /// Path of the manifest this context was built for.
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// The host interaction all engine IO goes through.
    pub fn host(&self) -> Arc<dyn HostInteraction> {
        Arc::clone(&self.host)
    }

    /// Look up a provider by id.
    pub fn provider(&self, id: &str) -> Option<Arc<dyn Provider>> {
        self.providers
            .iter()
            .find(|p| p.id() == id)
            .map(Arc::clone)
    }

    /// All registered providers.
    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    /// Ids of all registered providers.
    pub fn provider_ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }
}

/// Process-wide cache of dependency contexts, keyed by manifest path.
pub struct DependencyRegistry {
    factories: Vec<Box<dyn ProviderFactory>>,
    contexts: Mutex<HashMap<PathBuf, Arc<DependencyContext>>>,
}

impl DependencyRegistry {
    /// Create a registry with an explicit factory list.
    pub fn new(factories: Vec<Box<dyn ProviderFactory>>) -> Self {
        Self {
            factories,
            contexts: Mutex::new(HashMap::new()),
        }
    }

    /// Create a registry with the built-in provider set.
    pub fn with_default_providers() -> Self {
        Self::new(default_factories())
    }

    /// Return the cached context for a manifest path, constructing it on
    /// first use.
    ///
    /// Construction builds the host interaction rooted at the manifest's
    /// directory, runs every factory, wraps each provider's catalog in the
    /// coalescing cache, and initializes id naming — all before the context
    /// becomes visible to other callers.
    pub fn get_or_create(
        &self,
        manifest_path: &Path,
    ) -> Result<Arc<DependencyContext>, RegistryError> {
        let mut contexts = self.contexts.lock();
        if let Some(context) = contexts.get(manifest_path) {
            return Ok(Arc::clone(context));
        }

        let context = Arc::new(self.construct(manifest_path)?);
        contexts.insert(manifest_path.to_path_buf(), Arc::clone(&context));
        Ok(context)
    }

    /// The cached context for a path, if one was already constructed.
    pub fn get(&self, manifest_path: &Path) -> Option<Arc<DependencyContext>> {
        self.contexts.lock().get(manifest_path).map(Arc::clone)
    }

    fn construct(&self, manifest_path: &Path) -> Result<DependencyContext, RegistryError> {
        let root = match manifest_path.parent() {
            // A bare file name lives in the current directory.
            Some(parent) if parent.as_os_str().is_empty() => PathBuf::from("."),
            Some(parent) => parent.to_path_buf(),
            None => {
                return Err(RegistryError::InvalidManifestPath {
                    path: manifest_path.to_path_buf(),
                })
            }
        };

        let host: Arc<dyn HostInteraction> = Arc::new(DefaultHostInteraction::new(root));

        let mut providers = Vec::with_capacity(self.factories.len());
        for factory in &self.factories {
            let provider = factory.create_provider(&host)?;
            providers.push(CachedProvider::wrap(provider));
        }

        // Naming must be ready before any operation runs against the context.
        LibraryIdResolver::global().ensure_initialized(&providers);

        info!(
            manifest = %manifest_path.display(),
            providers = providers.len(),
            "constructed dependency context"
        );

        Ok(DependencyContext {
            manifest_path: manifest_path.to_path_buf(),
            host,
            providers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::FileSystemProviderFactory;

    fn test_registry() -> DependencyRegistry {
        DependencyRegistry::new(vec![Box::new(FileSystemProviderFactory)])
    }

    #[test]
    fn test_same_path_returns_same_context() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("weblib.json");
        let registry = test_registry();

        let first = registry.get_or_create(&manifest).unwrap();
        let second = registry.get_or_create(&manifest).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_different_paths_get_distinct_contexts() {
        let dir = tempfile::tempdir().unwrap();
        let registry = test_registry();

        let a = registry.get_or_create(&dir.path().join("a/weblib.json")).unwrap();
        let b = registry.get_or_create(&dir.path().join("b/weblib.json")).unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        let (host_a, host_b) = (a.host(), b.host());
        assert_eq!(host_a.root(), dir.path().join("a"));
        assert_eq!(host_b.root(), dir.path().join("b"));
    }

    #[test]
    fn test_provider_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let registry = test_registry();
        let context = registry
            .get_or_create(&dir.path().join("weblib.json"))
            .unwrap();

        assert!(context.provider("filesystem").is_some());
        assert!(context.provider("unknown").is_none());
        assert_eq!(context.provider_ids(), vec!["filesystem"]);
    }

    #[test]
    fn test_bare_file_name_roots_at_current_directory() {
        let registry = test_registry();
        let context = registry.get_or_create(Path::new("weblib.json")).unwrap();
        let host = context.host();
        assert_eq!(host.root(), Path::new("."));
    }

    #[test]
    fn test_concurrent_construction_is_single() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("weblib.json");
        let registry = Arc::new(test_registry());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let manifest = manifest.clone();
                std::thread::spawn(move || registry.get_or_create(&manifest).unwrap())
            })
            .collect();

        let contexts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for context in &contexts[1..] {
            assert!(Arc::ptr_eq(&contexts[0], context));
        }
    }
}
