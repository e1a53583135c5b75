//! Provider factories.
//!
//! Providers are discovered at context-construction time from an explicit
//! factory list, not through runtime plugin discovery. The registry runs
//! every factory against the host interaction once and treats the returned
//! provider list as fixed for the lifetime of the context.

use std::sync::Arc;

use super::cdn::{CdnProvider, DEFAULT_CDN_BASE_URL};
use super::filesystem::FileSystemProvider;
use super::http::ReqwestClient;
use super::types::{Provider, ProviderError};
use crate::host::HostInteraction;

/// Factory for constructing one provider against a host interaction.
pub trait ProviderFactory: Send + Sync {
    /// Construct the provider. A failure here is fatal to context
    /// construction.
    fn create_provider(
        &self,
        host: &Arc<dyn HostInteraction>,
    ) -> Result<Arc<dyn Provider>, ProviderError>;
}

/// Factory for the remote CDN registry provider.
pub struct CdnProviderFactory {
    base_url: String,
}

impl CdnProviderFactory {
    /// Create a factory targeting a custom registry base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for CdnProviderFactory {
    fn default() -> Self {
        Self::new(DEFAULT_CDN_BASE_URL)
    }
}

impl ProviderFactory for CdnProviderFactory {
    fn create_provider(
        &self,
        _host: &Arc<dyn HostInteraction>,
    ) -> Result<Arc<dyn Provider>, ProviderError> {
        let client = ReqwestClient::new().map_err(|e| ProviderError::Unavailable(e.to_string()))?;
        Ok(Arc::new(CdnProvider::new(client, self.base_url.clone())))
    }
}

/// Factory for the local file-tree provider, rooted at the project root.
pub struct FileSystemProviderFactory;

impl ProviderFactory for FileSystemProviderFactory {
    fn create_provider(
        &self,
        host: &Arc<dyn HostInteraction>,
    ) -> Result<Arc<dyn Provider>, ProviderError> {
        Ok(Arc::new(FileSystemProvider::new(host.root())))
    }
}

/// The built-in factory set: CDN registry plus local file trees.
pub fn default_factories() -> Vec<Box<dyn ProviderFactory>> {
    vec![
        Box::new(CdnProviderFactory::default()),
        Box::new(FileSystemProviderFactory),
    ]
}
