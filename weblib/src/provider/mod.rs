//! Library provider abstraction.
//!
//! This module provides traits and implementations for resolving client-side
//! libraries from various sources (remote CDN registry, local file trees).
//!
//! # Factory Pattern
//!
//! Providers are never constructed ad hoc; the dependency registry runs an
//! explicit factory list against the host interaction when a context is
//! first built:
//!
//! ```ignore
//! use weblib::provider::{default_factories, ProviderFactory};
//!
//! for factory in default_factories() {
//!     let provider = factory.create_provider(&host)?;
//! }
//! ```
//!
//! Every registered provider's catalog is wrapped in a [`CatalogCache`], so
//! concurrent resolutions of the same `(library, version)` coalesce into a
//! single fetch.

mod cache;
mod cdn;
mod factory;
mod filesystem;
mod http;
mod naming;
mod types;

pub use cache::{CachedProvider, CatalogCache};
pub use cdn::{CdnCatalog, CdnProvider, CDN_PROVIDER_ID, DEFAULT_CDN_BASE_URL};
pub use factory::{
    default_factories, CdnProviderFactory, FileSystemProviderFactory, ProviderFactory,
};
pub use filesystem::{FileSystemCatalog, FileSystemProvider, FILESYSTEM_PROVIDER_ID};
pub use http::{AsyncHttpClient, HttpError, ReqwestClient};
pub use naming::LibraryIdResolver;
pub use types::{Catalog, IdScheme, Library, Provider, ProviderError};

#[cfg(test)]
pub use http::tests::MockHttpClient;
