//! Remote CDN registry provider.
//!
//! Resolves libraries against a static JSON registry served over HTTP.
//!
//! # URL Pattern
//!
//! - `{base}/catalog.json` — list of all library ids (search)
//! - `{base}/{library}/index.json` — known versions of one library
//! - `{base}/{library}/{version}/files.json` — file listing for one version
//! - `{base}/{library}/{version}/{path}` — raw file content
//!
//! The registry is append-only, so every catalog response for an exact
//! `(library, version)` pair is immutable and safe to memoize.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::http::{AsyncHttpClient, HttpError};
use super::types::{Catalog, Library, Provider, ProviderError};
use crate::host::BoxFuture;
use crate::version::SemanticVersion;

/// Provider id for the CDN registry.
pub const CDN_PROVIDER_ID: &str = "cdn";

/// Base URL of the public registry.
pub const DEFAULT_CDN_BASE_URL: &str = "https://cdn.weblib.dev/libraries";

/// Per-library version index document.
#[derive(Debug, Deserialize)]
struct LibraryIndexDoc {
    #[serde(default)]
    versions: Vec<String>,
}

/// Per-version file listing document.
#[derive(Debug, Deserialize)]
struct FileListDoc {
    #[serde(default)]
    files: Vec<FileDoc>,
}

#[derive(Debug, Deserialize)]
struct FileDoc {
    path: String,
    #[serde(default)]
    default: bool,
}

/// Registry-wide catalog document, used for prefix search.
#[derive(Debug, Deserialize)]
struct CatalogDoc {
    #[serde(default)]
    libraries: Vec<String>,
}

/// Catalog over the remote JSON registry.
pub struct CdnCatalog<C: AsyncHttpClient> {
    client: C,
    base_url: String,
}

impl<C: AsyncHttpClient> CdnCatalog<C> {
    /// Create a catalog against the given registry base URL.
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn index_url(&self, id: &str) -> String {
        format!("{}/{}/index.json", self.base_url, id)
    }

    fn files_url(&self, id: &str, version: &str) -> String {
        format!("{}/{}/{}/files.json", self.base_url, id, version)
    }

    fn content_url(&self, id: &str, version: &str, path: &str) -> String {
        format!("{}/{}/{}/{}", self.base_url, id, version, path)
    }

    fn catalog_url(&self) -> String {
        format!("{}/catalog.json", self.base_url)
    }

    /// Map an HTTP failure onto the provider error taxonomy: a 404 means the
    /// library/version does not exist, anything else means the registry is
    /// unreachable.
    fn map_http_error(error: HttpError, id: &str, version: &str) -> ProviderError {
        if error.is_not_found() {
            ProviderError::LibraryNotFound {
                id: id.to_string(),
                version: version.to_string(),
            }
        } else {
            ProviderError::Unavailable(error.to_string())
        }
    }
}

impl<C: AsyncHttpClient> Catalog for CdnCatalog<C> {
    fn get_library<'a>(
        &'a self,
        id: &'a str,
        version: &'a str,
    ) -> BoxFuture<'a, Result<Arc<Library>, ProviderError>> {
        Box::pin(async move {
            let url = self.files_url(id, version);
            debug!(library = id, version, url, "fetching library metadata");

            let body = self
                .client
                .get(&url)
                .await
                .map_err(|e| Self::map_http_error(e, id, version))?;

            let doc: FileListDoc = serde_json::from_slice(&body).map_err(|e| {
                ProviderError::Unavailable(format!("malformed file listing at {}: {}", url, e))
            })?;

            let files: BTreeMap<String, bool> = doc
                .files
                .into_iter()
                .map(|f| (f.path, f.default))
                .collect();

            Ok(Arc::new(Library::new(CDN_PROVIDER_ID, id, version, files)))
        })
    }

    fn get_latest_version<'a>(
        &'a self,
        id: &'a str,
        include_prerelease: bool,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let url = self.index_url(id);
            let body = self
                .client
                .get(&url)
                .await
                .map_err(|e| Self::map_http_error(e, id, "latest"))?;

            let doc: LibraryIndexDoc = serde_json::from_slice(&body).map_err(|e| {
                ProviderError::Unavailable(format!("malformed version index at {}: {}", url, e))
            })?;

            latest_of(&doc.versions, include_prerelease).ok_or_else(|| {
                ProviderError::InvalidVersion {
                    id: id.to_string(),
                    version: "latest".to_string(),
                }
            })
        })
    }

    fn fetch_file<'a>(
        &'a self,
        id: &'a str,
        version: &'a str,
        path: &'a str,
    ) -> BoxFuture<'a, Result<Vec<u8>, ProviderError>> {
        Box::pin(async move {
            let url = self.content_url(id, version, path);
            self.client
                .get(&url)
                .await
                .map_err(|e| Self::map_http_error(e, id, version))
        })
    }

    fn search<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Result<Vec<String>, ProviderError>> {
        Box::pin(async move {
            let url = self.catalog_url();
            let body = self
                .client
                .get(&url)
                .await
                .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

            let doc: CatalogDoc = serde_json::from_slice(&body).map_err(|e| {
                ProviderError::Unavailable(format!("malformed catalog at {}: {}", url, e))
            })?;

            Ok(doc
                .libraries
                .into_iter()
                .filter(|name| name.starts_with(prefix))
                .collect())
        })
    }
}

/// Pick the newest version string from a list, skipping unparsable entries
/// and (unless requested) prereleases. Returns the original string, not the
/// canonical rendering.
pub(crate) fn latest_of(versions: &[String], include_prerelease: bool) -> Option<String> {
    versions
        .iter()
        .filter_map(|text| {
            SemanticVersion::parse(text)
                .ok()
                .map(|parsed| (parsed, text))
        })
        .filter(|(parsed, _)| include_prerelease || !parsed.is_prerelease())
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, text)| text.clone())
}

/// The CDN registry provider.
pub struct CdnProvider {
    catalog: Arc<dyn Catalog>,
}

impl CdnProvider {
    /// Create a provider over the given HTTP client and registry base URL.
    pub fn new<C: AsyncHttpClient + 'static>(client: C, base_url: impl Into<String>) -> Self {
        Self {
            catalog: Arc::new(CdnCatalog::new(client, base_url)),
        }
    }
}

impl Provider for CdnProvider {
    fn id(&self) -> &str {
        CDN_PROVIDER_ID
    }

    fn catalog(&self) -> Arc<dyn Catalog> {
        Arc::clone(&self.catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::super::http::tests::MockHttpClient;
    use super::*;

    const BASE: &str = "http://registry.test/libraries";

    fn catalog_with_jquery() -> CdnCatalog<MockHttpClient> {
        let client = MockHttpClient::new();
        client.route(
            format!("{}/jquery/index.json", BASE),
            br#"{"versions": ["3.3.0", "3.3.1", "3.4.0-beta.1"]}"#.to_vec(),
        );
        client.route(
            format!("{}/jquery/3.3.1/files.json", BASE),
            br#"{"files": [
                {"path": "dist/jquery.js", "default": false},
                {"path": "dist/jquery.min.js", "default": true}
            ]}"#
            .to_vec(),
        );
        client.route(
            format!("{}/jquery/3.3.1/dist/jquery.min.js", BASE),
            b"console.log('jquery')".to_vec(),
        );
        client.route(
            format!("{}/catalog.json", BASE),
            br#"{"libraries": ["jquery", "jqueryui", "lodash"]}"#.to_vec(),
        );
        CdnCatalog::new(client, BASE)
    }

    #[tokio::test]
    async fn test_get_library_parses_file_listing() {
        let catalog = catalog_with_jquery();

        let library = catalog.get_library("jquery", "3.3.1").await.unwrap();

        assert_eq!(library.provider_id(), "cdn");
        assert_eq!(library.version(), "3.3.1");
        assert_eq!(library.file_count(), 2);
        assert_eq!(library.default_files(), vec!["dist/jquery.min.js"]);
    }

    #[tokio::test]
    async fn test_missing_library_is_not_found() {
        let catalog = catalog_with_jquery();

        let err = catalog.get_library("nope", "1.0.0").await.unwrap_err();
        assert!(matches!(err, ProviderError::LibraryNotFound { .. }));
    }

    #[tokio::test]
    async fn test_latest_version_skips_prerelease_by_default() {
        let catalog = catalog_with_jquery();

        let latest = catalog.get_latest_version("jquery", false).await.unwrap();
        assert_eq!(latest, "3.3.1");

        let latest = catalog.get_latest_version("jquery", true).await.unwrap();
        assert_eq!(latest, "3.4.0-beta.1");
    }

    #[tokio::test]
    async fn test_fetch_file_returns_content() {
        let catalog = catalog_with_jquery();

        let bytes = catalog
            .fetch_file("jquery", "3.3.1", "dist/jquery.min.js")
            .await
            .unwrap();
        assert_eq!(bytes, b"console.log('jquery')");
    }

    #[tokio::test]
    async fn test_search_filters_by_prefix() {
        let catalog = catalog_with_jquery();

        let hits = catalog.search("jquery").await.unwrap();
        assert_eq!(hits, vec!["jquery", "jqueryui"]);
    }

    #[test]
    fn test_latest_of_ignores_unparsable_versions() {
        let versions = vec![
            "not-a-version".to_string(),
            "1.2.3".to_string(),
            "1.10.0".to_string(),
        ];
        assert_eq!(latest_of(&versions, false), Some("1.10.0".to_string()));
    }
}
