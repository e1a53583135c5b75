//! Local file-tree provider.
//!
//! Serves libraries out of a directory tree rooted at the project root:
//!
//! ```text
//! <root>/<library>/<version>/<files...>
//! ```
//!
//! Library ids are relative paths (they may contain `/`), versions are
//! directory names, and every file under a version directory is part of the
//! library's default subset. Useful for vendored libraries and for tests.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::cdn::latest_of;
use super::types::{Catalog, IdScheme, Library, Provider, ProviderError};
use crate::host::BoxFuture;

/// Provider id for the local file-tree provider.
pub const FILESYSTEM_PROVIDER_ID: &str = "filesystem";

/// Catalog over a local directory tree.
pub struct FileSystemCatalog {
    root: PathBuf,
}

impl FileSystemCatalog {
    /// Create a catalog rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Reject ids that would escape the root.
    fn library_dir(&self, id: &str) -> Result<PathBuf, ProviderError> {
        let relative = Path::new(id);
        let escapes = relative
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir));
        if id.is_empty() || escapes {
            return Err(ProviderError::Unavailable(format!(
                "invalid library path '{}'",
                id
            )));
        }
        Ok(self.root.join(relative))
    }

    fn io_error(id: &str, error: std::io::Error) -> ProviderError {
        ProviderError::Unavailable(format!("filesystem error for '{}': {}", id, error))
    }
}

impl Catalog for FileSystemCatalog {
    fn get_library<'a>(
        &'a self,
        id: &'a str,
        version: &'a str,
    ) -> BoxFuture<'a, Result<Arc<Library>, ProviderError>> {
        Box::pin(async move {
            let dir = self.library_dir(id)?.join(version);
            debug!(library = id, version, dir = %dir.display(), "scanning library tree");

            if !matches!(tokio::fs::metadata(&dir).await, Ok(meta) if meta.is_dir()) {
                return Err(ProviderError::LibraryNotFound {
                    id: id.to_string(),
                    version: version.to_string(),
                });
            }

            // Iterative walk; async recursion would need boxing at each level.
            let mut files = BTreeMap::new();
            let mut stack = vec![dir.clone()];
            while let Some(current) = stack.pop() {
                let mut entries = tokio::fs::read_dir(&current)
                    .await
                    .map_err(|e| Self::io_error(id, e))?;
                while let Some(entry) = entries
                    .next_entry()
                    .await
                    .map_err(|e| Self::io_error(id, e))?
                {
                    let file_type = entry.file_type().await.map_err(|e| Self::io_error(id, e))?;
                    let path = entry.path();
                    if file_type.is_dir() {
                        stack.push(path);
                    } else if file_type.is_file() {
                        // Entries always live under `dir`; skip anything odd.
                        let Ok(relative) = path.strip_prefix(&dir) else {
                            continue;
                        };
                        let key = relative
                            .components()
                            .map(|c| c.as_os_str().to_string_lossy())
                            .collect::<Vec<_>>()
                            .join("/");
                        files.insert(key, true);
                    }
                }
            }

            Ok(Arc::new(Library::new(
                FILESYSTEM_PROVIDER_ID,
                id,
                version,
                files,
            )))
        })
    }

    fn get_latest_version<'a>(
        &'a self,
        id: &'a str,
        include_prerelease: bool,
    ) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            let dir = self.library_dir(id)?;
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(_) => {
                    return Err(ProviderError::LibraryNotFound {
                        id: id.to_string(),
                        version: "latest".to_string(),
                    })
                }
            };

            let mut versions = Vec::new();
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| Self::io_error(id, e))?
            {
                let file_type = entry.file_type().await.map_err(|e| Self::io_error(id, e))?;
                if file_type.is_dir() {
                    versions.push(entry.file_name().to_string_lossy().into_owned());
                }
            }

            latest_of(&versions, include_prerelease).ok_or_else(|| {
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
            let full = self.library_dir(id)?.join(version).join(path);
            tokio::fs::read(&full)
                .await
                .map_err(|e| Self::io_error(id, e))
        })
    }

    fn search<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Result<Vec<String>, ProviderError>> {
        Box::pin(async move {
            let mut entries = match tokio::fs::read_dir(&self.root).await {
                Ok(entries) => entries,
                // An absent root simply has no libraries yet.
                Err(_) => return Ok(Vec::new()),
            };

            let mut hits = Vec::new();
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| Self::io_error(prefix, e))?
            {
                let file_type = entry.file_type().await.map_err(|e| Self::io_error(prefix, e))?;
                if !file_type.is_dir() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with(prefix) {
                    hits.push(name);
                }
            }
            hits.sort();
            Ok(hits)
        })
    }
}

/// The local file-tree provider.
pub struct FileSystemProvider {
    catalog: Arc<dyn Catalog>,
}

impl FileSystemProvider {
    /// Create a provider rooted at `root` (normally the project root).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            catalog: Arc::new(FileSystemCatalog::new(root)),
        }
    }
}

impl Provider for FileSystemProvider {
    fn id(&self) -> &str {
        FILESYSTEM_PROVIDER_ID
    }

    fn catalog(&self) -> Arc<dyn Catalog> {
        Arc::clone(&self.catalog)
    }

    fn id_scheme(&self) -> IdScheme {
        // Ids are directory paths; the version is a separate directory
        // level, never an `@` suffix.
        IdScheme::Path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed(root: &Path, library: &str, version: &str, files: &[(&str, &str)]) {
        for (path, contents) in files {
            let full = root.join(library).join(version).join(path);
            tokio::fs::create_dir_all(full.parent().unwrap())
                .await
                .unwrap();
            tokio::fs::write(&full, contents).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_get_library_walks_nested_tree() {
        let dir = tempfile::tempdir().unwrap();
        seed(
            dir.path(),
            "mylib",
            "1.0.0",
            &[("main.js", "js"), ("css/style.css", "css")],
        )
        .await;
        let catalog = FileSystemCatalog::new(dir.path());

        let library = catalog.get_library("mylib", "1.0.0").await.unwrap();

        let files: Vec<&str> = library.files().collect();
        assert_eq!(files, vec!["css/style.css", "main.js"]);
        assert_eq!(library.default_files().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_version_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), "mylib", "1.0.0", &[("main.js", "js")]).await;
        let catalog = FileSystemCatalog::new(dir.path());

        let err = catalog.get_library("mylib", "2.0.0").await.unwrap_err();
        assert!(matches!(err, ProviderError::LibraryNotFound { .. }));
    }

    #[tokio::test]
    async fn test_latest_version_picks_highest_directory() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), "mylib", "1.0.0", &[("main.js", "v1")]).await;
        seed(dir.path(), "mylib", "1.2.0", &[("main.js", "v2")]).await;
        seed(dir.path(), "mylib", "2.0.0-rc.1", &[("main.js", "rc")]).await;
        let catalog = FileSystemCatalog::new(dir.path());

        assert_eq!(
            catalog.get_latest_version("mylib", false).await.unwrap(),
            "1.2.0"
        );
        assert_eq!(
            catalog.get_latest_version("mylib", true).await.unwrap(),
            "2.0.0-rc.1"
        );
    }

    #[tokio::test]
    async fn test_parent_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FileSystemCatalog::new(dir.path());

        let err = catalog.get_library("../escape", "1.0.0").await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_search_lists_matching_directories() {
        let dir = tempfile::tempdir().unwrap();
        seed(dir.path(), "mylib", "1.0.0", &[("a.js", "a")]).await;
        seed(dir.path(), "mytools", "1.0.0", &[("b.js", "b")]).await;
        seed(dir.path(), "other", "1.0.0", &[("c.js", "c")]).await;
        let catalog = FileSystemCatalog::new(dir.path());

        assert_eq!(catalog.search("my").await.unwrap(), vec!["mylib", "mytools"]);
    }
}
