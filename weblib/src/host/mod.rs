//! Host interaction surface.
//!
//! The engine never touches the filesystem directly; every read, write, and
//! delete goes through [`HostInteraction`]. Editor hosts implement this trait
//! against their own storage and telemetry pipelines; [`DefaultHostInteraction`]
//! is the plain-disk binding used by the CLI and tests.
//!
//! # Design Principles
//!
//! - **Relative paths**: All paths are relative to the project root (the
//!   directory holding the manifest). The host owns the mapping to real
//!   storage.
//! - **Dyn-compatible**: Uses `Pin<Box<dyn Future>>` for trait object
//!   support, so the engine can hold `Arc<dyn HostInteraction>`.
//! - **Telemetry is fire-and-forget**: `track_event` never blocks the engine
//!   and never surfaces a failure.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tracing::{debug, info};

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Abstract file-system and telemetry sink the engine calls into.
///
/// Implementations must tolerate concurrent calls; the engine serializes
/// writes to any single destination path itself.
pub trait HostInteraction: Send + Sync {
    /// Project root all relative paths are resolved against.
    fn root(&self) -> &Path;

    /// Read a file, returning `Ok(None)` when it does not exist.
    fn read_file<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<Option<Vec<u8>>>>;

    /// Write a file, creating intermediate directories as needed.
    fn write_file<'a>(&'a self, path: &'a Path, contents: &'a [u8])
        -> BoxFuture<'a, io::Result<()>>;

    /// Delete a file. Deleting a file that does not exist is not an error.
    fn delete_file<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<()>>;

    /// Whether a file exists.
    fn file_exists<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<bool>>;

    /// Record a telemetry event. Fire-and-forget: implementations must not
    /// block the caller or propagate failures.
    fn track_event(&self, name: &str, properties: &[(&str, String)]);
}

/// Plain-disk host rooted at the manifest's directory.
///
/// Telemetry events are emitted as structured `tracing` records under the
/// `weblib::telemetry` target; hosts with a real telemetry pipeline replace
/// this implementation wholesale.
pub struct DefaultHostInteraction {
    root: PathBuf,
}

impl DefaultHostInteraction {
    /// Create a host rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl HostInteraction for DefaultHostInteraction {
    fn root(&self) -> &Path {
        &self.root
    }

    fn read_file<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<Option<Vec<u8>>>> {
        Box::pin(async move {
            match tokio::fs::read(self.resolve(path)).await {
                Ok(bytes) => Ok(Some(bytes)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e),
            }
        })
    }

    fn write_file<'a>(
        &'a self,
        path: &'a Path,
        contents: &'a [u8],
    ) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(async move {
            let full = self.resolve(path);
            if let Some(parent) = full.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&full, contents).await?;
            debug!(path = %full.display(), bytes = contents.len(), "wrote file");
            Ok(())
        })
    }

    fn delete_file<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(async move {
            let full = self.resolve(path);
            match tokio::fs::remove_file(&full).await {
                Ok(()) => {
                    debug!(path = %full.display(), "deleted file");
                    Ok(())
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e),
            }
        })
    }

    fn file_exists<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<bool>> {
        Box::pin(async move {
            match tokio::fs::metadata(self.resolve(path)).await {
                Ok(meta) => Ok(meta.is_file()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(e),
            }
        })
    }

    fn track_event(&self, name: &str, properties: &[(&str, String)]) {
        // Structured log record stands in for a telemetry pipeline.
        info!(
            target: "weblib::telemetry",
            event = name,
            properties = ?properties,
        );
    }
}
