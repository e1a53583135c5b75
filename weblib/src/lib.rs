//! weblib - deterministic acquisition of client-side web libraries.
//!
//! A manifest (`weblib.json`) declares libraries by provider, id, version,
//! file subset, and destination; this crate materializes those declarations
//! onto disk, repeatably. The moving parts:
//!
//! - [`manifest`] — the persisted declaration model, plus validation.
//! - [`provider`] — catalogs of installable libraries (remote CDN registry,
//!   local file trees) behind a coalescing cache.
//! - [`version`] — lenient semantic-version ordering for `latest`
//!   resolution.
//! - [`registry`] — per-manifest-path assembly of hosts and providers.
//! - [`host`] — the IO and telemetry surface embedders implement.
//! - [`install`] — the two-phase engine: concurrent resolution, then
//!   deterministic declaration-order writes with orphan cleanup.
//!
//! # Example
//!
//! ```ignore
//! use weblib::install::Installer;
//! use weblib::manifest::Manifest;
//! use weblib::registry::DependencyRegistry;
//!
//! let registry = DependencyRegistry::with_default_providers();
//! let context = registry.get_or_create(manifest_path)?;
//! let manifest = Manifest::load_file(manifest_path).await?;
//! let report = Installer::new(context).install(&manifest).await;
//! ```

pub mod host;
pub mod install;
pub mod manifest;
pub mod provider;
pub mod registry;
pub mod version;

pub use host::{DefaultHostInteraction, HostInteraction};
pub use install::{InstallOptions, InstallReport, Installer};
pub use manifest::{Manifest, ManifestEntry, DEFAULT_MANIFEST_NAME};
pub use registry::{DependencyContext, DependencyRegistry};
pub use version::SemanticVersion;
