//! Installation engine.
//!
//! Resolves each manifest entry against its provider's catalog, computes
//! the file set to write, performs conflict detection, writes files through
//! the host interaction, and reconciles previously-installed state for
//! cleanup.
//!
//! # Phases
//!
//! 1. **Resolve** — entries fan out concurrently (up to
//!    [`InstallOptions::fan_out`]); each entry resolves its library,
//!    computes its file subset, and fetches content. Entry failures are
//!    isolated: a failed resolution never aborts a sibling.
//! 2. **Write** — strictly in manifest declaration order. This serializes
//!    writes to any shared destination path and makes conflict resolution
//!    deterministic: the last declared entry's content ends up on disk, no
//!    matter which resolution finished first. Pre-existing files are only
//!    rewritten when content differs (or `force` is set).
//! 3. **Cleanup** — the new installed-file state is diffed against the
//!    previous generation; orphaned files are deleted unless a
//!    still-present entry claims them.
//!
//! Cancellation is cooperative: no new fetches or writes are issued once
//! the token fires, and files already written stay in place.

mod report;
mod state;

pub use report::{EntryReport, EntryState, InstallError, InstallReport};
pub use state::{InstalledState, STATE_FILE_NAME};

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::manifest::{validate, Manifest, ManifestEntry, ValidationIssue};
use crate::registry::DependencyContext;

/// Default resolution fan-out.
pub const DEFAULT_FAN_OUT: usize = 4;

/// Tuning knobs for an install/restore run.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Rewrite files even when on-disk content already matches.
    pub force: bool,
    /// Maximum number of entries resolving concurrently.
    pub fan_out: usize,
    /// Let `latest` resolve to prerelease versions.
    pub include_prerelease: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            force: false,
            fan_out: DEFAULT_FAN_OUT,
            include_prerelease: false,
        }
    }
}

/// Errors from [`Installer::uninstall`].
#[derive(Debug, Error)]
pub enum UninstallError {
    /// No manifest entry matches the given provider and library.
    #[error("no manifest entry for {provider}:{library}")]
    EntryNotFound { provider: String, library: String },
}

/// Outcome of an uninstall.
#[derive(Debug, Clone)]
pub struct UninstallReport {
    /// The removed manifest entry.
    pub entry: ManifestEntry,
    /// Files deleted from disk.
    pub deleted_files: Vec<String>,
}

/// A resolved entry carried from the resolve phase into the write phase.
struct ResolvedEntry {
    report: EntryReport,
    key: String,
    /// `(project-relative destination path, content)` pairs.
    files: Vec<(String, Vec<u8>)>,
}

/// The installation engine for one dependency context.
pub struct Installer {
    context: Arc<DependencyContext>,
    options: InstallOptions,
    cancel: CancellationToken,
}

impl Installer {
    /// Create an installer with default options.
    pub fn new(context: Arc<DependencyContext>) -> Self {
        Self {
            context,
            options: InstallOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: InstallOptions) -> Self {
        self.options = options;
        self
    }

    /// Token callers can use to cancel an in-progress run.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Validate a manifest against this context's registered providers.
    pub fn validate_manifest(&self, manifest: &Manifest) -> Vec<ValidationIssue> {
        validate(manifest, &self.context.provider_ids())
    }

    /// Install/restore every manifest entry and reconcile on-disk state.
    ///
    /// Entry-level failures are collected into the returned report; the run
    /// itself only fails at context construction, before an installer
    /// exists.
    pub async fn install(&self, manifest: &Manifest) -> InstallReport {
        let host = self.context.host();
        let previous = InstalledState::load(host.as_ref()).await;

        // Phase 1: concurrent resolution, order restored afterwards.
        let mut resolved: Vec<ResolvedEntry> = stream::iter(
            manifest
                .libraries
                .iter()
                .enumerate()
                .map(|(index, entry)| self.resolve_entry(index, entry)),
        )
        .buffer_unordered(self.options.fan_out.max(1))
        .collect()
        .await;
        resolved.sort_by_key(|r| r.report.index);

        // Phase 2: writes in declaration order.
        let mut new_state = InstalledState::new();
        let mut claims: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for slot in 0..resolved.len() {
            let ResolvedEntry {
                ref mut report,
                ref key,
                ref files,
            } = resolved[slot];

            if report.state == EntryState::Failed {
                // A failed resolution keeps its previously installed files;
                // a transient provider outage must never trigger deletion.
                for path in previous.files_owned_by(key) {
                    new_state.record(path, key.clone());
                }
                continue;
            }

            report.state = EntryState::Writing;
            let mut cancelled = false;
            for (path, bytes) in files {
                if self.cancel.is_cancelled() {
                    cancelled = true;
                    break;
                }

                // Claims only count files this run actually attempted; a
                // cancelled entry is not a conflict owner for files it
                // never reached.
                claims.entry(path.clone()).or_default().push(slot);

                let target = Path::new(path);
                let existing = host.read_file(target).await.unwrap_or(None);
                if !self.options.force && existing.as_deref() == Some(bytes.as_slice()) {
                    report.files_up_to_date += 1;
                } else {
                    if let Err(e) = host.write_file(target, bytes).await {
                        report.errors.push(InstallError::WriteFailed {
                            path: path.clone(),
                            message: e.to_string(),
                        });
                        report.files_failed += 1;
                        // If a previous generation of the file is still on
                        // disk, it stays owned so cleanup leaves it alone.
                        if existing.is_some() {
                            new_state.record(path.clone(), key.clone());
                        }
                        continue;
                    }
                    report.files_written += 1;
                }
                new_state.record(path.clone(), key.clone());
            }

            if cancelled {
                report.fail(InstallError::Cancelled);
                // Files this run never reached are still the previous
                // generation's; keep their ownership.
                for path in previous.files_owned_by(key) {
                    if !new_state.contains(&path) {
                        new_state.record(path, key.clone());
                    }
                }
                continue;
            }

            report.state = EntryState::Installed;
            host.track_event(
                "library/installed",
                &[
                    ("library", report.library.clone()),
                    ("written", report.files_written.to_string()),
                    ("up_to_date", report.files_up_to_date.to_string()),
                ],
            );
        }

        // Conflicts are informational: every conflicting file is reported
        // once per owning entry, and the later declared entry has won.
        for (path, owners) in &claims {
            if owners.len() > 1 {
                warn!(
                    path,
                    owners = owners.len(),
                    "conflicting destination file; last declared entry wins"
                );
                for &slot in owners {
                    resolved[slot].report.conflicts.push(path.clone());
                }
            }
        }

        // Phase 3: cleanup of orphaned files.
        let mut deleted = Vec::new();
        for path in previous.orphans_against(&new_state) {
            if self.cancel.is_cancelled() {
                break;
            }
            match host.delete_file(Path::new(&path)).await {
                Ok(()) => deleted.push(path),
                Err(e) => warn!(path, error = %e, "failed to delete orphaned file"),
            }
        }

        if let Err(e) = new_state.save(host.as_ref()).await {
            warn!(error = %e, "failed to persist installed-file state");
        }

        let report = InstallReport {
            entries: resolved.into_iter().map(|r| r.report).collect(),
            deleted_files: deleted,
        };
        host.track_event(
            "restore/completed",
            &[
                ("entries", report.entries.len().to_string()),
                ("failed", report.failed_entries().to_string()),
                ("deleted", report.deleted_files.len().to_string()),
            ],
        );
        report
    }

    /// Remove an entry from the manifest and delete its files from disk.
    ///
    /// Files another remaining entry still selects — explicitly or through
    /// its library's default subset — are left in place; ownership
    /// transfers on the next restore. The caller persists the mutated
    /// manifest.
    pub async fn uninstall(
        &self,
        manifest: &mut Manifest,
        provider: &str,
        library: &str,
    ) -> Result<UninstallReport, UninstallError> {
        let entry = manifest.remove_entry(provider, library).ok_or_else(|| {
            UninstallError::EntryNotFound {
                provider: provider.to_string(),
                library: library.to_string(),
            }
        })?;

        let host = self.context.host();
        let mut state = InstalledState::load(host.as_ref()).await;
        let key = entry.key();

        // Resolve every remaining entry's effective file set, so entries
        // relying on their library's default subset protect their files
        // too. An entry whose set cannot be resolved claims nothing; the
        // next restore reinstates anything deleted out from under it.
        let mut still_claimed: HashSet<String> = HashSet::new();
        for remaining in &manifest.libraries {
            match self.entry_files(remaining).await {
                Ok(files) => {
                    still_claimed.extend(files.iter().map(|f| remaining.destination_file(f)));
                }
                Err(e) => warn!(
                    entry = %remaining.display_id(),
                    error = %e,
                    "could not resolve remaining entry's file set"
                ),
            }
        }

        let mut deleted = Vec::new();
        for path in state.files_owned_by(&key) {
            state.remove(&path);
            if still_claimed.contains(&path) {
                debug!(path, "file still claimed by another entry, keeping");
                continue;
            }
            match host.delete_file(Path::new(&path)).await {
                Ok(()) => deleted.push(path),
                Err(e) => warn!(path, error = %e, "failed to delete uninstalled file"),
            }
        }

        if let Err(e) = state.save(host.as_ref()).await {
            warn!(error = %e, "failed to persist installed-file state");
        }

        host.track_event(
            "library/uninstalled",
            &[
                ("library", entry.display_id()),
                ("deleted", deleted.len().to_string()),
            ],
        );

        Ok(UninstallReport {
            entry,
            deleted_files: deleted,
        })
    }

    /// All files a library offers, for completion surfaces. Read-only.
    pub async fn list_installable_files(
        &self,
        provider: &str,
        library: &str,
        version: &str,
    ) -> Result<Vec<String>, InstallError> {
        let provider =
            self.context
                .provider(provider)
                .ok_or_else(|| InstallError::UnknownProvider {
                    provider: provider.to_string(),
                })?;
        let resolved = provider.catalog().get_library(library, version).await?;
        Ok(resolved.files().map(str::to_string).collect())
    }

    /// The file set a manifest entry currently selects. Read-only.
    pub async fn entry_files(&self, entry: &ManifestEntry) -> Result<Vec<String>, InstallError> {
        if !entry.files.is_empty() {
            return Ok(entry.files.clone());
        }

        let provider =
            self.context
                .provider(&entry.provider)
                .ok_or_else(|| InstallError::UnknownProvider {
                    provider: entry.provider.clone(),
                })?;
        let catalog = provider.catalog();
        let version = if entry.is_latest() {
            catalog
                .get_latest_version(&entry.library, self.options.include_prerelease)
                .await?
        } else {
            entry.version.clone()
        };
        let library = catalog.get_library(&entry.library, &version).await?;
        Ok(library.default_files())
    }

    /// Resolve one entry: library lookup, file-set computation, content
    /// fetch. Never touches the disk.
    async fn resolve_entry(&self, index: usize, entry: &ManifestEntry) -> ResolvedEntry {
        let mut resolved = ResolvedEntry {
            report: EntryReport::new(index, entry.display_id()),
            key: entry.key(),
            files: Vec::new(),
        };
        let report = &mut resolved.report;

        report.state = EntryState::Resolving;
        debug!(library = %report.library, "resolving");

        if self.cancel.is_cancelled() {
            report.fail(InstallError::Cancelled);
            return resolved;
        }

        let Some(provider) = self.context.provider(&entry.provider) else {
            report.fail(InstallError::UnknownProvider {
                provider: entry.provider.clone(),
            });
            return resolved;
        };
        let catalog = provider.catalog();

        let version = if entry.is_latest() {
            match catalog
                .get_latest_version(&entry.library, self.options.include_prerelease)
                .await
            {
                Ok(version) => version,
                Err(e) => {
                    report.fail(e.into());
                    return resolved;
                }
            }
        } else {
            entry.version.clone()
        };
        // Reports show the resolved version, not the `latest` marker.
        report.library = format!("{}:{}@{}", entry.provider, entry.library, version);

        let library = match catalog.get_library(&entry.library, &version).await {
            Ok(library) => library,
            Err(e) => {
                report.fail(e.into());
                return resolved;
            }
        };

        report.state = EntryState::FileSetComputed;
        let selected: Vec<String> = if entry.files.is_empty() {
            library.default_files()
        } else {
            let mut keep = Vec::with_capacity(entry.files.len());
            for file in &entry.files {
                if library.contains_file(file) {
                    keep.push(file.clone());
                } else {
                    // Per-file failure; the entry only fails wholesale when
                    // nothing is left to install.
                    report.errors.push(InstallError::FileNotFoundInLibrary {
                        library: report.library.clone(),
                        path: file.clone(),
                    });
                    report.files_failed += 1;
                }
            }
            keep
        };

        if selected.is_empty() {
            report.fail(InstallError::EmptyFileSet {
                library: report.library.clone(),
            });
            return resolved;
        }

        for path in selected {
            if self.cancel.is_cancelled() {
                report.fail(InstallError::Cancelled);
                return resolved;
            }
            match catalog.fetch_file(&entry.library, &version, &path).await {
                Ok(bytes) => resolved
                    .files
                    .push((entry.destination_file(&path), bytes)),
                Err(e) => {
                    report.errors.push(e.into());
                    report.files_failed += 1;
                }
            }
        }

        if resolved.files.is_empty() {
            // Every fetch failed; there is nothing to write.
            resolved.report.state = EntryState::Failed;
        }

        resolved
    }
}
