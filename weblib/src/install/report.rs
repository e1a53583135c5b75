//! Install result reporting.
//!
//! Entry-level failures are collected into a per-operation report rather
//! than raised as one aggregate error: each manifest entry is independent,
//! so one failed resolution must not hide the outcome of its siblings.

use std::fmt;

use thiserror::Error;

use crate::provider::ProviderError;

/// Lifecycle of one manifest entry during installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Not yet picked up.
    Pending,
    /// Resolving the library against its provider's catalog.
    Resolving,
    /// File set resolved and content fetched.
    FileSetComputed,
    /// Writing files to the destination.
    Writing,
    /// All resolved files are on disk.
    Installed,
    /// The entry failed; siblings are unaffected.
    Failed,
}

impl EntryState {
    /// Human-readable name for the state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Resolving => "Resolving",
            Self::FileSetComputed => "File set computed",
            Self::Writing => "Writing",
            Self::Installed => "Installed",
            Self::Failed => "Failed",
        }
    }
}

/// Errors attributed to a single entry or a single file of an entry.
///
/// Cloneable so reports can be shared across task boundaries.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InstallError {
    /// The entry's provider is not registered in the context.
    #[error("provider '{provider}' is not registered")]
    UnknownProvider { provider: String },

    /// Catalog resolution failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// An explicitly requested file does not exist in the library.
    #[error("file '{path}' not found in library {library}")]
    FileNotFoundInLibrary { library: String, path: String },

    /// After subsetting, nothing is left to install.
    #[error("no installable files resolved for {library}")]
    EmptyFileSet { library: String },

    /// A destination file could not be written.
    #[error("failed to write '{path}': {message}")]
    WriteFailed { path: String, message: String },

    /// The operation was cancelled before this entry finished.
    #[error("installation cancelled")]
    Cancelled,
}

/// Outcome of one manifest entry.
#[derive(Debug, Clone)]
pub struct EntryReport {
    /// Declaration index of the entry in the manifest.
    pub index: usize,
    /// Display id (`provider:library@version`).
    pub library: String,
    /// Final state.
    pub state: EntryState,
    /// Entry- and file-level errors, in occurrence order.
    pub errors: Vec<InstallError>,
    /// Destination files this entry shares with another entry. Non-fatal:
    /// the later declared entry's content ends up on disk.
    pub conflicts: Vec<String>,
    /// Files written this run.
    pub files_written: usize,
    /// Files already on disk with identical content.
    pub files_up_to_date: usize,
    /// Files that failed to fetch or write.
    pub files_failed: usize,
}

impl EntryReport {
    pub(crate) fn new(index: usize, library: String) -> Self {
        Self {
            index,
            library,
            state: EntryState::Pending,
            errors: Vec::new(),
            conflicts: Vec::new(),
            files_written: 0,
            files_up_to_date: 0,
            files_failed: 0,
        }
    }

    pub(crate) fn fail(&mut self, error: InstallError) {
        self.state = EntryState::Failed;
        self.errors.push(error);
    }

    /// Whether the entry installed completely.
    pub fn success(&self) -> bool {
        self.state == EntryState::Installed && self.files_failed == 0
    }
}

/// Outcome of a whole install/restore run, in manifest declaration order.
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    /// Per-entry outcomes.
    pub entries: Vec<EntryReport>,
    /// Orphaned files removed by the cleanup pass.
    pub deleted_files: Vec<String>,
}

impl InstallReport {
    /// Whether every entry installed completely.
    pub fn success(&self) -> bool {
        self.entries.iter().all(EntryReport::success)
    }

    /// Number of entries that ended in [`EntryState::Failed`].
    pub fn failed_entries(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.state == EntryState::Failed)
            .count()
    }

    /// Total files written across all entries.
    pub fn files_written(&self) -> usize {
        self.entries.iter().map(|e| e.files_written).sum()
    }
}

impl fmt::Display for InstallReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(
                f,
                "{}: {} ({} written, {} up to date, {} failed)",
                entry.library,
                entry.state.name(),
                entry.files_written,
                entry.files_up_to_date,
                entry.files_failed
            )?;
            for error in &entry.errors {
                writeln!(f, "  error: {}", error)?;
            }
            for conflict in &entry.conflicts {
                writeln!(f, "  conflict: {}", conflict)?;
            }
        }
        if !self.deleted_files.is_empty() {
            writeln!(f, "cleaned up {} orphaned file(s)", self.deleted_files.len())?;
        }
        Ok(())
    }
}
