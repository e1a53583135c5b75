//! Manifest validation.
//!
//! Validation flags problems without fixing them: conflicts are surfaced
//! once per owning entry and installation still proceeds (last declared
//! entry wins on disk), unknown providers and malformed versions are
//! reported so the host can present them before a restore runs.

use std::collections::BTreeMap;
use std::fmt;

use super::{Manifest, ManifestEntry};
use crate::version::SemanticVersion;

/// A non-fatal problem found in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// Two or more entries claim the same destination file. Reported once
    /// per owning entry.
    Conflict {
        /// Index of the owning entry.
        entry: usize,
        /// Project-relative path both entries want to write.
        destination_file: String,
    },

    /// The entry names a provider that is not registered.
    UnknownProvider { entry: usize, provider: String },

    /// The entry's version string does not parse (and is not `latest`).
    InvalidVersion {
        entry: usize,
        version: String,
        reason: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict {
                entry,
                destination_file,
            } => {
                write!(
                    f,
                    "entry {}: '{}' is also installed by another entry (last declared wins)",
                    entry, destination_file
                )
            }
            Self::UnknownProvider { entry, provider } => {
                write!(f, "entry {}: unknown provider '{}'", entry, provider)
            }
            Self::InvalidVersion {
                entry,
                version,
                reason,
            } => {
                write!(f, "entry {}: invalid version '{}': {}", entry, version, reason)
            }
        }
    }
}

/// Validate a manifest against the registered provider ids.
///
/// Conflict detection here only sees explicitly listed files; entries that
/// rely on a library's default subset are checked again by the engine once
/// their file sets are resolved.
pub fn validate(manifest: &Manifest, known_providers: &[&str]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for (index, entry) in manifest.libraries.iter().enumerate() {
        if !known_providers.contains(&entry.provider.as_str()) {
            issues.push(ValidationIssue::UnknownProvider {
                entry: index,
                provider: entry.provider.clone(),
            });
        }

        if !entry.is_latest() {
            if let Err(e) = SemanticVersion::parse(&entry.version) {
                issues.push(ValidationIssue::InvalidVersion {
                    entry: index,
                    version: entry.version.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    issues.extend(find_conflicts(&manifest.libraries));
    issues
}

/// Find destination files claimed by more than one entry, reporting each
/// conflicting file once per owning entry, in declaration order.
pub(crate) fn find_conflicts(entries: &[ManifestEntry]) -> Vec<ValidationIssue> {
    let mut claims: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (index, entry) in entries.iter().enumerate() {
        for file in &entry.files {
            claims
                .entry(entry.destination_file(file))
                .or_default()
                .push(index);
        }
    }

    let mut issues = Vec::new();
    for (destination_file, owners) in claims {
        if owners.len() < 2 {
            continue;
        }
        for entry in owners {
            issues.push(ValidationIssue::Conflict {
                entry,
                destination_file: destination_file.clone(),
            });
        }
    }
    issues
}
