//! Shared plumbing for CLI commands.

use std::io;
use std::path::Path;
use std::sync::Arc;

use console::style;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use weblib::install::InstallReport;
use weblib::manifest::{Manifest, SchemaError, ValidationIssue};
use weblib::registry::{DependencyContext, DependencyRegistry};

use crate::error::CliError;

/// Load the manifest, turning "file not found" into a usage hint.
pub async fn load_manifest(path: &Path) -> Result<Manifest, CliError> {
    match Manifest::load_file(path).await {
        Ok(manifest) => Ok(manifest),
        Err(SchemaError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
            Err(CliError::Usage(format!(
                "no manifest at '{}'; run `weblib init` first",
                path.display()
            )))
        }
        Err(e) => Err(e.into()),
    }
}

/// Build the dependency context for a manifest path with the built-in
/// provider set.
pub fn context_for(manifest_path: &Path) -> Result<Arc<DependencyContext>, CliError> {
    let registry = DependencyRegistry::with_default_providers();
    Ok(registry.get_or_create(manifest_path)?)
}

/// Cancel the token on Ctrl-C. Files already written stay in place.
pub fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            eprintln!("\ninterrupted, stopping after the current step");
            token.cancel();
        }
    });
}

/// Print validation warnings before a restore runs.
pub fn print_validation(issues: &[ValidationIssue]) {
    for issue in issues {
        debug!(%issue, "manifest validation issue");
        println!("{} {}", style("warning:").yellow().bold(), issue);
    }
}

/// Print an install report; returns whether every entry succeeded.
pub fn print_report(report: &InstallReport) -> bool {
    for entry in &report.entries {
        let state = if entry.success() {
            style(entry.state.name()).green()
        } else {
            style(entry.state.name()).red()
        };
        println!(
            "{}  {} ({} written, {} up to date)",
            entry.library, state, entry.files_written, entry.files_up_to_date
        );
        for error in &entry.errors {
            println!("  {} {}", style("error:").red().bold(), error);
        }
        for conflict in &entry.conflicts {
            println!(
                "  {} '{}' is shared with another entry (last declared wins)",
                style("warning:").yellow().bold(),
                conflict
            );
        }
    }
    if !report.deleted_files.is_empty() {
        println!("removed {} orphaned file(s)", report.deleted_files.len());
    }
    debug!(
        entries = report.entries.len(),
        failed = report.failed_entries(),
        written = report.files_written(),
        deleted = report.deleted_files.len(),
        "install run finished"
    );
    report.success()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_manifest_missing_file_is_usage_hint() {
        let dir = tempfile::tempdir().unwrap();

        let err = load_manifest(&dir.path().join("weblib.json"))
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::Usage(_)));
        assert!(err.to_string().contains("weblib init"));
    }

    #[tokio::test]
    async fn test_load_manifest_rejects_malformed_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weblib.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let err = load_manifest(&path).await.unwrap_err();
        assert!(matches!(err, CliError::Manifest(_)));
    }

    #[test]
    fn test_context_roots_at_manifest_directory() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("weblib.json");

        let context = context_for(&manifest).unwrap();

        let host = context.host();
        assert_eq!(host.root(), dir.path());
        assert!(context.provider("cdn").is_some());
        assert!(context.provider("filesystem").is_some());
    }
}
