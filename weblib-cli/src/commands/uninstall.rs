//! Uninstall command - remove a library and delete its files.

use std::path::Path;

use weblib::install::Installer;
use weblib::provider::LibraryIdResolver;

use super::common;
use crate::error::CliError;

/// Run the uninstall command.
pub async fn run(manifest_path: &Path, provider: &str, library: &str) -> Result<bool, CliError> {
    let context = common::context_for(manifest_path)?;
    // Accept `jquery@3.3.1` as well as `jquery`; the entry is keyed by name.
    let (name, _) = LibraryIdResolver::global().split(provider, library);

    let mut manifest = common::load_manifest(manifest_path).await?;
    let installer = Installer::new(context);

    let report = installer.uninstall(&mut manifest, provider, &name).await?;
    manifest.save_file(manifest_path).await?;

    println!("Removed {}", report.entry.display_id());
    for path in &report.deleted_files {
        println!("  deleted {}", path);
    }
    Ok(true)
}
