//! Install command - add a library to the manifest and install it.

use std::path::Path;

use weblib::install::{InstallOptions, Installer};
use weblib::manifest::{Manifest, ManifestEntry, LATEST_VERSION};
use weblib::provider::LibraryIdResolver;

use super::common;
use crate::error::CliError;

/// Arguments for the install command.
pub struct InstallArgs {
    /// Combined library id, optionally carrying a version (`jquery@3.3.1`).
    pub library: String,
    pub provider: String,
    pub version: Option<String>,
    pub destination: Option<String>,
    pub files: Vec<String>,
    pub include_prerelease: bool,
}

/// Run the install command.
pub async fn run(manifest_path: &Path, args: InstallArgs) -> Result<bool, CliError> {
    // Context first: it registers each provider's id scheme, which decides
    // how the combined id splits.
    let context = common::context_for(manifest_path)?;
    let (name, embedded_version) =
        LibraryIdResolver::global().split(&args.provider, &args.library);
    let version = args
        .version
        .or(embedded_version)
        .unwrap_or_else(|| LATEST_VERSION.to_string());
    let destination = args
        .destination
        .unwrap_or_else(|| format!("lib/{}", name.rsplit('/').next().unwrap_or(&name)));

    let mut manifest = if manifest_path.exists() {
        common::load_manifest(manifest_path).await?
    } else {
        Manifest::new()
    };

    let entry = ManifestEntry {
        provider: args.provider.clone(),
        library: name.clone(),
        version,
        destination,
        files: args.files,
    };
    // Re-installing an already declared library replaces its entry in place,
    // keeping its declaration order.
    match manifest.entry(&args.provider, &name).map(|(i, _)| i) {
        Some(index) => manifest.libraries[index] = entry,
        None => manifest.libraries.push(entry),
    }
    manifest.save_file(manifest_path).await?;

    let installer = Installer::new(context).with_options(InstallOptions {
        include_prerelease: args.include_prerelease,
        ..InstallOptions::default()
    });
    common::print_validation(&installer.validate_manifest(&manifest));
    common::cancel_on_ctrl_c(installer.cancellation_token());

    let report = installer.install(&manifest).await;
    Ok(common::print_report(&report))
}
