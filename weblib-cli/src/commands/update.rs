//! Update command - change a declared library's version and reinstall.

use std::path::Path;

use weblib::install::{InstallOptions, Installer};
use weblib::manifest::LATEST_VERSION;
use weblib::provider::LibraryIdResolver;

use super::common;
use crate::error::CliError;

/// Arguments for the update command.
pub struct UpdateArgs {
    /// Combined library id; `jquery@3.4.0` pins, `jquery` floats to latest.
    pub library: String,
    pub provider: String,
    pub version: Option<String>,
    pub include_prerelease: bool,
}

/// Run the update command.
pub async fn run(manifest_path: &Path, args: UpdateArgs) -> Result<bool, CliError> {
    let context = common::context_for(manifest_path)?;
    let (name, embedded_version) =
        LibraryIdResolver::global().split(&args.provider, &args.library);
    let version = args
        .version
        .or(embedded_version)
        .unwrap_or_else(|| LATEST_VERSION.to_string());

    let mut manifest = common::load_manifest(manifest_path).await?;
    let Some(index) = manifest.entry(&args.provider, &name).map(|(i, _)| i) else {
        return Err(CliError::Usage(format!(
            "no manifest entry for {}:{}",
            args.provider, name
        )));
    };
    manifest.libraries[index].version = version;
    manifest.save_file(manifest_path).await?;

    // Reinstall the whole manifest; untouched entries are idempotent
    // up-to-date checks, and cleanup removes files the new version dropped.
    let installer = Installer::new(context).with_options(InstallOptions {
        include_prerelease: args.include_prerelease,
        ..InstallOptions::default()
    });
    common::cancel_on_ctrl_c(installer.cancellation_token());

    let report = installer.install(&manifest).await;
    Ok(common::print_report(&report))
}
