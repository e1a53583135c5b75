//! Restore command - install everything the manifest declares.

use std::path::Path;

use weblib::install::{InstallOptions, Installer};

use super::common;
use crate::error::CliError;

/// Arguments for the restore command.
pub struct RestoreArgs {
    pub force: bool,
    pub include_prerelease: bool,
    pub fan_out: usize,
}

/// Run the restore command.
pub async fn run(manifest_path: &Path, args: RestoreArgs) -> Result<bool, CliError> {
    let manifest = common::load_manifest(manifest_path).await?;
    let context = common::context_for(manifest_path)?;

    let installer = Installer::new(context).with_options(InstallOptions {
        force: args.force,
        fan_out: args.fan_out,
        include_prerelease: args.include_prerelease,
    });
    common::print_validation(&installer.validate_manifest(&manifest));
    common::cancel_on_ctrl_c(installer.cancellation_token());

    let report = installer.install(&manifest).await;
    Ok(common::print_report(&report))
}
