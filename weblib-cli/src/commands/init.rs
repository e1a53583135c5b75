//! Init command - create an empty manifest.

use std::path::Path;

use weblib::manifest::Manifest;

use crate::error::CliError;

/// Run the init command.
pub async fn run(manifest_path: &Path, force: bool) -> Result<bool, CliError> {
    if manifest_path.exists() && !force {
        return Err(CliError::Usage(format!(
            "'{}' already exists (use --force to overwrite)",
            manifest_path.display()
        )));
    }

    Manifest::new().save_file(manifest_path).await?;
    println!("Created {}", manifest_path.display());
    println!("Add libraries with `weblib install <library>`.");
    Ok(true)
}
