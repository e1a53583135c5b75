//! Search command - query a provider's catalog by name prefix.

use std::path::Path;

use super::common;
use crate::error::CliError;

/// Run the search command.
pub async fn run(manifest_path: &Path, provider: &str, query: &str) -> Result<bool, CliError> {
    let context = common::context_for(manifest_path)?;
    let Some(provider) = context.provider(provider) else {
        return Err(CliError::Usage(format!("unknown provider '{}'", provider)));
    };

    let hits = provider.catalog().search(query).await?;
    if hits.is_empty() {
        println!("No libraries matching '{}'", query);
    } else {
        for hit in hits {
            println!("{}", hit);
        }
    }
    Ok(true)
}
