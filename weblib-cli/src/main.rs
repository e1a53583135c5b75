//! weblib CLI - manage client-side web libraries from the terminal.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use commands::install::InstallArgs;
use commands::restore::RestoreArgs;
use commands::update::UpdateArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "weblib")]
#[command(about = "Acquire and install client-side web libraries", version)]
struct Cli {
    /// Path to the manifest file
    #[arg(long, global = true, default_value = weblib::manifest::DEFAULT_MANIFEST_NAME)]
    manifest: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty manifest
    Init {
        /// Overwrite an existing manifest
        #[arg(long)]
        force: bool,
    },

    /// Install every library the manifest declares
    Restore {
        /// Rewrite files even when on-disk content already matches
        #[arg(long)]
        force: bool,

        /// Let `latest` resolve to prerelease versions
        #[arg(long)]
        include_prerelease: bool,

        /// Maximum number of libraries resolving concurrently
        #[arg(long, default_value_t = weblib::install::DEFAULT_FAN_OUT)]
        fan_out: usize,
    },

    /// Add a library to the manifest and install it
    Install {
        /// Library id, optionally with a version (`jquery@3.3.1`)
        library: String,

        /// Provider to resolve the library against
        #[arg(long, default_value = "cdn")]
        provider: String,

        /// Exact version (overrides a version embedded in the id)
        #[arg(long)]
        version: Option<String>,

        /// Destination directory (defaults to `lib/<name>`)
        #[arg(long)]
        destination: Option<String>,

        /// Restrict the install to specific files (repeatable)
        #[arg(long = "file")]
        files: Vec<String>,

        /// Let `latest` resolve to prerelease versions
        #[arg(long)]
        include_prerelease: bool,
    },

    /// Remove a library from the manifest and delete its files
    Uninstall {
        /// Library id
        library: String,

        /// Provider the library was installed from
        #[arg(long, default_value = "cdn")]
        provider: String,
    },

    /// Change a declared library's version and reinstall
    Update {
        /// Library id, optionally with the new version (`jquery@3.4.0`)
        library: String,

        /// Provider the library was installed from
        #[arg(long, default_value = "cdn")]
        provider: String,

        /// New version (defaults to `latest`)
        #[arg(long)]
        version: Option<String>,

        /// Let `latest` resolve to prerelease versions
        #[arg(long)]
        include_prerelease: bool,
    },

    /// Search a provider's catalog by name prefix
    Search {
        /// Name prefix to search for
        query: String,

        /// Provider to search
        #[arg(long, default_value = "cdn")]
        provider: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result: Result<bool, CliError> = match cli.command {
        Commands::Init { force } => commands::init::run(&cli.manifest, force).await,
        Commands::Restore {
            force,
            include_prerelease,
            fan_out,
        } => {
            commands::restore::run(
                &cli.manifest,
                RestoreArgs {
                    force,
                    include_prerelease,
                    fan_out,
                },
            )
            .await
        }
        Commands::Install {
            library,
            provider,
            version,
            destination,
            files,
            include_prerelease,
        } => {
            commands::install::run(
                &cli.manifest,
                InstallArgs {
                    library,
                    provider,
                    version,
                    destination,
                    files,
                    include_prerelease,
                },
            )
            .await
        }
        Commands::Uninstall { library, provider } => {
            commands::uninstall::run(&cli.manifest, &provider, &library).await
        }
        Commands::Update {
            library,
            provider,
            version,
            include_prerelease,
        } => {
            commands::update::run(
                &cli.manifest,
                UpdateArgs {
                    library,
                    provider,
                    version,
                    include_prerelease,
                },
            )
            .await
        }
        Commands::Search { query, provider } => {
            commands::search::run(&cli.manifest, &provider, &query).await
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    #[test]
    fn test_cli_declaration_is_consistent() {
        super::Cli::command().debug_assert();
    }
}
