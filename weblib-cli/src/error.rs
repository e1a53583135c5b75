//! CLI error type.

use std::fmt;
use std::io;

use weblib::install::UninstallError;
use weblib::manifest::SchemaError;
use weblib::provider::ProviderError;
use weblib::registry::RegistryError;

/// Errors surfaced to the terminal.
///
/// Per-entry installation failures are not errors at this level; they are
/// printed from the install report and reflected in the exit code.
#[derive(Debug)]
pub enum CliError {
    /// The manifest could not be loaded or saved.
    Manifest(SchemaError),
    /// The dependency context could not be constructed.
    Registry(RegistryError),
    /// Uninstall targeted an entry that does not exist.
    Uninstall(UninstallError),
    /// A direct catalog query failed.
    Provider(ProviderError),
    /// Bad invocation or missing prerequisite (e.g. no manifest yet).
    Usage(String),
    /// Plain IO failure.
    Io(io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manifest(e) => write!(f, "{}", e),
            Self::Registry(e) => write!(f, "{}", e),
            Self::Uninstall(e) => write!(f, "{}", e),
            Self::Provider(e) => write!(f, "{}", e),
            Self::Usage(message) => write!(f, "{}", message),
            Self::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        Self::Manifest(e)
    }
}

impl From<RegistryError> for CliError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

impl From<UninstallError> for CliError {
    fn from(e: UninstallError) -> Self {
        Self::Uninstall(e)
    }
}

impl From<ProviderError> for CliError {
    fn from(e: ProviderError) -> Self {
        Self::Provider(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
