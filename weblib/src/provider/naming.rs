//! Combined library id naming.
//!
//! The CLI and completion surfaces deal in combined id strings like
//! `jquery@3.3.1`; how such a string splits into name and version depends on
//! the provider's [`IdScheme`]. This module is the single source of truth
//! for that mapping. The scheme table is process-wide and populated once per
//! provider when a dependency context is first constructed.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use super::types::{IdScheme, Provider};

static GLOBAL: OnceLock<LibraryIdResolver> = OnceLock::new();

/// Process-wide resolver for combined `name@version` id strings.
pub struct LibraryIdResolver {
    schemes: RwLock<HashMap<String, IdScheme>>,
}

impl LibraryIdResolver {
    fn new() -> Self {
        Self {
            schemes: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide resolver instance.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::new)
    }

    /// Register the id scheme of every provider in a context.
    ///
    /// Idempotent; later contexts never change a scheme registered by an
    /// earlier one.
    pub fn ensure_initialized(&self, providers: &[Arc<dyn Provider>]) {
        let mut schemes = self.schemes.write();
        for provider in providers {
            schemes
                .entry(provider.id().to_string())
                .or_insert_with(|| provider.id_scheme());
        }
    }

    /// Scheme registered for a provider; unknown providers default to
    /// versioned ids.
    pub fn scheme(&self, provider_id: &str) -> IdScheme {
        self.schemes
            .read()
            .get(provider_id)
            .copied()
            .unwrap_or(IdScheme::Versioned)
    }

    /// Split a combined id into `(name, version)`.
    ///
    /// For versioned schemes the version follows the last `@` (so scoped
    /// names like `@scope/pkg@1.0.0` split correctly); path schemes never
    /// embed a version.
    pub fn split(&self, provider_id: &str, combined: &str) -> (String, Option<String>) {
        match self.scheme(provider_id) {
            IdScheme::Path => (combined.to_string(), None),
            IdScheme::Versioned => match combined.rfind('@') {
                Some(idx) if idx > 0 => (
                    combined[..idx].to_string(),
                    Some(combined[idx + 1..].to_string()),
                ),
                _ => (combined.to_string(), None),
            },
        }
    }

    /// Combine a name and version into the provider's combined id form.
    pub fn combine(&self, provider_id: &str, name: &str, version: &str) -> String {
        match self.scheme(provider_id) {
            IdScheme::Path => name.to_string(),
            IdScheme::Versioned => format!("{}@{}", name, version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver_with(provider_id: &str, scheme: IdScheme) -> LibraryIdResolver {
        let resolver = LibraryIdResolver::new();
        resolver
            .schemes
            .write()
            .insert(provider_id.to_string(), scheme);
        resolver
    }

    #[test]
    fn test_split_versioned_id() {
        let resolver = resolver_with("cdn", IdScheme::Versioned);

        assert_eq!(
            resolver.split("cdn", "jquery@3.3.1"),
            ("jquery".to_string(), Some("3.3.1".to_string()))
        );
        assert_eq!(
            resolver.split("cdn", "@scope/pkg@1.0.0"),
            ("@scope/pkg".to_string(), Some("1.0.0".to_string()))
        );
        assert_eq!(resolver.split("cdn", "jquery"), ("jquery".to_string(), None));
    }

    #[test]
    fn test_split_path_id_keeps_at_signs() {
        let resolver = resolver_with("filesystem", IdScheme::Path);

        assert_eq!(
            resolver.split("filesystem", "vendor/lib@2"),
            ("vendor/lib@2".to_string(), None)
        );
    }

    #[test]
    fn test_combine_matches_scheme() {
        let resolver = resolver_with("filesystem", IdScheme::Path);

        assert_eq!(resolver.combine("cdn", "jquery", "3.3.1"), "jquery@3.3.1");
        assert_eq!(
            resolver.combine("filesystem", "vendor/lib", "3.3.1"),
            "vendor/lib"
        );
    }

    #[test]
    fn test_unknown_provider_defaults_to_versioned() {
        let resolver = LibraryIdResolver::new();
        assert_eq!(resolver.scheme("mystery"), IdScheme::Versioned);
    }
}
