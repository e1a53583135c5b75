//! Semantic version parsing and ordering.
//!
//! Library registries are not strict about version grammar, so this type is
//! deliberately more tolerant than the published SemVer 2.0 grammar:
//!
//! - The numeric core may have more than three components (`1.2.3.4.5`);
//!   comparison continues component-wise, with shorter cores implicitly
//!   zero-padded.
//! - The prerelease and build metadata segments may appear in either order.
//!   The first `-` after the numeric core starts the prerelease segment and
//!   the first `+` starts the metadata segment; each segment runs until the
//!   other's marker or the end of the string. `1.2.3-as-df+te+st` and
//!   `1.2.3+te+st-as-df` parse to the same segments.
//!
//! # Precedence
//!
//! Numeric core first, then prerelease presence (a version with a prerelease
//! tag sorts before the same numeric version without one), then prerelease
//! identifiers (numeric vs numeric numerically, otherwise lexically), and
//! finally build metadata as a last-resort lexical tiebreak. Metadata never
//! affects precedence proper; it only makes the order total so sorting is
//! deterministic.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors produced when a version string cannot be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    /// The input was empty.
    #[error("empty version string")]
    Empty,

    /// The string starts with a `-` or `+` marker, leaving no numeric core.
    #[error("missing numeric core in '{text}'")]
    MissingCore { text: String },

    /// A core component was empty or non-numeric.
    #[error("invalid numeric component '{component}' in '{text}'")]
    InvalidComponent { component: String, text: String },

    /// The core must carry at least major and minor components.
    #[error("version core needs at least major.minor: '{text}'")]
    TooFewComponents { text: String },
}

/// A parsed semantic version.
///
/// Optional segments that were absent in the input stay absent, so
/// [`Display`](fmt::Display) reproduces the numeric core, prerelease, and
/// metadata segments exactly as parsed (in canonical `-pre+meta` order).
///
/// Equality is defined through [`Ord`]: `1.2` and `1.2.0` compare equal
/// because the missing patch component is treated as zero.
#[derive(Debug, Clone)]
pub struct SemanticVersion {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component; `None` when the core had only two parts.
    pub patch: Option<u64>,
    /// Numeric components beyond patch (4+ part versions).
    pub extra: Vec<u64>,
    /// Prerelease segment, without its leading `-`.
    pub prerelease: Option<String>,
    /// Build metadata segment, without its leading `+`.
    pub build_metadata: Option<String>,
}

impl SemanticVersion {
    /// Parse a version string.
    ///
    /// # Errors
    ///
    /// Fails only when the numeric core is missing, too short, or
    /// non-numeric. Missing optional segments are never an error.
    pub fn parse(text: &str) -> Result<Self, VersionParseError> {
        if text.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let (core, rest) = match text.find(['-', '+']) {
            Some(idx) => (&text[..idx], &text[idx..]),
            None => (text, ""),
        };

        if core.is_empty() {
            return Err(VersionParseError::MissingCore {
                text: text.to_string(),
            });
        }

        let mut parts = Vec::new();
        for component in core.split('.') {
            if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
                return Err(VersionParseError::InvalidComponent {
                    component: component.to_string(),
                    text: text.to_string(),
                });
            }
            let value = component.parse::<u64>().map_err(|_| {
                VersionParseError::InvalidComponent {
                    component: component.to_string(),
                    text: text.to_string(),
                }
            })?;
            parts.push(value);
        }

        if parts.len() < 2 {
            return Err(VersionParseError::TooFewComponents {
                text: text.to_string(),
            });
        }

        let (prerelease, build_metadata) = split_segments(rest);

        Ok(Self {
            major: parts[0],
            minor: parts[1],
            patch: parts.get(2).copied(),
            extra: if parts.len() > 3 {
                parts[3..].to_vec()
            } else {
                Vec::new()
            },
            prerelease,
            build_metadata,
        })
    }

    /// Whether this version carries a prerelease segment.
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    /// Number of components in the numeric core as written.
    fn core_len(&self) -> usize {
        match self.patch {
            Some(_) => 3 + self.extra.len(),
            None => 2,
        }
    }

    /// Core component at `index`, zero when absent.
    fn core_component(&self, index: usize) -> u64 {
        match index {
            0 => self.major,
            1 => self.minor,
            2 => self.patch.unwrap_or(0),
            _ => self.extra.get(index - 3).copied().unwrap_or(0),
        }
    }
}

/// Split the remainder after the numeric core into (prerelease, metadata).
///
/// The first `-` and the first `+` are authoritative; any later repetition of
/// either marker belongs to the segment already in progress.
fn split_segments(rest: &str) -> (Option<String>, Option<String>) {
    let dash = rest.find('-');
    let plus = rest.find('+');

    match (dash, plus) {
        (None, None) => (None, None),
        (Some(d), None) => (Some(rest[d + 1..].to_string()), None),
        (None, Some(p)) => (None, Some(rest[p + 1..].to_string())),
        (Some(d), Some(p)) if d < p => (
            Some(rest[d + 1..p].to_string()),
            Some(rest[p + 1..].to_string()),
        ),
        (Some(d), Some(p)) => (
            Some(rest[d + 1..].to_string()),
            Some(rest[p + 1..d].to_string()),
        ),
    }
}

/// Compare a single pair of prerelease identifiers.
///
/// Numeric identifiers compare numerically and sort below alphanumeric ones;
/// everything else compares lexically.
fn compare_identifier(left: &str, right: &str) -> Ordering {
    match (left.parse::<u64>(), right.parse::<u64>()) {
        (Ok(l), Ok(r)) => l.cmp(&r),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => left.cmp(right),
    }
}

/// Compare two prerelease segments as dot-separated identifier lists.
///
/// Identifiers are compared pairwise; when one segment is a prefix of the
/// other, the longer one is greater.
fn compare_prerelease(left: &str, right: &str) -> Ordering {
    let mut left_ids = left.split('.');
    let mut right_ids = right.split('.');

    loop {
        match (left_ids.next(), right_ids.next()) {
            (None, None) => return Ordering::Equal,
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (Some(l), Some(r)) => {
                let ord = compare_identifier(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        // Numeric core, shorter side zero-padded.
        let len = self.core_len().max(other.core_len());
        for index in 0..len {
            let ord = self.core_component(index).cmp(&other.core_component(index));
            if ord != Ordering::Equal {
                return ord;
            }
        }

        // A prerelease sorts before the same numeric version without one.
        match (&self.prerelease, &other.prerelease) {
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = compare_prerelease(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (None, None) => {}
        }

        // Build metadata does not affect precedence; it is only the final
        // tiebreak that makes the order total.
        match (&self.build_metadata, &other.build_metadata) {
            (None, None) => Ordering::Equal,
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (Some(l), Some(r)) => l.cmp(r),
        }
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemanticVersion {}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(patch) = self.patch {
            write!(f, ".{}", patch)?;
            for part in &self.extra {
                write!(f, ".{}", part)?;
            }
        }
        if let Some(prerelease) = &self.prerelease {
            write!(f, "-{}", prerelease)?;
        }
        if let Some(metadata) = &self.build_metadata {
            write!(f, "+{}", metadata)?;
        }
        Ok(())
    }
}

impl FromStr for SemanticVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
