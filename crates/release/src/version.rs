//! Semantic version parsing and bump arithmetic.
//!
//! Versions are written with a leading `v` everywhere the engine produces
//! them (`v1.2.3`), matching Go module tags; parsing accepts the prefix as
//! optional.

use crate::changeset::Bump;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Version assumed for a module that has never been tagged.
pub const ZERO_VERSION: &str = "v0.0.0";

/// A semantic version following the `SemVer` 2.0.0 specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    /// Major version number.
    pub major: u64,
    /// Minor version number.
    pub minor: u64,
    /// Patch version number.
    pub patch: u64,
    /// Pre-release identifier (e.g., "alpha", "beta.1").
    pub prerelease: Option<String>,
    /// Build metadata (e.g., "20230101", "commit.abc123").
    pub build: Option<String>,
}

impl Version {
    /// Create a new version.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
            build: None,
        }
    }

    /// Create a version with a pre-release identifier.
    #[must_use]
    pub fn with_prerelease(mut self, prerelease: impl Into<String>) -> Self {
        self.prerelease = Some(prerelease.into());
        self
    }

    /// Apply a bump to this version.
    ///
    /// `major` zeroes minor and patch, `minor` zeroes patch. Pre-release and
    /// build metadata are dropped. Returns `None` when the bumped component
    /// is already `u64::MAX`.
    #[must_use]
    pub fn bump(&self, bump: Bump) -> Option<Self> {
        match bump {
            Bump::Major => Some(Self::new(self.major.checked_add(1)?, 0, 0)),
            Bump::Minor => Some(Self::new(self.major, self.minor.checked_add(1)?, 0)),
            Bump::Patch => Some(Self::new(self.major, self.minor, self.patch.checked_add(1)?)),
        }
    }

    /// Format with the `v` prefix used by tags and release records.
    #[must_use]
    pub fn to_tag_string(&self) -> String {
        format!("v{self}")
    }
}

fn parse_component(part: &str, original: &str) -> Result<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::invalid_version("", original));
    }
    part.parse()
        .map_err(|_| Error::invalid_version("", original))
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let original = s;
        let s = s.trim();
        let s = s.strip_prefix('v').unwrap_or(s);

        let (version_pre, build) = match s.split_once('+') {
            Some((v, b)) if !b.is_empty() => (v, Some(b.to_string())),
            Some(_) => return Err(Error::invalid_version("", original)),
            None => (s, None),
        };

        let (version, prerelease) = match version_pre.split_once('-') {
            Some((v, p)) if !p.is_empty() => (v, Some(p.to_string())),
            Some(_) => return Err(Error::invalid_version("", original)),
            None => (version_pre, None),
        };

        let parts: Vec<&str> = version.split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(Error::invalid_version("", original));
        };

        Ok(Self {
            major: parse_component(major, original)?,
            minor: parse_component(minor, original)?,
            patch: parse_component(patch, original)?,
            prerelease,
            build,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref pre) = self.prerelease {
            write!(f, "-{pre}")?;
        }
        if let Some(ref build) = self.build {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                // Pre-release versions have lower precedence
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => compare_prerelease(a, b).then_with(|| a.cmp(b)),
            })
            // Build metadata carries no precedence; compare it last to stay consistent with Eq
            .then_with(|| self.build.cmp(&other.build))
    }
}

fn numeric_identifier(ident: &str) -> Option<u64> {
    if ident.is_empty() || !ident.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    ident.parse().ok()
}

/// Compare dot-separated pre-release identifiers: numeric ones numerically
/// and below alphanumeric ones, a shorter list of equal identifiers first.
fn compare_prerelease(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (numeric_identifier(x), numeric_identifier(y)) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Apply `bump` to a `v`-prefixed version string for `module`.
///
/// # Errors
///
/// Returns [`Error::InvalidVersion`] naming `module` if `current` is not a
/// semantic version or the bumped component would overflow.
pub fn increment(module: &str, current: &str, bump: Bump) -> Result<String> {
    let version: Version = current
        .parse()
        .map_err(|_| Error::invalid_version(module, current))?;
    version
        .bump(bump)
        .map(|next| next.to_tag_string())
        .ok_or_else(|| Error::invalid_version(module, current))
}
