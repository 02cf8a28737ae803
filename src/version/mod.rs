//! Package versions and version ranges.
//!
//! This module models NuGet package versions ([`NuGetVersion`]) and the ranges that
//! dependency declarations use to constrain them ([`VersionRange`]). Both are pure,
//! immutable value types consumed throughout the resolver and the package rules.
//!
//! # Version Format
//!
//! A version has up to four numeric parts, optional release labels and optional
//! build metadata:
//!
//! | Input | Normalized | Prerelease |
//! |-------|------------|------------|
//! | `1.0` | `1.0.0` | no |
//! | `1.2.3.4` | `1.2.3.4` | no |
//! | `1.0.0-beta.2` | `1.0.0-beta.2` | yes |
//! | `2.0.0-rc1+sha.5114f85` | `2.0.0-rc1` | yes |
//!
//! Build metadata never participates in equality or ordering.
//!
//! # Ordering
//!
//! Numeric parts are compared first. A stable version sorts above every prerelease of
//! the same numeric version. Release labels are compared piecewise: numeric labels
//! numerically, alphanumeric labels case-insensitively, and a numeric label sorts
//! below an alphanumeric one. When one label list is a prefix of the other, the
//! shorter list sorts first.
//!
//! # Examples
//!
//! ```rust,no_run
//! use nuresolve_cli::version::{NuGetVersion, VersionRange};
//!
//! let range = VersionRange::parse("[1.0, 2.0)")?;
//! assert!(range.satisfies(&NuGetVersion::parse("1.5.0")?));
//! assert!(!range.satisfies(&NuGetVersion::parse("1.5.0-beta")?));
//! # Ok::<(), anyhow::Error>(())
//! ```

mod range;

pub use range::{RangeParseError, VersionRange};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing a [`NuGetVersion`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    /// The input was empty or whitespace only
    #[error("Version string is empty")]
    Empty,

    /// The numeric part of the version is malformed
    #[error("'{input}' is not a valid version string")]
    Malformed {
        /// The rejected input
        input: String,
    },

    /// A release label contains characters outside `[0-9A-Za-z-]` or is empty
    #[error("'{input}' contains an invalid release label '{label}'")]
    InvalidLabel {
        /// The rejected input
        input: String,
        /// The offending label
        label: String,
    },

    /// The build metadata is not a valid dot-separated identifier list
    #[error("'{input}' contains invalid build metadata '{metadata}'")]
    InvalidMetadata {
        /// The rejected input
        input: String,
        /// The offending metadata
        metadata: String,
    },
}

/// A concrete package version.
///
/// Equality and hashing ignore build metadata and compare release labels
/// case-insensitively, so `1.0.0-Beta+abc` equals `1.0.0-beta`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NuGetVersion {
    parts: [u64; 4],
    release_labels: Vec<String>,
    metadata: Option<String>,
}

impl NuGetVersion {
    /// Creates a stable three-part version.
    #[must_use]
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self::with_revision(major, minor, patch, 0)
    }

    /// Creates a stable four-part version.
    #[must_use]
    pub fn with_revision(major: u64, minor: u64, patch: u64, revision: u64) -> Self {
        Self {
            parts: [major, minor, patch, revision],
            release_labels: Vec::new(),
            metadata: None,
        }
    }

    /// Parses a version string such as `1.0`, `1.2.3.4` or `1.0.0-beta.1+meta`.
    ///
    /// # Errors
    ///
    /// Returns [`VersionParseError`] when the numeric part does not contain one to
    /// four dot-separated integers, or when labels or metadata contain characters
    /// outside the identifier alphabet.
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let (rest, metadata) = match trimmed.split_once('+') {
            Some((rest, meta)) => (rest, Some(meta)),
            None => (trimmed, None),
        };
        let (numeric, release) = match rest.split_once('-') {
            Some((numeric, release)) => (numeric, Some(release)),
            None => (rest, None),
        };

        let malformed = || VersionParseError::Malformed {
            input: trimmed.to_string(),
        };

        let segments: Vec<&str> = numeric.split('.').collect();
        if segments.is_empty() || segments.len() > 4 {
            return Err(malformed());
        }
        let mut parts = [0u64; 4];
        for (slot, segment) in parts.iter_mut().zip(&segments) {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            *slot = segment.parse().map_err(|_| malformed())?;
        }

        let mut release_labels = Vec::new();
        if let Some(release) = release {
            for label in release.split('.') {
                // semver's build identifiers share the NuGet label alphabet and,
                // unlike prerelease identifiers, tolerate leading zeros (`beta.01`).
                if semver::BuildMetadata::new(label).is_err() {
                    return Err(VersionParseError::InvalidLabel {
                        input: trimmed.to_string(),
                        label: label.to_string(),
                    });
                }
                release_labels.push(label.to_string());
            }
        }

        if let Some(meta) = metadata
            && semver::BuildMetadata::new(meta).is_err()
        {
            return Err(VersionParseError::InvalidMetadata {
                input: trimmed.to_string(),
                metadata: meta.to_string(),
            });
        }

        Ok(Self {
            parts,
            release_labels,
            metadata: metadata.map(str::to_string),
        })
    }

    /// Returns a copy of this version carrying the given release labels.
    #[must_use]
    pub fn with_release_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.release_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Major version component.
    #[must_use]
    pub const fn major(&self) -> u64 {
        self.parts[0]
    }

    /// Minor version component.
    #[must_use]
    pub const fn minor(&self) -> u64 {
        self.parts[1]
    }

    /// Patch version component.
    #[must_use]
    pub const fn patch(&self) -> u64 {
        self.parts[2]
    }

    /// Fourth (legacy) version component.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.parts[3]
    }

    /// Release labels in declaration order.
    #[must_use]
    pub fn release_labels(&self) -> &[String] {
        &self.release_labels
    }

    /// Release labels joined with `.`; empty for stable versions.
    #[must_use]
    pub fn release(&self) -> String {
        self.release_labels.join(".")
    }

    /// Build metadata, if present.
    #[must_use]
    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    /// Whether this version has release labels.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        !self.release_labels.is_empty()
    }

    /// Whether this version needs SemVer 2.0.0 support to be understood.
    ///
    /// Dotted release labels and build metadata are both SemVer 2.0.0 features that
    /// legacy clients reject.
    #[must_use]
    pub fn is_semver2(&self) -> bool {
        self.release_labels.len() > 1 || self.metadata.is_some()
    }

    /// Normalized form: three parts (four when the revision is non-zero) plus labels.
    #[must_use]
    pub fn to_normalized_string(&self) -> String {
        let mut out = format!("{}.{}.{}", self.parts[0], self.parts[1], self.parts[2]);
        if self.parts[3] != 0 {
            out.push_str(&format!(".{}", self.parts[3]));
        }
        if self.is_prerelease() {
            out.push('-');
            out.push_str(&self.release());
        }
        out
    }

    /// Normalized form including build metadata.
    #[must_use]
    pub fn to_full_string(&self) -> String {
        match &self.metadata {
            Some(meta) => format!("{}+{meta}", self.to_normalized_string()),
            None => self.to_normalized_string(),
        }
    }
}

fn compare_label(left: &str, right: &str) -> Ordering {
    match (left.parse::<u64>(), right.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => {
            left.to_ascii_lowercase().cmp(&right.to_ascii_lowercase())
        }
    }
}

fn compare_release_labels(left: &[String], right: &[String]) -> Ordering {
    match (left.is_empty(), right.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }
    for (a, b) in left.iter().zip(right) {
        let ordering = compare_label(a, b);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    left.len().cmp(&right.len())
}

impl Ord for NuGetVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts
            .cmp(&other.parts)
            .then_with(|| compare_release_labels(&self.release_labels, &other.release_labels))
    }
}

impl PartialOrd for NuGetVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for NuGetVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NuGetVersion {}

impl Hash for NuGetVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts.hash(state);
        for label in &self.release_labels {
            // Numeric labels compare by value, so "01" and "1" must hash alike.
            match label.parse::<u64>() {
                Ok(number) => number.hash(state),
                Err(_) => label.to_ascii_lowercase().hash(state),
            }
        }
    }
}

impl fmt::Display for NuGetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_normalized_string())
    }
}

impl FromStr for NuGetVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NuGetVersion {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NuGetVersion> for String {
    fn from(value: NuGetVersion) -> Self {
        value.to_full_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> NuGetVersion {
        NuGetVersion::parse(s).unwrap()
    }

    #[test]
    fn test_parse_part_counts() {
        assert_eq!(v("1").to_normalized_string(), "1.0.0");
        assert_eq!(v("1.2").to_normalized_string(), "1.2.0");
        assert_eq!(v("1.2.3").to_normalized_string(), "1.2.3");
        assert_eq!(v("1.2.3.4").to_normalized_string(), "1.2.3.4");
        assert_eq!(v("1.2.3.0").to_normalized_string(), "1.2.3");
    }

    #[test]
    fn test_parse_labels_and_metadata() {
        let version = v("2.0.0-rc.1+sha.5114f85");
        assert_eq!(version.release_labels(), &["rc".to_string(), "1".to_string()]);
        assert_eq!(version.metadata(), Some("sha.5114f85"));
        assert!(version.is_prerelease());
        assert!(version.is_semver2());
        assert_eq!(version.to_string(), "2.0.0-rc.1");
        assert_eq!(version.to_full_string(), "2.0.0-rc.1+sha.5114f85");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(NuGetVersion::parse("  "), Err(VersionParseError::Empty));
        assert!(NuGetVersion::parse("1.2.3.4.5").is_err());
        assert!(NuGetVersion::parse("1..2").is_err());
        assert!(NuGetVersion::parse("v1.0").is_err());
        assert!(NuGetVersion::parse("1.0-").is_err());
        assert!(NuGetVersion::parse("1.0-beta_1").is_err());
        assert!(NuGetVersion::parse("1.0+").is_err());
    }

    #[test]
    fn test_ordering_stable_above_prerelease() {
        assert!(v("1.0.0") > v("1.0.0-rc"));
        assert!(v("1.0.0-beta") > v("1.0.0-alpha"));
        assert!(v("1.0.0-Beta") == v("1.0.0-beta"));
        assert!(v("1.0.0-beta.2") < v("1.0.0-beta.10"));
        assert!(v("1.0.0-1") < v("1.0.0-alpha"));
        assert!(v("1.0.0-beta") < v("1.0.0-beta.1"));
        assert!(v("1.0.0.1") > v("1.0.0"));
    }

    #[test]
    fn test_metadata_ignored_for_equality() {
        assert_eq!(v("1.0.0+abc"), v("1.0.0+def"));
        assert_eq!(v("1.0"), v("1.0.0.0"));

        let mut set = std::collections::HashSet::new();
        set.insert(v("1.0.0-BETA+x"));
        assert!(set.contains(&v("1.0.0-beta")));
    }

    #[test]
    fn test_semver2_detection() {
        assert!(!v("1.0.0").is_semver2());
        assert!(!v("1.0.0-beta1").is_semver2());
        assert!(v("1.0.0-beta.1").is_semver2());
        assert!(v("1.0.0+build").is_semver2());
    }

    #[test]
    fn test_serde_round_trip_as_string() {
        let json = serde_json::to_string(&v("1.2.3-beta")).unwrap();
        assert_eq!(json, "\"1.2.3-beta\"");
        let parsed: NuGetVersion = serde_json::from_str("\"4.5\"").unwrap();
        assert_eq!(parsed, v("4.5.0"));
        assert!(serde_json::from_str::<NuGetVersion>("\"nope\"").is_err());
    }
}
