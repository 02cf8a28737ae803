//! Version ranges with inclusive and exclusive bounds.
//!
//! Supported syntax:
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `1.0` | `1.0 <= x` |
//! | `[1.0]` | `x == 1.0` |
//! | `[1.0, 2.0]` | `1.0 <= x <= 2.0` |
//! | `(1.0, 2.0)` | `1.0 < x < 2.0` |
//! | `[1.0, 2.0)` | `1.0 <= x < 2.0` |
//! | `(, 2.0]` | `x <= 2.0` |
//! | `[1.0, )` | `1.0 <= x` |
//! | `>= 1.0`, `> 1.0`, `<= 2.0`, `< 2.0` | single comparator shorthand |
//!
//! Floating ranges (`1.*`) are not supported.

use super::{NuGetVersion, VersionParseError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing a [`VersionRange`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeParseError {
    /// The input was empty or whitespace only
    #[error("Version range is empty")]
    Empty,

    /// The bracket syntax is malformed
    #[error("Invalid version range '{input}': {reason}")]
    Malformed {
        /// The rejected input
        input: String,
        /// What is wrong with it
        reason: String,
    },

    /// A bound is not a valid version
    #[error("Invalid version range '{input}'")]
    InvalidVersion {
        /// The rejected input
        input: String,
        /// The underlying version error
        #[source]
        source: VersionParseError,
    },
}

/// An interval of acceptable package versions.
///
/// Absent bounds are unbounded. [`VersionRange::all`] accepts every stable version;
/// prerelease versions are only accepted by ranges with a prerelease bound, see
/// [`VersionRange::satisfies`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    min: Option<NuGetVersion>,
    min_inclusive: bool,
    max: Option<NuGetVersion>,
    max_inclusive: bool,
}

impl VersionRange {
    /// The unbounded range.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            min: None,
            min_inclusive: false,
            max: None,
            max_inclusive: false,
        }
    }

    /// `[version, )`.
    #[must_use]
    pub const fn at_least(version: NuGetVersion) -> Self {
        Self {
            min: Some(version),
            min_inclusive: true,
            max: None,
            max_inclusive: false,
        }
    }

    /// `[version]`.
    #[must_use]
    pub fn exact(version: NuGetVersion) -> Self {
        Self {
            min: Some(version.clone()),
            min_inclusive: true,
            max: Some(version),
            max_inclusive: true,
        }
    }

    /// Builds a range from explicit bounds.
    ///
    /// The inclusive flag of an absent bound is ignored.
    #[must_use]
    pub const fn new(
        min: Option<NuGetVersion>,
        min_inclusive: bool,
        max: Option<NuGetVersion>,
        max_inclusive: bool,
    ) -> Self {
        Self {
            min_inclusive: min_inclusive && min.is_some(),
            max_inclusive: max_inclusive && max.is_some(),
            min,
            max,
        }
    }

    /// Parses range syntax.
    ///
    /// # Errors
    ///
    /// Returns [`RangeParseError`] for empty input, unbalanced or unknown brackets,
    /// more than two bounds, unparseable versions, and ranges that can never be
    /// satisfied such as `[2.0, 1.0]` or `(1.0, 1.0]`.
    pub fn parse(input: &str) -> Result<Self, RangeParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(RangeParseError::Empty);
        }

        let malformed = |reason: &str| RangeParseError::Malformed {
            input: trimmed.to_string(),
            reason: reason.to_string(),
        };
        let version = |text: &str| {
            NuGetVersion::parse(text).map_err(|source| RangeParseError::InvalidVersion {
                input: trimmed.to_string(),
                source,
            })
        };

        if let Some(comparator) = parse_comparator(trimmed) {
            let (op, rest) = comparator;
            let bound = version(rest)?;
            return Ok(match op {
                ">=" => Self::at_least(bound),
                ">" => Self::new(Some(bound), false, None, false),
                "<=" => Self::new(None, false, Some(bound), true),
                _ => Self::new(None, false, Some(bound), false),
            });
        }

        let first = trimmed.as_bytes()[0];
        if first != b'[' && first != b'(' {
            return Ok(Self::at_least(version(trimmed)?));
        }

        let last = trimmed.as_bytes()[trimmed.len() - 1];
        if trimmed.len() < 2 || (last != b']' && last != b')') {
            return Err(malformed("missing closing bracket"));
        }
        let min_inclusive = first == b'[';
        let max_inclusive = last == b']';
        let inner = trimmed[1..trimmed.len() - 1].trim();

        let range = match inner.split_once(',') {
            None => {
                if inner.is_empty() {
                    return Err(malformed("no versions between brackets"));
                }
                if !(min_inclusive && max_inclusive) {
                    return Err(malformed("a single version must use '[' and ']'"));
                }
                Self::exact(version(inner)?)
            }
            Some((low, high)) => {
                if high.contains(',') {
                    return Err(malformed("more than two bounds"));
                }
                let (low, high) = (low.trim(), high.trim());
                if low.is_empty() && high.is_empty() {
                    return Err(malformed("at least one bound is required"));
                }
                let min = if low.is_empty() { None } else { Some(version(low)?) };
                let max = if high.is_empty() { None } else { Some(version(high)?) };
                Self::new(min, min_inclusive, max, max_inclusive)
            }
        };

        if range.is_empty() {
            return Err(malformed("no version can satisfy the bounds"));
        }
        Ok(range)
    }

    /// Lower bound, if any.
    #[must_use]
    pub const fn min_version(&self) -> Option<&NuGetVersion> {
        self.min.as_ref()
    }

    /// Upper bound, if any.
    #[must_use]
    pub const fn max_version(&self) -> Option<&NuGetVersion> {
        self.max.as_ref()
    }

    /// Whether the lower bound is inclusive.
    #[must_use]
    pub const fn is_min_inclusive(&self) -> bool {
        self.min_inclusive
    }

    /// Whether the upper bound is inclusive.
    #[must_use]
    pub const fn is_max_inclusive(&self) -> bool {
        self.max_inclusive
    }

    /// Whether either bound is a prerelease version.
    #[must_use]
    pub fn has_prerelease_bounds(&self) -> bool {
        self.min.as_ref().is_some_and(NuGetVersion::is_prerelease)
            || self.max.as_ref().is_some_and(NuGetVersion::is_prerelease)
    }

    /// Whether `version` lies below the lower bound.
    #[must_use]
    pub fn is_below_lower_bound(&self, version: &NuGetVersion) -> bool {
        match &self.min {
            Some(min) => match version.cmp(min) {
                Ordering::Less => true,
                Ordering::Equal => !self.min_inclusive,
                Ordering::Greater => false,
            },
            None => false,
        }
    }

    /// Whether `version` lies above the upper bound.
    #[must_use]
    pub fn is_above_upper_bound(&self, version: &NuGetVersion) -> bool {
        match &self.max {
            Some(max) => match version.cmp(max) {
                Ordering::Greater => true,
                Ordering::Equal => !self.max_inclusive,
                Ordering::Less => false,
            },
            None => false,
        }
    }

    /// Whether `version` lies within both bounds, ignoring prerelease rules.
    #[must_use]
    pub fn contains_bounds(&self, version: &NuGetVersion) -> bool {
        !self.is_below_lower_bound(version) && !self.is_above_upper_bound(version)
    }

    /// Whether `version` is acceptable under this range.
    ///
    /// A prerelease version is only acceptable when at least one bound of the
    /// range is itself a prerelease version.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use nuresolve_cli::version::{NuGetVersion, VersionRange};
    ///
    /// let stable = VersionRange::parse("[1.0, 2.0)")?;
    /// assert!(!stable.satisfies(&NuGetVersion::parse("1.5.0-beta")?));
    ///
    /// let pre = VersionRange::parse("[1.0.0-alpha, 2.0)")?;
    /// assert!(pre.satisfies(&NuGetVersion::parse("1.5.0-beta")?));
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn satisfies(&self, version: &NuGetVersion) -> bool {
        if !self.contains_bounds(version) {
            return false;
        }
        !version.is_prerelease() || self.has_prerelease_bounds()
    }

    /// Intersection of two ranges, or `None` when they do not overlap.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let (min, min_inclusive) = match (&self.min, &other.min) {
            (None, None) => (None, false),
            (Some(a), None) => (Some(a.clone()), self.min_inclusive),
            (None, Some(b)) => (Some(b.clone()), other.min_inclusive),
            (Some(a), Some(b)) => match a.cmp(b) {
                Ordering::Greater => (Some(a.clone()), self.min_inclusive),
                Ordering::Less => (Some(b.clone()), other.min_inclusive),
                Ordering::Equal => (Some(a.clone()), self.min_inclusive && other.min_inclusive),
            },
        };
        let (max, max_inclusive) = match (&self.max, &other.max) {
            (None, None) => (None, false),
            (Some(a), None) => (Some(a.clone()), self.max_inclusive),
            (None, Some(b)) => (Some(b.clone()), other.max_inclusive),
            (Some(a), Some(b)) => match a.cmp(b) {
                Ordering::Less => (Some(a.clone()), self.max_inclusive),
                Ordering::Greater => (Some(b.clone()), other.max_inclusive),
                Ordering::Equal => (Some(a.clone()), self.max_inclusive && other.max_inclusive),
            },
        };

        let range = Self {
            min,
            min_inclusive,
            max,
            max_inclusive,
        };
        if range.is_empty() { None } else { Some(range) }
    }

    /// Highest candidate that satisfies this range.
    ///
    /// Equal candidates keep the first occurrence.
    #[must_use]
    pub fn find_best_match<'a>(&self, candidates: &'a [NuGetVersion]) -> Option<&'a NuGetVersion> {
        candidates
            .iter()
            .filter(|candidate| self.satisfies(candidate))
            .fold(None, |best, candidate| match best {
                Some(current) if current >= candidate => Some(current),
                _ => Some(candidate),
            })
    }

    /// Lowest candidate that satisfies this range.
    #[must_use]
    pub fn find_lowest_match<'a>(
        &self,
        candidates: &'a [NuGetVersion],
    ) -> Option<&'a NuGetVersion> {
        candidates
            .iter()
            .filter(|candidate| self.satisfies(candidate))
            .fold(None, |best, candidate| match best {
                Some(current) if current <= candidate => Some(current),
                _ => Some(candidate),
            })
    }

    /// Human-oriented rendering used in diagnostics, e.g. `>= 1.0.0 && < 2.0.0`.
    #[must_use]
    pub fn pretty(&self) -> String {
        match (&self.min, &self.max) {
            (None, None) => "all versions".to_string(),
            (Some(min), Some(max)) if min == max && self.min_inclusive && self.max_inclusive => {
                format!("= {min}")
            }
            (Some(min), None) => format!("{} {min}", if self.min_inclusive { ">=" } else { ">" }),
            (None, Some(max)) => format!("{} {max}", if self.max_inclusive { "<=" } else { "<" }),
            (Some(min), Some(max)) => format!(
                "{} {min} && {} {max}",
                if self.min_inclusive { ">=" } else { ">" },
                if self.max_inclusive { "<=" } else { "<" }
            ),
        }
    }

    fn is_empty(&self) -> bool {
        match (&self.min, &self.max) {
            (Some(min), Some(max)) => match min.cmp(max) {
                Ordering::Greater => true,
                Ordering::Equal => !(self.min_inclusive && self.max_inclusive),
                Ordering::Less => false,
            },
            _ => false,
        }
    }
}

fn parse_comparator(input: &str) -> Option<(&'static str, &str)> {
    [">=", "<=", ">", "<"]
        .into_iter()
        .find_map(|op| input.strip_prefix(op).map(|rest| (op, rest.trim())))
}

impl Default for VersionRange {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.min, &self.max) {
            (None, None) => f.write_str("(, )"),
            (Some(min), Some(max)) if min == max && self.min_inclusive && self.max_inclusive => {
                write!(f, "[{min}]")
            }
            (min, max) => {
                f.write_str(if self.min_inclusive { "[" } else { "(" })?;
                if let Some(min) = min {
                    write!(f, "{min}")?;
                }
                f.write_str(", ")?;
                if let Some(max) = max {
                    write!(f, "{max}")?;
                }
                f.write_str(if self.max_inclusive { "]" } else { ")" })
            }
        }
    }
}

impl FromStr for VersionRange {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for VersionRange {
    type Error = RangeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VersionRange> for String {
    fn from(value: VersionRange) -> Self {
        value.to_string()
    }
}
