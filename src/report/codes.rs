//! Stable diagnostic codes.
//!
//! Codes follow the `NU` + four digits shape that downstream tooling matches on.
//! Resolver codes live in the `NU1xxx` range and package rule codes in `NU5xxx`.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static CODE_PATTERN: LazyLock<Option<regex::Regex>> =
    LazyLock::new(|| regex::Regex::new(r"^NU\d{4}$").ok());

/// Rejected diagnostic code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' is not a valid diagnostic code (expected NU followed by four digits)")]
pub struct InvalidLogCode(pub String);

/// A validated diagnostic code such as `NU5100`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogCode(Cow<'static, str>);

impl LogCode {
    const fn known(code: &'static str) -> Self {
        Self(Cow::Borrowed(code))
    }

    /// Validates and wraps a code.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidLogCode`] unless the input is `NU` followed by four digits.
    pub fn parse(code: &str) -> Result<Self, InvalidLogCode> {
        let normalized = code.trim().to_ascii_uppercase();
        if CODE_PATTERN.as_ref().is_some_and(|re| re.is_match(&normalized)) {
            Ok(Self(Cow::Owned(normalized)))
        } else {
            Err(InvalidLogCode(code.to_string()))
        }
    }

    /// The code text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LogCode {
    type Error = InvalidLogCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LogCode> for String {
    fn from(value: LogCode) -> Self {
        value.0.into_owned()
    }
}

impl PartialEq<&str> for LogCode {
    fn eq(&self, other: &&str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

/// Unable to find a package: no versions exist in any source.
pub const NU1101: LogCode = LogCode::known("NU1101");
/// Unable to find a version of the package within the requested range.
pub const NU1102: LogCode = LogCode::known("NU1102");
/// A project reference targets no compatible framework.
pub const NU1201: LogCode = LogCode::known("NU1201");
/// Dependency bounds could not be satisfied: unresolvable version conflict.
pub const NU1107: LogCode = LogCode::known("NU1107");
/// The requested version was missing; a higher version was resolved instead.
pub const NU1603: LogCode = LogCode::known("NU1603");
/// A direct reference downgrades a package below a transitive lower bound.
pub const NU1605: LogCode = LogCode::known("NU1605");
/// A resolved version lies outside a transitive constraint's upper bound.
pub const NU1608: LogCode = LogCode::known("NU1608");

/// Assembly outside the `lib` folder.
pub const NU5100: LogCode = LogCode::known("NU5100");
/// Assembly directly under `lib`.
pub const NU5101: LogCode = LogCode::known("NU5101");
/// Template default value left in the manifest.
pub const NU5102: LogCode = LogCode::known("NU5102");
/// Unrecognized framework folder.
pub const NU5103: LogCode = LogCode::known("NU5103");
/// Stable package with a prerelease dependency.
pub const NU5104: LogCode = LogCode::known("NU5104");
/// SemVer 2.0.0 package version.
pub const NU5105: LogCode = LogCode::known("NU5105");
/// Placeholder file next to other files.
pub const NU5109: LogCode = LogCode::known("NU5109");
/// Script outside `tools`.
pub const NU5110: LogCode = LogCode::known("NU5110");
/// Unrecognized script name.
pub const NU5111: LogCode = LogCode::known("NU5111");
/// `build` framework folders without matching `lib`/`ref` folders.
pub const NU5127: LogCode = LogCode::known("NU5127");
/// Dependency group and `lib`/`ref` framework without any match.
pub const NU5128: LogCode = LogCode::known("NU5128");
/// MSBuild files not named after the package id.
pub const NU5129: LogCode = LogCode::known("NU5129");
/// Dependency group matched only by a compatible `lib`/`ref` framework.
pub const NU5130: LogCode = LogCode::known("NU5130");
/// Manifest references missing from `ref`.
pub const NU5131: LogCode = LogCode::known("NU5131");
