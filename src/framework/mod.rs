//! Target framework monikers and framework compatibility.
//!
//! A [`Framework`] identifies what a project or a package asset is built for: an
//! identifier (`.NETStandard`), a version (`2.0`), and optionally a platform
//! (`windows` `10.0.19041`) or a profile (`Client`). Frameworks are parsed from
//! short monikers (`netstandard2.0`, `net6.0-windows10.0.19041`, `net472`), from
//! package folder names, or from the long form used in manifests
//! (`.NETFramework,Version=v4.7.2`).
//!
//! Whether an asset built for one framework can be consumed by a project targeting
//! another is answered by a [`CompatibilityTable`], which also selects the nearest
//! candidate among a package's asset or dependency groups.
//!
//! # Moniker Forms
//!
//! | Moniker | Identifier | Version | Extra |
//! |---------|------------|---------|-------|
//! | `net472` | `.NETFramework` | `4.7.2` | |
//! | `net40-client` | `.NETFramework` | `4.0` | profile `client` |
//! | `netstandard2.0` | `.NETStandard` | `2.0` | |
//! | `netcoreapp3.1` | `.NETCoreApp` | `3.1` | |
//! | `net6.0` | `.NETCoreApp` | `6.0` | |
//! | `net6.0-windows10.0.19041` | `.NETCoreApp` | `6.0` | platform `windows 10.0.19041` |
//! | `portable-net45+win8` | `.NETPortable` | `0.0` | profile `net45+win8` |
//! | `any` | `Any` | | |
//!
//! # Examples
//!
//! ```rust,no_run
//! use nuresolve_cli::framework::{CompatibilityTable, Framework};
//!
//! let table = CompatibilityTable::standard();
//! let project = Framework::parse("net6.0")?;
//! let groups = [Framework::parse("netstandard2.0")?, Framework::parse("net5.0")?];
//!
//! assert_eq!(table.get_nearest(&project, &groups), Some(&groups[1]));
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod compatibility;
pub mod identifiers;

#[cfg(test)]
mod tests;

pub use compatibility::{CompatibilityMapping, CompatibilityTable};

use identifiers::{
    AGNOSTIC, ANY, NATIVE, NET_CORE_APP, NET_FRAMEWORK, NET_PORTABLE, UNSUPPORTED, VersionStyle,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Errors produced by strict framework parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameworkParseError {
    /// The moniker was empty
    #[error("Target framework moniker is empty")]
    Empty,

    /// The identifier part is not a known framework
    #[error("Unknown target framework '{identifier}' in '{moniker}'")]
    UnknownIdentifier {
        /// The full moniker
        moniker: String,
        /// The unrecognized identifier
        identifier: String,
        /// A close known identifier, if any
        suggestion: Option<String>,
    },

    /// The moniker has a known identifier but an invalid shape
    #[error("Invalid target framework '{moniker}': {reason}")]
    Malformed {
        /// The full moniker
        moniker: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Four part framework version (`major.minor.build.revision`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FrameworkVersion([u32; 4]);

impl FrameworkVersion {
    /// `0.0.0.0`
    pub const ZERO: Self = Self([0; 4]);

    /// Creates a `major.minor` version.
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self([major, minor, 0, 0])
    }

    /// Creates a version from all four parts.
    #[must_use]
    pub const fn from_parts(parts: [u32; 4]) -> Self {
        Self(parts)
    }

    /// Major component.
    #[must_use]
    pub const fn major(&self) -> u32 {
        self.0[0]
    }

    /// Minor component.
    #[must_use]
    pub const fn minor(&self) -> u32 {
        self.0[1]
    }

    /// Whether every part is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Parses `4`, `4.5`, `10.0.19041` and `1.2.3.4`.
    #[must_use]
    pub fn parse_dotted(text: &str) -> Option<Self> {
        let segments: Vec<&str> = text.split('.').collect();
        if segments.len() > 4 {
            return None;
        }
        let mut parts = [0u32; 4];
        for (slot, segment) in parts.iter_mut().zip(&segments) {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            *slot = segment.parse().ok()?;
        }
        Some(Self(parts))
    }

    /// Parses the one-digit-per-part form used by `net472` or `win81`.
    #[must_use]
    pub fn parse_compact(text: &str) -> Option<Self> {
        if text.is_empty() || text.len() > 4 || !text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let mut parts = [0u32; 4];
        for (slot, digit) in parts.iter_mut().zip(text.bytes()) {
            *slot = u32::from(digit - b'0');
        }
        Some(Self(parts))
    }

    fn significant_parts(&self, min_parts: usize) -> &[u32] {
        let used = self.0.iter().rposition(|part| *part != 0).map_or(0, |i| i + 1);
        &self.0[..used.max(min_parts).min(4)]
    }

    fn to_compact(self, min_parts: usize) -> String {
        let parts = self.significant_parts(min_parts);
        if parts.iter().any(|part| *part > 9) {
            return self.to_string();
        }
        parts.iter().map(u32::to_string).collect()
    }
}

impl fmt::Display for FrameworkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.significant_parts(2).iter().map(u32::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

/// A target framework.
///
/// Equality compares identifier, platform and profile case-insensitively and
/// versions exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Framework {
    identifier: String,
    version: FrameworkVersion,
    platform: Option<String>,
    platform_version: FrameworkVersion,
    profile: Option<String>,
}

impl Framework {
    /// Creates a framework from a full identifier such as `.NETStandard`.
    ///
    /// Known identifiers are normalized to their canonical casing.
    #[must_use]
    pub fn new(identifier: &str, version: FrameworkVersion) -> Self {
        let identifier = identifiers::canonical_full_name(identifier)
            .map_or_else(|| identifier.to_string(), str::to_string);
        Self {
            identifier,
            version,
            platform: None,
            platform_version: FrameworkVersion::ZERO,
            profile: None,
        }
    }

    /// Returns a copy of this framework targeting an OS platform.
    #[must_use]
    pub fn with_platform(mut self, platform: &str, version: FrameworkVersion) -> Self {
        self.platform = Some(platform.to_string());
        self.platform_version = version;
        self
    }

    /// Returns a copy of this framework carrying a profile.
    #[must_use]
    pub fn with_profile(mut self, profile: &str) -> Self {
        self.profile = Some(profile.to_string());
        self
    }

    /// Matches every project; used for framework-less dependency groups.
    #[must_use]
    pub fn any() -> Self {
        Self::new(ANY, FrameworkVersion::ZERO)
    }

    /// Framework independent content.
    #[must_use]
    pub fn agnostic() -> Self {
        Self::new(AGNOSTIC, FrameworkVersion::ZERO)
    }

    /// Placeholder for monikers that could not be understood.
    #[must_use]
    pub fn unsupported() -> Self {
        Self::new(UNSUPPORTED, FrameworkVersion::ZERO)
    }

    /// Parses a moniker strictly.
    ///
    /// # Errors
    ///
    /// Returns [`FrameworkParseError`] for empty input, unknown identifiers (with a
    /// suggestion when a known identifier is close), and malformed versions,
    /// platforms or profiles.
    pub fn parse(moniker: &str) -> Result<Self, FrameworkParseError> {
        let trimmed = moniker.trim();
        if trimmed.is_empty() {
            return Err(FrameworkParseError::Empty);
        }
        if trimmed.starts_with('.') || trimmed.contains(',') {
            return parse_full_name(trimmed);
        }

        let lowered = trimmed.to_ascii_lowercase();
        match lowered.as_str() {
            "any" => return Ok(Self::any()),
            "agnostic" => return Ok(Self::agnostic()),
            "unsupported" => return Ok(Self::unsupported()),
            _ => {}
        }
        if let Some(members) = lowered.strip_prefix("portable-") {
            return parse_portable(trimmed, members);
        }

        let letters = lowered
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(lowered.len());
        let (short, rest) = lowered.split_at(letters);
        if short.is_empty() {
            return Err(malformed(trimmed, "missing framework identifier"));
        }
        let known = identifiers::by_short_name(short).ok_or_else(|| {
            FrameworkParseError::UnknownIdentifier {
                moniker: trimmed.to_string(),
                identifier: short.to_string(),
                suggestion: identifiers::suggest_short_name(short).map(str::to_string),
            }
        })?;

        let (version_text, suffix) = match rest.split_once('-') {
            Some((version, suffix)) => (version, Some(suffix)),
            None => (rest, None),
        };
        let version = match known.style {
            VersionStyle::None if !version_text.is_empty() => {
                return Err(malformed(trimmed, "this framework does not take a version"));
            }
            _ if version_text.is_empty() => FrameworkVersion::ZERO,
            _ if version_text.contains('.') => FrameworkVersion::parse_dotted(version_text)
                .ok_or_else(|| malformed(trimmed, "invalid version"))?,
            _ => FrameworkVersion::parse_compact(version_text)
                .ok_or_else(|| malformed(trimmed, "invalid version"))?,
        };

        let identifier = if known.full == NET_FRAMEWORK && version.major() >= 5 {
            NET_CORE_APP
        } else {
            known.full
        };
        let mut framework = Self::new(identifier, version);

        if let Some(suffix) = suffix {
            if suffix.is_empty() {
                return Err(malformed(trimmed, "empty suffix after '-'"));
            }
            if framework.is_net5_era() {
                let split = suffix
                    .find(|c: char| !c.is_ascii_alphabetic())
                    .unwrap_or(suffix.len());
                let (platform, platform_version) = suffix.split_at(split);
                if platform.is_empty() {
                    return Err(malformed(trimmed, "missing platform name"));
                }
                let platform_version = if platform_version.is_empty() {
                    FrameworkVersion::ZERO
                } else {
                    FrameworkVersion::parse_dotted(platform_version)
                        .ok_or_else(|| malformed(trimmed, "invalid platform version"))?
                };
                framework = framework.with_platform(platform, platform_version);
            } else {
                if !suffix.bytes().all(|b| b.is_ascii_alphanumeric()) {
                    return Err(malformed(trimmed, "invalid profile"));
                }
                framework = framework.with_profile(suffix);
            }
        }

        Ok(framework)
    }

    /// Parses a moniker, mapping anything unrecognized to [`Framework::unsupported`].
    #[must_use]
    pub fn parse_lenient(moniker: &str) -> Self {
        Self::parse(moniker).unwrap_or_else(|_| Self::unsupported())
    }

    /// Parses a package folder name such as `net45` or `netstandard2.0`.
    ///
    /// Long-form names never appear as folder names, so they are rejected here.
    #[must_use]
    pub fn parse_folder(segment: &str) -> Self {
        if segment.starts_with('.') || segment.contains(',') {
            return Self::unsupported();
        }
        Self::parse_lenient(segment)
    }

    /// Canonical full identifier (`.NETStandard`).
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Framework version.
    #[must_use]
    pub const fn version(&self) -> FrameworkVersion {
        self.version
    }

    /// OS platform name, for `net5.0` and later.
    #[must_use]
    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    /// OS platform version; zero when absent.
    #[must_use]
    pub const fn platform_version(&self) -> FrameworkVersion {
        self.platform_version
    }

    /// Profile name; for portable frameworks the `+`-joined member list.
    #[must_use]
    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Whether this is the [`Framework::any`] sentinel.
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.identifier.eq_ignore_ascii_case(ANY)
    }

    /// Whether this is the [`Framework::agnostic`] sentinel.
    #[must_use]
    pub fn is_agnostic(&self) -> bool {
        self.identifier.eq_ignore_ascii_case(AGNOSTIC)
    }

    /// Whether this is the [`Framework::unsupported`] sentinel.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        self.identifier.eq_ignore_ascii_case(UNSUPPORTED)
    }

    /// Whether this is a portable class library profile.
    #[must_use]
    pub fn is_portable(&self) -> bool {
        self.identifier.eq_ignore_ascii_case(NET_PORTABLE)
    }

    /// Whether this is a concrete framework rather than a sentinel.
    #[must_use]
    pub fn is_specific(&self) -> bool {
        !(self.is_any() || self.is_agnostic() || self.is_unsupported())
    }

    /// Whether this is `net5.0` or later, where suffixes name platforms.
    #[must_use]
    pub fn is_net5_era(&self) -> bool {
        self.identifier == NET_CORE_APP && self.version.major() >= 5
    }

    /// Whether both frameworks share an identifier.
    #[must_use]
    pub fn same_family(&self, other: &Self) -> bool {
        self.identifier.eq_ignore_ascii_case(&other.identifier)
    }

    /// Member frameworks of a portable profile; empty for other frameworks.
    #[must_use]
    pub fn portable_members(&self) -> Vec<Self> {
        if !self.is_portable() {
            return Vec::new();
        }
        self.profile
            .as_deref()
            .unwrap_or_default()
            .split('+')
            .map(Self::parse_lenient)
            .filter(Self::is_specific)
            .collect()
    }

    /// Short folder name, the inverse of [`Framework::parse`].
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use nuresolve_cli::framework::Framework;
    ///
    /// assert_eq!(Framework::parse("net472")?.short_folder_name(), "net472");
    /// assert_eq!(Framework::parse(".NETStandard,Version=v2.0")?.short_folder_name(), "netstandard2.0");
    /// assert_eq!(Framework::parse("NET6.0-Windows10.0.19041")?.short_folder_name(), "net6.0-windows10.0.19041");
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn short_folder_name(&self) -> String {
        if !self.is_specific() {
            return self.identifier.to_ascii_lowercase();
        }
        if self.is_portable() {
            return format!("portable-{}", self.profile.as_deref().unwrap_or_default());
        }
        if self.identifier == NATIVE {
            return NATIVE.to_string();
        }

        let mut name = if self.is_net5_era() {
            format!("net{}", self.version)
        } else if let Some(known) = identifiers::by_full_name(&self.identifier) {
            match known.style {
                VersionStyle::Dotted => format!("{}{}", known.short, self.version),
                VersionStyle::Compact(_) if self.version.is_zero() => known.short.to_string(),
                VersionStyle::Compact(min_parts) => {
                    format!("{}{}", known.short, self.version.to_compact(min_parts))
                }
                VersionStyle::None => known.short.to_string(),
            }
        } else {
            format!("{}{}", self.identifier.to_ascii_lowercase(), self.version)
        };

        if let Some(platform) = &self.platform {
            name.push('-');
            name.push_str(&platform.to_ascii_lowercase());
            if !self.platform_version.is_zero() {
                name.push_str(&self.platform_version.to_string());
            }
        }
        if let Some(profile) = &self.profile {
            name.push('-');
            name.push_str(&profile.to_ascii_lowercase());
        }
        name
    }

    /// Long form such as `.NETFramework,Version=v4.0,Profile=Client`.
    #[must_use]
    pub fn full_name(&self) -> String {
        let mut name = format!("{},Version=v{}", self.identifier, self.version);
        if let Some(profile) = &self.profile {
            name.push_str(&format!(",Profile={profile}"));
        }
        name
    }

    fn key(&self) -> (String, FrameworkVersion, Option<String>, FrameworkVersion, Option<String>) {
        (
            self.identifier.to_ascii_lowercase(),
            self.version,
            self.platform.as_ref().map(|p| p.to_ascii_lowercase()),
            self.platform_version,
            self.profile.as_ref().map(|p| p.to_ascii_lowercase()),
        )
    }
}

fn malformed(moniker: &str, reason: &str) -> FrameworkParseError {
    FrameworkParseError::Malformed {
        moniker: moniker.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_portable(moniker: &str, members: &str) -> Result<Framework, FrameworkParseError> {
    let mut names = Vec::new();
    for member in members.split('+') {
        let framework = Framework::parse(member)?;
        if !framework.is_specific() || framework.is_portable() {
            return Err(malformed(moniker, "portable profiles must list concrete frameworks"));
        }
        names.push(framework.short_folder_name());
    }
    names.sort();
    names.dedup();
    Ok(Framework::new(NET_PORTABLE, FrameworkVersion::ZERO).with_profile(&names.join("+")))
}

/// `.NETStandard2.0`, `.NETFramework,Version=v4.0,Profile=Client`.
fn parse_full_name(moniker: &str) -> Result<Framework, FrameworkParseError> {
    let mut sections = moniker.split(',').map(str::trim);
    let head = sections.next().unwrap_or_default();
    let digits = head.find(|c: char| c.is_ascii_digit()).unwrap_or(head.len());
    let (name, inline_version) = head.split_at(digits);

    let identifier =
        identifiers::canonical_full_name(name).ok_or_else(|| FrameworkParseError::UnknownIdentifier {
            moniker: moniker.to_string(),
            identifier: name.to_string(),
            suggestion: None,
        })?;

    let mut version_text = inline_version.to_string();
    let mut profile = None;
    for section in sections {
        let Some((key, value)) = section.split_once('=') else {
            return Err(malformed(moniker, "expected key=value"));
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "version" => {
                version_text = value.trim().trim_start_matches(['v', 'V']).to_string();
            }
            "profile" => profile = Some(value.trim().to_string()),
            _ => return Err(malformed(moniker, "unknown section")),
        }
    }

    let version = if version_text.is_empty() {
        FrameworkVersion::ZERO
    } else {
        FrameworkVersion::parse_dotted(&version_text)
            .ok_or_else(|| malformed(moniker, "invalid version"))?
    };
    let identifier = if identifier == NET_FRAMEWORK && version.major() >= 5 {
        NET_CORE_APP
    } else {
        identifier
    };

    let framework = Framework::new(identifier, version);
    Ok(match profile {
        Some(profile) if !profile.is_empty() => framework.with_profile(&profile),
        _ => framework,
    })
}

impl PartialEq for Framework {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Framework {}

impl Hash for Framework {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_folder_name())
    }
}

impl FromStr for Framework {
    type Err = FrameworkParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Framework {
    type Error = FrameworkParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Framework> for String {
    fn from(value: Framework) -> Self {
        value.short_folder_name()
    }
}
