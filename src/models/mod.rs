//! Shared package data models.
//!
//! These are the shapes that cross every boundary in the crate: providers return
//! them, manifests are converted into them, and the resolver keys its graph on
//! them. They carry no behavior beyond identity rules and framework-group
//! selection.

use crate::framework::{CompatibilityTable, Framework};
use crate::version::{NuGetVersion, VersionRange};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A package id paired with one concrete version.
///
/// Ids compare case-insensitively; the original casing is kept for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageIdentity {
    /// Package id as first seen
    pub id: String,
    /// Concrete version
    pub version: NuGetVersion,
}

impl PackageIdentity {
    /// Creates an identity.
    #[must_use]
    pub fn new(id: impl Into<String>, version: NuGetVersion) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }

    /// Lowercased id used as a lookup key.
    #[must_use]
    pub fn key(&self) -> String {
        self.id.to_ascii_lowercase()
    }
}

impl PartialEq for PackageIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.id.eq_ignore_ascii_case(&other.id) && self.version == other.version
    }
}

impl Eq for PackageIdentity {}

impl Hash for PackageIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
        self.version.hash(state);
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}

/// A declared dependency on a package id within a version range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDependency {
    /// Package id
    pub id: String,
    /// Acceptable versions
    #[serde(default)]
    pub range: VersionRange,
}

impl PackageDependency {
    /// Creates a dependency.
    #[must_use]
    pub fn new(id: impl Into<String>, range: VersionRange) -> Self {
        Self {
            id: id.into(),
            range,
        }
    }
}

impl fmt::Display for PackageDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.range.pretty())
    }
}

/// Dependencies a package declares for one target framework.
///
/// The catch-all group of a package uses [`Framework::any`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGroup {
    /// Framework the group applies to
    pub target_framework: Framework,
    /// Dependencies in declaration order
    #[serde(default)]
    pub dependencies: Vec<PackageDependency>,
}

impl DependencyGroup {
    /// Creates a group for `target_framework`.
    #[must_use]
    pub const fn new(target_framework: Framework, dependencies: Vec<PackageDependency>) -> Self {
        Self {
            target_framework,
            dependencies,
        }
    }

    /// Creates a framework-less group.
    #[must_use]
    pub fn catch_all(dependencies: Vec<PackageDependency>) -> Self {
        Self::new(Framework::any(), dependencies)
    }
}

/// Picks the group whose framework is nearest to `target`.
///
/// Returns `None` when no group is compatible, which callers treat as "no
/// dependencies for this framework".
#[must_use]
pub fn nearest_group<'a>(
    groups: &'a [DependencyGroup],
    target: &Framework,
    table: &CompatibilityTable,
) -> Option<&'a DependencyGroup> {
    let frameworks: Vec<Framework> = groups.iter().map(|g| g.target_framework.clone()).collect();
    table
        .nearest_index(target, &frameworks)
        .map(|index| &groups[index])
}
