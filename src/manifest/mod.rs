//! Package manifest (`.nuspec`) model.
//!
//! A manifest describes a package: its id and version, descriptive metadata, and
//! per-framework dependency groups, reference groups and framework assembly
//! references. Parsing lives in [`nuspec`]; this module holds the parsed shape
//! consumed by the package rules and by the folder feed.
//!
//! # Manifest Shape
//!
//! ```xml
//! <package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">
//!   <metadata>
//!     <id>Contoso.Core</id>
//!     <version>1.2.0</version>
//!     <description>Core types.</description>
//!     <dependencies>
//!       <group targetFramework="net6.0">
//!         <dependency id="Contoso.Abstractions" version="[1.0.0, 2.0.0)" />
//!       </group>
//!       <group>
//!         <dependency id="Contoso.Legacy" version="1.0.0" />
//!       </group>
//!     </dependencies>
//!     <references>
//!       <group targetFramework="net6.0">
//!         <reference file="Contoso.Core.dll" />
//!       </group>
//!     </references>
//!     <frameworkAssemblies>
//!       <frameworkAssembly assemblyName="System.Net.Http" targetFramework="net45, net472" />
//!     </frameworkAssemblies>
//!   </metadata>
//! </package>
//! ```
//!
//! A `<dependencies>` element holding `<dependency>` children directly (the
//! legacy flat form) is read as a single framework-less group.

pub mod nuspec;

use crate::framework::Framework;
use crate::models::{DependencyGroup, PackageDependency};
use crate::version::{NuGetVersion, RangeParseError, VersionParseError};
use serde::Serialize;
use thiserror::Error;

/// Errors produced while reading a manifest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// The document is not well-formed XML
    #[error("Malformed manifest XML: {message}")]
    Xml {
        /// Parser message
        message: String,
    },

    /// The document has no `<package>` root element
    #[error("Manifest has no <package> root element")]
    MissingRoot,

    /// `<version>` is not a valid package version
    #[error("Invalid package version '{value}' in manifest")]
    InvalidVersion {
        /// The rejected text
        value: String,
        /// Underlying version error
        #[source]
        source: VersionParseError,
    },

    /// A dependency's `version` attribute is not a valid range
    #[error("Invalid version range '{value}' for dependency '{id}'")]
    InvalidRange {
        /// Dependency id
        id: String,
        /// The rejected text
        value: String,
        /// Underlying range error
        #[source]
        source: RangeParseError,
    },

    /// A `<dependency>` element lacks its `id` attribute
    #[error("A <dependency> element is missing the 'id' attribute")]
    MissingDependencyId,
}

/// Descriptive metadata fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestMetadata {
    /// `<id>`
    pub id: String,
    /// `<title>`
    pub title: Option<String>,
    /// `<authors>`
    pub authors: Option<String>,
    /// `<description>`
    pub description: Option<String>,
    /// `<summary>`
    pub summary: Option<String>,
    /// `<releaseNotes>`
    pub release_notes: Option<String>,
    /// `<tags>`
    pub tags: Option<String>,
    /// `<projectUrl>`
    pub project_url: Option<String>,
    /// `<iconUrl>`
    pub icon_url: Option<String>,
    /// `<licenseUrl>`
    pub license_url: Option<String>,
    /// `<license>`
    pub license: Option<String>,
    /// `<copyright>`
    pub copyright: Option<String>,
}

/// `<dependencies>/<group>`; `None` framework for the catch-all group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestDependencyGroup {
    /// Framework from `targetFramework`
    pub target_framework: Option<Framework>,
    /// Dependencies in document order
    pub dependencies: Vec<PackageDependency>,
}

/// `<references>/<group>`; `None` framework for the flat form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestReferenceGroup {
    /// Framework from `targetFramework`
    pub target_framework: Option<Framework>,
    /// Referenced assembly file names
    pub references: Vec<String>,
}

/// `<frameworkAssemblies>/<frameworkAssembly>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameworkAssembly {
    /// GAC assembly name
    pub assembly_name: String,
    /// Frameworks listed in the comma-delimited `targetFramework`; empty means all
    pub target_frameworks: Vec<Framework>,
}

/// A parsed package manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManifestDocument {
    /// Descriptive metadata
    pub metadata: ManifestMetadata,
    /// Package version; absent when the manifest omits it
    pub version: Option<NuGetVersion>,
    /// Dependency groups in document order
    pub dependency_groups: Vec<ManifestDependencyGroup>,
    /// Reference groups in document order
    pub reference_groups: Vec<ManifestReferenceGroup>,
    /// Framework assembly references
    pub framework_assemblies: Vec<FrameworkAssembly>,
}

impl ManifestDocument {
    /// Parses nuspec XML.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] when the XML is malformed, the root element is not
    /// `<package>`, or a version or dependency range is invalid.
    pub fn parse(xml: &str) -> Result<Self, ManifestError> {
        nuspec::parse(xml)
    }

    /// Package id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    /// Whether any dependency group is declared.
    #[must_use]
    pub fn has_dependency_groups(&self) -> bool {
        !self.dependency_groups.is_empty()
    }

    /// Dependency groups in resolver form; the catch-all group maps to `Any`.
    #[must_use]
    pub fn to_dependency_groups(&self) -> Vec<DependencyGroup> {
        self.dependency_groups
            .iter()
            .map(|group| {
                DependencyGroup::new(
                    group.target_framework.clone().unwrap_or_else(Framework::any),
                    group.dependencies.clone(),
                )
            })
            .collect()
    }

    /// Every dependency across all groups, in document order.
    pub fn all_dependencies(&self) -> impl Iterator<Item = &PackageDependency> {
        self.dependency_groups.iter().flat_map(|g| g.dependencies.iter())
    }
}
