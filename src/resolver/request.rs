//! Resolution requests.
//!
//! A request is written as TOML and deserialized into [`ProjectSpec`]:
//!
//! ```toml
//! name = "App"
//! frameworks = ["net6.0", "net472"]
//!
//! [[dependencies]]
//! id = "Contoso.Core"
//! version = "[1.0.0, 2.0.0)"
//!
//! [[dependencies]]
//! id = "Contoso.Windows"
//! version = "2.5.0"            # bare version: pinned
//! frameworks = ["net472"]     # only for this framework
//!
//! [[dependencies]]
//! project = "Lib"              # project reference
//!
//! [[projects]]
//! name = "Lib"
//! frameworks = ["netstandard2.0"]
//!
//! [[projects.dependencies]]
//! id = "Contoso.Abstractions"
//! version = ">= 1.0.0"
//! ```
//!
//! [`ResolutionRequest::from_spec`] validates monikers, ranges and project
//! references up front so a pass never meets malformed input.

use crate::framework::{Framework, FrameworkParseError};
use crate::version::{NuGetVersion, RangeParseError, VersionRange};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors found while turning a [`ProjectSpec`] into a request.
#[derive(Error, Debug)]
pub enum RequestError {
    /// A framework moniker failed strict parsing
    #[error("Invalid framework '{moniker}' in project '{project}'")]
    Framework {
        /// Project declaring it
        project: String,
        /// The moniker
        moniker: String,
        /// Underlying error
        #[source]
        source: FrameworkParseError,
    },

    /// A dependency version is not a valid range
    #[error("Invalid version '{value}' for '{id}' in project '{project}'")]
    Range {
        /// Project declaring it
        project: String,
        /// Dependency id
        id: String,
        /// The rejected text
        value: String,
        /// Underlying error
        #[source]
        source: RangeParseError,
    },

    /// A project reference names no declared project
    #[error("Project '{project}' references unknown project '{name}'")]
    UnknownProject {
        /// Referencing project
        project: String,
        /// Missing name
        name: String,
    },

    /// Two projects share a name
    #[error("Project '{name}' is declared more than once")]
    DuplicateProject {
        /// Repeated name
        name: String,
    },

    /// The root project lists no frameworks
    #[error("Project '{project}' declares no target frameworks")]
    NoFrameworks {
        /// Root project name
        project: String,
    },

    /// The request file is not valid TOML for this shape
    #[error("Invalid request file")]
    Toml(#[from] toml::de::Error),

    /// The request file could not be read
    #[error("Failed to read request file '{path}'")]
    Io {
        /// Request path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// One entry of a project's `dependencies` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    /// A package reference
    Package {
        /// Package id
        id: String,
        /// Range or bare version; absent means any version
        #[serde(default)]
        version: Option<String>,
        /// Frameworks the reference applies to; empty means all
        #[serde(default)]
        frameworks: Vec<String>,
    },
    /// A reference to another project in the request
    Project {
        /// Referenced project name
        project: String,
        /// Frameworks the reference applies to; empty means all
        #[serde(default)]
        frameworks: Vec<String>,
    },
}

/// Serialized request shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSpec {
    /// Project name
    pub name: String,
    /// Target framework monikers
    #[serde(default)]
    pub frameworks: Vec<String>,
    /// References in declaration order
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
    /// Projects available to project references (root only)
    #[serde(default)]
    pub projects: Vec<ProjectSpec>,
}

impl ProjectSpec {
    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Toml`] when the text does not match the shape.
    pub fn from_toml(text: &str) -> Result<Self, RequestError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a request file.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Io`] when the file cannot be read, or
    /// [`RequestError::Toml`] when it is malformed.
    pub async fn load(path: &Path) -> Result<Self, RequestError> {
        let text = tokio::fs::read_to_string(path).await.map_err(|source| RequestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }
}

/// A validated reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedDependency {
    /// A package reference
    Package {
        /// Package id
        id: String,
        /// Acceptable versions
        range: VersionRange,
        /// Written as a bare version
        pinned: bool,
        /// Frameworks the reference applies to; empty means all
        frameworks: Vec<Framework>,
    },
    /// A project reference
    Project {
        /// Referenced project name
        name: String,
        /// Frameworks the reference applies to; empty means all
        frameworks: Vec<Framework>,
    },
}

impl RequestedDependency {
    /// Whether the reference applies when building for `framework`.
    #[must_use]
    pub fn applies_to(&self, framework: &Framework) -> bool {
        let frameworks = match self {
            Self::Package { frameworks, .. } | Self::Project { frameworks, .. } => frameworks,
        };
        frameworks.is_empty() || frameworks.contains(framework)
    }
}

/// A validated project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRequest {
    /// Project name
    pub name: String,
    /// Target frameworks; empty for referenced projects means "any"
    pub frameworks: Vec<Framework>,
    /// References in declaration order
    pub dependencies: Vec<RequestedDependency>,
}

/// A validated request: the root project and the projects it may reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    /// Root project
    pub root: ProjectRequest,
    /// Referenceable projects in declaration order
    pub projects: Vec<ProjectRequest>,
}

/// Parses a dependency version; a bare version means pinned.
fn parse_version(text: &str) -> Result<(VersionRange, bool), RangeParseError> {
    let trimmed = text.trim();
    if let Ok(version) = NuGetVersion::parse(trimmed) {
        return Ok((VersionRange::at_least(version), true));
    }
    VersionRange::parse(trimmed).map(|range| (range, false))
}

fn parse_frameworks(
    project: &str,
    monikers: &[String],
    strict: bool,
) -> Result<Vec<Framework>, RequestError> {
    monikers
        .iter()
        .map(|moniker| {
            if strict {
                Framework::parse(moniker).map_err(|source| RequestError::Framework {
                    project: project.to_string(),
                    moniker: moniker.clone(),
                    source,
                })
            } else {
                Ok(Framework::parse_lenient(moniker))
            }
        })
        .collect()
}

fn convert_project(
    spec: &ProjectSpec,
    known: &HashSet<String>,
    strict: bool,
) -> Result<ProjectRequest, RequestError> {
    let dependencies = spec
        .dependencies
        .iter()
        .map(|dependency| match dependency {
            DependencySpec::Package {
                id,
                version,
                frameworks,
            } => {
                let (range, pinned) = match version.as_deref().filter(|v| !v.trim().is_empty()) {
                    Some(value) => parse_version(value).map_err(|source| RequestError::Range {
                        project: spec.name.clone(),
                        id: id.clone(),
                        value: value.to_string(),
                        source,
                    })?,
                    None => (VersionRange::all(), false),
                };
                Ok(RequestedDependency::Package {
                    id: id.clone(),
                    range,
                    pinned,
                    frameworks: parse_frameworks(&spec.name, frameworks, strict)?,
                })
            }
            DependencySpec::Project {
                project,
                frameworks,
            } => {
                if !known.contains(&project.to_ascii_lowercase()) {
                    return Err(RequestError::UnknownProject {
                        project: spec.name.clone(),
                        name: project.clone(),
                    });
                }
                Ok(RequestedDependency::Project {
                    name: project.clone(),
                    frameworks: parse_frameworks(&spec.name, frameworks, strict)?,
                })
            }
        })
        .collect::<Result<Vec<_>, RequestError>>()?;

    Ok(ProjectRequest {
        name: spec.name.clone(),
        frameworks: parse_frameworks(&spec.name, &spec.frameworks, strict)?,
        dependencies,
    })
}

impl ResolutionRequest {
    /// Validates a [`ProjectSpec`].
    ///
    /// With `strict_frameworks` an unknown moniker is an error; otherwise it
    /// becomes [`Framework::unsupported`].
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] for malformed monikers or ranges, unknown or
    /// duplicate projects, and a root project without frameworks.
    pub fn from_spec(spec: &ProjectSpec, strict_frameworks: bool) -> Result<Self, RequestError> {
        let mut known = HashSet::from([spec.name.to_ascii_lowercase()]);
        for project in &spec.projects {
            if !known.insert(project.name.to_ascii_lowercase()) {
                return Err(RequestError::DuplicateProject {
                    name: project.name.clone(),
                });
            }
        }

        let root = convert_project(spec, &known, strict_frameworks)?;
        if root.frameworks.is_empty() {
            return Err(RequestError::NoFrameworks { project: root.name });
        }
        let projects = spec
            .projects
            .iter()
            .map(|project| convert_project(project, &known, strict_frameworks))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { root, projects })
    }

    /// A request for one project with package references only.
    #[must_use]
    pub fn single(name: &str, frameworks: Vec<Framework>, dependencies: Vec<RequestedDependency>) -> Self {
        Self {
            root: ProjectRequest {
                name: name.to_string(),
                frameworks,
                dependencies,
            },
            projects: Vec::new(),
        }
    }

    /// Replaces the root frameworks.
    #[must_use]
    pub fn with_frameworks(mut self, frameworks: Vec<Framework>) -> Self {
        self.root.frameworks = frameworks;
        self
    }

    /// The referenceable project called `name`, compared case-insensitively.
    #[must_use]
    pub fn project(&self, name: &str) -> Option<&ProjectRequest> {
        self.projects.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}
