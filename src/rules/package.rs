//! The package under validation and the ways to obtain one.

use crate::content::{ContentItemCollection, patterns};
use crate::framework::Framework;
use crate::manifest::{ManifestDocument, ManifestError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Packaging metadata that is not package content.
const PACKAGING_ENTRIES: &[&str] = &["[Content_Types].xml"];
const PACKAGING_FOLDERS: &[&str] = &["_rels", "package"];

/// Failures while reading a package.
#[derive(Error, Debug)]
pub enum PackageError {
    /// The package directory could not be walked
    #[error("Failed to read package directory {path}")]
    Walk {
        /// Directory being read
        path: PathBuf,
        /// Underlying walk error
        #[source]
        source: walkdir::Error,
    },

    /// The manifest file could not be read
    #[error("Failed to read manifest {path}")]
    Io {
        /// Manifest path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// No `.nuspec` sits at the package root
    #[error("No .nuspec manifest found in {path}")]
    MissingManifest {
        /// Package directory
        path: PathBuf,
    },

    /// The manifest is invalid
    #[error("Invalid manifest {path}")]
    Manifest {
        /// Manifest path
        path: PathBuf,
        /// Parse error
        #[source]
        source: ManifestError,
    },
}

/// Source of a package's file list and manifest.
///
/// Both reads must be repeatable: rules may ask more than once.
pub trait PackageContentLister {
    /// Package-relative file paths using `/` separators, manifest excluded.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError`] when the package cannot be read.
    fn files(&self) -> Result<Vec<String>, PackageError>;

    /// The parsed package manifest.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError`] when the manifest is missing or invalid.
    fn manifest(&self) -> Result<ManifestDocument, PackageError>;
}

/// An extracted package on disk.
#[derive(Debug, Clone)]
pub struct DirectoryPackage {
    root: PathBuf,
}

impl DirectoryPackage {
    /// Wraps an extracted package directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The package directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn nuspec_path(&self) -> Result<PathBuf, PackageError> {
        let mut candidates = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|source| PackageError::Walk {
                path: self.root.clone(),
                source,
            })?;
            if entry.file_type().is_file() && is_nuspec(entry.path()) {
                candidates.push(entry.into_path());
            }
        }
        candidates.sort();
        candidates
            .into_iter()
            .next()
            .ok_or_else(|| PackageError::MissingManifest {
                path: self.root.clone(),
            })
    }
}

fn is_nuspec(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("nuspec"))
}

fn is_packaging_entry(relative: &str) -> bool {
    let first = relative.split('/').next().unwrap_or_default();
    PACKAGING_ENTRIES.iter().any(|e| e.eq_ignore_ascii_case(relative))
        || (relative.contains('/') && PACKAGING_FOLDERS.iter().any(|f| f.eq_ignore_ascii_case(first)))
}

impl PackageContentLister for DirectoryPackage {
    fn files(&self) -> Result<Vec<String>, PackageError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(|source| PackageError::Walk {
                path: self.root.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            let at_root = !relative.contains('/');
            if (at_root && is_nuspec(entry.path())) || is_packaging_entry(&relative) {
                continue;
            }
            files.push(relative);
        }
        Ok(files)
    }

    fn manifest(&self) -> Result<ManifestDocument, PackageError> {
        let path = self.nuspec_path()?;
        let xml = std::fs::read_to_string(&path).map_err(|source| PackageError::Io {
            path: path.clone(),
            source,
        })?;
        ManifestDocument::parse(&xml).map_err(|source| PackageError::Manifest { path, source })
    }
}

/// Everything a rule may inspect about one package.
#[derive(Debug, Clone)]
pub struct PackageView {
    /// Parsed manifest
    pub manifest: ManifestDocument,
    /// Package-relative file paths
    pub files: Vec<String>,
}

impl PackageView {
    /// Creates a view from a manifest and a file list.
    #[must_use]
    pub fn new<I, S>(manifest: ManifestDocument, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let files = ContentItemCollection::load(files).paths().to_vec();
        Self { manifest, files }
    }

    /// Reads both halves from `lister`.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError`] when either read fails.
    pub fn from_lister(lister: &dyn PackageContentLister) -> Result<Self, PackageError> {
        Ok(Self::new(lister.manifest()?, lister.files()?))
    }

    /// The file list as a content collection.
    #[must_use]
    pub fn content(&self) -> ContentItemCollection {
        ContentItemCollection::load(&self.files)
    }

    /// Package id from the manifest.
    #[must_use]
    pub fn id(&self) -> &str {
        self.manifest.id()
    }

    /// Distinct frameworks the package has assets or references for.
    ///
    /// Union of `lib`, `ref` and `contentFiles` folder frameworks, reference
    /// groups and framework assemblies, in first-seen order. `any` folders are
    /// not counted.
    #[must_use]
    pub fn supported_frameworks(&self) -> Vec<Framework> {
        let content = self.content();
        let mut frameworks: Vec<Framework> = Vec::new();
        let mut push = |framework: &Framework| {
            if !framework.is_unsupported() && !framework.is_any() && !frameworks.contains(framework) {
                frameworks.push(framework.clone());
            }
        };

        for set in [
            patterns::lib_folders(),
            patterns::ref_folders(),
            patterns::content_files(),
        ] {
            for group in content.find_item_groups(&set) {
                if let Some(framework) = group.framework() {
                    push(framework);
                }
            }
        }
        for group in &self.manifest.reference_groups {
            if let Some(framework) = &group.target_framework {
                push(framework);
            }
        }
        for assembly in &self.manifest.framework_assemblies {
            for framework in &assembly.target_frameworks {
                push(framework);
            }
        }
        frameworks
    }

    /// Frameworks of `lib/{tfm}` and `ref/{tfm}` folders, in first-seen order.
    #[must_use]
    pub fn lib_ref_frameworks(&self) -> Vec<Framework> {
        let content = self.content();
        let mut frameworks: Vec<Framework> = Vec::new();
        for set in [patterns::lib_folders(), patterns::ref_folders()] {
            for group in content.find_item_groups(&set) {
                if let Some(framework) = group.framework()
                    && !frameworks.contains(framework)
                {
                    frameworks.push(framework.clone());
                }
            }
        }
        frameworks
    }
}
