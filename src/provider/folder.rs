//! Feed backed by an expanded package folder.
//!
//! # Layout
//!
//! ```text
//! feed/
//! ├── contoso.core/
//! │   ├── 1.0.0/
//! │   │   └── contoso.core.nuspec
//! │   └── 2.0.0-beta/
//! │       └── contoso.core.nuspec
//! └── contoso.abstractions/
//!     └── 1.0.0/
//!         └── contoso.abstractions.nuspec
//! ```
//!
//! Id directories are lowercase. Version directories are matched by parsed
//! version, so `1.0` and `1.0.0` name the same version; directories that do not
//! parse as versions are ignored. Ids containing path separators or `..` are
//! rejected with [`ProviderError::InvalidId`] so lookups stay below the root.

use super::{DependencyInfo, PackageMetadataProvider, ProviderError};
use crate::manifest::ManifestDocument;
use crate::models::PackageIdentity;
use crate::version::NuGetVersion;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A feed reading `{id}/{version}/*.nuspec` below a root directory.
#[derive(Debug, Clone)]
pub struct LocalFolderFeed {
    root: PathBuf,
    name: String,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ProviderError + '_ {
    move |source| ProviderError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl LocalFolderFeed {
    /// Creates a feed rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root.display().to_string();
        Self { root, name }
    }

    /// Feed root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of `id` below the root.
    fn id_dir(&self, id: &str) -> Result<PathBuf, ProviderError> {
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(ProviderError::InvalidId { id: id.to_string() });
        }
        Ok(self.root.join(id.to_ascii_lowercase()))
    }

    /// Version directories of `id` paired with their parsed versions.
    async fn version_dirs(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<(NuGetVersion, PathBuf)>, ProviderError> {
        let id_dir = self.id_dir(id)?;
        if !fs::try_exists(&id_dir).await.map_err(io_error(&id_dir))? {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&id_dir).await.map_err(io_error(&id_dir))?;
        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error(&id_dir))? {
            if cancel.is_cancelled() {
                return Err(ProviderError::Cancelled);
            }
            let path = entry.path();
            if !entry.file_type().await.map_err(io_error(&path))?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            match NuGetVersion::parse(&name) {
                Ok(version) => found.push((version, path)),
                Err(error) => debug!("Skipping '{}': {error}", path.display()),
            }
        }
        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found)
    }

    async fn find_manifest(dir: &Path) -> Result<Option<PathBuf>, ProviderError> {
        let mut entries = fs::read_dir(dir).await.map_err(io_error(dir))?;
        let mut manifests = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error(dir))? {
            let path = entry.path();
            if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("nuspec"))
            {
                manifests.push(path);
            }
        }
        manifests.sort();
        Ok(manifests.into_iter().next())
    }
}

#[async_trait]
impl PackageMetadataProvider for LocalFolderFeed {
    fn source_name(&self) -> &str {
        &self.name
    }

    async fn get_all_versions(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<NuGetVersion>, ProviderError> {
        Ok(self
            .version_dirs(id, cancel)
            .await?
            .into_iter()
            .map(|(version, _)| version)
            .collect())
    }

    async fn get_dependency_info(
        &self,
        id: &str,
        version: &NuGetVersion,
        cancel: &CancellationToken,
    ) -> Result<DependencyInfo, ProviderError> {
        let not_found = || ProviderError::NotFound {
            id: format!("{id} {version}"),
        };
        let dir = self
            .version_dirs(id, cancel)
            .await?
            .into_iter()
            .find(|(candidate, _)| candidate == version)
            .map(|(_, dir)| dir)
            .ok_or_else(not_found)?;
        let manifest_path = Self::find_manifest(&dir).await?.ok_or_else(not_found)?;
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let xml = fs::read_to_string(&manifest_path)
            .await
            .map_err(io_error(&manifest_path))?;
        let document = ManifestDocument::parse(&xml).map_err(|source| ProviderError::Manifest {
            path: manifest_path.clone(),
            source,
        })?;
        debug!("Read {} from {}", document.id(), manifest_path.display());

        let package_id = if document.id().is_empty() {
            id.to_string()
        } else {
            document.id().to_string()
        };
        Ok(DependencyInfo {
            identity: PackageIdentity::new(package_id, version.clone()),
            groups: document.to_dependency_groups(),
        })
    }
}
