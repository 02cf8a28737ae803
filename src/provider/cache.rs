//! Shared metadata cache.
//!
//! [`MetadataCache`] is a pair of concurrent maps shared by every resolution
//! pass of one run, so each (id) and (id, version) lookup reaches the feed at
//! most once when calls do not overlap. Concurrent misses for the same key may
//! both reach the feed; the last write wins and both callers see equal data.
//! Failures are never cached.

use super::{DependencyInfo, PackageMetadataProvider, ProviderError};
use crate::version::NuGetVersion;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Concurrent cache of provider answers, keyed by lowercased id.
#[derive(Debug, Default)]
pub struct MetadataCache {
    versions: DashMap<String, Vec<NuGetVersion>>,
    dependencies: DashMap<(String, NuGetVersion), DependencyInfo>,
}

impl MetadataCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached version list for `id`.
    #[must_use]
    pub fn versions(&self, id: &str) -> Option<Vec<NuGetVersion>> {
        self.versions.get(&id.to_ascii_lowercase()).map(|v| v.clone())
    }

    /// Stores the version list for `id`.
    pub fn store_versions(&self, id: &str, versions: Vec<NuGetVersion>) {
        self.versions.insert(id.to_ascii_lowercase(), versions);
    }

    /// Cached dependency info for `id` at `version`.
    #[must_use]
    pub fn dependency_info(&self, id: &str, version: &NuGetVersion) -> Option<DependencyInfo> {
        self.dependencies
            .get(&(id.to_ascii_lowercase(), version.clone()))
            .map(|info| info.clone())
    }

    /// Stores dependency info for `id` at `version`.
    pub fn store_dependency_info(&self, id: &str, version: &NuGetVersion, info: DependencyInfo) {
        self.dependencies
            .insert((id.to_ascii_lowercase(), version.clone()), info);
    }

    /// Number of cached entries of both kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len() + self.dependencies.len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Serves answers from a [`MetadataCache`], falling back to an inner provider.
#[derive(Clone)]
pub struct CachingProvider {
    inner: Arc<dyn PackageMetadataProvider>,
    cache: Arc<MetadataCache>,
}

impl CachingProvider {
    /// Wraps `inner` with `cache`.
    #[must_use]
    pub fn new(inner: Arc<dyn PackageMetadataProvider>, cache: Arc<MetadataCache>) -> Self {
        Self { inner, cache }
    }

    /// The shared cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }
}

#[async_trait]
impl PackageMetadataProvider for CachingProvider {
    fn source_name(&self) -> &str {
        self.inner.source_name()
    }

    async fn get_all_versions(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<NuGetVersion>, ProviderError> {
        if let Some(versions) = self.cache.versions(id) {
            trace!("Version cache hit for {id}");
            return Ok(versions);
        }
        let versions = self.inner.get_all_versions(id, cancel).await?;
        self.cache.store_versions(id, versions.clone());
        Ok(versions)
    }

    async fn get_dependency_info(
        &self,
        id: &str,
        version: &NuGetVersion,
        cancel: &CancellationToken,
    ) -> Result<DependencyInfo, ProviderError> {
        if let Some(info) = self.cache.dependency_info(id, version) {
            trace!("Dependency cache hit for {id} {version}");
            return Ok(info);
        }
        let info = self.inner.get_dependency_info(id, version, cancel).await?;
        self.cache.store_dependency_info(id, version, info.clone());
        Ok(info)
    }
}
