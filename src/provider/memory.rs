//! In-memory feed.

use super::{DependencyInfo, PackageMetadataProvider, ProviderError};
use crate::models::{DependencyGroup, PackageIdentity};
use crate::version::NuGetVersion;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A feed held entirely in memory.
///
/// Besides serving packages it can inject failures and latency, and counts the
/// calls it receives so callers can observe caching and cancellation.
///
/// # Examples
///
/// ```rust,no_run
/// use nuresolve_cli::models::{DependencyGroup, PackageDependency};
/// use nuresolve_cli::provider::InMemoryFeed;
/// use nuresolve_cli::version::{NuGetVersion, VersionRange};
///
/// let feed = InMemoryFeed::new("memory");
/// feed.add_package(
///     "A",
///     NuGetVersion::parse("1.0.0")?,
///     vec![DependencyGroup::catch_all(vec![PackageDependency::new(
///         "B",
///         VersionRange::parse("[1.0, )")?,
///     )])],
/// );
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryFeed {
    name: String,
    packages: Arc<DashMap<String, Vec<(PackageIdentity, Vec<DependencyGroup>)>>>,
    failing: Arc<DashMap<String, String>>,
    latency: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl InMemoryFeed {
    /// Creates an empty feed.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            packages: Arc::new(DashMap::new()),
            failing: Arc::new(DashMap::new()),
            latency: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Adds or replaces one package version.
    pub fn add_package(
        &self,
        id: &str,
        version: NuGetVersion,
        groups: Vec<DependencyGroup>,
    ) {
        let mut entry = self.packages.entry(id.to_ascii_lowercase()).or_default();
        entry.retain(|(identity, _)| identity.version != version);
        entry.push((PackageIdentity::new(id, version), groups));
    }

    /// Makes every call for `id` fail with `message`.
    pub fn fail_on(&self, id: &str, message: impl Into<String>) {
        self.failing.insert(id.to_ascii_lowercase(), message.into());
    }

    /// Delays every call by `latency`, honoring cancellation while waiting.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of provider calls received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Distinct lowercased ids in the feed.
    #[must_use]
    pub fn package_ids(&self) -> HashSet<String> {
        self.packages.iter().map(|e| e.key().clone()).collect()
    }

    async fn enter(&self, id: &str, cancel: &CancellationToken) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::select! {
                () = cancel.cancelled() => return Err(ProviderError::Cancelled),
                () = tokio::time::sleep(latency) => {}
            }
        }
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        if let Some(message) = self.failing.get(&id.to_ascii_lowercase()) {
            return Err(ProviderError::Other {
                message: message.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PackageMetadataProvider for InMemoryFeed {
    fn source_name(&self) -> &str {
        &self.name
    }

    async fn get_all_versions(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<NuGetVersion>, ProviderError> {
        self.enter(id, cancel).await?;
        Ok(self
            .packages
            .get(&id.to_ascii_lowercase())
            .map(|entry| entry.iter().map(|(identity, _)| identity.version.clone()).collect())
            .unwrap_or_default())
    }

    async fn get_dependency_info(
        &self,
        id: &str,
        version: &NuGetVersion,
        cancel: &CancellationToken,
    ) -> Result<DependencyInfo, ProviderError> {
        self.enter(id, cancel).await?;
        self.packages
            .get(&id.to_ascii_lowercase())
            .and_then(|entry| {
                entry
                    .iter()
                    .find(|(identity, _)| &identity.version == version)
                    .map(|(identity, groups)| DependencyInfo {
                        identity: identity.clone(),
                        groups: groups.clone(),
                    })
            })
            .ok_or_else(|| ProviderError::NotFound {
                id: format!("{id} {version}"),
            })
    }
}
