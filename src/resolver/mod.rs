//! Dependency resolution for package references.
//!
//! The resolver turns a [`ResolutionRequest`] into one [`FrameworkResolution`]
//! per target framework of the root project. Passes for different frameworks
//! run concurrently and share nothing but the [`MetadataCache`].
//!
//! # Architecture Overview
//!
//! - [`request`]: request file format and validation
//! - `pass`: the per-framework breadth-first walk over an arena of nodes
//! - [`types`]: nodes, edges, conflicts and pass output
//! - [`dependency_graph`]: `petgraph` view for install order and tree output
//!
//! # Outcomes
//!
//! A run yields one of:
//!
//! 1. every pass [`PassOutcome::Success`]: a complete graph with zero conflicts
//! 2. some pass [`PassOutcome::Partial`]: everything resolvable is resolved and
//!    every conflict found is listed (no fail-fast)
//! 3. `Err(ResolveError)`: a provider failure or cancellation; no graph is
//!    returned
//!
//! # Version Selection
//!
//! | Constraint | Chosen version |
//! |------------|----------------|
//! | Range (`[1.0, 2.0)`, `>= 1.0`) | highest satisfying version |
//! | Bare version from the root project (`2.5.0`) | exactly that version, else the lowest satisfying one with NU1603 |
//! | Several constraints at the same depth | highest version satisfying their intersection |
//! | Constraint arriving deeper than the decision | checked against the decided version; a rejected transitive choice is narrowed and the pass walks again |
//!
//! # Example
//!
//! ```rust,no_run
//! use nuresolve_cli::framework::Framework;
//! use nuresolve_cli::provider::InMemoryFeed;
//! use nuresolve_cli::resolver::{RequestedDependency, ResolutionRequest, Resolver};
//! use nuresolve_cli::version::{NuGetVersion, VersionRange};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let feed = InMemoryFeed::new("memory");
//! feed.add_package("A", NuGetVersion::parse("1.0.0")?, vec![]);
//!
//! let request = ResolutionRequest::single(
//!     "App",
//!     vec![Framework::parse("net6.0")?],
//!     vec![RequestedDependency::Package {
//!         id: "A".into(),
//!         range: VersionRange::parse("[1.0, )")?,
//!         pinned: false,
//!         frameworks: vec![],
//!     }],
//! );
//! let result = Resolver::new(Arc::new(feed))
//!     .resolve(&request, &CancellationToken::new())
//!     .await?;
//! assert!(result.is_success());
//! # Ok(())
//! # }
//! ```

pub mod dependency_graph;
mod pass;
pub mod request;
pub mod types;

#[cfg(test)]
mod tests;

pub use dependency_graph::ResolvedGraph;
pub use request::{
    DependencySpec, ProjectRequest, ProjectSpec, RequestError, RequestedDependency,
    ResolutionRequest,
};
pub use types::{
    CycleAnnotation, EdgeStatus, FrameworkResolution, GraphEdge, GraphNode, NodeState,
    PassOutcome, ResolutionConflict, ResolvedPackage,
};

use crate::constants::DEFAULT_MAX_CONCURRENCY;
use crate::framework::CompatibilityTable;
use crate::provider::{CachingProvider, MetadataCache, PackageMetadataProvider, ProviderError};
use crate::report::Report;
use futures::future::try_join_all;
use pass::ResolutionPass;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Hard failures of a resolution run.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A provider call failed
    #[error("Failed to retrieve information about '{package_id}' from source '{source_name}'")]
    Protocol {
        /// Provider source name
        source_name: String,
        /// Package being looked up
        package_id: String,
        /// Provider error
        #[source]
        cause: ProviderError,
    },

    /// The run was cancelled
    #[error("Resolution was cancelled")]
    Cancelled,
}

/// Per-framework results of one run, in root framework order.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionResult {
    /// One entry per root framework
    pub frameworks: Vec<FrameworkResolution>,
}

impl ResolutionResult {
    /// Whether every pass finished without conflicts.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.frameworks.iter().all(FrameworkResolution::is_success)
    }

    /// The pass for `framework`, matched by short folder name.
    #[must_use]
    pub fn for_framework(&self, framework: &str) -> Option<&FrameworkResolution> {
        self.frameworks
            .iter()
            .find(|f| f.framework.short_folder_name().eq_ignore_ascii_case(framework))
    }

    /// Every pass's messages, pass by pass.
    #[must_use]
    pub fn report(&self) -> Report {
        self.frameworks
            .iter()
            .flat_map(|f| f.messages.iter().cloned())
            .collect()
    }
}

/// Runs resolution passes against a metadata provider.
#[derive(Clone)]
pub struct Resolver {
    provider: Arc<dyn PackageMetadataProvider>,
    cache: Arc<MetadataCache>,
    table: Arc<CompatibilityTable>,
    max_concurrency: usize,
}

impl Resolver {
    /// Creates a resolver with a fresh cache and the standard compatibility table.
    #[must_use]
    pub fn new(provider: Arc<dyn PackageMetadataProvider>) -> Self {
        Self {
            provider,
            cache: Arc::new(MetadataCache::new()),
            table: Arc::new(CompatibilityTable::standard()),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Shares `cache` with other resolvers.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<MetadataCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Uses `table` for group and project framework selection.
    #[must_use]
    pub fn with_table(mut self, table: CompatibilityTable) -> Self {
        self.table = Arc::new(table);
        self
    }

    /// Bounds in-flight provider calls per pass; at least 1.
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// The shared metadata cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    /// Resolves every root framework of `request` concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Protocol`] when a provider call fails and
    /// [`ResolveError::Cancelled`] when `cancel` fires before the run completes.
    pub async fn resolve(
        &self,
        request: &ResolutionRequest,
        cancel: &CancellationToken,
    ) -> Result<ResolutionResult, ResolveError> {
        let provider = CachingProvider::new(Arc::clone(&self.provider), Arc::clone(&self.cache));
        let passes = request.root.frameworks.iter().map(|framework| {
            ResolutionPass::new(
                &provider,
                &self.table,
                request,
                framework.clone(),
                self.max_concurrency,
                cancel,
            )
            .run()
        });
        let frameworks = try_join_all(passes).await?;
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }

        let result = ResolutionResult { frameworks };
        info!(
            "Resolved {} framework(s) for {}: {}",
            result.frameworks.len(),
            request.root.name,
            if result.is_success() {
                "success"
            } else {
                "partial"
            }
        );
        Ok(result)
    }
}
