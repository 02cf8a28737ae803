//! Package metadata providers.
//!
//! The resolver never reads packages itself. It asks a [`PackageMetadataProvider`]
//! for the versions published under an id and for the dependency groups of one
//! concrete version. Implementations:
//!
//! - [`memory::InMemoryFeed`]: a programmable feed for tests and embedding
//! - [`folder::LocalFolderFeed`]: an expanded package folder on disk
//! - [`cache::CachingProvider`]: memoizes another provider through a shared
//!   [`cache::MetadataCache`]
//!
//! # Cancellation
//!
//! Every call takes a [`CancellationToken`]. Providers that perform I/O check it
//! and return [`ProviderError::Cancelled`]; the resolver additionally races each
//! call against the token so a provider that ignores it cannot stall shutdown.

pub mod cache;
pub mod folder;
pub mod memory;

pub use cache::{CachingProvider, MetadataCache};
pub use folder::LocalFolderFeed;
pub use memory::InMemoryFeed;

use crate::manifest::ManifestError;
use crate::models::{DependencyGroup, PackageIdentity};
use crate::version::NuGetVersion;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors raised by metadata providers.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The feed has no such package or version
    #[error("Package '{id}' was not found in the feed")]
    NotFound {
        /// Package id, plus version when one was requested
        id: String,
    },

    /// Reading feed storage failed
    #[error("Failed to read '{path}'")]
    Io {
        /// Path being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A manifest in the feed is invalid
    #[error("Invalid manifest '{path}'")]
    Manifest {
        /// Manifest path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: ManifestError,
    },

    /// The id cannot name a package in this feed
    #[error("Invalid package id '{id}'")]
    InvalidId {
        /// Rejected id
        id: String,
    },

    /// Any other provider failure
    #[error("{message}")]
    Other {
        /// Description
        message: String,
    },

    /// The operation was cancelled
    #[error("Operation was cancelled")]
    Cancelled,
}

/// Dependency metadata for one package version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyInfo {
    /// The package this describes
    pub identity: PackageIdentity,
    /// Per-framework dependency groups
    pub groups: Vec<DependencyGroup>,
}

/// A source of package versions and dependency metadata.
///
/// An empty version list means the package does not exist in the feed.
/// Implementations must be safe to call concurrently.
#[async_trait]
pub trait PackageMetadataProvider: Send + Sync {
    /// Human-readable source name for diagnostics.
    fn source_name(&self) -> &str;

    /// Every published version of `id`, in any order.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the feed cannot be read or the call is cancelled.
    async fn get_all_versions(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<NuGetVersion>, ProviderError>;

    /// Dependency groups of one concrete version.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] for unknown versions, or another variant
    /// when the feed cannot be read.
    async fn get_dependency_info(
        &self,
        id: &str,
        version: &NuGetVersion,
        cancel: &CancellationToken,
    ) -> Result<DependencyInfo, ProviderError>;
}
