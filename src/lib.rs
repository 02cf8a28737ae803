//! nuresolve - NuGet-style dependency resolution and package checks
//!
//! A library and command-line tool that answers three questions about
//! NuGet-style packages:
//!
//! - which concrete package versions a project gets for each of its target
//!   frameworks, given the packages available in a feed
//! - which of a package's framework-specific groups a project should consume
//! - whether a package's layout and manifest follow the packaging conventions
//!
//! # Architecture Overview
//!
//! Inputs are a resolution request (root project, target frameworks and
//! references), a package metadata provider, and extracted package contents.
//! Outputs are per-framework dependency graphs, conflicts and structured log
//! messages with stable `NUxxxx` codes.
//!
//! ## Key Features
//!
//! - **Concurrent passes**: one breadth-first pass per target framework, with
//!   bounded in-flight provider calls and a shared metadata cache
//! - **No fail-fast**: every resolvable package is resolved and every conflict
//!   is listed
//! - **Deterministic**: identical inputs give identical graphs and message order
//! - **Cancellable**: a cancellation token aborts a run without partial results
//!
//! # Core Modules
//!
//! ## Resolution
//! - [`resolver`] - Resolution passes, conflicts, cycles and graph output
//! - [`provider`] - Package metadata providers and the metadata cache
//! - [`version`] - NuGet versions and version ranges
//! - [`models`] - Package identities and dependency groups
//!
//! ## Frameworks and Content
//! - [`framework`] - Framework monikers and the compatibility table
//! - [`content`] - Package path patterns and content item selection
//! - [`manifest`] - `.nuspec` manifest parsing
//!
//! ## Package Checks
//! - [`rules`] - Package rules producing `NU51xx` warnings
//! - [`report`] - Log codes, messages and reports
//!
//! ## Supporting Modules
//! - [`cli`] - Command-line interface
//! - [`config`] - Optional TOML configuration
//! - [`core`] - Error handling
//! - [`constants`] - Shared defaults
//!
//! # Command-Line Usage
//!
//! ```bash
//! # Resolve a project against a folder feed
//! nuresolve resolve project.toml --feed ./packages --tree
//!
//! # Check an extracted package
//! nuresolve validate ./contoso.core.1.0.0
//!
//! # Pick the nearest framework
//! nuresolve nearest net6.0 net472 netstandard2.0
//! ```
//!
//! # Request Format
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
//! project = "Lib"
//!
//! [[projects]]
//! name = "Lib"
//! frameworks = ["netstandard2.0"]
//! ```

// Resolution
pub mod models;
pub mod provider;
pub mod resolver;
pub mod version;

// Frameworks and content
pub mod content;
pub mod framework;
pub mod manifest;

// Package checks
pub mod report;
pub mod rules;

// Supporting modules
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
