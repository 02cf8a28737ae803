//! Integration test suite for nuresolve
//!
//! End-to-end tests that resolve request files against on-disk folder feeds,
//! validate extracted package directories, and drive the `nuresolve` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **resolve**: resolution through request files and folder feeds
//! - **validate**: package rules over extracted package directories
//! - **cli**: exit codes and output of the binary

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cli;
mod resolve;
mod validate;
