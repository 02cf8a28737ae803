//! Test utilities for nuresolve
//!
//! Helpers for writing tests: logging setup and fixtures that lay out folder
//! feeds, extracted package directories and request files on disk.
//!
//! # Example
//!
//! ```rust,no_run
//! use nuresolve_cli::test_utils::{write_feed_package, write_request};
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! write_feed_package(&temp.path().join("feed"), "A", "1.0.0", &[("B", "[1.0.0, )")]);
//! write_feed_package(&temp.path().join("feed"), "B", "1.0.0", &[]);
//! write_request(&temp.path().join("project.toml"), "App", &["net6.0"], &[("A", "1.0.0")]);
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Initializes the tracing subscriber once regardless of how many times it is
/// called. Uses `level` when given, otherwise `RUST_LOG` if set; with neither,
/// logging stays off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("Failed to create {}: {e}", parent.display()));
    }
    std::fs::write(path, content)
        .unwrap_or_else(|e| panic!("Failed to write {}: {e}", path.display()));
}

/// Writes `{feed}/{id}/{version}/{id}.nuspec` with `dependencies` inner XML.
///
/// Returns the manifest path.
pub fn write_feed_nuspec(feed: &Path, id: &str, version: &str, dependencies: &str) -> PathBuf {
    let lower = id.to_ascii_lowercase();
    let path = feed.join(&lower).join(version).join(format!("{lower}.nuspec"));
    write(
        &path,
        &format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <package>\n  <metadata>\n    <id>{id}</id>\n    <version>{version}</version>\n    \
             <dependencies>{dependencies}</dependencies>\n  </metadata>\n</package>\n"
        ),
    );
    path
}

/// Writes a feed package whose dependencies apply to every framework.
///
/// `dependencies` holds `(id, range)` pairs.
pub fn write_feed_package(
    feed: &Path,
    id: &str,
    version: &str,
    dependencies: &[(&str, &str)],
) -> PathBuf {
    let mut xml = String::new();
    for (dep_id, range) in dependencies {
        let _ = write!(xml, "<dependency id=\"{dep_id}\" version=\"{range}\" />");
    }
    write_feed_nuspec(feed, id, version, &xml)
}

/// Writes an extracted package directory: `{id}.nuspec` with `metadata` as
/// the inner XML of `<metadata>`, plus an empty file per entry of `files`.
pub fn write_package_dir(root: &Path, id: &str, metadata: &str, files: &[&str]) {
    write(
        &root.join(format!("{id}.nuspec")),
        &format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <package>\n  <metadata>\n    <id>{id}</id>\n{metadata}\n  </metadata>\n</package>\n"
        ),
    );
    for file in files {
        write(&root.join(file), "");
    }
}

/// Writes a request file for a single project.
///
/// `dependencies` holds `(id, version)` pairs; an empty version means any.
pub fn write_request(path: &Path, name: &str, frameworks: &[&str], dependencies: &[(&str, &str)]) {
    let monikers = frameworks
        .iter()
        .map(|f| format!("\"{f}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let mut content = format!("name = \"{name}\"\nframeworks = [{monikers}]\n");
    for (id, version) in dependencies {
        let _ = write!(content, "\n[[dependencies]]\nid = \"{id}\"\n");
        if !version.is_empty() {
            let _ = writeln!(content, "version = \"{version}\"");
        }
    }
    write(path, &content);
}
