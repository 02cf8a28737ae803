//! Shared helpers for the integration suite.

#![allow(dead_code)]

use anyhow::Result;
use assert_cmd::Command;
use nuresolve_cli::test_utils::{write_feed_package, write_package_dir, write_request};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A scratch workspace holding a request file, a folder feed and packages.
pub struct TestProject {
    _temp_dir: TempDir, // Keep alive for RAII cleanup
    root: PathBuf,
    feed_dir: PathBuf,
}

impl TestProject {
    /// Create an empty workspace with a `feed/` directory
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().to_path_buf();
        let feed_dir = root.join("feed");
        std::fs::create_dir_all(&feed_dir)?;
        Ok(Self {
            _temp_dir: temp_dir,
            root,
            feed_dir,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn feed_dir(&self) -> &Path {
        &self.feed_dir
    }

    pub fn request_path(&self) -> PathBuf {
        self.root.join("project.toml")
    }

    /// Add a feed package with dependencies for every framework
    pub fn add_package(&self, id: &str, version: &str, dependencies: &[(&str, &str)]) {
        write_feed_package(&self.feed_dir, id, version, dependencies);
    }

    /// Write `project.toml` for a single net6.0 project
    pub fn write_request(&self, dependencies: &[(&str, &str)]) {
        write_request(&self.request_path(), "App", &["net6.0"], dependencies);
    }

    /// Write an extracted package directory under `packages/{id}` and return it
    pub fn add_package_dir(&self, id: &str, metadata: &str, files: &[&str]) -> PathBuf {
        let dir = self.root.join("packages").join(id);
        write_package_dir(&dir, id, metadata, files);
        dir
    }

    /// A `nuresolve` command running in the workspace with configuration isolated
    pub fn command(&self) -> Result<Command> {
        let mut cmd = Command::cargo_bin("nuresolve")?;
        cmd.current_dir(&self.root)
            .env("NURESOLVE_CONFIG", self.root.join("no-config.toml"))
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        Ok(cmd)
    }

    /// Run the `nuresolve` binary and capture its output
    pub fn run_nuresolve(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = self.command()?.args(args).output()?;
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}

/// Captured output of a binary run
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Assert the command succeeded
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success,
            "Command failed with code {:?}\nStderr: {}",
            self.code, self.stderr
        );
        self
    }

    /// Assert the command exited with `code`
    pub fn assert_code(&self, code: i32) -> &Self {
        assert_eq!(
            self.code,
            Some(code),
            "Unexpected exit code\nStdout: {}\nStderr: {}",
            self.stdout,
            self.stderr
        );
        self
    }

    /// Parse stdout as JSON
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}): {}", self.stdout))
    }
}
