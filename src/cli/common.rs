//! Shared pieces of the command implementations.

use crate::config::Config;
use crate::report::{LogLevel, Report};
use colored::Colorize;
use std::path::Path;

/// How command results are printed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Colored, human-readable text
    #[default]
    Text,
    /// Pretty-printed JSON for automation
    Json,
}

/// Outcome of a command that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// Nothing to report beyond warnings
    Success,
    /// Conflicts, error-level findings, or no answer
    Failed,
}

impl CommandStatus {
    /// Process exit code: 0 for success, 2 for failures found by the command.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failed => 2,
        }
    }
}

/// Settings every command receives.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    /// Loaded configuration
    pub config: Config,
    /// Suppress informational output
    pub quiet: bool,
}

impl CommandContext {
    /// Creates a context.
    #[must_use]
    pub const fn new(config: Config, quiet: bool) -> Self {
        Self { config, quiet }
    }

    /// Prints `message` unless quiet.
    pub fn print(&self, message: &str) {
        if !self.quiet {
            println!("{message}");
        }
    }
}

/// Fails with a file-not-found error unless `path` exists.
///
/// # Errors
///
/// Returns [`crate::core::NuresolveError::FileNotFound`] for a missing path.
pub async fn require_path(path: &Path) -> anyhow::Result<()> {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        Ok(())
    } else {
        Err(crate::core::NuresolveError::FileNotFound {
            path: path.display().to_string(),
        }
        .into())
    }
}

/// One-line summary of a report, e.g. `2 warnings, 1 error`.
#[must_use]
pub fn summary_line(report: &Report) -> String {
    let warnings = report.count(LogLevel::Warning);
    let errors = report.count(LogLevel::Error);
    let plural = |n: usize, word: &str| {
        if n == 1 {
            format!("{n} {word}")
        } else {
            format!("{n} {word}s")
        }
    };
    let text = format!("{}, {}", plural(warnings, "warning"), plural(errors, "error"));
    if errors > 0 {
        text.red().to_string()
    } else if warnings > 0 {
        text.yellow().to_string()
    } else {
        text.green().to_string()
    }
}
