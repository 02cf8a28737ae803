//! Command-line interface for nuresolve.
//!
//! # Available Commands
//!
//! - `resolve` - Resolve a project's dependencies against a folder feed
//! - `validate` - Check an extracted package directory against the package rules
//! - `nearest` - Pick the candidate framework a project should consume
//!
//! # Global Options
//!
//! All commands support these global options:
//! - `--verbose` - Enable debug logging
//! - `--quiet` - Suppress everything except results and errors
//! - `--config` - Path to a configuration file
//!
//! # Exit Status
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success, possibly with warnings |
//! | 1 | Hard failure: invalid input, unreadable files, provider errors |
//! | 2 | The command ran and found conflicts or error-level messages |
//!
//! # Example
//!
//! ```bash
//! nuresolve resolve project.toml --feed ./packages --tree
//! nuresolve --verbose validate ./contoso.core.1.0.0
//! nuresolve nearest net6.0 net472 netstandard2.0
//! ```
//!
//! Logging goes to stderr. `RUST_LOG` overrides the level chosen by
//! `--verbose` or `--quiet`.

pub mod common;
mod nearest;
mod resolve;
mod validate;

#[cfg(test)]
mod tests;

pub use common::{CommandContext, CommandStatus, OutputFormat};
pub use nearest::NearestCommand;
pub use resolve::ResolveCommand;
pub use validate::ValidateCommand;

use crate::config::Config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Main CLI structure for nuresolve.
///
/// # Examples
///
/// ```rust,no_run
/// use nuresolve_cli::cli::Cli;
/// use clap::Parser;
///
/// # async fn example() -> anyhow::Result<()> {
/// let cli = Cli::parse_from(["nuresolve", "nearest", "net6.0", "netstandard2.0"]);
/// let status = cli.execute().await?;
/// std::process::exit(status.exit_code());
/// # }
/// ```
#[derive(Parser)]
#[command(
    name = "nuresolve",
    about = "Dependency resolution and package compatibility checks for NuGet-style packages",
    version,
    author,
    long_about = None
)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress informational output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a project's dependency graph against a local folder feed.
    ///
    /// See [`ResolveCommand`] for options.
    Resolve(ResolveCommand),

    /// Check an extracted package directory against the package rules.
    ///
    /// See [`ValidateCommand`] for options.
    Validate(ValidateCommand),

    /// Pick the nearest compatible framework among candidates.
    ///
    /// See [`NearestCommand`] for options.
    Nearest(NearestCommand),
}

impl Cli {
    /// The log filter directive for the parsed flags.
    ///
    /// `--verbose` selects `debug`, `--quiet` selects `error`, otherwise
    /// `warn`. A set `RUST_LOG` takes precedence in [`Cli::init_logging`].
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }

    /// Installs the stderr tracing subscriber.
    ///
    /// Does nothing when a subscriber is already installed.
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(self.log_filter())
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Loads configuration and runs the selected command.
    ///
    /// # Errors
    ///
    /// Returns configuration errors and any hard failure of the command.
    /// Findings such as conflicts are reported through [`CommandStatus`].
    pub async fn execute(self) -> Result<CommandStatus> {
        let config = Config::load(self.config.as_deref()).await?;
        let ctx = CommandContext::new(config, self.quiet);

        match self.command {
            Commands::Resolve(cmd) => cmd.execute(&ctx).await,
            Commands::Validate(cmd) => cmd.execute(&ctx).await,
            Commands::Nearest(cmd) => cmd.execute(&ctx),
        }
    }
}
