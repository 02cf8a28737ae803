//! Resolve a project's dependency graph against a local folder feed.
//!
//! # Examples
//!
//! ```bash
//! # Resolve every framework declared in the request
//! nuresolve resolve project.toml --feed ./packages
//!
//! # Resolve one framework and print the dependency tree
//! nuresolve resolve project.toml --feed ./packages --framework net6.0 --tree
//!
//! # Machine-readable output
//! nuresolve resolve project.toml --feed ./packages --format json
//! ```
//!
//! Exit status is 0 when every pass succeeds, 2 when a pass has conflicts or a
//! promoted warning, and 1 on hard failures such as an unreadable feed.

use super::common::{CommandContext, CommandStatus, OutputFormat, require_path, summary_line};
use crate::framework::Framework;
use crate::provider::LocalFolderFeed;
use crate::report::{LogMessage, Report};
use crate::resolver::{
    CycleAnnotation, FrameworkResolution, PassOutcome, ProjectSpec, ResolutionRequest,
    ResolutionResult, ResolvedGraph, Resolver,
};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Arguments of `nuresolve resolve`.
#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// Request file describing the project, its frameworks and dependencies
    pub request: PathBuf,

    /// Folder feed holding `{id}/{version}/{id}.nuspec` manifests
    #[arg(long, default_value = "packages")]
    pub feed: PathBuf,

    /// Resolve only these frameworks instead of the ones in the request
    #[arg(long = "framework", value_name = "TFM")]
    pub frameworks: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print each framework's dependency tree
    #[arg(long)]
    pub tree: bool,
}

/// JSON shape of one framework pass.
#[derive(Debug, Serialize)]
struct FrameworkSummary<'a> {
    framework: String,
    outcome: PassOutcome,
    packages: Vec<PackageSummary<'a>>,
    install_order: Vec<String>,
    cycles: Vec<String>,
    messages: &'a [LogMessage],
}

#[derive(Debug, Serialize)]
struct PackageSummary<'a> {
    id: &'a str,
    version: String,
    depth: usize,
    direct: bool,
    conflicted: bool,
}

#[derive(Debug, Serialize)]
struct ResolveSummary<'a> {
    success: bool,
    frameworks: Vec<FrameworkSummary<'a>>,
    messages: &'a [LogMessage],
}

impl ResolveCommand {
    /// Runs the command.
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be loaded, a framework filter
    /// is invalid, the feed is missing, a provider call fails, or the run is
    /// interrupted.
    pub async fn execute(self, ctx: &CommandContext) -> Result<CommandStatus> {
        let spec = ProjectSpec::load(&self.request)
            .await
            .with_context(|| format!("Failed to load request {}", self.request.display()))?;
        let mut request =
            ResolutionRequest::from_spec(&spec, ctx.config.resolver.strict_frameworks)?;
        if !self.frameworks.is_empty() {
            let frameworks = self
                .frameworks
                .iter()
                .map(|moniker| Framework::parse(moniker))
                .collect::<Result<Vec<_>, _>>()?;
            request = request.with_frameworks(frameworks);
        }
        require_path(&self.feed).await?;

        let resolver = Resolver::new(Arc::new(LocalFolderFeed::new(&self.feed)))
            .with_table(ctx.config.compatibility_table())
            .with_max_concurrency(ctx.config.resolver.max_concurrency);

        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling resolution");
                interrupt.cancel();
            }
        });
        let outcome = resolver.resolve(&request, &cancel).await;
        watcher.abort();
        let result = outcome?;

        let report = result
            .report()
            .with_warnings_as_errors(&ctx.config.rules.warnings_as_errors);
        debug!(
            "Resolution finished with {} message(s) across {} framework(s)",
            report.len(),
            result.frameworks.len()
        );

        match self.format {
            OutputFormat::Json => println!("{}", render_json(&result, &report)?),
            OutputFormat::Text => self.print_text(ctx, &result, &report),
        }

        if result.is_success() && !report.has_errors() {
            Ok(CommandStatus::Success)
        } else {
            Ok(CommandStatus::Failed)
        }
    }

    fn print_text(&self, ctx: &CommandContext, result: &ResolutionResult, report: &Report) {
        for resolution in &result.frameworks {
            ctx.print(&render_framework(resolution, self.tree));
        }
        if !report.is_empty() {
            println!("{}", report.render_text());
        }
        ctx.print(&summary_line(report));
    }
}

fn render_framework(resolution: &FrameworkResolution, tree: bool) -> String {
    let status = match resolution.outcome {
        PassOutcome::Success => "ok".green(),
        PassOutcome::Partial => "partial".red(),
    };
    let mut out = format!(
        "{} [{}]\n",
        resolution.framework.short_folder_name().bold(),
        status
    );
    if resolution.packages.is_empty() {
        out.push_str("  (no packages)\n");
    }
    for package in &resolution.packages {
        let marker = if package.conflicted { " !" } else { "" };
        let scope = if package.direct { "direct" } else { "transitive" };
        out.push_str(&format!(
            "  {} {} ({scope}){marker}\n",
            package.identity.id,
            package.identity.version.to_string().cyan()
        ));
    }
    if tree {
        out.push('\n');
        out.push_str(&ResolvedGraph::from_resolution(resolution).to_tree_string());
    }
    for cycle in &resolution.cycles {
        out.push_str(&format!("  {} {cycle}\n", "cycle:".yellow()));
    }
    out.trim_end().to_string()
}

fn render_json(result: &ResolutionResult, report: &Report) -> Result<String> {
    let frameworks = result
        .frameworks
        .iter()
        .map(|resolution| FrameworkSummary {
            framework: resolution.framework.short_folder_name(),
            outcome: resolution.outcome,
            packages: resolution
                .packages
                .iter()
                .map(|p| PackageSummary {
                    id: &p.identity.id,
                    version: p.identity.version.to_string(),
                    depth: p.depth,
                    direct: p.direct,
                    conflicted: p.conflicted,
                })
                .collect(),
            install_order: ResolvedGraph::from_resolution(resolution)
                .install_order()
                .iter()
                .map(ToString::to_string)
                .collect(),
            cycles: resolution.cycles.iter().map(CycleAnnotation::to_string).collect(),
            messages: &resolution.messages,
        })
        .collect();
    let summary = ResolveSummary {
        success: result.is_success() && !report.has_errors(),
        frameworks,
        messages: report.messages(),
    };
    Ok(serde_json::to_string_pretty(&summary)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{write_feed_package, write_request};
    use tempfile::TempDir;

    fn command(dir: &TempDir, format: OutputFormat) -> ResolveCommand {
        ResolveCommand {
            request: dir.path().join("project.toml"),
            feed: dir.path().join("feed"),
            frameworks: Vec::new(),
            format,
            tree: true,
        }
    }

    fn request(dir: &TempDir, dependencies: &[(&str, &str)]) {
        write_request(&dir.path().join("project.toml"), "App", &["net6.0"], dependencies);
    }

    #[tokio::test]
    async fn test_resolve_success() {
        let dir = TempDir::new().unwrap();
        write_feed_package(&dir.path().join("feed"), "A", "1.0.0", &[("B", "[1.0.0, )")]);
        write_feed_package(&dir.path().join("feed"), "B", "1.0.0", &[]);
        request(&dir, &[("A", "1.0.0")]);

        let status = command(&dir, OutputFormat::Json)
            .execute(&CommandContext::default())
            .await
            .unwrap();
        assert_eq!(status, CommandStatus::Success);
    }

    #[tokio::test]
    async fn test_resolve_conflict_fails() {
        let dir = TempDir::new().unwrap();
        write_feed_package(&dir.path().join("feed"), "A", "1.0.0", &[]);
        request(&dir, &[("A", "[3.0.0, )")]);

        let status = command(&dir, OutputFormat::Text)
            .execute(&CommandContext::new(crate::config::Config::default(), true))
            .await
            .unwrap();
        assert_eq!(status, CommandStatus::Failed);
    }

    #[tokio::test]
    async fn test_missing_feed_is_an_error() {
        let dir = TempDir::new().unwrap();
        request(&dir, &[("A", "1.0.0")]);

        let err = command(&dir, OutputFormat::Text)
            .execute(&CommandContext::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[tokio::test]
    async fn test_invalid_framework_filter() {
        let dir = TempDir::new().unwrap();
        tokio::fs::create_dir_all(dir.path().join("feed")).await.unwrap();
        request(&dir, &[]);

        let mut cmd = command(&dir, OutputFormat::Text);
        cmd.frameworks = vec!["netstandrd2.0".to_string()];
        assert!(cmd.execute(&CommandContext::default()).await.is_err());
    }
}
