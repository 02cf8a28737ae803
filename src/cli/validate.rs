//! Check an extracted package directory against the package rules.
//!
//! # Examples
//!
//! ```bash
//! nuresolve validate ./contoso.core.1.0.0
//! nuresolve validate ./contoso.core.1.0.0 --format json
//! ```
//!
//! Rules listed under `[rules] disabled` are skipped and codes listed under
//! `warnings_as_errors` are promoted. Exit status is 2 when any error-level
//! message remains.

use super::common::{CommandContext, CommandStatus, OutputFormat, require_path, summary_line};
use crate::rules::{DirectoryPackage, PackageView, RuleSet};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Arguments of `nuresolve validate`.
#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// Extracted package directory containing a `.nuspec` at its root
    pub package: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl ValidateCommand {
    /// Runs the command.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory is missing, cannot be walked, or
    /// has no readable manifest.
    pub async fn execute(self, ctx: &CommandContext) -> Result<CommandStatus> {
        require_path(&self.package).await?;

        let lister = DirectoryPackage::new(&self.package);
        let view = tokio::task::spawn_blocking(move || PackageView::from_lister(&lister)).await??;
        debug!("Validating {} ({} files)", view.id(), view.files.len());

        let rules = RuleSet::with_table(Arc::new(ctx.config.compatibility_table()))
            .without_codes(&ctx.config.rules.disabled);
        let report = rules
            .run(&view)
            .with_warnings_as_errors(&ctx.config.rules.warnings_as_errors);

        match self.format {
            OutputFormat::Json => println!("{}", report.to_json()?),
            OutputFormat::Text => {
                if !report.is_empty() {
                    println!("{}", report.render_text());
                }
                ctx.print(&format!("{}: {}", view.id(), summary_line(&report)));
            }
        }

        Ok(if report.has_errors() {
            CommandStatus::Failed
        } else {
            CommandStatus::Success
        })
    }
}
