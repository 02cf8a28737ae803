//! Pick the candidate framework a project should consume.
//!
//! # Examples
//!
//! ```bash
//! # Prints netstandard2.0
//! nuresolve nearest net6.0 net472 netstandard2.0 netstandard1.3
//!
//! # No compatible candidate: prints nothing, exit status 2
//! nuresolve nearest net472 net6.0 --format json
//! ```

use super::common::{CommandContext, CommandStatus, OutputFormat};
use crate::framework::Framework;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tracing::debug;

/// Arguments of `nuresolve nearest`.
#[derive(Args, Debug)]
pub struct NearestCommand {
    /// Framework of the consuming project
    pub target: String,

    /// Frameworks a package offers
    #[arg(required = true, num_args = 1..)]
    pub candidates: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct NearestOutput {
    target: String,
    nearest: Option<String>,
}

impl NearestCommand {
    /// Runs the command.
    ///
    /// # Errors
    ///
    /// Returns an error when the target or a candidate is not a valid moniker.
    pub fn execute(self, ctx: &CommandContext) -> Result<CommandStatus> {
        let target = Framework::parse(&self.target)?;
        let candidates = self
            .candidates
            .iter()
            .map(|moniker| Framework::parse(moniker))
            .collect::<Result<Vec<_>, _>>()?;

        let table = ctx.config.compatibility_table();
        let nearest = table.get_nearest(&target, &candidates);
        debug!(
            "Nearest of {} candidate(s) for {}: {:?}",
            candidates.len(),
            target.short_folder_name(),
            nearest.map(Framework::short_folder_name)
        );

        match self.format {
            OutputFormat::Json => {
                let output = NearestOutput {
                    target: target.short_folder_name(),
                    nearest: nearest.map(Framework::short_folder_name),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => match nearest {
                Some(framework) => println!("{}", framework.short_folder_name()),
                None => ctx.print(&format!(
                    "{} none of the candidates is compatible with {}",
                    "warning:".yellow().bold(),
                    target.short_folder_name()
                )),
            },
        }

        Ok(if nearest.is_some() {
            CommandStatus::Success
        } else {
            CommandStatus::Failed
        })
    }
}
