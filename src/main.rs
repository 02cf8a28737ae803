//! nuresolve CLI entry point
//!
//! Parses arguments, installs logging, runs the command and maps the outcome
//! to an exit status: 0 on success, 2 when the command found conflicts or
//! error-level messages, 1 on hard failures.

use clap::Parser;
use nuresolve_cli::cli;
use nuresolve_cli::core::user_friendly_error;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    cli.init_logging();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(status) => std::process::exit(status.exit_code()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
