//! Error handling for nuresolve.
//!
//! Library modules return their own precise error enums. [`NuresolveError`]
//! gathers them for callers that want one type, and [`user_friendly_error`]
//! turns any `anyhow::Error` raised by a command into an [`ErrorContext`] with
//! details and a suggestion for the terminal.
//!
//! # Error Categories
//!
//! - **Parse errors**: framework monikers, versions, ranges, manifests and
//!   request files. Always surfaced, never defaulted.
//! - **Resolution errors**: provider failures and cancellation. Conflicts are
//!   not errors; they are reported in the resolution result.
//! - **Package errors**: unreadable package directories.
//! - **Configuration errors**: unreadable or invalid configuration files.
//!
//! # Examples
//!
//! ```rust,no_run
//! use nuresolve_cli::core::{NuresolveError, user_friendly_error};
//!
//! let error = anyhow::Error::from(NuresolveError::FileNotFound {
//!     path: "project.toml".to_string(),
//! });
//! user_friendly_error(error).display();
//! ```

use crate::config::ConfigError;
use crate::framework::FrameworkParseError;
use crate::manifest::ManifestError;
use crate::provider::ProviderError;
use crate::resolver::{RequestError, ResolveError};
use crate::rules::PackageError;
use crate::version::{RangeParseError, VersionParseError};
use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Every failure a nuresolve operation can surface.
#[derive(Error, Debug)]
pub enum NuresolveError {
    /// A framework moniker is invalid
    #[error(transparent)]
    Framework(#[from] FrameworkParseError),

    /// A version string is invalid
    #[error(transparent)]
    Version(#[from] VersionParseError),

    /// A version range is invalid
    #[error(transparent)]
    Range(#[from] RangeParseError),

    /// A package manifest is invalid
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// A resolution request is invalid
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Resolution failed or was cancelled
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A package could not be read
    #[error(transparent)]
    Package(#[from] PackageError),

    /// A provider call failed outside a resolution run
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A required file does not exist
    #[error("File not found: {path}")]
    FileNotFound {
        /// Missing path
        path: String,
    },

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Anything else
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

/// An error prepared for terminal output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Main error line
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Creates a context with no details or suggestion.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Adds an actionable suggestion, shown in green.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Adds details explaining the error, shown in yellow.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Prints the context to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Joins the causes below the top-level error, if any.
fn cause_chain(error: &anyhow::Error) -> Option<String> {
    let causes: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    (!causes.is_empty()).then(|| causes.join(": "))
}

fn framework_context(error: &FrameworkParseError) -> ErrorContext {
    let context = ErrorContext::new(error.to_string());
    match error {
        FrameworkParseError::UnknownIdentifier {
            suggestion: Some(known),
            ..
        } => context.with_suggestion(format!("Did you mean '{known}'?")),
        _ => context.with_suggestion(
            "Use a short folder name such as 'net6.0', 'netstandard2.0' or 'net472'",
        ),
    }
}

fn resolve_context(error: &ResolveError, full: &anyhow::Error) -> ErrorContext {
    match error {
        ResolveError::Protocol { source_name, .. } => {
            let context = ErrorContext::new(error.to_string()).with_suggestion(format!(
                "Check that the package source '{source_name}' exists and is readable"
            ));
            match cause_chain(full) {
                Some(chain) => context.with_details(chain),
                None => context,
            }
        }
        ResolveError::Cancelled => ErrorContext::new(error.to_string())
            .with_details("No partial results are produced for a cancelled run"),
    }
}

fn request_context(error: &RequestError, full: &anyhow::Error) -> ErrorContext {
    let context = ErrorContext::new(error.to_string());
    let context = match cause_chain(full) {
        Some(chain) => context.with_details(chain),
        None => context,
    };
    match error {
        RequestError::Framework { .. } => context.with_suggestion(
            "Use a short folder name such as 'net6.0', 'netstandard2.0' or 'net472'",
        ),
        RequestError::Range { .. } => context.with_suggestion(
            "Use a version ('1.0.0'), an interval ('[1.0, 2.0)') or a minimum ('>= 1.0')",
        ),
        RequestError::UnknownProject { .. } => {
            context.with_suggestion("Declare the referenced project under [[projects]]")
        }
        RequestError::NoFrameworks { .. } => {
            context.with_suggestion("Add a frameworks list, for example frameworks = [\"net6.0\"]")
        }
        RequestError::Toml(_) => context.with_suggestion(
            "Check the TOML syntax. Verify quotes, brackets, and indentation",
        ),
        _ => context,
    }
}

/// Converts any error into an [`ErrorContext`] with details and suggestions.
///
/// Known error types anywhere in the chain get tailored guidance; other errors
/// are shown with their cause chain as details.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(nuresolve) = error.downcast_ref::<NuresolveError>() {
        match nuresolve {
            NuresolveError::Framework(e) => return framework_context(e),
            NuresolveError::Request(e) => return request_context(e, &error),
            NuresolveError::Resolve(e) => return resolve_context(e, &error),
            NuresolveError::FileNotFound { .. } => {
                return ErrorContext::new(nuresolve.to_string())
                    .with_suggestion("Check that the path is correct");
            }
            _ => {}
        }
    }
    if let Some(e) = error.downcast_ref::<FrameworkParseError>() {
        return framework_context(e);
    }
    if let Some(e) = error.downcast_ref::<ResolveError>() {
        return resolve_context(e, &error);
    }
    if let Some(e) = error.downcast_ref::<RequestError>() {
        return request_context(e, &error);
    }
    if let Some(e) = error.downcast_ref::<ManifestError>() {
        return ErrorContext::new(e.to_string())
            .with_suggestion("Check the .nuspec XML against the manifest schema");
    }
    if let Some(e) = error.downcast_ref::<PackageError>() {
        let context = ErrorContext::new(e.to_string());
        let context = match cause_chain(&error) {
            Some(chain) => context.with_details(chain),
            None => context,
        };
        return match e {
            PackageError::MissingManifest { .. } => context
                .with_suggestion("Point at an extracted package directory containing a .nuspec"),
            _ => context,
        };
    }
    if let Some(e) = error.downcast_ref::<ConfigError>() {
        let context = ErrorContext::new(e.to_string()).with_suggestion(
            "Fix the configuration file or point NURESOLVE_CONFIG at a valid one",
        );
        return match cause_chain(&error) {
            Some(chain) => context.with_details(chain),
            None => context,
        };
    }
    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        let context = ErrorContext::new(error.to_string());
        return match io_error.kind() {
            std::io::ErrorKind::NotFound => context
                .with_suggestion("Check that the file or directory exists and the path is correct"),
            std::io::ErrorKind::PermissionDenied => {
                context.with_suggestion("Check file permissions and ownership")
            }
            _ => context,
        };
    }
    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(format!("Invalid TOML: {toml_error}"))
            .with_suggestion("Check the TOML syntax. Verify quotes, brackets, and indentation");
    }

    let context = ErrorContext::new(error.to_string());
    match cause_chain(&error) {
        Some(chain) => context.with_details(chain),
        None => context,
    }
}
