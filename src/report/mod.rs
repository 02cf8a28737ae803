//! Diagnostic messages and their aggregation into reports.
//!
//! Both the resolver and the package rules emit [`LogMessage`] values. A [`Report`]
//! keeps them in insertion order so output is reproducible for the same input;
//! deduplication and severity sorting are explicit opt-in transformations.
//!
//! # Output Formats
//!
//! Text output mirrors the familiar compiler-diagnostic shape:
//!
//! ```text
//! warning NU5100: The assembly 'tools/foo.dll' is not inside the 'lib' folder ...
//! error NU1107: Version conflict detected for Contoso.Core ...
//! ```
//!
//! JSON output serializes the message list as-is, one object per message with
//! `level`, `code`, `message` and the optional `target_framework` and
//! `package_id` fields.

pub mod codes;

pub use codes::{InvalidLogCode, LogCode};

use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Severity of a message, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Informational output
    Information,
    /// Output shown even at minimal verbosity
    Minimal,
    /// Non-fatal problem
    Warning,
    /// Problem that fails the operation
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Information => "info",
            Self::Minimal => "minimal",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// One diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogMessage {
    /// Severity
    pub level: LogLevel,
    /// Stable code
    pub code: LogCode,
    /// Formatted text
    pub message: String,
    /// Framework the message applies to, for resolver messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_framework: Option<String>,
    /// Package the message is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
}

impl LogMessage {
    /// Creates a message at `level`.
    #[must_use]
    pub fn new(level: LogLevel, code: LogCode, message: impl Into<String>) -> Self {
        Self {
            level,
            code,
            message: message.into(),
            target_framework: None,
            package_id: None,
        }
    }

    /// Creates a warning.
    #[must_use]
    pub fn warning(code: LogCode, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, code, message)
    }

    /// Creates an error.
    #[must_use]
    pub fn error(code: LogCode, message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, code, message)
    }

    /// Attaches the framework the message applies to.
    #[must_use]
    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.target_framework = Some(framework.into());
        self
    }

    /// Attaches the package the message is about.
    #[must_use]
    pub fn with_package(mut self, package_id: impl Into<String>) -> Self {
        self.package_id = Some(package_id.into());
        self
    }
}

impl fmt::Display for LogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.level, self.code, self.message)
    }
}

/// An ordered collection of messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    messages: Vec<LogMessage>,
}

impl Report {
    /// Builds a report preserving the given order; duplicates are kept.
    #[must_use]
    pub fn aggregate<I>(messages: I) -> Self
    where
        I: IntoIterator<Item = LogMessage>,
    {
        Self {
            messages: messages.into_iter().collect(),
        }
    }

    /// Appends one message.
    pub fn push(&mut self, message: LogMessage) {
        self.messages.push(message);
    }

    /// Appends all messages of another report.
    pub fn extend(&mut self, other: Self) {
        self.messages.extend(other.messages);
    }

    /// Messages in report order.
    #[must_use]
    pub fn messages(&self) -> &[LogMessage] {
        &self.messages
    }

    /// Whether the report holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Number of messages at exactly `level`.
    #[must_use]
    pub fn count(&self, level: LogLevel) -> usize {
        self.messages.iter().filter(|m| m.level == level).count()
    }

    /// Whether any message is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.level == LogLevel::Error)
    }

    /// Messages carrying `code`, in report order.
    pub fn with_code<'a>(&'a self, code: &'a LogCode) -> impl Iterator<Item = &'a LogMessage> + 'a {
        self.messages.iter().filter(move |m| &m.code == code)
    }

    /// Copy without exact duplicates; the first occurrence is kept.
    #[must_use]
    pub fn deduplicated(&self) -> Self {
        let mut seen = HashSet::new();
        Self {
            messages: self
                .messages
                .iter()
                .filter(|m| seen.insert(*m))
                .cloned()
                .collect(),
        }
    }

    /// Copy sorted most severe first; equal levels keep report order.
    #[must_use]
    pub fn sorted_by_severity(&self) -> Self {
        let mut messages = self.messages.clone();
        messages.sort_by(|a, b| b.level.cmp(&a.level));
        Self { messages }
    }

    /// Copy with warnings carrying any of `codes` promoted to errors.
    #[must_use]
    pub fn with_warnings_as_errors(&self, codes: &[LogCode]) -> Self {
        Self {
            messages: self
                .messages
                .iter()
                .cloned()
                .map(|mut message| {
                    if message.level == LogLevel::Warning && codes.contains(&message.code) {
                        message.level = LogLevel::Error;
                    }
                    message
                })
                .collect(),
        }
    }

    /// Copy without messages carrying any of `codes`.
    #[must_use]
    pub fn without_codes(&self, codes: &[LogCode]) -> Self {
        Self {
            messages: self
                .messages
                .iter()
                .filter(|m| !codes.contains(&m.code))
                .cloned()
                .collect(),
        }
    }

    /// Pretty printed JSON array of the messages.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.messages)
    }

    /// Colored, one message per line.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for message in &self.messages {
            let level = match message.level {
                LogLevel::Error => message.level.to_string().red().bold(),
                LogLevel::Warning => message.level.to_string().yellow().bold(),
                LogLevel::Minimal | LogLevel::Information => message.level.to_string().normal(),
            };
            out.push_str(&format!("{level} {}: ", message.code.as_str().bold()));
            if let Some(framework) = &message.target_framework {
                out.push_str(&format!("[{}] ", framework.cyan()));
            }
            out.push_str(&message.message);
            out.push('\n');
        }
        out
    }
}

impl IntoIterator for Report {
    type Item = LogMessage;
    type IntoIter = std::vec::IntoIter<LogMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

impl FromIterator<LogMessage> for Report {
    fn from_iter<T: IntoIterator<Item = LogMessage>>(iter: T) -> Self {
        Self::aggregate(iter)
    }
}
