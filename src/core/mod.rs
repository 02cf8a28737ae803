//! Core types shared by the library and the command line.
//!
//! # Error Management
//!
//! - [`NuresolveError`] gathers every module's error enum behind one type
//! - [`ErrorContext`] is the terminal form of an error: message, details and
//!   a suggestion, printed with colors by [`ErrorContext::display`]
//! - [`user_friendly_error`] converts any `anyhow::Error` into an
//!   [`ErrorContext`], recognizing known error types anywhere in the chain
//!
//! # Examples
//!
//! ```rust,no_run
//! use nuresolve_cli::core::user_friendly_error;
//!
//! fn run() -> anyhow::Result<()> {
//!     anyhow::bail!("something went wrong")
//! }
//!
//! if let Err(e) = run() {
//!     user_friendly_error(e).display();
//! }
//! ```

pub mod error;

pub use error::{ErrorContext, NuresolveError, user_friendly_error};
