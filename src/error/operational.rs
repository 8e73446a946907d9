//! Operational error context propagation with `anyhow`.
//!
//! Domain errors (`LibraryError`, `SessionError`) describe what failed;
//! this module carries where and why across module boundaries, and funnels
//! the resulting chains into `tracing`.

use std::{error::Error as StdError, fmt::Display};

use {
    anyhow::{Context, Error, Result as AnyhowResult},
    tracing::{debug, error, warn},
};

/// Extension trait for enhanced error context.
///
/// Attaches call-site information to a `Result` as it crosses a module
/// boundary, so a logged chain reads outermost-context first.
pub trait ResultExt<T, E> {
    /// Adds context to an error with a static string.
    fn add_context(self, context: &'static str) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static;

    /// Adds context to an error with a formatted string.
    fn add_contextf(self, format: impl Display) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn add_context(self, context: &'static str) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.context(context)
    }

    fn add_contextf(self, format: impl Display) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.context(format.to_string())
    }
}

/// Centralized error reporting through `tracing`.
///
/// Background tasks (the connect task, the scan task, the sleep timer)
/// have no caller to return an error to; they hand failures here instead
/// so every swallowed error still reaches the log with its full chain.
pub struct ErrorReporter;

impl ErrorReporter {
    /// Reports an expected, per-entry failure (skipped file, dropped command).
    pub fn debug(error: &Error, context: &str) {
        debug!(context = context, error = %error, "Recoverable error");
    }

    /// Reports a degraded-but-continuing condition (empty scan, stale root).
    pub fn warn(error: &Error, context: &str) {
        warn!(context = context, error = %error, "Degraded operation");
    }

    /// Reports a failure that ends an operation (connection lost for good).
    pub fn error(error: &Error, context: &str) {
        error!(context = context, error = %error, "Operation failed");
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use crate::{
        error::domain::LibraryError,
        error::operational::{ErrorReporter, ResultExt},
    };

    #[test]
    fn test_result_ext_add_context() {
        let result: Result<(), LibraryError> = Err(LibraryError::RootUnavailable {
            handle: "/gone".to_string(),
        });
        let with_context = result.add_context("resolving scan root");

        let error = with_context.unwrap_err();
        assert!(error.to_string().contains("resolving scan root"));
        assert!(
            error
                .chain()
                .any(|cause| cause.to_string().contains("/gone"))
        );
    }

    #[test]
    fn test_result_ext_add_contextf() {
        let result: Result<(), LibraryError> = Err(LibraryError::InvalidData {
            reason: "bad locator".to_string(),
        });
        let with_context = result.add_contextf(format_args!("scanning entry {}", 7));

        let error = with_context.unwrap_err();
        assert!(error.to_string().contains("scanning entry 7"));
    }

    #[test]
    fn test_error_reporter_accepts_anyhow_chains() {
        // Reporting must not panic regardless of chain depth.
        let error = anyhow!("inner").context("outer");
        ErrorReporter::debug(&error, "test");
        ErrorReporter::warn(&error, "test");
        ErrorReporter::error(&error, "test");
    }
}
