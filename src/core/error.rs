//! Error handling for steward
//!
//! Errors follow the same two-layer model as the rest of the crate:
//! 1. **Strongly-typed errors** ([`StewardError`]) for failures a caller may
//!    want to branch on (network, parse, filesystem, restricted path, process).
//! 2. **`anyhow` context chains** for everything else, attached with
//!    `.context(..)` where the failure happens.
//!
//! Pipeline boundaries (the update orchestrator and the pack installer) never
//! let an error escape: they convert it into an [`Outcome`](crate::core::Outcome).
//! The CLI uses [`user_friendly_error`] to print whatever reaches `main`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use bedrock_steward::core::{StewardError, user_friendly_error};
//!
//! let err = anyhow::Error::from(StewardError::WorldNotFound("Bedrock level".into()));
//! let ctx = user_friendly_error(err);
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Categorized failures raised by steward operations.
///
/// Variants map onto the recovery policy of the caller:
///
/// - [`Network`](Self::Network) and [`Parse`](Self::Parse) abort a version
///   check or skip a single pack, never the whole process.
/// - [`RestrictedPath`](Self::RestrictedPath) is a hard stop: a destructive
///   operation was pointed outside the managed roots and must not be retried.
/// - [`Process`](Self::Process) failures are logged by the supervisor's callers
///   and never fatal.
#[derive(Error, Debug)]
pub enum StewardError {
    /// Transport failure while talking to a remote endpoint.
    #[error("Network error while requesting {url}: {reason}")]
    Network {
        /// The URL being requested
        url: String,
        /// Reason reported by the transport or HTTP status
        reason: String,
    },

    /// Remote metadata, a pack manifest or a registry file is malformed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A filesystem operation failed.
    #[error("Filesystem error during {operation} on {}: {source}", path.display())]
    Filesystem {
        /// What was being attempted (e.g. "rename", "copy")
        operation: String,
        /// The path involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A destructive operation targeted a path outside the managed roots.
    #[error("Refusing to modify {}: path is not inside a managed directory", path.display())]
    RestrictedPath {
        /// The rejected path
        path: PathBuf,
    },

    /// Starting, stopping or probing the server process failed.
    #[error("Process error: {0}")]
    Process(String),

    /// The requested world directory does not exist.
    #[error("World '{0}' does not exist")]
    WorldNotFound(String),

    /// Another update run holds the single-flight guard.
    #[error("An update is already in progress")]
    UpdateInProgress,

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StewardError {
    /// Shorthand for a [`StewardError::Filesystem`] built from an I/O error.
    pub fn filesystem(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Filesystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }
}

/// A user-facing rendering of an error with optional suggestion and details.
#[derive(Debug)]
pub struct ErrorContext {
    /// Primary message (the full anyhow chain)
    pub message: String,
    /// Optional hint on how to fix the problem
    pub suggestion: Option<String>,
    /// Optional extra explanation
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
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

/// Convert any error into an [`ErrorContext`] with a targeted suggestion.
///
/// The first [`StewardError`] found in the chain decides the suggestion; plain
/// I/O and TOML errors get generic hints.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let message = format!("{error:#}");

    if let Some(steward) = error.chain().find_map(|e| e.downcast_ref::<StewardError>()) {
        return match steward {
            StewardError::Network { .. } => ErrorContext::new(message)
                .with_suggestion("Check network connectivity and the configured download_page_url"),
            StewardError::Parse(_) => ErrorContext::new(message).with_details(
                "The remote page or a JSON file did not have the expected structure",
            ),
            StewardError::RestrictedPath { .. } => ErrorContext::new(message)
                .with_suggestion(
                    "Only paths inside server_dir, temp_dir and backup_dir may be removed",
                )
                .with_details("This is a safety stop and is never retried"),
            StewardError::Process(_) => ErrorContext::new(message)
                .with_suggestion("Check that the server executable exists and is executable"),
            StewardError::WorldNotFound(_) => ErrorContext::new(message)
                .with_suggestion("Run `steward worlds list` to see available worlds"),
            StewardError::UpdateInProgress => ErrorContext::new(message)
                .with_suggestion("Wait for the running update to finish and try again"),
            StewardError::Config(_) => ErrorContext::new(message)
                .with_suggestion("Run `steward config show` to inspect the effective configuration"),
            StewardError::Filesystem { .. } => ErrorContext::new(message)
                .with_suggestion("Check that the path exists and that you have permission to modify it"),
        };
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(message).with_suggestion(
                    "Try running with elevated permissions or check directory ownership",
                );
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(message)
                    .with_suggestion("Check that the file or directory exists");
            }
            _ => {}
        }
    }

    if error.chain().any(|e| e.downcast_ref::<toml::de::Error>().is_some()) {
        return ErrorContext::new(message)
            .with_suggestion("Check the TOML syntax of your steward config file");
    }

    ErrorContext::new(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restricted_path_message() {
        let err = StewardError::RestrictedPath {
            path: PathBuf::from("/etc"),
        };
        assert!(err.to_string().contains("/etc"));
        assert!(err.to_string().contains("not inside a managed directory"));
    }

    #[test]
    fn test_user_friendly_error_finds_wrapped_category() {
        let err = anyhow::Error::from(StewardError::UpdateInProgress).context("running update");
        let ctx = user_friendly_error(err);
        assert!(ctx.message.contains("running update"));
        assert!(ctx.message.contains("already in progress"));
        assert!(ctx.suggestion.unwrap().contains("Wait"));
    }

    #[test]
    fn test_user_friendly_error_plain_io() {
        let err = anyhow::Error::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let ctx = user_friendly_error(err);
        assert!(ctx.suggestion.is_some());
        assert!(ctx.details.is_none());
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext::new("boom").with_details("d").with_suggestion("s");
        assert_eq!(ctx.to_string(), "boom\nDetails: d\nSuggestion: s");
    }
}
