//! The `{success, message}` result surfaced by pipeline-level operations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of an update check/install or a pack upload.
///
/// This is the only contract exposed to callers of those operations: there is
/// no partial-progress reporting. Failures carry the human-readable message of
/// the error that stopped the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Whether the operation achieved its goal.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
}

impl Outcome {
    /// A successful outcome.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// A failed outcome.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Convert an error into a failed outcome, keeping the whole context chain.
    pub fn from_error(prefix: &str, error: &anyhow::Error) -> Self {
        Self::failure(format!("{prefix}: {error:#}"))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_error_keeps_chain() {
        let err = anyhow::anyhow!("disk full").context("copying snapshot");
        let outcome = Outcome::from_error("Update failed", &err);
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Update failed: copying snapshot: disk full");
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let json = serde_json::to_string(&Outcome::success("ok")).unwrap();
        assert_eq!(json, r#"{"success":true,"message":"ok"}"#);
    }
}
