//! Invocation results

use serde::{Deserialize, Serialize};

/// Result of one idempotent invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Whether the live system was modified
    pub changed: bool,
    pub message: String,
    #[serde(default)]
    pub failed: bool,
}

impl Outcome {
    pub fn changed(message: impl Into<String>) -> Self {
        Self {
            changed: true,
            message: message.into(),
            failed: false,
        }
    }

    pub fn unchanged(message: impl Into<String>) -> Self {
        Self {
            changed: false,
            message: message.into(),
            failed: false,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            changed: false,
            message: message.into(),
            failed: true,
        }
    }
}
