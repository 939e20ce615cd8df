//! Error types for entity drivers and sessions

use std::path::PathBuf;
use thiserror::Error;

use auxsync_browser::BrowserError;
use auxsync_engine::EngineError;

/// Result type alias using the driver error
pub type DriverResult<T> = Result<T, DriverError>;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Authentication state file does not exist: {}", .0.display())]
    Precondition(PathBuf),

    #[error("No current logged in user")]
    NotLoggedIn,

    #[error("Error saving {entity}: {reason}")]
    SaveFailed { entity: String, reason: String },

    #[error("Error deleting {entity}: {reason}")]
    DeleteFailed { entity: String, reason: String },

    #[error("{0} not found after saving")]
    MissingAfterSave(String),

    #[error("Could not delete {0}")]
    StillPresentAfterDelete(String),

    #[error("{entity} has no table `{table}`")]
    UnknownTable { entity: String, table: String },

    #[error("Input is missing search key `{0}`")]
    MissingSearchKey(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl DriverError {
    /// Timeouts anywhere in the stack may succeed on a re-run
    pub fn is_transient(&self) -> bool {
        match self {
            DriverError::Engine(e) => e.is_transient(),
            DriverError::Browser(e) => e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auxsync_engine::FieldId;

    #[test]
    fn test_engine_errors_pass_through() {
        let err: DriverError =
            EngineError::VerificationMismatch(vec![FieldId::new("city")]).into();
        assert_eq!(err.to_string(), "Details have not correctly been updated: city");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_timeouts_are_transient() {
        let err: DriverError = BrowserError::Timeout("toast".into()).into();
        assert!(err.is_transient());
        let err: DriverError = EngineError::Timeout("login".into()).into();
        assert!(err.is_transient());
    }
}
