//! Error types for the Playwright bridge

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Node.js or the playwright package not found. Install with: npm install playwright && npx playwright install chromium")]
    PlaywrightNotFound,

    #[error("Bridge failed to start: {0}")]
    Startup(String),

    #[error("Bridge process exited unexpectedly")]
    BridgeExited,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Unexpected bridge response: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BrowserError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BrowserError::Timeout(_))
    }
}

pub type BrowserResult<T> = Result<T, BrowserError>;
