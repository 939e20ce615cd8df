//! JSON-lines protocol spoken with the bridge process
//!
//! Each request is one line on the bridge's stdin; each response is one line
//! on its stdout carrying the same `id`. Lines that are not responses are
//! treated as log output.

use serde::{Deserialize, Serialize};

use crate::locator::Locator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Launch {
        headless: bool,
        storage_state: Option<String>,
        viewport_width: u32,
        viewport_height: u32,
    },
    Goto {
        url: String,
        timeout_ms: u64,
    },
    WaitForUrl {
        pattern: String,
        timeout_ms: u64,
    },
    Count {
        locator: Locator,
    },
    IsVisible {
        locator: Locator,
    },
    IsEnabled {
        locator: Locator,
    },
    InputValue {
        locator: Locator,
        timeout_ms: u64,
    },
    TextContent {
        locator: Locator,
        timeout_ms: u64,
    },
    Fill {
        locator: Locator,
        value: String,
        timeout_ms: u64,
    },
    Clear {
        locator: Locator,
        timeout_ms: u64,
    },
    Click {
        locator: Locator,
        click_count: u32,
        timeout_ms: u64,
    },
    WaitFor {
        locator: Locator,
        state: WaitState,
        timeout_ms: u64,
    },
    StorageState {
        path: String,
    },
    Close,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Launch { .. } => "launch",
            Command::Goto { .. } => "goto",
            Command::WaitForUrl { .. } => "wait_for_url",
            Command::Count { .. } => "count",
            Command::IsVisible { .. } => "is_visible",
            Command::IsEnabled { .. } => "is_enabled",
            Command::InputValue { .. } => "input_value",
            Command::TextContent { .. } => "text_content",
            Command::Fill { .. } => "fill",
            Command::Clear { .. } => "clear",
            Command::Click { .. } => "click",
            Command::WaitFor { .. } => "wait_for",
            Command::StorageState { .. } => "storage_state",
            Command::Close => "close",
        }
    }

    /// Playwright-side timeout carried by the command, if any
    pub fn timeout_ms(&self) -> Option<u64> {
        match self {
            Command::Goto { timeout_ms, .. }
            | Command::WaitForUrl { timeout_ms, .. }
            | Command::InputValue { timeout_ms, .. }
            | Command::TextContent { timeout_ms, .. }
            | Command::Fill { timeout_ms, .. }
            | Command::Clear { timeout_ms, .. }
            | Command::Click { timeout_ms, .. }
            | Command::WaitFor { timeout_ms, .. } => Some(*timeout_ms),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub id: u64,
    #[serde(flatten)]
    pub command: Command,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Failure {
    /// JavaScript error class name, `TimeoutError` for Playwright timeouts
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    pub id: u64,
    pub ok: bool,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub error: Option<Failure>,
}

impl Response {
    /// Parse a stdout line; `None` for anything that is not a response
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if !line.starts_with('{') {
            return None;
        }
        serde_json::from_str(line).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_flat() {
        let request = Request {
            id: 7,
            command: Command::Click {
                locator: Locator::id("ToolBtnSave"),
                click_count: 1,
                timeout_ms: 5000,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["op"], "click");
        assert_eq!(json["click_count"], 1);
        assert_eq!(json["locator"][0]["kind"], "css");
    }

    #[test]
    fn test_parse_responses() {
        let ok = Response::parse(r#"{"id":1,"ok":true,"value":"X1"}"#).unwrap();
        assert!(ok.ok);
        assert_eq!(ok.value, "X1");

        let err = Response::parse(
            r#"{"id":2,"ok":false,"error":{"name":"TimeoutError","message":"locator.click: Timeout 5000ms exceeded"}}"#,
        )
        .unwrap();
        assert!(!err.ok);
        assert_eq!(err.error.unwrap().name, "TimeoutError");

        assert!(Response::parse("Downloading chromium...").is_none());
    }
}
