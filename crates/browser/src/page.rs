//! Typed page API over the bridge

use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::bridge::{BrowserConfig, PlaywrightBridge};
use crate::error::{BrowserError, BrowserResult};
use crate::locator::Locator;
use crate::protocol::{Command, WaitState};

/// The single page of a bridge session. Clones share the session.
#[derive(Clone)]
pub struct Page {
    bridge: Arc<PlaywrightBridge>,
    default_timeout: Duration,
}

impl Page {
    /// Launch the bridge and open a page
    pub async fn launch(config: &BrowserConfig) -> BrowserResult<Self> {
        let bridge = PlaywrightBridge::launch(config).await?;
        Ok(Self {
            bridge: Arc::new(bridge),
            default_timeout: config.default_timeout,
        })
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    fn ms(&self, timeout: Option<Duration>) -> u64 {
        timeout.unwrap_or(self.default_timeout).as_millis() as u64
    }

    /// Navigate and return the final URL after redirects
    pub async fn goto(&self, url: &str) -> BrowserResult<String> {
        let value = self
            .bridge
            .call(Command::Goto {
                url: url.to_string(),
                timeout_ms: self.ms(None),
            })
            .await?;
        as_string(value)
    }

    /// Wait until the URL matches a glob (`**` spans `/`). Returns `false`
    /// when the timeout elapses first.
    pub async fn wait_for_url(&self, pattern: &str, timeout: Duration) -> BrowserResult<bool> {
        let value = self
            .bridge
            .call(Command::WaitForUrl {
                pattern: pattern.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
            .await?;
        as_bool(value)
    }

    pub async fn count(&self, locator: &Locator) -> BrowserResult<usize> {
        let value = self
            .bridge
            .call(Command::Count {
                locator: locator.clone(),
            })
            .await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| unexpected("count", &value))
    }

    pub async fn is_visible(&self, locator: &Locator) -> BrowserResult<bool> {
        as_bool(
            self.bridge
                .call(Command::IsVisible {
                    locator: locator.clone(),
                })
                .await?,
        )
    }

    pub async fn is_enabled(&self, locator: &Locator) -> BrowserResult<bool> {
        as_bool(
            self.bridge
                .call(Command::IsEnabled {
                    locator: locator.clone(),
                })
                .await?,
        )
    }

    pub async fn input_value(&self, locator: &Locator) -> BrowserResult<String> {
        as_string(
            self.bridge
                .call(Command::InputValue {
                    locator: locator.clone(),
                    timeout_ms: self.ms(None),
                })
                .await?,
        )
    }

    pub async fn text_content(&self, locator: &Locator) -> BrowserResult<Option<String>> {
        let value = self
            .bridge
            .call(Command::TextContent {
                locator: locator.clone(),
                timeout_ms: self.ms(None),
            })
            .await?;
        match value {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Err(unexpected("text_content", &other)),
        }
    }

    pub async fn fill(&self, locator: &Locator, value: &str) -> BrowserResult<()> {
        self.fill_within(locator, value, self.default_timeout).await
    }

    pub async fn fill_within(&self, locator: &Locator, value: &str, timeout: Duration) -> BrowserResult<()> {
        self.bridge
            .call(Command::Fill {
                locator: locator.clone(),
                value: value.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
            .await?;
        Ok(())
    }

    pub async fn clear(&self, locator: &Locator) -> BrowserResult<()> {
        self.bridge
            .call(Command::Clear {
                locator: locator.clone(),
                timeout_ms: self.ms(None),
            })
            .await?;
        Ok(())
    }

    pub async fn click(&self, locator: &Locator) -> BrowserResult<()> {
        self.click_with(locator, 1, None).await
    }

    pub async fn double_click(&self, locator: &Locator) -> BrowserResult<()> {
        self.click_with(locator, 2, None).await
    }

    pub async fn click_with(
        &self,
        locator: &Locator,
        click_count: u32,
        timeout: Option<Duration>,
    ) -> BrowserResult<()> {
        self.bridge
            .call(Command::Click {
                locator: locator.clone(),
                click_count,
                timeout_ms: self.ms(timeout),
            })
            .await?;
        Ok(())
    }

    pub async fn wait_for(
        &self,
        locator: &Locator,
        state: WaitState,
        timeout: Option<Duration>,
    ) -> BrowserResult<()> {
        self.bridge
            .call(Command::WaitFor {
                locator: locator.clone(),
                state,
                timeout_ms: self.ms(timeout),
            })
            .await?;
        Ok(())
    }

    /// Persist cookies and local storage for later sessions
    pub async fn save_storage_state(&self, path: &Path) -> BrowserResult<()> {
        self.bridge
            .call(Command::StorageState {
                path: path.to_string_lossy().into_owned(),
            })
            .await?;
        Ok(())
    }

    pub async fn close(&self) -> BrowserResult<()> {
        self.bridge.close().await
    }
}

fn as_string(value: Value) -> BrowserResult<String> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(unexpected("string", &other)),
    }
}

fn as_bool(value: Value) -> BrowserResult<bool> {
    value.as_bool().ok_or_else(|| unexpected("bool", &value))
}

fn unexpected(expected: &str, value: &Value) -> BrowserError {
    BrowserError::Protocol(format!("expected {}, got {}", expected, value))
}
