//! auxsync configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use auxsync_browser::BrowserConfig;

use crate::error::{DriverError, DriverResult};

/// Top-level configuration, usually read from `auxsync.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuxConfig {
    /// QAD server addressing
    pub server: ServerConfig,

    /// Browser bridge settings
    pub browser: BrowserSettings,

    /// Authentication state persistence
    pub session: SessionConfig,

    /// UI wait limits
    pub timeouts: TimeoutConfig,
}

impl AuxConfig {
    /// Load configuration from file, falling back to defaults when the file
    /// does not exist
    pub fn load(path: &Path) -> DriverResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> DriverResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| DriverError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> DriverResult<()> {
        if self.server.host.is_empty() {
            return Err(DriverError::Config("server.host must be set".into()));
        }
        if !self.browser.browser.eq_ignore_ascii_case("chromium") {
            return Err(DriverError::Config(format!(
                "unsupported browser `{}`, only chromium is available",
                self.browser.browser
            )));
        }
        Ok(())
    }

    /// Bridge configuration, starting from `storage_state` when given
    pub fn browser_config(&self, storage_state: Option<PathBuf>) -> BrowserConfig {
        BrowserConfig {
            node_binary: self.browser.node_binary.clone(),
            working_dir: self.browser.working_dir.clone(),
            headless: self.browser.headless,
            storage_state,
            default_timeout: Duration::from_millis(self.browser.command_timeout_ms),
            ..BrowserConfig::default()
        }
    }
}

/// QAD server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub scheme: String,

    /// Path the web application is mounted under
    pub base_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 22010,
            scheme: "http".to_string(),
            base_path: "/qad-central".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn base_url(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.scheme,
            self.host,
            self.port,
            self.base_path.trim_end_matches('/')
        )
    }

    pub fn home_url(&self) -> String {
        format!("{}/#/view/webshell/home", self.base_url())
    }

    /// Browse view for a view meta URI
    pub fn browse_url(&self, view_uri: &str) -> String {
        format!(
            "{}/#/view/qraview/hybridbrowse?viewMetaUri={}",
            self.base_url(),
            view_uri
        )
    }

    /// URL glob matching the home view after login
    pub fn home_pattern(&self) -> String {
        format!("**{}/#/view/webshell/home", self.base_path.trim_end_matches('/'))
    }

    /// URL glob matching the login page the server redirects to
    pub fn login_pattern(&self) -> String {
        format!("**{}/resources/login.jsp*", self.base_path.trim_end_matches('/'))
    }
}

/// Browser bridge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Node.js executable
    pub node_binary: PathBuf,

    /// Directory holding `node_modules/playwright`
    pub working_dir: PathBuf,

    pub headless: bool,

    /// Browser engine; only chromium is supported
    pub browser: String,

    /// Default Playwright action timeout
    pub command_timeout_ms: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            node_binary: PathBuf::from("node"),
            working_dir: PathBuf::from("."),
            headless: true,
            browser: "chromium".to_string(),
            command_timeout_ms: 30_000,
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Playwright storage state holding the authentication cookies
    pub state_file: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("state.json"),
        }
    }
}

/// UI wait limits, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub save_toast_ms: u64,
    pub delete_toast_ms: u64,
    pub login_ms: u64,
    pub login_redirect_probe_ms: u64,
    pub option_list_ms: u64,

    /// Pause after adding a table row before its inputs accept text
    pub row_ready_delay_ms: u64,

    pub search_fill_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            save_toast_ms: 160_000,
            delete_toast_ms: 30_000,
            login_ms: 10_000,
            login_redirect_probe_ms: 1_000,
            option_list_ms: 5_000,
            row_ready_delay_ms: 2_000,
            search_fill_ms: 15_000,
        }
    }
}

impl TimeoutConfig {
    pub fn save_toast(&self) -> Duration {
        Duration::from_millis(self.save_toast_ms)
    }

    pub fn delete_toast(&self) -> Duration {
        Duration::from_millis(self.delete_toast_ms)
    }

    pub fn login(&self) -> Duration {
        Duration::from_millis(self.login_ms)
    }

    pub fn login_redirect_probe(&self) -> Duration {
        Duration::from_millis(self.login_redirect_probe_ms)
    }

    pub fn option_list(&self) -> Duration {
        Duration::from_millis(self.option_list_ms)
    }

    pub fn row_ready_delay(&self) -> Duration {
        Duration::from_millis(self.row_ready_delay_ms)
    }

    pub fn search_fill(&self) -> Duration {
        Duration::from_millis(self.search_fill_ms)
    }
}
