//! Session management
//!
//! Authentication lives in a Playwright storage state file. Logging in
//! writes it; logging out removes it. Record drivers only ever read it.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use auxsync_browser::{Locator, Page};
use auxsync_engine::EngineError;

use crate::config::{AuxConfig, ServerConfig, TimeoutConfig};
use crate::error::{DriverError, DriverResult};
use crate::outcome::Outcome;

/// Fail unless the authentication state file exists
pub fn require_state_file(path: &Path) -> DriverResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(DriverError::Precondition(path.to_path_buf()))
    }
}

/// Remove the state file. Returns whether one existed.
pub fn discard_state_file(path: &Path) -> DriverResult<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn is_login_url(url: &str) -> bool {
    url.contains("login.jsp")
}

/// Logs a browser session in or out of the QAD web UI
pub struct SessionManager {
    page: Page,
    server: ServerConfig,
    timeouts: TimeoutConfig,
    state_file: PathBuf,
}

impl SessionManager {
    /// Launch a browser, reusing the saved session when there is one
    pub async fn connect(config: &AuxConfig) -> DriverResult<Self> {
        let state_file = config.session.state_file.clone();
        let storage_state = state_file.exists().then(|| state_file.clone());
        debug!("Starting session (saved state: {})", storage_state.is_some());

        let page = Page::launch(&config.browser_config(storage_state)).await?;
        Ok(Self {
            page,
            server: config.server.clone(),
            timeouts: config.timeouts.clone(),
            state_file,
        })
    }

    /// Navigate home and report whether the server sent us to the login page
    async fn redirected_to_login(&self) -> DriverResult<bool> {
        let landed = self.page.goto(&self.server.home_url()).await?;
        if is_login_url(&landed) {
            return Ok(true);
        }
        Ok(self
            .page
            .wait_for_url(&self.server.login_pattern(), self.timeouts.login_redirect_probe())
            .await?)
    }

    pub async fn login(&self, username: &str, password: &str) -> DriverResult<Outcome> {
        if username.is_empty() || password.is_empty() {
            return Err(DriverError::Config(
                "username and password are required together".into(),
            ));
        }

        if !self.redirected_to_login().await? {
            return Ok(Outcome::unchanged("Already logged in"));
        }

        self.page.fill(&Locator::name("username"), username).await?;
        self.page.fill(&Locator::name("password"), password).await?;
        self.page.click(&Locator::id("logInBtn")).await?;

        let login_wait = self.timeouts.login();
        let arrived = self
            .page
            .wait_for_url(&self.server.home_pattern(), login_wait)
            .await?;
        if !arrived {
            return Err(EngineError::Timeout(format!(
                "QAD took too long to load after logging in (> {}s)",
                login_wait.as_secs()
            ))
            .into());
        }

        if let Some(parent) = self.state_file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        self.page.save_storage_state(&self.state_file).await?;
        info!("Session saved to {}", self.state_file.display());

        Ok(Outcome::changed(format!("logged in as user {}", username)))
    }

    pub async fn logout(&self) -> DriverResult<Outcome> {
        if self.redirected_to_login().await? {
            return Ok(Outcome::unchanged("Already logged out"));
        }

        self.page.click(&Locator::id("kMenuUserInfo_wrapper")).await?;
        self.page
            .click(&Locator::css("[data-id=logoutMenuItem]"))
            .await?;

        if discard_state_file(&self.state_file)? {
            info!("Removed {}", self.state_file.display());
        }
        Ok(Outcome::changed("Logged out"))
    }

    pub async fn close(&self) -> DriverResult<()> {
        self.page.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("http://qad-test:22010/qad-central/resources/login.jsp", true ; "login page")]
    #[test_case("http://qad-test:22010/qad-central/resources/login.jsp?error=1", true ; "login page with query")]
    #[test_case("http://qad-test:22010/qad-central/#/view/webshell/home", false ; "home view")]
    fn test_is_login_url(url: &str, expected: bool) {
        assert_eq!(is_login_url(url), expected);
    }

    #[test]
    fn test_state_file_precondition() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        assert!(matches!(
            require_state_file(&path),
            Err(DriverError::Precondition(p)) if p == path
        ));

        std::fs::write(&path, "{}").unwrap();
        assert!(require_state_file(&path).is_ok());
    }

    #[test]
    fn test_discard_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{}").unwrap();

        assert!(discard_state_file(&path).unwrap());
        assert!(!path.exists());
        assert!(!discard_state_file(&path).unwrap());
    }
}
