//! Auth Commands

use anyhow::Result;
use clap::Subcommand;
use tracing::warn;

use auxsync_drivers::{AuxConfig, Outcome, SessionManager};

#[derive(Debug, Subcommand)]
pub enum AuthCommands {
    /// Log in and save the session to the state file
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "AUXSYNC_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log out and remove the state file
    Logout,
}

pub async fn execute(cmd: AuthCommands, config: &AuxConfig, check: bool) -> Result<Outcome> {
    if check {
        return Ok(Outcome::unchanged("Check mode: session left untouched"));
    }

    let session = SessionManager::connect(config).await?;
    let result = match &cmd {
        AuthCommands::Login { username, password } => session.login(username, password).await,
        AuthCommands::Logout => session.logout().await,
    };
    if let Err(e) = session.close().await {
        warn!("Failed to close browser: {}", e);
    }
    Ok(result?)
}
