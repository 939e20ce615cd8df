//! Argument parsing and dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use auxsync_drivers::{AuxConfig, DriverError, Outcome};

use crate::commands::{auth, normalize, record};
use crate::output::{print_outcome, OutputFormat};

/// auxsync - idempotent record management for QAD AUX
#[derive(Debug, Parser)]
#[command(name = "auxsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file
    #[arg(long, default_value = "auxsync.toml", global = true)]
    pub config: PathBuf,

    /// QAD server host name
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Authentication state file
    #[arg(long, global = true)]
    pub state_file: Option<PathBuf>,

    /// Show the browser window
    #[arg(long, global = true)]
    pub headed: bool,

    /// Validate input and report what would happen without touching the server
    #[arg(long, global = true)]
    pub check: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log in to or out of QAD
    #[command(subcommand)]
    Auth(auth::AuthCommands),

    /// Ensure a record is present or absent
    Record(record::RecordArgs),

    /// Show the form field each input field maps to
    Normalize(normalize::NormalizeArgs),
}

impl Cli {
    /// Configuration file values with command-line overrides applied
    pub fn load_config(&self) -> Result<AuxConfig> {
        let mut config = AuxConfig::load(&self.config)?;
        if let Some(server) = &self.server {
            config.server.host = server.clone();
        }
        if let Some(state_file) = &self.state_file {
            config.session.state_file = state_file.clone();
        }
        if self.headed {
            config.browser.headless = false;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Run the parsed command. Failures are reported as a failed outcome and
/// returned so the caller can set the exit code.
pub async fn run(cli: Cli) -> Result<()> {
    let format = cli.format;
    let result = dispatch(cli).await;
    match result {
        Ok(Some(outcome)) => {
            print_outcome(&outcome, format);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => {
            print_outcome(&Outcome::failed(failure_message(&e)), format);
            Err(e)
        }
    }
}

fn failure_message(err: &anyhow::Error) -> String {
    let message = format!("{:#}", err);
    match err.downcast_ref::<DriverError>() {
        Some(e) if e.is_transient() => format!("{} (timed out, re-running may succeed)", message),
        _ => message,
    }
}

async fn dispatch(cli: Cli) -> Result<Option<Outcome>> {
    let config = cli.load_config()?;
    match cli.command {
        Commands::Auth(cmd) => auth::execute(cmd, &config, cli.check).await.map(Some),
        Commands::Record(args) => record::execute(args, &config, cli.check).await.map(Some),
        Commands::Normalize(args) => normalize::execute(args, cli.format).map(|()| None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::EntityArg;

    #[test]
    fn test_record_args() {
        let cli = Cli::try_parse_from([
            "auxsync",
            "--server",
            "qad-test",
            "record",
            "ship-to-address",
            "present",
            "--input",
            "shipto.yaml",
        ])
        .unwrap();

        let Commands::Record(args) = &cli.command else {
            panic!("expected record command");
        };
        assert_eq!(args.entity, EntityArg::ShipToAddress);
        assert_eq!(args.state, record::RecordState::Present);
        assert_eq!(args.input, PathBuf::from("shipto.yaml"));
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_unknown_entity_is_rejected() {
        assert!(Cli::try_parse_from(["auxsync", "record", "vendor", "present", "-i", "x.yaml"]).is_err());
    }

    #[test]
    fn test_overrides_apply_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("auxsync.toml");
        std::fs::write(&config_path, "[server]\nhost = \"qad-file\"\nport = 22011\n").unwrap();

        let cli = Cli::try_parse_from([
            "auxsync",
            "--config",
            config_path.to_str().unwrap(),
            "--server",
            "qad-flag",
            "--state-file",
            "/tmp/auth.json",
            "--headed",
            "auth",
            "logout",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();

        assert_eq!(config.server.host, "qad-flag");
        assert_eq!(config.server.port, 22011);
        assert_eq!(config.session.state_file, PathBuf::from("/tmp/auth.json"));
        assert!(!config.browser.headless);
    }

    #[test]
    fn test_failure_message_hints_rerun_on_timeout() {
        let timeout = anyhow::Error::from(DriverError::from(auxsync_engine::EngineError::Timeout(
            "save confirmation".into(),
        )));
        assert!(failure_message(&timeout).ends_with("(timed out, re-running may succeed)"));

        let fatal = anyhow::Error::from(DriverError::NotLoggedIn);
        assert_eq!(failure_message(&fatal), "No current logged in user");
    }

    #[tokio::test]
    async fn test_check_mode_reports_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("customer.yaml");
        std::fs::write(&input, "main:\n  customer_code: C100\n").unwrap();

        let cli = Cli::try_parse_from([
            "auxsync",
            "--config",
            dir.path().join("missing.toml").to_str().unwrap(),
            "--check",
            "record",
            "customer",
            "present",
            "--input",
            input.to_str().unwrap(),
        ])
        .unwrap();

        let outcome = dispatch(cli).await.unwrap().unwrap();
        assert!(!outcome.changed);
        assert!(!outcome.failed);
        assert_eq!(outcome.message, "Check mode: Customer input is valid");
    }

    #[tokio::test]
    async fn test_check_mode_still_validates_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("customer.yaml");
        std::fs::write(&input, "main:\n  city: Sydney\n").unwrap();

        let cli = Cli::try_parse_from([
            "auxsync",
            "--config",
            dir.path().join("missing.toml").to_str().unwrap(),
            "--check",
            "record",
            "customer",
            "absent",
            "--input",
            input.to_str().unwrap(),
        ])
        .unwrap();

        let err = dispatch(cli).await.unwrap_err();
        assert!(err.to_string().contains("main.customer_code"));
    }
}
