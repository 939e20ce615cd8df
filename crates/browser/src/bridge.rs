//! Bridge process management
//!
//! The bridge is a Node.js script driving Playwright. It is staged into a
//! temporary directory, spawned once per invocation, and spoken to over
//! stdin/stdout. Requests are strictly sequential.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{BrowserError, BrowserResult};
use crate::protocol::{Command, Failure, Request, Response};

const BRIDGE_SCRIPT: &str = include_str!("bridge.js");

/// Configuration for the Playwright bridge
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Node.js executable
    pub node_binary: PathBuf,

    /// Directory whose `node_modules` contains `playwright`
    pub working_dir: PathBuf,

    pub headless: bool,

    /// Playwright storage state (cookies, local storage) to start from
    pub storage_state: Option<PathBuf>,

    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Playwright timeout for actions that do not specify their own
    pub default_timeout: Duration,

    /// Extra time allowed for a reply on top of the action's own timeout
    pub reply_grace: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            node_binary: PathBuf::from("node"),
            working_dir: PathBuf::from("."),
            headless: true,
            storage_state: None,
            viewport_width: 1280,
            viewport_height: 720,
            default_timeout: Duration::from_secs(30),
            reply_grace: Duration::from_secs(10),
        }
    }
}

pub(crate) struct BridgeIo<W, R> {
    writer: W,
    lines: Lines<BufReader<R>>,
}

impl<W, R> BridgeIo<W, R>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    pub(crate) fn new(writer: W, reader: R) -> Self {
        Self {
            writer,
            lines: BufReader::new(reader).lines(),
        }
    }

    /// Send one request and wait for the response carrying its id. Stale
    /// responses from requests that timed out earlier are skipped.
    pub(crate) async fn exchange(&mut self, request: &Request) -> BrowserResult<Response> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;

        loop {
            let Some(line) = self.lines.next_line().await? else {
                return Err(BrowserError::BridgeExited);
            };
            match Response::parse(&line) {
                Some(response) if response.id == request.id => return Ok(response),
                Some(response) => debug!("Skipping stale bridge response {}", response.id),
                None => debug!("bridge: {}", line),
            }
        }
    }
}

/// Running bridge process owning one browser page
pub struct PlaywrightBridge {
    child: Mutex<Child>,
    io: Mutex<BridgeIo<ChildStdin, ChildStdout>>,
    next_id: AtomicU64,
    reply_grace: Duration,

    /// Keeps the staged script alive while the process runs
    _script_dir: tempfile::TempDir,
}

impl PlaywrightBridge {
    /// Spawn the bridge and launch the browser
    pub async fn launch(config: &BrowserConfig) -> BrowserResult<Self> {
        Self::check_playwright_installed(config).await?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        tokio::fs::write(&script_path, BRIDGE_SCRIPT).await?;

        debug!("Spawning Playwright bridge: {}", script_path.display());

        let mut child = TokioCommand::new(&config.node_binary)
            .arg(&script_path)
            .current_dir(&config.working_dir)
            .env("NODE_PATH", config.working_dir.join("node_modules"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                BrowserError::Startup(format!(
                    "Failed to spawn {}: {}",
                    config.node_binary.display(),
                    e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BrowserError::Startup("bridge stdin not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BrowserError::Startup("bridge stdout not captured".into()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("bridge stderr: {}", line);
                }
            });
        }

        let bridge = Self {
            child: Mutex::new(child),
            io: Mutex::new(BridgeIo::new(stdin, stdout)),
            next_id: AtomicU64::new(1),
            reply_grace: config.reply_grace,
            _script_dir: script_dir,
        };

        bridge
            .call(Command::Launch {
                headless: config.headless,
                storage_state: config
                    .storage_state
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
                viewport_width: config.viewport_width,
                viewport_height: config.viewport_height,
            })
            .await?;

        info!("Browser launched (headless: {})", config.headless);
        Ok(bridge)
    }

    /// Check that node can resolve the playwright package
    async fn check_playwright_installed(config: &BrowserConfig) -> BrowserResult<()> {
        let status = TokioCommand::new(&config.node_binary)
            .args(["-e", "require.resolve('playwright')"])
            .current_dir(&config.working_dir)
            .env("NODE_PATH", config.working_dir.join("node_modules"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(BrowserError::PlaywrightNotFound),
        }
    }

    /// Run one command and return its value
    pub async fn call(&self, command: Command) -> BrowserResult<serde_json::Value> {
        let name = command.name();
        let limit = Duration::from_millis(command.timeout_ms().unwrap_or(0)) + self.reply_grace;
        let request = Request {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            command,
        };

        let mut io = self.io.lock().await;
        let response = tokio::time::timeout(limit, io.exchange(&request))
            .await
            .map_err(|_| BrowserError::Timeout(format!("bridge reply to `{}` after {:?}", name, limit)))??;

        if response.ok {
            return Ok(response.value);
        }
        let failure = response.error.unwrap_or(Failure {
            name: "Error".into(),
            message: format!("`{}` failed without details", name),
        });
        if failure.name == "TimeoutError" {
            Err(BrowserError::Timeout(failure.message))
        } else {
            Err(BrowserError::Playwright(failure.message))
        }
    }

    /// Close the browser and stop the process
    pub async fn close(&self) -> BrowserResult<()> {
        if let Err(e) = self.call(Command::Close).await {
            warn!("Bridge close failed: {}", e);
        }

        let mut child = self.child.lock().await;
        if let Ok(Ok(status)) = tokio::time::timeout(Duration::from_secs(5), child.wait()).await {
            debug!("Bridge exited with {}", status);
            return Ok(());
        }

        #[cfg(unix)]
        if let Some(pid) = child.id() {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok() {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }

        // Force kill if still running
        let _ = child.kill().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Locator;

    #[tokio::test]
    async fn test_exchange_skips_noise_and_stale_replies() {
        let (client, server) = tokio::io::duplex(4096);
        let (client_read, client_write) = tokio::io::split(client);
        let (server_read, mut server_write) = tokio::io::split(server);

        tokio::spawn(async move {
            let mut requests = BufReader::new(server_read).lines();
            let line = requests.next_line().await.unwrap().unwrap();
            let request: serde_json::Value = serde_json::from_str(&line).unwrap();
            assert_eq!(request["op"], "count");
            let id = request["id"].as_u64().unwrap();

            let reply = format!(
                "Downloading browsers...\n{{\"id\":{},\"ok\":true,\"value\":null}}\n{{\"id\":{},\"ok\":true,\"value\":3}}\n",
                id - 1,
                id
            );
            server_write.write_all(reply.as_bytes()).await.unwrap();
        });

        let mut io = BridgeIo::new(client_write, client_read);
        let response = io
            .exchange(&Request {
                id: 5,
                command: Command::Count {
                    locator: Locator::css("tbody tr"),
                },
            })
            .await
            .unwrap();
        assert_eq!(response.id, 5);
        assert_eq!(response.value, 3);
    }

    #[tokio::test]
    async fn test_exchange_reports_exit() {
        let (client, server) = tokio::io::duplex(4096);
        let (client_read, client_write) = tokio::io::split(client);
        drop(server);

        let mut io = BridgeIo::new(client_write, client_read);
        let result = io.exchange(&Request { id: 1, command: Command::Close }).await;
        assert!(matches!(
            result,
            Err(BrowserError::BridgeExited) | Err(BrowserError::Io(_))
        ));
    }
}
