//! Debuggee process management: waiting for the inspector port, launching
//! the child under the inspector, and echoing its output.

use crate::config::DebuggerConfig;
use crate::error::{DebuggerError, Result};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, warn};

const LISTEN_PREFIX: &str = "Debugger listening on ws://";

/// Resolves once nothing accepts connections on `host:port`, polling every
/// `interval`. Port 0 means "pick any port" and is never checked.
pub async fn port_is_free(
    host: &str,
    port: u16,
    deadline: Duration,
    interval: Duration,
) -> Result<()> {
    if port == 0 {
        return Ok(());
    }
    let give_up = Instant::now() + deadline;
    loop {
        match TcpStream::connect((host, port)).await {
            Err(err) if err.kind() == ErrorKind::ConnectionRefused => return Ok(()),
            Err(err) => debug!(host, port, error = %err, "port probe failed, retrying"),
            Ok(_) => debug!(host, port, "port still in use"),
        }
        if Instant::now() + interval > give_up {
            return Err(DebuggerError::Startup(format!(
                "Timeout ({}) waiting for {}:{} to be free",
                deadline.as_millis(),
                host,
                port
            )));
        }
        sleep(interval).await;
    }
}

/// Pulls host and port out of the inspector's
/// `Debugger listening on ws://<host>:<port>/<id>` banner.
pub fn parse_listen_hint(text: &str) -> Option<(String, u16)> {
    let start = text.find(LISTEN_PREFIX)? + LISTEN_PREFIX.len();
    let rest = &text[start..];
    let authority = &rest[..rest.find('/')?];

    let (host, port) = match authority.strip_prefix('[') {
        Some(bracketed) => {
            let (host, port) = bracketed.split_once("]:")?;
            (host, port)
        }
        None => authority.rsplit_once(':')?,
    };
    if host.is_empty() {
        return None;
    }
    let port = port.parse::<u16>().ok()?;
    Some((host.to_string(), port))
}

/// Where a freshly launched debuggee is listening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenAddress {
    pub host: String,
    pub port: u16,
}

pub struct ProcessSupervisor {
    child: Option<Child>,
    node_binary: PathBuf,
    port_free_timeout: Duration,
    port_probe_interval: Duration,
    listen_timeout: Duration,
    output: mpsc::UnboundedSender<String>,
}

impl ProcessSupervisor {
    /// Child output lines are sent to `output` as they arrive.
    pub fn new(config: &DebuggerConfig, output: mpsc::UnboundedSender<String>) -> Self {
        Self {
            child: None,
            node_binary: config.node_binary.clone(),
            port_free_timeout: config.port_free_timeout,
            port_probe_interval: config.port_probe_interval,
            listen_timeout: config.listen_timeout,
            output,
        }
    }

    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    /// Starts `script` under the inspector and waits until it reports its
    /// listen address.
    pub async fn launch(
        &mut self,
        script: &str,
        args: &[String],
        host: &str,
        port: u16,
        stop_at_entry: bool,
    ) -> Result<ListenAddress> {
        port_is_free(host, port, self.port_free_timeout, self.port_probe_interval).await?;

        let inspect_flag = if stop_at_entry {
            format!("--inspect-brk={}", port)
        } else {
            format!("--inspect={}", port)
        };
        debug!(node = %self.node_binary.display(), %inspect_flag, script, "launching debuggee");

        let mut child = Command::new(&self.node_binary)
            .arg(inspect_flag)
            .arg(script)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                DebuggerError::Startup(format!(
                    "Failed to start {}: {}",
                    self.node_binary.display(),
                    err
                ))
            })?;

        let (hint_tx, hint_rx) = oneshot::channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, self.output.clone(), None));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, self.output.clone(), Some(hint_tx)));
        }
        self.child = Some(child);

        match timeout(self.listen_timeout, hint_rx).await {
            Ok(Ok(address)) => Ok(address),
            Ok(Err(_)) => {
                self.kill().await;
                Err(DebuggerError::Startup(
                    "Target exited before the debugger started listening".to_string(),
                ))
            }
            Err(_) => {
                self.kill().await;
                Err(DebuggerError::Startup(format!(
                    "Timeout ({}) waiting for the debugger to listen",
                    self.listen_timeout.as_millis()
                )))
            }
        }
    }

    /// Kills the child if there is one. Safe to call repeatedly.
    pub async fn kill(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        if let Err(err) = child.kill().await {
            warn!(error = %err, "failed to kill debuggee");
        }
    }
}

async fn forward_lines<R>(
    stream: R,
    output: mpsc::UnboundedSender<String>,
    mut listen_hint: Option<oneshot::Sender<ListenAddress>>,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if listen_hint.is_some() {
                    if let Some((host, port)) = parse_listen_hint(&line) {
                        if let Some(tx) = listen_hint.take() {
                            let _ = tx.send(ListenAddress { host, port });
                        }
                    }
                }
                if output.send(line).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "failed to read debuggee output");
                break;
            }
        }
    }
}

/// Asks an already running process to open its inspector (SIGUSR1).
#[cfg(unix)]
pub fn signal_debug(pid: u32) -> Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid)
        .map_err(|_| DebuggerError::Startup(format!("Target process: {} doesn't exist.", pid)))?;
    match kill(Pid::from_raw(raw), Signal::SIGUSR1) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => Err(DebuggerError::Startup(format!(
            "Target process: {} doesn't exist.",
            pid
        ))),
        Err(err) => Err(DebuggerError::Startup(format!(
            "Failed to signal process {}: {}",
            pid, err
        ))),
    }
}

#[cfg(not(unix))]
pub fn signal_debug(pid: u32) -> Result<()> {
    Err(DebuggerError::Startup(format!(
        "Attaching to process {} by pid is only supported on unix",
        pid
    )))
}
