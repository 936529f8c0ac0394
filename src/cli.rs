use crate::error::{DebuggerError, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "inspect-debugger")]
#[command(about = "Command-line debugger for scripts running under the Node inspector", long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[arg(long, help = "Start the script without stopping on the first line")]
    pub inspect: bool,

    #[arg(long, help = "Inspector port to launch the script on", value_name = "PORT")]
    pub port: Option<u16>,

    #[arg(short = 'p', long = "pid", help = "Attach to a running process by pid", value_name = "PID")]
    pub pid: Option<u32>,

    #[arg(long, help = "Print the version and exit")]
    pub version: bool,

    #[arg(value_name = "SCRIPT | HOST:PORT", help = "Script to debug, or address of a running debuggee")]
    pub target: Option<String>,

    #[arg(
        value_name = "ARGS",
        help = "Arguments passed to the script",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}

/// What the debugger should attach to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchTarget {
    Script {
        path: String,
        args: Vec<String>,
        stop_at_entry: bool,
    },
    Remote {
        host: String,
        port: u16,
    },
    Pid(u32),
}

impl Cli {
    pub fn into_target(self) -> Result<LaunchTarget> {
        if let Some(pid) = self.pid {
            return Ok(LaunchTarget::Pid(pid));
        }
        let Some(target) = self.target else {
            return Err(DebuggerError::Startup(
                "Usage: inspect-debugger [--inspect] [--port=N] script.js [args]\n       \
                 inspect-debugger <host>:<port>\n       \
                 inspect-debugger -p <pid>"
                    .to_string(),
            ));
        };
        if let Some((host, port)) = parse_host_port(&target) {
            return Ok(LaunchTarget::Remote { host, port });
        }
        Ok(LaunchTarget::Script {
            path: target,
            args: self.args,
            stop_at_entry: !self.inspect,
        })
    }
}

/// `host:port` or `[v6]:port`. Anything else is taken as a script path.
pub fn parse_host_port(text: &str) -> Option<(String, u16)> {
    let (host, port) = text.rsplit_once(':')?;
    if host.is_empty() || port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let port = port.parse::<u16>().ok()?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    Some((host.to_string(), port))
}
