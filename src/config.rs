use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Tunables for one debugger run.
#[derive(Debug, Clone)]
pub struct DebuggerConfig {
    pub host: String,
    pub port: u16,
    pub node_binary: PathBuf,
    pub connect_attempts: u32,
    pub connect_retry_delay: Duration,
    pub port_free_timeout: Duration,
    pub port_probe_interval: Duration,
    /// How long the child may take to print its listen address.
    pub listen_timeout: Duration,
    pub list_delta: u32,
    pub pause_context_delta: u32,
    pub display_width: usize,
    pub auto_eval: bool,
    pub prompt: String,
    pub shell_prompt: String,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9229,
            node_binary: PathBuf::from("node"),
            connect_attempts: 10,
            connect_retry_delay: Duration::from_millis(500),
            port_free_timeout: Duration::from_millis(2000),
            port_probe_interval: Duration::from_millis(150),
            listen_timeout: Duration::from_secs(10),
            list_delta: 5,
            pause_context_delta: 2,
            display_width: 80,
            auto_eval: true,
            prompt: "debug> ".to_string(),
            shell_prompt: "> ".to_string(),
        }
    }
}

impl DebuggerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(node) = env::var("INSPECT_DEBUGGER_NODE") {
            if !node.trim().is_empty() {
                config.node_binary = PathBuf::from(node);
            }
        }

        if let Ok(columns) = env::var("COLUMNS") {
            match columns.trim().parse::<usize>() {
                Ok(width) if width > 0 => config.display_width = width,
                _ => tracing::warn!(%columns, "ignoring invalid COLUMNS value"),
            }
        }

        config
    }
}
