use thiserror::Error;

#[derive(Error, Debug)]
pub enum DebuggerError {
    /// Fatal: the debuggee could not be started or reached.
    #[error("{0}")]
    Startup(String),

    /// A command ran in the wrong state or with bad arguments.
    #[error("{0}")]
    Precondition(String),

    #[error("{message}")]
    Protocol { code: i64, message: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Connection to the debuggee was closed")]
    TransportClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DebuggerError {
    pub fn precondition(message: impl Into<String>) -> Self {
        DebuggerError::Precondition(message.into())
    }

    /// Errors the REPL reports and survives. Everything else ends the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DebuggerError::Precondition(_)
                | DebuggerError::Protocol { .. }
                | DebuggerError::Connection(_)
                | DebuggerError::TransportClosed
                | DebuggerError::Json(_)
        )
    }

    pub fn is_startup(&self) -> bool {
        matches!(self, DebuggerError::Startup(_))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for DebuggerError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        DebuggerError::Connection(err.to_string())
    }
}

impl From<reqwest::Error> for DebuggerError {
    fn from(err: reqwest::Error) -> Self {
        DebuggerError::Connection(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DebuggerError>;
