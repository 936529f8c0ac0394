pub mod cli;
pub mod commands;
pub mod config;
pub mod debugger;
pub mod error;
pub mod output;
pub mod protocol;
pub mod repl;
pub mod supervisor;

pub use config::DebuggerConfig;
pub use error::{DebuggerError, Result};
