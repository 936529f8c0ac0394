use super::types::{
    BreakpointResolvedEvent, ConsoleProfileFinishedEvent, PausedEvent, ScriptParsedEvent,
};
use serde_json::Value;

/// Protocol events the session reacts to.
#[derive(Debug, Clone)]
pub enum ProtocolEvent {
    Paused(PausedEvent),
    Resumed,
    ScriptParsed(ScriptParsedEvent),
    BreakpointResolved(BreakpointResolvedEvent),
    ConsoleProfileFinished(ConsoleProfileFinishedEvent),
    Other { method: String },
}

impl ProtocolEvent {
    pub fn parse(method: &str, params: Value) -> serde_json::Result<Self> {
        let event = match method {
            "Debugger.paused" => ProtocolEvent::Paused(serde_json::from_value(params)?),
            "Debugger.resumed" => ProtocolEvent::Resumed,
            "Debugger.scriptParsed" => ProtocolEvent::ScriptParsed(serde_json::from_value(params)?),
            "Debugger.breakpointResolved" => {
                ProtocolEvent::BreakpointResolved(serde_json::from_value(params)?)
            }
            "Profiler.consoleProfileFinished" => {
                ProtocolEvent::ConsoleProfileFinished(serde_json::from_value(params)?)
            }
            other => ProtocolEvent::Other {
                method: other.to_string(),
            },
        };
        Ok(event)
    }
}

/// What the transport delivers on the session's inbound channel.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Event(ProtocolEvent),
    Closed,
}
