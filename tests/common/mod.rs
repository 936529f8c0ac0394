// Shared helpers for the integration tests: an in-memory protocol client
// and builders for protocol events.
#![allow(dead_code)]

use async_trait::async_trait;
use inspect_debugger::debugger::Session;
use inspect_debugger::protocol::{ProtocolClient, ProtocolEvent};
use inspect_debugger::{DebuggerConfig, DebuggerError, Result};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Records every call and answers from canned responses. Queued responses
/// are used first, then the per-method default, then `{}`.
#[derive(Default)]
pub struct ScriptedClient {
    calls: Mutex<Vec<(String, Value)>>,
    queued: Mutex<HashMap<String, VecDeque<Result<Value>>>>,
    defaults: Mutex<HashMap<String, Value>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: &str, value: Value) {
        self.queued
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(Ok(value));
    }

    pub fn respond_always(&self, method: &str, value: Value) {
        self.defaults
            .lock()
            .unwrap()
            .insert(method.to_string(), value);
    }

    pub fn fail(&self, method: &str, message: &str) {
        self.queued
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(Err(DebuggerError::Protocol {
                code: -32000,
                message: message.to_string(),
            }));
    }

    /// Queues an arbitrary error for the next call to `method`.
    pub fn fail_with(&self, method: &str, error: DebuggerError) {
        self.queued
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|(method, _)| method).collect()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|(m, _)| m == method).count()
    }

    /// Params of the last call to `method`.
    pub fn last_params(&self, method: &str) -> Option<Value> {
        self.calls()
            .into_iter()
            .rev()
            .find(|(m, _)| m == method)
            .map(|(_, params)| params)
    }
}

#[async_trait]
impl ProtocolClient for ScriptedClient {
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params));

        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        if let Some(response) = queued {
            return response;
        }
        if let Some(value) = self.defaults.lock().unwrap().get(method) {
            return Ok(value.clone());
        }
        Ok(json!({}))
    }
}

pub fn connected_session() -> Session {
    let mut session = Session::new(&DebuggerConfig::default());
    session.begin_connect();
    session.on_connected();
    session
}

pub fn script_parsed(id: &str, url: &str) -> ProtocolEvent {
    ProtocolEvent::parse(
        "Debugger.scriptParsed",
        json!({ "scriptId": id, "url": url }),
    )
    .unwrap()
}

/// A paused event with one frame per `(script_id, line, function)`, newest
/// first. Lines are 0-based.
pub fn paused(reason: &str, frames: &[(&str, u32, &str)]) -> ProtocolEvent {
    let call_frames: Vec<Value> = frames
        .iter()
        .enumerate()
        .map(|(index, (script_id, line, function))| {
            json!({
                "callFrameId": format!("frame-{}", index),
                "functionName": function,
                "location": { "scriptId": script_id, "lineNumber": line, "columnNumber": 0 },
                "scopeChain": [
                    { "type": "local", "object": { "type": "object", "objectId": format!("scope-{}", index) } }
                ],
                "this": { "type": "undefined" }
            })
        })
        .collect();
    ProtocolEvent::parse(
        "Debugger.paused",
        json!({ "callFrames": call_frames, "reason": reason, "hitBreakpoints": [] }),
    )
    .unwrap()
}

pub fn resumed() -> ProtocolEvent {
    ProtocolEvent::parse("Debugger.resumed", json!({})).unwrap()
}

pub fn breakpoint_resolved(breakpoint_id: &str, script_id: &str, line: u32) -> ProtocolEvent {
    ProtocolEvent::parse(
        "Debugger.breakpointResolved",
        json!({
            "breakpointId": breakpoint_id,
            "location": { "scriptId": script_id, "lineNumber": line, "columnNumber": 0 }
        }),
    )
    .unwrap()
}

pub const MAIN_SOURCE: &str = "const a = 1;\nconst b = 2;\nfunction add(x, y) {\n  return x + y;\n}\nconsole.log(add(a, b));\n";
