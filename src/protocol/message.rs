use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outgoing protocol request.
#[derive(Debug, Serialize)]
pub struct ProtocolRequest<'a> {
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// Anything the debuggee sends us. Responses carry an `id`; events don't.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IncomingMessage {
    Response {
        id: u64,
        #[serde(default)]
        result: Option<Value>,
        #[serde(default)]
        error: Option<RpcError>,
    },
    Event {
        method: String,
        #[serde(default)]
        params: Value,
    },
}

impl IncomingMessage {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
