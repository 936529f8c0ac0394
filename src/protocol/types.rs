//! Typed payloads for the protocol methods and events the debugger uses.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A position inside a parsed script. Lines and columns are 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub script_id: String,
    pub line_number: u32,
    #[serde(default)]
    pub column_number: u32,
}

impl Location {
    pub fn new(script_id: impl Into<String>, line_number: u32) -> Self {
        Self {
            script_id: script_id.into(),
            line_number,
            column_number: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unserializable_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

impl RemoteObject {
    pub fn type_label(&self) -> String {
        match &self.class_name {
            Some(class_name) => format!("{} {}", self.kind, class_name),
            None => self.kind.clone(),
        }
    }
}

/// One-line rendering; richer formatting belongs to the presentation layer.
impl fmt::Display for RemoteObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.as_str() {
            "undefined" => write!(f, "undefined"),
            "string" => match &self.value {
                Some(value) => write!(f, "{}", value),
                None => write!(f, "''"),
            },
            "number" | "boolean" | "bigint" => {
                if let Some(raw) = &self.unserializable_value {
                    write!(f, "{}", raw)
                } else if let Some(value) = &self.value {
                    write!(f, "{}", value)
                } else {
                    write!(f, "{}", self.description.as_deref().unwrap_or("?"))
                }
            }
            "function" => {
                let class_name = self.class_name.as_deref().unwrap_or("Function");
                match self.description.as_deref().and_then(function_name) {
                    Some(name) => write!(f, "[{}: {}]", class_name, name),
                    None => write!(f, "[{}]", class_name),
                }
            }
            "object" if self.subtype.as_deref() == Some("null") => write!(f, "null"),
            _ => match (&self.description, &self.value) {
                (Some(description), _) => write!(f, "{}", description),
                (None, Some(value)) => write!(f, "{}", value),
                (None, None) => write!(f, "[{}]", self.kind),
            },
        }
    }
}

/// Pulls `name` out of `function name(` / `function* name(` / `name(`.
fn function_name(description: &str) -> Option<&str> {
    let rest = description
        .strip_prefix("function* ")
        .or_else(|| description.strip_prefix("function "))
        .unwrap_or(description);
    let end = rest.find('(')?;
    let name = rest[..end].trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        None
    } else {
        Some(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    pub object: RemoteObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrame {
    pub call_frame_id: String,
    #[serde(default)]
    pub function_name: String,
    pub location: Location,
    #[serde(default)]
    pub scope_chain: Vec<Scope>,
    #[serde(default)]
    pub this: RemoteObject,
}

impl CallFrame {
    pub fn display_name(&self) -> &str {
        if self.function_name.is_empty() {
            "(anonymous)"
        } else {
            &self.function_name
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseOnExceptionsState {
    #[default]
    None,
    All,
    Uncaught,
}

impl fmt::Display for PauseOnExceptionsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PauseOnExceptionsState::None => "none",
            PauseOnExceptionsState::All => "all",
            PauseOnExceptionsState::Uncaught => "uncaught",
        };
        write!(f, "{}", name)
    }
}

// ---- events ----

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PausedEvent {
    pub call_frames: Vec<CallFrame>,
    pub reason: String,
    #[serde(default)]
    pub hit_breakpoints: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptParsedEvent {
    pub script_id: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointResolvedEvent {
    pub breakpoint_id: String,
    pub location: Location,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleProfileFinishedEvent {
    pub profile: Value,
    #[serde(default)]
    pub title: Option<String>,
}

// ---- method params and results ----

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointParams {
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointResult {
    pub breakpoint_id: String,
    pub actual_location: Location,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointByUrlParams {
    pub url_regex: String,
    pub line_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointByUrlResult {
    pub breakpoint_id: String,
    #[serde(default)]
    pub locations: Vec<Location>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
    pub expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_group: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub generate_preview: bool,
    #[serde(
        rename = "includeCommandLineAPI",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub include_command_line_api: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub return_by_value: bool,
}

impl EvaluateParams {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateOnCallFrameParams {
    pub call_frame_id: String,
    #[serde(flatten)]
    pub evaluate: EvaluateParams,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub exception: Option<RemoteObject>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResult {
    pub result: RemoteObject,
    #[serde(default)]
    pub was_thrown: bool,
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

impl EvaluateResult {
    pub fn threw(&self) -> bool {
        self.was_thrown || self.exception_details.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(default)]
    pub value: Option<RemoteObject>,
}

#[derive(Debug, Deserialize)]
pub struct GetPropertiesResult {
    pub result: Vec<PropertyDescriptor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetScriptSourceResult {
    pub script_source: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfilerStopResult {
    pub profile: Value,
}
