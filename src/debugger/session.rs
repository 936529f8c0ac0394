use super::breakpoints::BreakpointTable;
use super::profiles::{Profile, ProfileStore};
use super::scripts::{Script, ScriptRegistry};
use super::source::SourceSnippet;
use super::stepping::StepKind;
use super::watchers::WatchList;
use crate::config::DebuggerConfig;
use crate::error::{DebuggerError, Result};
use crate::protocol::types::{
    CallFrame, EvaluateParams, EvaluateResult, Location, PauseOnExceptionsState, PausedEvent,
    RemoteObject,
};
use crate::protocol::{
    DebuggerDomain, ProfilerDomain, ProtocolClient, ProtocolEvent, RuntimeDomain,
};
use std::fmt;
use tracing::{debug, warn};

const OBJECT_GROUP: &str = "node-inspect";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PauseReason {
    Break,
    Exception,
    PromiseRejection,
    DebugCommand,
    Other(String),
}

impl From<&str> for PauseReason {
    fn from(reason: &str) -> Self {
        match reason {
            "other" | "break" => PauseReason::Break,
            "exception" => PauseReason::Exception,
            "promiseRejection" => PauseReason::PromiseRejection,
            "debugCommand" => PauseReason::DebugCommand,
            other => PauseReason::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PauseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PauseReason::Break => write!(f, "break"),
            PauseReason::Exception => write!(f, "exception"),
            PauseReason::PromiseRejection => write!(f, "promiseRejection"),
            PauseReason::DebugCommand => write!(f, "debugCommand"),
            PauseReason::Other(reason) => write!(f, "{}", reason),
        }
    }
}

/// An exception thrown by an evaluated expression, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
}

impl RemoteError {
    pub fn from_evaluation(result: &EvaluateResult) -> Self {
        let exception = result
            .exception_details
            .as_ref()
            .and_then(|details| details.exception.as_ref())
            .unwrap_or(&result.result);
        let fallback = result
            .exception_details
            .as_ref()
            .map(|details| details.text.clone())
            .unwrap_or_default();
        let description = exception.description.clone().unwrap_or(fallback);

        let mut parts = description.splitn(2, '\n');
        let headline = parts.next().unwrap_or_default();
        let stack = parts.next().map(str::to_string);
        let (name, message) = match headline.split_once(": ") {
            Some((name, message)) => (name.to_string(), message.to_string()),
            None => (
                exception.class_name.clone().unwrap_or_else(|| "Error".to_string()),
                headline.to_string(),
            ),
        };
        Self {
            name,
            message,
            stack,
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvalOutcome {
    Value(RemoteObject),
    Thrown(RemoteError),
}

impl fmt::Display for EvalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalOutcome::Value(value) => write!(f, "{}", value),
            EvalOutcome::Thrown(error) => write!(f, "{}", error),
        }
    }
}

/// What applying a protocol event changed, for the driver to present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventEffect {
    Paused,
    Resumed,
    ScriptLoaded,
    BreakpointResolved(u32),
    ProfileFinished(usize),
    Ignored,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub auto_eval: bool,
    pub display_width: usize,
    pub list_delta: u32,
    pub pause_context_delta: u32,
}

impl Settings {
    pub fn from_config(config: &DebuggerConfig) -> Self {
        Self {
            auto_eval: config.auto_eval,
            display_width: config.display_width,
            list_delta: config.list_delta,
            pause_context_delta: config.pause_context_delta,
        }
    }
}

/// State of one debug session. Paused exactly when a backtrace is held,
/// and then `selected_frame` indexes into it.
#[derive(Debug)]
pub struct Session {
    connection: ConnectionState,
    backtrace: Option<Vec<CallFrame>>,
    selected_frame: usize,
    pause_reason: Option<PauseReason>,
    pause_on_exceptions: PauseOnExceptionsState,
    shell_active: bool,
    pub scripts: ScriptRegistry,
    pub breakpoints: BreakpointTable,
    pub watchers: WatchList,
    pub profiles: ProfileStore,
    pub settings: Settings,
    pub program_args: Vec<String>,
}

impl Session {
    pub fn new(config: &DebuggerConfig) -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            backtrace: None,
            selected_frame: 0,
            pause_reason: None,
            pause_on_exceptions: PauseOnExceptionsState::None,
            shell_active: false,
            scripts: ScriptRegistry::new(),
            breakpoints: BreakpointTable::new(),
            watchers: WatchList::new(),
            profiles: ProfileStore::new(),
            settings: Settings::from_config(config),
            program_args: Vec::new(),
        }
    }

    // ---- connection ----

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Connected
    }

    pub fn begin_connect(&mut self) {
        self.connection = ConnectionState::Connecting;
    }

    pub fn on_connected(&mut self) {
        self.connection = ConnectionState::Connected;
    }

    /// Transport went away: forget everything tied to the old connection.
    /// Breakpoints stay so they can be restored on the next connect.
    pub fn on_closed(&mut self) {
        self.connection = ConnectionState::Disconnected;
        self.scripts.reset();
        self.clear_pause();
        self.shell_active = false;
    }

    /// Brings a fresh connection into a usable state: domains enabled,
    /// exception mode and breakpoints re-applied, the debuggee released
    /// if it waits for us. Returns how many breakpoints were restored.
    pub async fn initialize(&mut self, client: &dyn ProtocolClient) -> Result<usize> {
        let runtime = RuntimeDomain::new(client);
        let profiler = ProfilerDomain::new(client);
        let debugger = DebuggerDomain::new(client);

        runtime.enable().await?;
        profiler.enable().await?;
        profiler.set_sampling_interval(100).await?;
        debugger.enable().await?;
        debugger
            .set_pause_on_exceptions(self.pause_on_exceptions)
            .await?;
        debugger.set_async_call_stack_depth(0).await?;
        debugger.set_blackbox_patterns(&[]).await?;
        let restored = self.restore_breakpoints(client).await?;
        runtime.run_if_waiting_for_debugger().await?;

        debug!(restored, "session initialized");
        Ok(restored)
    }

    // ---- events ----

    pub fn apply_event(&mut self, event: ProtocolEvent) -> EventEffect {
        match event {
            ProtocolEvent::Paused(paused) => {
                if self.on_paused(paused) {
                    EventEffect::Paused
                } else {
                    EventEffect::Ignored
                }
            }
            ProtocolEvent::Resumed => {
                self.on_resumed();
                EventEffect::Resumed
            }
            ProtocolEvent::ScriptParsed(parsed) => {
                if self.scripts.register(&parsed.script_id, &parsed.url) {
                    self.breakpoints
                        .attach_script_url(&parsed.script_id, &parsed.url);
                    EventEffect::ScriptLoaded
                } else {
                    EventEffect::Ignored
                }
            }
            ProtocolEvent::BreakpointResolved(resolved) => {
                let url = self
                    .scripts
                    .lookup(&resolved.location.script_id)
                    .map(|script| script.url.clone());
                let bp_num =
                    self.breakpoints
                        .handle_resolved(&resolved.breakpoint_id, resolved.location, url);
                EventEffect::BreakpointResolved(bp_num)
            }
            ProtocolEvent::ConsoleProfileFinished(finished) => {
                let index = self
                    .profiles
                    .add(Profile::new(finished.profile, finished.title));
                EventEffect::ProfileFinished(index)
            }
            ProtocolEvent::Other { method } => {
                debug!(%method, "ignoring event");
                EventEffect::Ignored
            }
        }
    }

    /// Replaces any previous backtrace. An empty frame batch is ignored.
    pub fn on_paused(&mut self, event: PausedEvent) -> bool {
        if event.call_frames.is_empty() {
            warn!(reason = %event.reason, "paused event without call frames");
            return false;
        }
        self.pause_reason = Some(PauseReason::from(event.reason.as_str()));
        self.backtrace = Some(event.call_frames);
        self.selected_frame = 0;
        true
    }

    pub fn on_resumed(&mut self) {
        self.clear_pause();
    }

    fn clear_pause(&mut self) {
        self.backtrace = None;
        self.selected_frame = 0;
        self.pause_reason = None;
    }

    // ---- pause state and frames ----

    pub fn is_paused(&self) -> bool {
        self.backtrace.is_some()
    }

    pub fn backtrace(&self) -> Option<&[CallFrame]> {
        self.backtrace.as_deref()
    }

    pub fn pause_reason(&self) -> Option<&PauseReason> {
        self.pause_reason.as_ref()
    }

    pub fn selected_frame_index(&self) -> Option<usize> {
        self.backtrace.as_ref().map(|_| self.selected_frame)
    }

    pub fn selected_frame(&self) -> Result<&CallFrame> {
        self.backtrace
            .as_ref()
            .and_then(|frames| frames.get(self.selected_frame))
            .ok_or_else(not_paused)
    }

    pub fn current_location(&self) -> Result<&Location> {
        self.selected_frame().map(|frame| &frame.location)
    }

    pub fn current_script(&self) -> Option<&Script> {
        let location = self.current_location().ok()?;
        self.scripts.lookup(&location.script_id)
    }

    /// Selects frame `index`. Out-of-range requests leave the selection alone.
    pub fn select_frame(&mut self, index: i64) -> Result<&CallFrame> {
        let frames = self.backtrace.as_ref().ok_or_else(not_paused)?;
        if index < 0 {
            return Err(DebuggerError::precondition(
                "Cannot move beyond the newest frame",
            ));
        }
        let index = index as usize;
        if index >= frames.len() {
            return Err(DebuggerError::precondition(
                "Cannot move beyond the oldest frame",
            ));
        }
        self.selected_frame = index;
        Ok(&frames[index])
    }

    /// Moves toward older frames.
    pub fn up(&mut self, count: i64) -> Result<&CallFrame> {
        let current = self.selected_frame_index().ok_or_else(not_paused)? as i64;
        self.select_frame(current.saturating_add(count))
    }

    /// Moves toward newer frames.
    pub fn down(&mut self, count: i64) -> Result<&CallFrame> {
        let current = self.selected_frame_index().ok_or_else(not_paused)? as i64;
        self.select_frame(current.saturating_sub(count))
    }

    /// Resumes execution. Pause state is dropped before the request goes
    /// out; the next paused event re-establishes it.
    pub async fn step(&mut self, client: &dyn ProtocolClient, kind: StepKind) -> Result<()> {
        if !self.is_paused() {
            return Err(not_paused());
        }
        self.on_resumed();
        debug!(method = kind.method(), "resuming");
        kind.send(&DebuggerDomain::new(client)).await
    }

    pub async fn pause(&self, client: &dyn ProtocolClient) -> Result<()> {
        DebuggerDomain::new(client).pause().await
    }

    // ---- evaluation ----

    /// Evaluates in the selected frame when paused, globally otherwise.
    pub async fn evaluate(&self, client: &dyn ProtocolClient, expression: &str) -> Result<EvalOutcome> {
        let mut params = EvaluateParams::new(expression);
        params.object_group = Some(OBJECT_GROUP.to_string());
        params.generate_preview = true;
        params.include_command_line_api = true;

        let result = match self.selected_frame() {
            Ok(frame) => {
                DebuggerDomain::new(client)
                    .evaluate_on_call_frame(&frame.call_frame_id, params)
                    .await
            }
            Err(_) => RuntimeDomain::new(client).evaluate(params).await,
        };

        match result {
            Ok(result) if result.threw() => Ok(EvalOutcome::Thrown(RemoteError::from_evaluation(&result))),
            Ok(result) => Ok(EvalOutcome::Value(result.result)),
            Err(DebuggerError::Protocol { message, .. }) => Ok(EvalOutcome::Thrown(RemoteError {
                name: "Error".to_string(),
                message,
                stack: None,
            })),
            Err(err) => Err(err),
        }
    }

    /// Watched expressions and their current values, or None when nothing
    /// is watched.
    pub async fn format_watchers(&self, client: &dyn ProtocolClient) -> Result<Option<String>> {
        if self.watchers.is_empty() {
            return Ok(None);
        }
        let width = (self.watchers.len() - 1).to_string().len();
        let mut out = String::from("Watchers:\n");
        for (index, expression) in self.watchers.iter().enumerate() {
            let value = match self.evaluate(client, expression).await? {
                EvalOutcome::Value(value) => value.to_string(),
                EvalOutcome::Thrown(error) => format!("<{}>", error),
            };
            out.push_str(&format!(
                "{:>width$}: {} = {}\n",
                index,
                expression,
                value,
                width = width
            ));
        }
        Ok(Some(out))
    }

    /// Source around `center` (0-based) of `script_id`, marking the stopped
    /// line when it falls inside the window.
    pub async fn source_snippet(
        &self,
        client: &dyn ProtocolClient,
        script_id: &str,
        center: u32,
        delta: u32,
    ) -> Result<SourceSnippet> {
        let source = DebuggerDomain::new(client)
            .get_script_source(script_id)
            .await?;
        let current = self
            .current_location()
            .ok()
            .filter(|location| location.script_id == script_id)
            .map(|location| location.line_number);
        Ok(SourceSnippet::around(
            &source,
            center,
            delta,
            current,
            &self.breakpoints.lines_in(script_id),
        ))
    }

    // ---- exceptions ----

    pub fn pause_on_exceptions(&self) -> PauseOnExceptionsState {
        self.pause_on_exceptions
    }

    /// The mode is stored only once the debugger accepted it.
    pub async fn set_pause_on_exceptions(
        &mut self,
        client: &dyn ProtocolClient,
        state: PauseOnExceptionsState,
    ) -> Result<()> {
        DebuggerDomain::new(client)
            .set_pause_on_exceptions(state)
            .await?;
        self.pause_on_exceptions = state;
        Ok(())
    }

    // ---- shell mode ----

    pub fn in_shell(&self) -> bool {
        self.shell_active
    }

    pub fn enter_shell(&mut self) {
        self.shell_active = true;
    }

    pub fn leave_shell(&mut self) {
        self.shell_active = false;
    }
}

fn not_paused() -> DebuggerError {
    DebuggerError::precondition("Requires execution to be paused")
}
