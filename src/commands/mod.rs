mod args;
mod builtin;
mod handlers;

pub use args::{split_command, Arg, ParsedArgs};
pub use builtin::builtin_commands;
pub use handlers::{print_pause_banner, CommandContext};

use crate::debugger::{EvalOutcome, Session, StepKind};
use crate::error::{DebuggerError, Result};
use crate::output::Printer;
use crate::protocol::types::PauseOnExceptionsState;
use crate::protocol::ProtocolClient;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub const NOT_CONNECTED: &str = "Program not connected; Use `run` to start the app again.";

/// When a command may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    Always,
    RequiresConnection,
    RequiresPause,
}

impl Precondition {
    /// The message to show when `session` does not satisfy the condition.
    pub fn check(self, session: &Session, name: &str) -> Option<String> {
        match self {
            Precondition::Always => None,
            Precondition::RequiresConnection if !session.is_connected() => {
                Some(NOT_CONNECTED.to_string())
            }
            Precondition::RequiresPause if !session.is_paused() => Some(format!(
                "This command \"{}\" requires program to be paused.",
                name
            )),
            _ => None,
        }
    }
}

/// What a command does; the handler for each lives in `handlers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Exec,
    SetBreakpoint,
    ClearBreakpoint,
    DeleteBreakpoint,
    ListBreakpoints,
    Backtrace,
    Step(StepKind),
    Pause,
    Up,
    Down,
    Frame,
    List,
    Watch,
    Unwatch,
    Watchers,
    BreakOn(PauseOnExceptionsState),
    Profile,
    ProfileEnd,
    Profiles,
    Version,
    Info,
    Set,
    Show,
    Alias,
    AutoEval,
    Help,
    Shell,
    Interrupt,
    Run,
    Kill,
    Quit,
}

#[derive(Debug, Clone)]
pub struct CommandDescriptor {
    pub name: String,
    pub aliases: Vec<String>,
    pub precondition: Precondition,
    pub help: &'static str,
    pub action: Action,
}

impl CommandDescriptor {
    pub fn new(name: &str, precondition: Precondition, action: Action, help: &'static str) -> Self {
        Self {
            name: name.to_string(),
            aliases: Vec::new(),
            precondition,
            help,
            action,
        }
    }

    pub fn aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|alias| alias.to_string()).collect();
        self
    }
}

/// Command table. Names and aliases share one namespace: whichever was
/// registered last owns a name.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: IndexMap<String, Arc<CommandDescriptor>>,
    aliases: HashMap<String, String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for descriptor in builtin_commands() {
            registry.define(descriptor);
        }
        registry
    }

    pub fn define(&mut self, descriptor: CommandDescriptor) {
        self.aliases.remove(&descriptor.name);
        for alias in &descriptor.aliases {
            self.aliases.insert(alias.clone(), descriptor.name.clone());
        }
        self.commands
            .insert(descriptor.name.clone(), Arc::new(descriptor));
    }

    /// Makes `alias` dispatch to whatever `target` currently names.
    pub fn add_alias(&mut self, alias: &str, target: &str) -> Result<()> {
        let descriptor = self.lookup(target).ok_or_else(|| {
            DebuggerError::precondition(format!("Command \"{}\" not found", target))
        })?;
        self.aliases
            .insert(alias.to_string(), descriptor.name.clone());
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<CommandDescriptor>> {
        let canonical = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.commands.get(canonical).cloned()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<CommandDescriptor>> {
        self.commands.values()
    }

    /// Aliases pointing at `name`, sorted.
    pub fn aliases_of(&self, name: &str) -> Vec<&str> {
        let mut aliases: Vec<&str> = self
            .aliases
            .iter()
            .filter(|(_, target)| target.as_str() == name)
            .map(|(alias, _)| alias.as_str())
            .collect();
        aliases.sort_unstable();
        aliases
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// What the driver has to do after a line was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Done,
    Restart,
    Kill,
    Interrupt,
    Quit,
}

pub struct Dispatcher {
    registry: CommandRegistry,
    last_line: Option<String>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(CommandRegistry::with_builtins())
    }
}

impl Dispatcher {
    pub fn new(registry: CommandRegistry) -> Self {
        Self {
            registry,
            last_line: None,
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    /// Runs one line of command-mode input. An empty line repeats the
    /// previous one. Recoverable errors are printed and swallowed.
    pub async fn dispatch(
        &mut self,
        session: &mut Session,
        client: &dyn ProtocolClient,
        out: &mut dyn Printer,
        line: &str,
    ) -> Result<CommandOutcome> {
        let line = match line.trim() {
            "" => match &self.last_line {
                Some(last) => last.clone(),
                None => return Ok(CommandOutcome::Done),
            },
            line => {
                self.last_line = Some(line.to_string());
                line.to_string()
            }
        };

        let (name, rest) = split_command(&line);
        debug!(command = name, "dispatch");

        let Some(descriptor) = self.registry.lookup(name) else {
            if session.settings.auto_eval {
                return self.evaluate(session, client, out, &line).await;
            }
            out.print(&format!("Command \"{}\" not a debugger command.", name));
            return Ok(CommandOutcome::Done);
        };

        if let Some(message) = descriptor.precondition.check(session, name) {
            out.print(&message);
            return Ok(CommandOutcome::Done);
        }

        let args = ParsedArgs::parse(rest);
        let mut ctx = CommandContext {
            session,
            client,
            registry: &mut self.registry,
            out,
        };
        let result = handlers::run(descriptor.action, &mut ctx, args).await;
        debug!(command = %descriptor.name, ok = result.is_ok(), "dispatch finished");
        recover(result, &mut *ctx.out)
    }

    /// Evaluates `expression` and prints the result. Used for auto-eval and
    /// for every line typed in shell mode.
    pub async fn evaluate(
        &mut self,
        session: &mut Session,
        client: &dyn ProtocolClient,
        out: &mut dyn Printer,
        expression: &str,
    ) -> Result<CommandOutcome> {
        if !session.is_connected() {
            out.print(NOT_CONNECTED);
            return Ok(CommandOutcome::Done);
        }
        let result = session.evaluate(client, expression).await.map(|outcome| {
            match outcome {
                EvalOutcome::Value(value) => out.print(&value.to_string()),
                EvalOutcome::Thrown(error) => out.error(&error.to_string()),
            }
            CommandOutcome::Done
        });
        recover(result, out)
    }
}

fn recover(result: Result<CommandOutcome>, out: &mut dyn Printer) -> Result<CommandOutcome> {
    match result {
        Err(DebuggerError::Precondition(message)) => {
            out.print(&message);
            Ok(CommandOutcome::Done)
        }
        Err(err) if err.is_recoverable() => {
            out.error(&err.to_string());
            Ok(CommandOutcome::Done)
        }
        other => other,
    }
}
