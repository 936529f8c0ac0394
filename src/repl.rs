//! The interactive driver. One task owns the session and consumes, in order
//! of priority, protocol events, debuggee output, user input and Ctrl+C.

use crate::cli::LaunchTarget;
use crate::commands::{print_pause_banner, CommandOutcome, Dispatcher};
use crate::config::DebuggerConfig;
use crate::debugger::{EventEffect, Session};
use crate::error::{DebuggerError, Result};
use crate::output::{Printer, StdoutPrinter};
use crate::protocol::{InspectorClient, TransportEvent};
use crate::supervisor::{signal_debug, ProcessSupervisor};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::debug;

const DISCONNECT_HINT: &str = "Waiting for the debugger to disconnect...";

enum Input {
    Transport(TransportEvent),
    ChildOutput(String),
    Line(Option<String>),
    Interrupt,
}

pub struct Inspector {
    config: DebuggerConfig,
    target: LaunchTarget,
    session: Session,
    dispatcher: Dispatcher,
    client: InspectorClient,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    supervisor: ProcessSupervisor,
    child_output: mpsc::UnboundedReceiver<String>,
    out: Box<dyn Printer>,
}

impl Inspector {
    pub fn new(config: DebuggerConfig, target: LaunchTarget) -> Self {
        Self::with_printer(config, target, Box::new(StdoutPrinter))
    }

    pub fn with_printer(config: DebuggerConfig, target: LaunchTarget, out: Box<dyn Printer>) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (output_tx, child_output) = mpsc::unbounded_channel();
        Self {
            session: Session::new(&config),
            dispatcher: Dispatcher::default(),
            client: InspectorClient::new(events_tx),
            events,
            supervisor: ProcessSupervisor::new(&config, output_tx),
            child_output,
            config,
            target,
            out,
        }
    }

    /// Connects, then runs the command loop until `quit` or end of input.
    /// The debuggee is killed on the way out, whatever the result.
    pub async fn run(mut self) -> Result<()> {
        let result = self.run_loop().await;
        self.shutdown().await;
        result
    }

    pub async fn shutdown(&mut self) {
        self.supervisor.kill().await;
        self.client.reset().await;
    }

    async fn run_loop(&mut self) -> Result<()> {
        self.start().await?;
        let mut input = spawn_input_reader();
        self.prompt();

        loop {
            let next = tokio::select! {
                biased;
                Some(event) = self.events.recv() => Input::Transport(event),
                Some(line) = self.child_output.recv() => Input::ChildOutput(line),
                line = input.recv() => Input::Line(line),
                _ = tokio::signal::ctrl_c() => Input::Interrupt,
            };

            match next {
                Input::Transport(event) => self.handle_transport(event).await?,
                Input::ChildOutput(line) => self.handle_child_output(line).await,
                Input::Line(Some(line)) => {
                    if self.handle_line(&line).await? == CommandOutcome::Quit {
                        return Ok(());
                    }
                    self.prompt();
                }
                Input::Line(None) => return Ok(()),
                Input::Interrupt => {
                    self.interrupt();
                    self.prompt();
                }
            }
        }
    }

    fn prompt(&mut self) {
        let prompt = if self.session.in_shell() {
            &self.config.shell_prompt
        } else {
            &self.config.prompt
        };
        self.out.write(prompt);
    }

    // ---- startup ----

    async fn start(&mut self) -> Result<()> {
        let (host, port) = match self.target.clone() {
            LaunchTarget::Script {
                path,
                args,
                stop_at_entry,
            } => {
                self.session.program_args = args.clone();
                let address = self
                    .supervisor
                    .launch(&path, &args, &self.config.host, self.config.port, stop_at_entry)
                    .await?;
                (address.host, address.port)
            }
            LaunchTarget::Remote { host, port } => (host, port),
            LaunchTarget::Pid(pid) => {
                signal_debug(pid)?;
                (self.config.host.clone(), self.config.port)
            }
        };

        self.connect_with_retry(&host, port).await?;
        let restored = self.session.initialize(&self.client).await?;
        if restored > 0 {
            self.out
                .print(&format!("{} breakpoints restored.", restored));
        }
        Ok(())
    }

    async fn connect_with_retry(&mut self, host: &str, port: u16) -> Result<()> {
        self.session.begin_connect();
        self.out
            .write(&format!("connecting to {}:{} ..", host, port));

        for attempt in 1..=self.config.connect_attempts {
            debug!(attempt, host, port, "connecting");
            match self.client.connect(host, port).await {
                Ok(()) => {
                    self.out.print(" ok");
                    self.session.on_connected();
                    return Ok(());
                }
                Err(err) => {
                    debug!(attempt, error = %err, "connection attempt failed");
                    self.out.write(".");
                    sleep(self.config.connect_retry_delay).await;
                }
            }
        }

        self.out.print("");
        self.session.on_closed();
        Err(DebuggerError::Startup(
            "failed to connect, please retry".to_string(),
        ))
    }

    /// Tears down the current child and connection. Events still queued
    /// from the old connection are discarded.
    async fn disconnect(&mut self) {
        self.supervisor.kill().await;
        self.client.reset().await;
        while self.events.try_recv().is_ok() {}
        self.session.on_closed();
    }

    async fn restart(&mut self) -> Result<()> {
        self.disconnect().await;
        self.start().await
    }

    // ---- inputs ----

    async fn handle_transport(&mut self, event: TransportEvent) -> Result<()> {
        let event = match event {
            TransportEvent::Event(event) => event,
            TransportEvent::Closed => {
                if self.session.is_connected() {
                    self.session.on_closed();
                    self.out.print("");
                    self.out.print("Debuggee connection closed.");
                    self.prompt();
                }
                return Ok(());
            }
        };

        match self.session.apply_event(event) {
            EventEffect::Paused => {
                self.out.print("");
                if let Err(err) =
                    print_pause_banner(&self.session, &self.client, self.out.as_mut()).await
                {
                    if !err.is_recoverable() {
                        return Err(err);
                    }
                    self.out.error(&err.to_string());
                }
                self.prompt();
            }
            EventEffect::ProfileFinished(index) => {
                if let Some(profile) = self.session.profiles.get(index) {
                    let text = format!("Captured {}", profile);
                    self.out.print("");
                    self.out.print(&text);
                    self.prompt();
                }
            }
            EventEffect::Resumed
            | EventEffect::ScriptLoaded
            | EventEffect::BreakpointResolved(_)
            | EventEffect::Ignored => {}
        }
        Ok(())
    }

    async fn handle_child_output(&mut self, line: String) {
        self.out.print(&format!("< {}", line));
        if line.trim_end() == DISCONNECT_HINT {
            debug!("debuggee finished, disconnecting");
            self.disconnect().await;
        }
    }

    async fn handle_line(&mut self, line: &str) -> Result<CommandOutcome> {
        if self.session.in_shell() {
            return self
                .dispatcher
                .evaluate(&mut self.session, &self.client, self.out.as_mut(), line)
                .await;
        }

        let outcome = self
            .dispatcher
            .dispatch(&mut self.session, &self.client, self.out.as_mut(), line)
            .await?;
        match outcome {
            CommandOutcome::Restart => self.restart().await?,
            CommandOutcome::Kill => self.disconnect().await,
            CommandOutcome::Interrupt => self.interrupt(),
            CommandOutcome::Done | CommandOutcome::Quit => {}
        }
        Ok(outcome)
    }

    /// Ctrl+C: only the line loop reacts; in-flight requests are untouched.
    fn interrupt(&mut self) {
        if self.session.in_shell() {
            self.session.leave_shell();
        }
        self.out.print("");
    }
}

fn spawn_input_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
    rx
}
