use super::{Action, CommandDescriptor, Precondition};
use crate::debugger::StepKind;
use crate::protocol::types::PauseOnExceptionsState;

use Precondition::{Always, RequiresConnection, RequiresPause};

/// The built-in command set, in help order.
pub fn builtin_commands() -> Vec<CommandDescriptor> {
    vec![
        // evaluation
        CommandDescriptor::new(
            "exec",
            RequiresConnection,
            Action::Exec,
            "exec <expr>: evaluate an expression in the selected frame",
        )
        .aliases(&["e", "eval"]),
        CommandDescriptor::new(
            "shell",
            RequiresConnection,
            Action::Shell,
            "shell: evaluate every line as an expression until interrupted",
        )
        .aliases(&["repl"]),
        // breakpoints
        CommandDescriptor::new(
            "setBreakpoint",
            RequiresConnection,
            Action::SetBreakpoint,
            "break [file] [line] [condition]: set a breakpoint; break fn() traps calls to fn",
        )
        .aliases(&["sb", "breakpoint", "break", "b"]),
        CommandDescriptor::new(
            "clearBreakpoint",
            RequiresConnection,
            Action::ClearBreakpoint,
            "clear <file> <line>: remove the breakpoint at file:line",
        )
        .aliases(&["cb", "clear"]),
        CommandDescriptor::new(
            "deleteBreakpoint",
            RequiresConnection,
            Action::DeleteBreakpoint,
            "delete <bp-number>: remove a breakpoint by number",
        )
        .aliases(&["delete", "d"]),
        CommandDescriptor::new(
            "breakpoints",
            Always,
            Action::ListBreakpoints,
            "breakpoints: list breakpoints",
        ),
        CommandDescriptor::new(
            "breakOnException",
            RequiresConnection,
            Action::BreakOn(PauseOnExceptionsState::All),
            "breakOnException: pause on every thrown exception",
        ),
        CommandDescriptor::new(
            "breakOnUncaught",
            RequiresConnection,
            Action::BreakOn(PauseOnExceptionsState::Uncaught),
            "breakOnUncaught: pause on uncaught exceptions",
        ),
        CommandDescriptor::new(
            "breakOnNone",
            RequiresConnection,
            Action::BreakOn(PauseOnExceptionsState::None),
            "breakOnNone: do not pause on exceptions",
        ),
        // execution control
        CommandDescriptor::new(
            "cont",
            RequiresPause,
            Action::Step(StepKind::Continue),
            "cont: continue execution",
        )
        .aliases(&["c", "continue"]),
        CommandDescriptor::new(
            "next",
            RequiresPause,
            Action::Step(StepKind::Over),
            "next: step over the next statement",
        )
        .aliases(&["n"]),
        CommandDescriptor::new(
            "step",
            RequiresPause,
            Action::Step(StepKind::Into),
            "step: step into the next statement",
        )
        .aliases(&["s"]),
        CommandDescriptor::new(
            "finish",
            RequiresPause,
            Action::Step(StepKind::Out),
            "finish: run until the current function returns",
        )
        .aliases(&["fin", "out"]),
        CommandDescriptor::new(
            "pause",
            RequiresConnection,
            Action::Pause,
            "pause: pause running code",
        ),
        // stack
        CommandDescriptor::new(
            "backtrace",
            RequiresPause,
            Action::Backtrace,
            "backtrace: print the call stack",
        )
        .aliases(&["bt", "where"]),
        CommandDescriptor::new(
            "up",
            RequiresPause,
            Action::Up,
            "up [count]: select an older frame",
        ),
        CommandDescriptor::new(
            "down",
            RequiresPause,
            Action::Down,
            "down [count]: select a newer frame",
        ),
        CommandDescriptor::new(
            "frame",
            RequiresPause,
            Action::Frame,
            "frame [n]: select frame n, or show the selected frame",
        ),
        CommandDescriptor::new(
            "list",
            RequiresPause,
            Action::List,
            "list [line [delta]]: show source around the current or given line",
        )
        .aliases(&["l"]),
        // watchers
        CommandDescriptor::new(
            "watch",
            Always,
            Action::Watch,
            "watch <expr>: show expr every time execution pauses",
        ),
        CommandDescriptor::new(
            "unwatch",
            Always,
            Action::Unwatch,
            "unwatch <expr|index>: stop watching an expression",
        ),
        CommandDescriptor::new(
            "watchers",
            RequiresConnection,
            Action::Watchers,
            "watchers: show watched expressions and their values",
        ),
        // profiling
        CommandDescriptor::new(
            "profile",
            RequiresConnection,
            Action::Profile,
            "profile: start a CPU profile",
        ),
        CommandDescriptor::new(
            "profileEnd",
            RequiresConnection,
            Action::ProfileEnd,
            "profileEnd: stop the CPU profile and keep it",
        ),
        CommandDescriptor::new(
            "profiles",
            Always,
            Action::Profiles,
            "profiles: list captured CPU profiles",
        ),
        // session
        CommandDescriptor::new(
            "version",
            RequiresConnection,
            Action::Version,
            "version: print the debuggee's V8 version",
        ),
        CommandDescriptor::new(
            "info",
            Always,
            Action::Info,
            "info breakpoints|files [all]|frame [n]|line|program",
        ),
        CommandDescriptor::new(
            "set",
            Always,
            Action::Set,
            "set autoeval|width|listsize <value>",
        ),
        CommandDescriptor::new(
            "show",
            Always,
            Action::Show,
            "show autoeval|width|listsize|args|version",
        ),
        CommandDescriptor::new(
            "alias",
            Always,
            Action::Alias,
            "alias <name> <command>: add an alias for a command",
        ),
        CommandDescriptor::new(
            "autoeval",
            Always,
            Action::AutoEval,
            "autoeval [on|off]: evaluate unknown input as an expression",
        ),
        CommandDescriptor::new(
            "help",
            Always,
            Action::Help,
            "help [command|*]: describe commands",
        )
        .aliases(&["h", "?"]),
        CommandDescriptor::new(
            "interrupt",
            Always,
            Action::Interrupt,
            "interrupt: leave shell mode",
        ),
        CommandDescriptor::new(
            "run",
            Always,
            Action::Run,
            "run: restart the program",
        )
        .aliases(&["r", "restart"]),
        CommandDescriptor::new(
            "kill",
            RequiresConnection,
            Action::Kill,
            "kill: kill the program",
        ),
        CommandDescriptor::new("quit", Always, Action::Quit, "quit: exit the debugger")
            .aliases(&["exit", "q"]),
    ]
}
