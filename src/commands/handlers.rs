use super::{Action, CommandOutcome, CommandRegistry, ParsedArgs, NOT_CONNECTED};
use crate::debugger::{BreakpointSet, BreakpointSite, EvalOutcome, Profile, Session, StepKind};
use crate::error::{DebuggerError, Result};
use crate::output::Printer;
use crate::protocol::types::{CallFrame, EvaluateParams, PauseOnExceptionsState};
use crate::protocol::{ProfilerDomain, ProtocolClient, RuntimeDomain};
use tracing::warn;

/// Lines shown on each side of a freshly set breakpoint.
const BREAKPOINT_CONTEXT_DELTA: u32 = 5;

/// Everything a command handler may touch.
pub struct CommandContext<'a> {
    pub session: &'a mut Session,
    pub client: &'a dyn ProtocolClient,
    pub registry: &'a mut CommandRegistry,
    pub out: &'a mut dyn Printer,
}

pub(super) async fn run(
    action: Action,
    ctx: &mut CommandContext<'_>,
    args: ParsedArgs,
) -> Result<CommandOutcome> {
    match action {
        Action::Exec => exec(ctx, &args).await?,
        Action::SetBreakpoint => set_breakpoint(ctx, &args).await?,
        Action::ClearBreakpoint => clear_breakpoint(ctx, &args).await?,
        Action::DeleteBreakpoint => delete_breakpoint(ctx, &args).await?,
        Action::ListBreakpoints => list_breakpoints(ctx),
        Action::Backtrace => backtrace(ctx)?,
        Action::Step(kind) => step(ctx, kind).await?,
        Action::Pause => ctx.session.pause(ctx.client).await?,
        Action::Up => {
            let count = args.int(0).unwrap_or(1);
            ctx.session.up(count)?;
            show_selected_frame(ctx).await?;
        }
        Action::Down => {
            let count = args.int(0).unwrap_or(1);
            ctx.session.down(count)?;
            show_selected_frame(ctx).await?;
        }
        Action::Frame => {
            if let Some(index) = args.int(0) {
                ctx.session.select_frame(index)?;
            }
            show_selected_frame(ctx).await?;
        }
        Action::List => list(ctx, &args).await?,
        Action::Watch => watch(ctx, &args)?,
        Action::Unwatch => unwatch(ctx, &args)?,
        Action::Watchers => match ctx.session.format_watchers(ctx.client).await? {
            Some(text) => ctx.out.write(&text),
            None => ctx.out.print("No watchers"),
        },
        Action::BreakOn(state) => break_on(ctx, state).await?,
        Action::Profile => ProfilerDomain::new(ctx.client).start().await?,
        Action::ProfileEnd => profile_end(ctx).await?,
        Action::Profiles => list_profiles(ctx),
        Action::Version => version(ctx).await?,
        Action::Info => info(ctx, &args).await?,
        Action::Set => set(ctx, &args)?,
        Action::Show => show(ctx, &args).await?,
        Action::Alias => alias(ctx, &args)?,
        Action::AutoEval => {
            if let Some(value) = args.text(0) {
                ctx.session.settings.auto_eval = parse_switch(&value)?;
            }
            show_setting(ctx, "autoeval");
        }
        Action::Help => help(ctx, &args),
        Action::Shell => {
            ctx.session.enter_shell();
            ctx.out.print("Press Ctrl+C to leave debug repl");
        }
        Action::Interrupt => return Ok(CommandOutcome::Interrupt),
        Action::Run => return Ok(CommandOutcome::Restart),
        Action::Kill => return Ok(CommandOutcome::Kill),
        Action::Quit => return Ok(CommandOutcome::Quit),
    }
    Ok(CommandOutcome::Done)
}

// ---- presentation helpers ----

/// Url as shown to the user: relative to the working directory when possible.
pub fn relative_path(url: &str) -> String {
    let path = url.strip_prefix("file://").unwrap_or(url);
    if let Ok(cwd) = std::env::current_dir() {
        let cwd = cwd.to_string_lossy();
        if let Some(rest) = path.strip_prefix(cwd.as_ref()) {
            if let Some(rest) = rest.strip_prefix(['/', '\\']) {
                return rest.to_string();
            }
        }
    }
    path.to_string()
}

fn script_label(session: &Session, script_id: &str) -> String {
    session
        .scripts
        .lookup(script_id)
        .map(|script| relative_path(&script.url))
        .unwrap_or_else(|| "<unknown>".to_string())
}

fn format_frame(session: &Session, index: usize, frame: &CallFrame) -> String {
    let prefix = if session.selected_frame_index() == Some(index) {
        "->"
    } else {
        "##"
    };
    format!(
        "{} {} {} {}:{}:{}",
        prefix,
        index,
        frame.display_name(),
        script_label(session, &frame.location.script_id),
        frame.location.line_number + 1,
        frame.location.column_number
    )
}

fn print_evaluation(out: &mut dyn Printer, outcome: EvalOutcome) {
    match outcome {
        EvalOutcome::Value(value) => out.print(&value.to_string()),
        EvalOutcome::Thrown(error) => out.error(&error.to_string()),
    }
}

fn parse_switch(value: &str) -> Result<bool> {
    match value {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(DebuggerError::precondition(format!(
            "Expecting \"on\" or \"off\", got \"{}\"",
            other
        ))),
    }
}

fn positive_arg(args: &ParsedArgs, index: usize, what: &str) -> Result<u32> {
    match args.int(index) {
        Some(n) if n > 0 => u32::try_from(n).map_err(|_| {
            DebuggerError::precondition(format!("{} is out of range", what))
        }),
        _ => Err(DebuggerError::precondition(format!(
            "{} should be a positive number",
            what
        ))),
    }
}

/// `<reason> in <url>:<line>`, then watchers and a short listing.
pub async fn print_pause_banner(
    session: &Session,
    client: &dyn ProtocolClient,
    out: &mut dyn Printer,
) -> Result<()> {
    let location = session.current_location()?.clone();
    let reason = session
        .pause_reason()
        .map(ToString::to_string)
        .unwrap_or_else(|| "break".to_string());
    out.print(&format!(
        "{} in {}:{}",
        reason,
        script_label(session, &location.script_id),
        location.line_number + 1
    ));

    if let Some(watchers) = session.format_watchers(client).await? {
        out.write(&watchers);
        out.print("");
    }

    let snippet = session
        .source_snippet(
            client,
            &location.script_id,
            location.line_number,
            session.settings.pause_context_delta,
        )
        .await?;
    if !snippet.is_empty() {
        out.print(&snippet.to_string());
    }
    Ok(())
}

// ---- evaluation ----

async fn exec(ctx: &mut CommandContext<'_>, args: &ParsedArgs) -> Result<()> {
    let expression = args.expression();
    if expression.is_empty() {
        return Err(DebuggerError::precondition("exec needs an expression"));
    }
    let outcome = ctx.session.evaluate(ctx.client, &expression).await?;
    print_evaluation(ctx.out, outcome);
    Ok(())
}

async fn version(ctx: &mut CommandContext<'_>) -> Result<()> {
    let mut params = EvaluateParams::new("process.versions.v8");
    params.return_by_value = true;
    let result = RuntimeDomain::new(ctx.client).evaluate(params).await?;
    match result.result.value.as_ref().and_then(|v| v.as_str()) {
        Some(version) => ctx.out.print(version),
        None => ctx.out.print(&result.result.to_string()),
    }
    Ok(())
}

// ---- breakpoints ----

async fn set_breakpoint(ctx: &mut CommandContext<'_>, args: &ParsedArgs) -> Result<()> {
    let (target, condition) = args.break_target();
    match ctx
        .session
        .set_breakpoint(ctx.client, target, condition)
        .await?
    {
        BreakpointSet::Resolved {
            bp_num,
            url,
            location,
        } => {
            ctx.out.print(&format!(
                "Breakpoint {} set in file {}, line {}.",
                bp_num,
                relative_path(&url),
                location.line_number + 1
            ));
            // The breakpoint already exists; a missing listing is not an error.
            match ctx
                .session
                .source_snippet(
                    ctx.client,
                    &location.script_id,
                    location.line_number,
                    BREAKPOINT_CONTEXT_DELTA,
                )
                .await
            {
                Ok(snippet) if !snippet.is_empty() => ctx.out.print(&snippet.to_string()),
                Ok(_) => {}
                Err(err) => warn!(bp_num, error = %err, "no source listing for breakpoint"),
            }
        }
        BreakpointSet::Pending { name, .. } => ctx
            .out
            .print(&format!("Warning: script '{}' was not loaded yet.", name)),
        BreakpointSet::FunctionTrap { function } => ctx
            .out
            .print(&format!("Breaking on calls to {}().", function)),
    }
    Ok(())
}

async fn clear_breakpoint(ctx: &mut CommandContext<'_>, args: &ParsedArgs) -> Result<()> {
    let (Some(url), Some(line)) = (args.text(0), args.int(1)) else {
        return Err(DebuggerError::precondition(
            "clear needs a script name and a line number",
        ));
    };
    let removed = ctx.session.clear_breakpoint(ctx.client, &url, line).await?;
    ctx.out
        .print(&format!("Breakpoint {} deleted", removed.bp_num));
    Ok(())
}

async fn delete_breakpoint(ctx: &mut CommandContext<'_>, args: &ParsedArgs) -> Result<()> {
    let bp_num = positive_arg(args, 0, "Breakpoint number")?;
    let removed = ctx.session.delete_breakpoint(ctx.client, bp_num).await?;
    ctx.out
        .print(&format!("Breakpoint {} deleted", removed.bp_num));
    Ok(())
}

fn list_breakpoints(ctx: &mut CommandContext<'_>) {
    let session = &*ctx.session;
    if session.breakpoints.is_empty() {
        ctx.out.print("No breakpoints yet");
        return;
    }
    for entry in session.breakpoints.iter() {
        let place = match &entry.site {
            BreakpointSite::Resolved(location) => format!(
                "{}:{}",
                session
                    .breakpoint_url(entry)
                    .map(|url| relative_path(&url))
                    .unwrap_or_else(|| "<unknown location>".to_string()),
                location.line_number + 1
            ),
            BreakpointSite::Pending {
                url_regex,
                line_number,
            } => format!("{}:{} (pending)", url_regex, line_number + 1),
        };
        match &entry.condition {
            Some(condition) => ctx
                .out
                .print(&format!("#{} {} if {}", entry.bp_num, place, condition)),
            None => ctx.out.print(&format!("#{} {}", entry.bp_num, place)),
        }
    }
}

async fn break_on(ctx: &mut CommandContext<'_>, state: PauseOnExceptionsState) -> Result<()> {
    ctx.session
        .set_pause_on_exceptions(ctx.client, state)
        .await
}

// ---- execution and frames ----

async fn step(ctx: &mut CommandContext<'_>, kind: StepKind) -> Result<()> {
    ctx.session.step(ctx.client, kind).await
}

fn backtrace(ctx: &mut CommandContext<'_>) -> Result<()> {
    let session = &*ctx.session;
    let frames = session
        .backtrace()
        .ok_or_else(|| DebuggerError::precondition("Requires execution to be paused"))?;
    for (index, frame) in frames.iter().enumerate() {
        ctx.out.print(&format_frame(session, index, frame));
    }
    Ok(())
}

async fn show_selected_frame(ctx: &mut CommandContext<'_>) -> Result<()> {
    let session = &*ctx.session;
    let index = session.selected_frame_index().unwrap_or(0);
    let frame = session.selected_frame()?;
    ctx.out.print(&format_frame(session, index, frame));
    let snippet = session
        .source_snippet(
            ctx.client,
            &frame.location.script_id,
            frame.location.line_number,
            session.settings.pause_context_delta,
        )
        .await?;
    if !snippet.is_empty() {
        ctx.out.print(&snippet.to_string());
    }
    Ok(())
}

async fn list(ctx: &mut CommandContext<'_>, args: &ParsedArgs) -> Result<()> {
    let session = &*ctx.session;
    let location = session.current_location()?;
    let center = match args.int(0) {
        Some(_) => positive_arg(args, 0, "Line")? - 1,
        None => location.line_number,
    };
    let delta = match args.int(1) {
        Some(delta) if delta < 0 => {
            return Err(DebuggerError::precondition("Delta should not be negative"))
        }
        Some(delta) => u32::try_from(delta)
            .map_err(|_| DebuggerError::precondition("Delta is out of range"))?,
        None => session.settings.list_delta,
    };
    let snippet = session
        .source_snippet(ctx.client, &location.script_id, center, delta)
        .await?;
    if snippet.is_empty() {
        ctx.out.print("No source lines in that range");
    } else {
        ctx.out.print(&snippet.to_string());
    }
    Ok(())
}

// ---- watchers and profiles ----

fn watch(ctx: &mut CommandContext<'_>, args: &ParsedArgs) -> Result<()> {
    let expression = args.expression();
    if expression.is_empty() {
        return Err(DebuggerError::precondition("watch needs an expression"));
    }
    ctx.session.watchers.add(expression);
    Ok(())
}

fn unwatch(ctx: &mut CommandContext<'_>, args: &ParsedArgs) -> Result<()> {
    let target = args.expression();
    match ctx.session.watchers.remove(&target) {
        Some(_) => Ok(()),
        None => Err(DebuggerError::precondition(format!(
            "No watch expression {}",
            target
        ))),
    }
}

async fn profile_end(ctx: &mut CommandContext<'_>) -> Result<()> {
    let data = ProfilerDomain::new(ctx.client).stop().await?;
    let profile = Profile::new(data, None);
    ctx.out.print(&profile.to_string());
    ctx.session.profiles.add(profile);
    Ok(())
}

fn list_profiles(ctx: &mut CommandContext<'_>) {
    if ctx.session.profiles.is_empty() {
        ctx.out.print("No profiles");
        return;
    }
    for (index, profile) in ctx.session.profiles.iter().enumerate() {
        ctx.out.print(&format!("{}: {}", index, profile));
    }
}

// ---- info / set / show ----

async fn info(ctx: &mut CommandContext<'_>, args: &ParsedArgs) -> Result<()> {
    let sub = args.text(0).unwrap_or_default();
    match sub.as_str() {
        "breakpoints" => list_breakpoints(ctx),
        "files" => {
            if !ctx.session.is_connected() {
                ctx.out.print(NOT_CONNECTED);
                return Ok(());
            }
            let show_all = args.text(1).as_deref() == Some("all");
            info_files(ctx, show_all);
        }
        "frame" | "line" if !ctx.session.is_paused() => {
            ctx.out
                .print(&format!("\"info {}\" requires program to be paused.", sub));
        }
        "frame" => {
            if let Some(index) = args.int(1) {
                ctx.session.select_frame(index)?;
            }
            let session = &*ctx.session;
            let index = session.selected_frame_index().unwrap_or(0);
            let frame = session.selected_frame()?;
            ctx.out.print(&format_frame(session, index, frame));
            for scope in &frame.scope_chain {
                ctx.out.print(&format!("  scope: {}", scope.kind));
            }
        }
        "line" => {
            let session = &*ctx.session;
            let location = session.current_location()?;
            ctx.out.print(&format!(
                "Line {} of \"{}\"",
                location.line_number + 1,
                script_label(session, &location.script_id)
            ));
        }
        "program" => {
            let session = &*ctx.session;
            if !session.is_connected() {
                ctx.out.print(NOT_CONNECTED);
            } else if let Some(reason) = session.pause_reason() {
                ctx.out
                    .print(&format!("Program is running and paused: {}.", reason));
            } else if session.is_paused() {
                ctx.out.print("Program is running and paused: break.");
            } else {
                ctx.out.print("Program is running and not paused.");
            }
        }
        "" => ctx
            .out
            .print("info: need a subcommand: breakpoints, files, frame, line, program"),
        other => {
            return Err(DebuggerError::precondition(format!(
                "Undefined info command \"{}\"",
                other
            )))
        }
    }
    Ok(())
}

fn info_files(ctx: &mut CommandContext<'_>, show_all: bool) {
    let session = &*ctx.session;
    let current = session
        .current_location()
        .ok()
        .map(|location| location.script_id.clone());
    ctx.out.print("current scriptId filename");
    for script in session.scripts.iter() {
        let is_current = current.as_deref() == Some(script.id.as_str());
        if script.is_native && !show_all && !is_current {
            continue;
        }
        ctx.out.print(&format!(
            "{}{}: {}{}",
            if is_current { "*" } else { " " },
            script.id,
            relative_path(&script.url),
            if script.is_native { " <native>" } else { "" }
        ));
    }
}

fn set(ctx: &mut CommandContext<'_>, args: &ParsedArgs) -> Result<()> {
    let (Some(name), Some(value)) = (args.text(0), args.text(1)) else {
        return Err(DebuggerError::precondition(
            "set needs a setting name and a value: autoeval, width, listsize",
        ));
    };
    let settings = &mut ctx.session.settings;
    match name.as_str() {
        "autoeval" => settings.auto_eval = parse_switch(&value)?,
        "width" => settings.display_width = positive_arg(args, 1, "Width")? as usize,
        "listsize" => settings.list_delta = positive_arg(args, 1, "List size")?,
        other => {
            return Err(DebuggerError::precondition(format!(
                "Undefined set command \"{}\"",
                other
            )))
        }
    }
    show_setting(ctx, &name);
    Ok(())
}

fn show_setting(ctx: &mut CommandContext<'_>, name: &str) {
    let settings = &ctx.session.settings;
    let text = match name {
        "autoeval" => format!(
            "autoeval is {}.",
            if settings.auto_eval { "on" } else { "off" }
        ),
        "width" => format!("width is {}.", settings.display_width),
        "listsize" => format!("listsize is {}.", settings.list_delta),
        _ => return,
    };
    ctx.out.print(&text);
}

async fn show(ctx: &mut CommandContext<'_>, args: &ParsedArgs) -> Result<()> {
    let name = args.text(0).unwrap_or_default();
    match name.as_str() {
        "autoeval" | "width" | "listsize" => show_setting(ctx, &name),
        "args" => {
            let text = ctx.session.program_args.join(" ");
            ctx.out.print(&format!("Argument list to give program: {}", text));
        }
        "version" => {
            if !ctx.session.is_connected() {
                ctx.out.print(NOT_CONNECTED);
            } else {
                version(ctx).await?;
            }
        }
        "" => {
            for name in ["autoeval", "width", "listsize"] {
                show_setting(ctx, name);
            }
        }
        other => {
            return Err(DebuggerError::precondition(format!(
                "Undefined show command \"{}\"",
                other
            )))
        }
    }
    Ok(())
}

// ---- registry ----

fn alias(ctx: &mut CommandContext<'_>, args: &ParsedArgs) -> Result<()> {
    let (Some(alias), Some(target)) = (args.text(0), args.text(1)) else {
        return Err(DebuggerError::precondition("alias needs a name and a command"));
    };
    ctx.registry.add_alias(&alias, &target)?;
    ctx.out
        .print(&format!("Alias \"{}\" for \"{}\" added.", alias, target));
    Ok(())
}

fn help(ctx: &mut CommandContext<'_>, args: &ParsedArgs) {
    match args.text(0).as_deref() {
        None => {
            let mut names: Vec<&str> = ctx
                .registry
                .descriptors()
                .map(|descriptor| descriptor.name.as_str())
                .collect();
            names.sort_unstable();
            let width = ctx.session.settings.display_width.max(20);
            let column = names.iter().map(|name| name.len()).max().unwrap_or(0) + 2;
            let per_line = (width / column).max(1);
            for chunk in names.chunks(per_line) {
                let line: String = chunk
                    .iter()
                    .map(|name| format!("{:<column$}", name, column = column))
                    .collect();
                ctx.out.print(line.trim_end());
            }
        }
        Some("*") => {
            for descriptor in ctx.registry.descriptors() {
                ctx.out.print(descriptor.help);
            }
        }
        Some(name) => match ctx.registry.lookup(name) {
            Some(descriptor) => {
                ctx.out.print(descriptor.help);
                let aliases = ctx.registry.aliases_of(&descriptor.name);
                if !aliases.is_empty() {
                    ctx.out.print(&format!("Aliases: {}", aliases.join(", ")));
                }
            }
            None => ctx.out.print(&format!(
                "\"{}\" is not a debugger command or is not a valid subcommand.",
                name
            )),
        },
    }
}
