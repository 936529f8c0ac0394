mod common;

use common::*;
use inspect_debugger::debugger::{
    exact_url_pattern, url_suffix_pattern, BreakpointSite, BreakpointTable, EventEffect,
    ScriptMatch, ScriptRegistry, SourceSnippet,
};
use inspect_debugger::protocol::types::Location;

#[cfg(test)]
mod script_registry_tests {
    use super::*;

    #[test]
    fn test_duplicate_parse_events_keep_one_entry() {
        let mut registry = ScriptRegistry::new();

        assert!(registry.register("42", "file:///app/main.js"));
        assert!(!registry.register("42", "file:///app/main.js"));
        assert!(!registry.register("42", "file:///app/main.js"));

        assert_eq!(registry.len(), 1, "Same (id, url) must be stored once");
        assert_eq!(registry.lookup("42").unwrap().url, "file:///app/main.js");
    }

    #[test]
    fn test_register_overwrites_changed_url() {
        let mut registry = ScriptRegistry::new();
        registry.register("7", "file:///app/old.js");

        assert!(registry.register("7", "file:///app/new.js"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("7").unwrap().url, "file:///app/new.js");
    }

    #[test]
    fn test_empty_url_is_ignored() {
        let mut registry = ScriptRegistry::new();
        assert!(!registry.register("3", ""));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_native_classification() {
        let mut registry = ScriptRegistry::new();
        registry.register("1", "node:fs");
        registry.register("2", "internal/modules/cjs/loader.js");
        registry.register("3", "events.js");
        registry.register("4", "file:///app/events.js");

        assert!(registry.lookup("1").unwrap().is_native);
        assert!(registry.lookup("2").unwrap().is_native);
        assert!(registry.lookup("3").unwrap().is_native);
        assert!(!registry.lookup("4").unwrap().is_native);
    }

    #[test]
    fn test_resolve_name_exact_id_wins_over_substring() {
        let mut registry = ScriptRegistry::new();
        registry.register("12", "file:///app/a.js");
        registry.register("123", "file:///app/12.js");

        match registry.resolve_name("12") {
            ScriptMatch::Found(script) => assert_eq!(script.id, "12"),
            other => panic!("Expected exact id match, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_name_reports_ambiguity() {
        let mut registry = ScriptRegistry::new();
        registry.register("1", "file:///app/a/util.js");
        registry.register("2", "file:///app/b/util.js");

        match registry.resolve_name("util.js") {
            ScriptMatch::Ambiguous(candidates) => assert_eq!(candidates.len(), 2),
            other => panic!("Expected ambiguity, got {:?}", other),
        }
        assert_eq!(registry.find_by_url_substring("a/util").len(), 1);
        assert_eq!(registry.resolve_name("missing.js"), ScriptMatch::NotLoaded);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut registry = ScriptRegistry::new();
        registry.register("1", "file:///app/a.js");
        registry.reset();
        assert!(registry.is_empty());
        assert!(registry.lookup("1").is_none());
    }
}

#[cfg(test)]
mod breakpoint_table_tests {
    use super::*;

    fn resolved(script_id: &str, line: u32) -> BreakpointSite {
        BreakpointSite::Resolved(Location::new(script_id, line))
    }

    #[test]
    fn test_numbers_are_sequential_and_unique() {
        let mut table = BreakpointTable::new();
        let first = table.record(Some("a".into()), resolved("1", 3), None, None);
        let second = table.record(Some("b".into()), resolved("1", 4), None, None);
        table.remove(second);
        let third = table.record(Some("c".into()), resolved("1", 5), None, None);

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(third, 3, "Numbers are never reused within a session");
    }

    #[test]
    fn test_same_breakpoint_id_updates_in_place() {
        let mut table = BreakpointTable::new();
        let bp_num = table.record(
            Some("bp-1".into()),
            BreakpointSite::Pending {
                url_regex: url_suffix_pattern("main.js"),
                line_number: 9,
            },
            Some("x > 1".into()),
            None,
        );
        let resolved_num =
            table.handle_resolved("bp-1", Location::new("S", 9), Some("file:///app/main.js".into()));

        assert_eq!(bp_num, resolved_num);
        assert_eq!(table.len(), 1);
        let entry = table.find(bp_num).unwrap();
        assert_eq!(entry.location(), Some(&Location::new("S", 9)));
        assert_eq!(entry.condition.as_deref(), Some("x > 1"));
        assert_eq!(entry.script_url.as_deref(), Some("file:///app/main.js"));
    }

    #[test]
    fn test_resolved_event_for_unknown_id_appends() {
        let mut table = BreakpointTable::new();
        table.record(Some("a".into()), resolved("1", 1), None, None);
        let bp_num = table.handle_resolved("zzz", Location::new("2", 7), None);

        assert_eq!(bp_num, 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_take_all_resets_numbering() {
        let mut table = BreakpointTable::new();
        table.record(Some("a".into()), resolved("1", 1), None, None);
        table.record(Some("b".into()), resolved("1", 2), None, None);

        let previous = table.take_all();
        assert_eq!(previous.len(), 2);
        assert!(table.is_empty());
        assert_eq!(table.next_number(), 1);
    }

    #[test]
    fn test_attach_script_url_only_fills_missing() {
        let mut table = BreakpointTable::new();
        let a = table.record(Some("a".into()), resolved("9", 1), None, None);
        let b = table.record(
            Some("b".into()),
            resolved("9", 2),
            None,
            Some("file:///keep.js".into()),
        );
        table.attach_script_url("9", "file:///app/late.js");

        assert_eq!(
            table.find(a).unwrap().script_url.as_deref(),
            Some("file:///app/late.js")
        );
        assert_eq!(
            table.find(b).unwrap().script_url.as_deref(),
            Some("file:///keep.js")
        );
        assert!(table.has_breakpoint_at("9", 2));
        assert_eq!(table.lines_in("9"), vec![1, 2]);
    }

    #[test]
    fn test_url_patterns_escape_metacharacters() {
        assert_eq!(url_suffix_pattern("a.js"), r"^(.*[\/\\])?a\.js$");
        assert_eq!(url_suffix_pattern("(x)+[y]"), r"^(.*[\/\\])?\(x\)\+\[y\]$");
        assert_eq!(exact_url_pattern("file:///a.js"), r"^file:\/\/\/a\.js$");
    }
}

#[cfg(test)]
mod session_state_tests {
    use super::*;

    #[test]
    fn test_paused_event_selects_newest_frame() {
        let mut session = connected_session();
        let effect = session.apply_event(paused(
            "other",
            &[("S", 3, "inner"), ("S", 10, "outer"), ("S", 20, "")],
        ));

        assert_eq!(effect, EventEffect::Paused);
        assert!(session.is_paused());
        assert_eq!(session.selected_frame_index(), Some(0));
        assert_eq!(session.backtrace().unwrap().len(), 3);
        assert_eq!(session.pause_reason().unwrap().to_string(), "break");
    }

    #[test]
    fn test_resumed_clears_backtrace() {
        let mut session = connected_session();
        session.apply_event(paused("other", &[("S", 3, "inner"), ("S", 10, "outer")]));
        session.up(1).unwrap();

        assert_eq!(session.apply_event(resumed()), EventEffect::Resumed);
        assert!(!session.is_paused());
        assert!(session.backtrace().is_none());
        assert!(session.selected_frame_index().is_none());
        assert!(session.up(1).is_err(), "Frame navigation needs a pause");
        assert!(session.down(1).is_err());
        assert!(session.select_frame(0).is_err());
    }

    #[test]
    fn test_up_stops_at_oldest_frame() {
        let mut session = connected_session();
        session.apply_event(paused(
            "other",
            &[("S", 1, "a"), ("S", 2, "b"), ("S", 3, "c")],
        ));

        session.up(1).unwrap();
        assert_eq!(session.selected_frame_index(), Some(1));
        session.up(1).unwrap();
        assert_eq!(session.selected_frame_index(), Some(2));

        assert!(session.up(1).is_err());
        assert_eq!(session.selected_frame_index(), Some(2));

        session.down(2).unwrap();
        assert_eq!(session.selected_frame_index(), Some(0));
        assert!(session.down(1).is_err());
        assert_eq!(session.selected_frame_index(), Some(0));
    }

    #[test]
    fn test_extreme_frame_counts_do_not_overflow() {
        let mut session = connected_session();
        session.apply_event(paused(
            "other",
            &[("S", 1, "a"), ("S", 2, "b"), ("S", 3, "c")],
        ));
        session.up(1).unwrap();

        assert!(session.up(i64::MAX).is_err());
        assert!(session.up(i64::MIN).is_err());
        assert!(session.down(i64::MAX).is_err());
        assert!(session.down(i64::MIN).is_err());
        assert_eq!(session.selected_frame_index(), Some(1));
    }

    #[test]
    fn test_new_pause_replaces_stale_backtrace() {
        let mut session = connected_session();
        session.apply_event(paused("other", &[("S", 1, "a"), ("S", 2, "b")]));
        session.up(1).unwrap();
        session.apply_event(paused("exception", &[("T", 5, "thrower")]));

        assert_eq!(session.selected_frame_index(), Some(0));
        assert_eq!(session.current_location().unwrap(), &Location::new("T", 5));
        assert_eq!(session.pause_reason().unwrap().to_string(), "exception");
    }

    #[test]
    fn test_paused_without_frames_is_ignored() {
        let mut session = connected_session();
        assert_eq!(session.apply_event(paused("other", &[])), EventEffect::Ignored);
        assert!(!session.is_paused());
    }

    #[test]
    fn test_close_resets_scripts_and_pause_but_keeps_breakpoints() {
        let mut session = connected_session();
        session.apply_event(script_parsed("S", "file:///app/main.js"));
        session.apply_event(paused("other", &[("S", 1, "a")]));
        session.breakpoints.record(
            Some("bp".into()),
            BreakpointSite::Resolved(Location::new("S", 1)),
            None,
            Some("file:///app/main.js".into()),
        );
        session.enter_shell();

        session.on_closed();

        assert!(!session.is_connected());
        assert!(!session.is_paused());
        assert!(session.scripts.is_empty());
        assert!(!session.in_shell());
        assert_eq!(session.breakpoints.len(), 1);
    }

    #[test]
    fn test_script_parsed_gives_url_to_resolved_breakpoints() {
        let mut session = connected_session();
        session.apply_event(breakpoint_resolved("bp-9", "S", 4));
        assert!(session.breakpoints.find(1).unwrap().script_url.is_none());

        session.apply_event(script_parsed("S", "file:///app/late.js"));
        assert_eq!(
            session.breakpoints.find(1).unwrap().script_url.as_deref(),
            Some("file:///app/late.js")
        );
    }
}

#[cfg(test)]
mod parsing_tests {
    use inspect_debugger::cli::{parse_host_port, Cli, LaunchTarget};
    use inspect_debugger::commands::{split_command, Arg, ParsedArgs};
    use inspect_debugger::debugger::BreakTarget;
    use inspect_debugger::protocol::IncomingMessage;
    use inspect_debugger::supervisor::parse_listen_hint;
    use clap::Parser;

    #[test]
    fn test_listen_hint_parsing() {
        assert_eq!(
            parse_listen_hint("Debugger listening on ws://127.0.0.1:9229/5f1c-aa"),
            Some(("127.0.0.1".to_string(), 9229))
        );
        assert_eq!(
            parse_listen_hint("Debugger listening on ws://[::1]:9230/abc"),
            Some(("::1".to_string(), 9230))
        );
        assert_eq!(parse_listen_hint("For help, see: https://nodejs.org"), None);
        assert_eq!(parse_listen_hint("Debugger listening on ws://host:notaport/x"), None);
    }

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("  break main.js 3 "), ("break", "main.js 3"));
        assert_eq!(split_command("sb('main.js', 3)"), ("sb", "('main.js', 3)"));
        assert_eq!(split_command("cont"), ("cont", ""));
    }

    #[test]
    fn test_call_syntax_and_plain_arguments_agree() {
        let plain = ParsedArgs::parse("main.js 3");
        let call = ParsedArgs::parse("('main.js', 3)");
        assert_eq!(plain.args, call.args);
        assert_eq!(
            plain.args,
            vec![Arg::Str("main.js".to_string()), Arg::Int(3)]
        );
    }

    #[test]
    fn test_break_targets() {
        assert_eq!(ParsedArgs::parse("").break_target().0, BreakTarget::CurrentLocation);
        assert_eq!(ParsedArgs::parse("12").break_target().0, BreakTarget::Line(12));
        assert_eq!(
            ParsedArgs::parse("add()").break_target().0,
            BreakTarget::FunctionCall("add()".to_string())
        );
        assert_eq!(
            ParsedArgs::parse("main.js:7").break_target().0,
            BreakTarget::Script {
                name: "main.js".to_string(),
                line: 7
            }
        );

        let (target, condition) = ParsedArgs::parse("main.js 7 x > 2").break_target();
        assert_eq!(
            target,
            BreakTarget::Script {
                name: "main.js".to_string(),
                line: 7
            }
        );
        assert_eq!(condition.as_deref(), Some("x > 2"));
    }

    #[test]
    fn test_expression_keeps_raw_text() {
        assert_eq!(ParsedArgs::parse("a + b, c").expression(), "a + b, c");
        assert_eq!(ParsedArgs::parse("(\"a + b\")").expression(), "a + b");
    }

    #[test]
    fn test_incoming_message_kinds() {
        match IncomingMessage::parse(r#"{"id":4,"result":{"breakpointId":"x"}}"#).unwrap() {
            IncomingMessage::Response { id, result, error } => {
                assert_eq!(id, 4);
                assert!(result.is_some());
                assert!(error.is_none());
            }
            other => panic!("Expected response, got {:?}", other),
        }
        match IncomingMessage::parse(r#"{"id":5,"error":{"code":-32000,"message":"nope"}}"#)
            .unwrap()
        {
            IncomingMessage::Response { error, .. } => {
                assert_eq!(error.unwrap().message, "nope");
            }
            other => panic!("Expected error response, got {:?}", other),
        }
        match IncomingMessage::parse(r#"{"method":"Debugger.resumed","params":{}}"#).unwrap() {
            IncomingMessage::Event { method, .. } => assert_eq!(method, "Debugger.resumed"),
            other => panic!("Expected event, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_targets() {
        let script = Cli::parse_from(["inspect-debugger", "app.js", "one", "two"])
            .into_target()
            .unwrap();
        assert_eq!(
            script,
            LaunchTarget::Script {
                path: "app.js".to_string(),
                args: vec!["one".to_string(), "two".to_string()],
                stop_at_entry: true,
            }
        );

        let no_break = Cli::parse_from(["inspect-debugger", "--inspect", "app.js"])
            .into_target()
            .unwrap();
        assert!(matches!(
            no_break,
            LaunchTarget::Script {
                stop_at_entry: false,
                ..
            }
        ));

        assert_eq!(
            Cli::parse_from(["inspect-debugger", "localhost:9230"])
                .into_target()
                .unwrap(),
            LaunchTarget::Remote {
                host: "localhost".to_string(),
                port: 9230
            }
        );
        assert_eq!(
            Cli::parse_from(["inspect-debugger", "-p", "4321"])
                .into_target()
                .unwrap(),
            LaunchTarget::Pid(4321)
        );
        assert!(Cli::parse_from(["inspect-debugger"]).into_target().is_err());
    }

    #[test]
    fn test_host_port_detection() {
        assert_eq!(parse_host_port("[::1]:9229"), Some(("::1".to_string(), 9229)));
        assert_eq!(parse_host_port("app.js"), None);
        assert_eq!(parse_host_port("C:app.js"), None);
    }
}

#[cfg(test)]
mod source_listing_tests {
    use super::*;

    #[test]
    fn test_snippet_marks_current_and_breakpoint_lines() {
        let snippet = SourceSnippet::around("a\nb\nc\nd\ne", 2, 1, Some(2), &[1]);
        assert_eq!(snippet.to_string(), " *2 b\n->3 c\n  4 d");
    }

    #[test]
    fn test_snippet_clamps_at_file_edges() {
        let snippet = SourceSnippet::around(MAIN_SOURCE, 0, 2, None, &[]);
        assert_eq!(snippet.lines.len(), 3);
        assert_eq!(snippet.lines[0].number, 1);

        let past_end = SourceSnippet::around("only\n", 40, 2, None, &[]);
        assert!(past_end.is_empty());
    }
}
