use crate::debugger::BreakTarget;

/// One command argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Int(i64),
    Str(String),
}

impl Arg {
    fn parse(token: String) -> Self {
        match token.parse::<i64>() {
            Ok(n) => Arg::Int(n),
            Err(_) => Arg::Str(token),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Arg::Int(n) => Some(*n),
            Arg::Str(_) => None,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            Arg::Int(n) => n.to_string(),
            Arg::Str(s) => s.clone(),
        }
    }
}

/// Splits an input line into the command word and the rest. The command
/// word ends at the first whitespace or `(`.
pub fn split_command(line: &str) -> (&str, &str) {
    let line = line.trim();
    match line.find(|c: char| c.is_whitespace() || c == '(') {
        Some(end) => (&line[..end], line[end..].trim()),
        None => (line, ""),
    }
}

/// Arguments following a command word, accepting both `cmd a b` and
/// `cmd(a, b)` forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArgs {
    raw: String,
    call_syntax: bool,
    pub args: Vec<Arg>,
}

impl ParsedArgs {
    pub fn parse(rest: &str) -> Self {
        let rest = rest.trim();
        let inner = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'));
        let (call_syntax, body) = match inner {
            Some(inner) => (true, commas_to_spaces(inner)),
            None => (false, rest.to_string()),
        };

        let tokens = shlex::split(&body)
            .unwrap_or_else(|| body.split_whitespace().map(str::to_string).collect());

        Self {
            raw: rest.to_string(),
            call_syntax,
            args: tokens.into_iter().map(Arg::parse).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.args.get(index)
    }

    pub fn int(&self, index: usize) -> Option<i64> {
        self.get(index).and_then(Arg::as_int)
    }

    pub fn text(&self, index: usize) -> Option<String> {
        self.get(index).map(Arg::as_text)
    }

    /// Tokens from `index` on, joined back with single spaces.
    pub fn rest_from(&self, index: usize) -> Option<String> {
        if index >= self.args.len() {
            return None;
        }
        let joined: Vec<String> = self.args[index..].iter().map(Arg::as_text).collect();
        Some(joined.join(" "))
    }

    /// The untokenized argument text, for commands that take a JavaScript
    /// expression. `exec("a + b")` yields `a + b`.
    pub fn expression(&self) -> String {
        if self.call_syntax && self.args.len() == 1 {
            if let Some(Arg::Str(text)) = self.args.first() {
                return text.clone();
            }
        }
        self.raw.clone()
    }

    pub fn break_target(&self) -> (BreakTarget, Option<String>) {
        match self.args.as_slice() {
            [] => (BreakTarget::CurrentLocation, None),
            [Arg::Int(line), ..] => (BreakTarget::Line(*line), self.rest_from(1)),
            [Arg::Str(name)] if name.ends_with("()") => {
                (BreakTarget::FunctionCall(name.clone()), None)
            }
            [Arg::Str(name)] => match split_file_line(name) {
                Some((file, line)) => (
                    BreakTarget::Script {
                        name: file.to_string(),
                        line,
                    },
                    None,
                ),
                None => (
                    BreakTarget::Script {
                        name: name.clone(),
                        line: 1,
                    },
                    None,
                ),
            },
            [Arg::Str(name), Arg::Int(line), ..] => (
                BreakTarget::Script {
                    name: name.clone(),
                    line: *line,
                },
                self.rest_from(2),
            ),
            [Arg::Str(name), ..] => match split_file_line(name) {
                Some((file, line)) => (
                    BreakTarget::Script {
                        name: file.to_string(),
                        line,
                    },
                    self.rest_from(1),
                ),
                None => (
                    BreakTarget::Script {
                        name: name.clone(),
                        line: 1,
                    },
                    self.rest_from(1),
                ),
            },
        }
    }
}

/// `file.js:12` -> (`file.js`, 12)
fn split_file_line(text: &str) -> Option<(&str, i64)> {
    let (file, line) = text.rsplit_once(':')?;
    if file.is_empty() {
        return None;
    }
    line.parse::<i64>().ok().map(|line| (file, line))
}

/// Turns argument-separating commas into spaces, leaving quoted text alone.
fn commas_to_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for ch in text.chars() {
        if escaped {
            escaped = false;
            out.push(ch);
            continue;
        }
        match (ch, quote) {
            ('\\', _) => escaped = true,
            ('"' | '\'', None) => quote = Some(ch),
            (c, Some(q)) if c == q => quote = None,
            (',', None) => {
                out.push(' ');
                continue;
            }
            _ => {}
        }
        out.push(ch);
    }
    out
}
