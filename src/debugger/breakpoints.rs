use super::scripts::ScriptMatch;
use super::session::Session;
use crate::error::{DebuggerError, Result};
use crate::protocol::types::{EvaluateParams, Location};
use crate::protocol::{DebuggerDomain, ProtocolClient, RuntimeDomain};
use tracing::{debug, warn};

/// Where a breakpoint is bound. Pattern breakpoints stay pending until a
/// matching script loads and the debugger reports a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakpointSite {
    Resolved(Location),
    Pending { url_regex: String, line_number: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    pub bp_num: u32,
    pub breakpoint_id: Option<String>,
    pub site: BreakpointSite,
    pub condition: Option<String>,
    /// Url used to re-create the breakpoint after a restart.
    pub script_url: Option<String>,
}

impl Breakpoint {
    pub fn location(&self) -> Option<&Location> {
        match &self.site {
            BreakpointSite::Resolved(location) => Some(location),
            BreakpointSite::Pending { .. } => None,
        }
    }

    /// 0-based line, resolved or requested.
    pub fn line_number(&self) -> u32 {
        match &self.site {
            BreakpointSite::Resolved(location) => location.line_number,
            BreakpointSite::Pending { line_number, .. } => *line_number,
        }
    }
}

#[derive(Debug)]
pub struct BreakpointTable {
    entries: Vec<Breakpoint>,
    next_num: u32,
}

impl Default for BreakpointTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BreakpointTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_num: 1,
        }
    }

    /// Number the next new breakpoint will get.
    pub fn next_number(&self) -> u32 {
        self.next_num
    }

    /// Records a breakpoint returned by the debugger. An entry already
    /// carrying `breakpoint_id` is updated in place instead of duplicated.
    pub fn record(
        &mut self,
        breakpoint_id: Option<String>,
        site: BreakpointSite,
        condition: Option<String>,
        script_url: Option<String>,
    ) -> u32 {
        if let Some(id) = breakpoint_id.as_deref() {
            if let Some(entry) = self
                .entries
                .iter_mut()
                .find(|entry| entry.breakpoint_id.as_deref() == Some(id))
            {
                entry.site = site;
                if condition.is_some() {
                    entry.condition = condition;
                }
                if entry.script_url.is_none() {
                    entry.script_url = script_url;
                }
                return entry.bp_num;
            }
        }

        let bp_num = self.next_num;
        self.next_num += 1;
        self.entries.push(Breakpoint {
            bp_num,
            breakpoint_id,
            site,
            condition,
            script_url,
        });
        bp_num
    }

    /// Applies a resolution reported by the debugger.
    pub fn handle_resolved(
        &mut self,
        breakpoint_id: &str,
        location: Location,
        script_url: Option<String>,
    ) -> u32 {
        self.record(
            Some(breakpoint_id.to_string()),
            BreakpointSite::Resolved(location),
            None,
            script_url,
        )
    }

    pub fn find(&self, bp_num: u32) -> Option<&Breakpoint> {
        self.entries.iter().find(|entry| entry.bp_num == bp_num)
    }

    pub fn remove(&mut self, bp_num: u32) -> Option<Breakpoint> {
        let index = self.entries.iter().position(|entry| entry.bp_num == bp_num)?;
        Some(self.entries.remove(index))
    }

    /// Empties the table and restarts numbering at 1.
    pub fn take_all(&mut self) -> Vec<Breakpoint> {
        self.next_num = 1;
        std::mem::take(&mut self.entries)
    }

    /// Puts back breakpoints a failed restore never reached. They get fresh
    /// numbers and no remote id, and keep their url for the next restore.
    pub fn readd_unrestored(&mut self, entries: impl IntoIterator<Item = Breakpoint>) {
        for entry in entries {
            self.record(None, entry.site, entry.condition, entry.script_url);
        }
    }

    /// Gives url-less breakpoints resolved into `script_id` the script's url.
    pub fn attach_script_url(&mut self, script_id: &str, url: &str) {
        for entry in &mut self.entries {
            if entry.script_url.is_none()
                && entry.location().map(|l| l.script_id.as_str()) == Some(script_id)
            {
                entry.script_url = Some(url.to_string());
            }
        }
    }

    pub fn has_breakpoint_at(&self, script_id: &str, line_number: u32) -> bool {
        self.entries.iter().any(|entry| {
            entry
                .location()
                .is_some_and(|l| l.script_id == script_id && l.line_number == line_number)
        })
    }

    /// 0-based lines carrying a breakpoint in `script_id`.
    pub fn lines_in(&self, script_id: &str) -> Vec<u32> {
        self.entries
            .iter()
            .filter_map(|entry| entry.location())
            .filter(|location| location.script_id == script_id)
            .map(|location| location.line_number)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Breakpoint> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Escapes every regex metacharacter in `text`.
pub fn escape_regex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if "\\^$.|?*+()[]{}/".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Matches `name` as the final path component(s) of a script url.
pub fn url_suffix_pattern(name: &str) -> String {
    format!(r"^(.*[\/\\])?{}$", escape_regex(name))
}

pub fn exact_url_pattern(url: &str) -> String {
    format!("^{}$", escape_regex(url))
}

/// What the user asked to break on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakTarget {
    CurrentLocation,
    Line(i64),
    FunctionCall(String),
    Script { name: String, line: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakpointSet {
    /// `location` is where the debugger actually placed the breakpoint.
    Resolved { bp_num: u32, url: String, location: Location },
    Pending { bp_num: u32, name: String },
    FunctionTrap { function: String },
}

impl Session {
    pub async fn set_breakpoint(
        &mut self,
        client: &dyn ProtocolClient,
        target: BreakTarget,
        condition: Option<String>,
    ) -> Result<BreakpointSet> {
        match target {
            BreakTarget::CurrentLocation => {
                let location = self.current_location()?.clone();
                self.set_breakpoint_at(client, location, condition).await
            }
            BreakTarget::Line(line) => {
                let line = positive_line(line)?;
                let script_id = self.current_location()?.script_id.clone();
                self.set_breakpoint_at(client, Location::new(script_id, line - 1), condition)
                    .await
            }
            BreakTarget::FunctionCall(expression) => {
                let function = expression.trim_end_matches("()").to_string();
                let mut params = EvaluateParams::new(format!("debug({})", function));
                params.include_command_line_api = true;
                // Paused: resolve the name in the selected frame so locals work.
                let result = match self.selected_frame() {
                    Ok(frame) => {
                        DebuggerDomain::new(client)
                            .evaluate_on_call_frame(&frame.call_frame_id, params)
                            .await?
                    }
                    Err(_) => RuntimeDomain::new(client).evaluate(params).await?,
                };
                if result.threw() {
                    let error = super::session::RemoteError::from_evaluation(&result);
                    return Err(DebuggerError::precondition(error.to_string()));
                }
                Ok(BreakpointSet::FunctionTrap { function })
            }
            BreakTarget::Script { name, line } => {
                let script_id = match self.scripts.resolve_name(&name) {
                    ScriptMatch::Ambiguous(_) => {
                        return Err(DebuggerError::precondition("Script name is ambiguous"))
                    }
                    ScriptMatch::Found(script) => Some(script.id.clone()),
                    ScriptMatch::NotLoaded => None,
                };
                let line = positive_line(line)?;

                if let Some(script_id) = script_id {
                    return self
                        .set_breakpoint_at(client, Location::new(script_id, line - 1), condition)
                        .await;
                }

                let url_regex = url_suffix_pattern(&name);
                let result = DebuggerDomain::new(client)
                    .set_breakpoint_by_url(url_regex.clone(), line - 1, condition.clone())
                    .await?;

                match result.locations.into_iter().next() {
                    Some(location) => {
                        let url = self.scripts.lookup(&location.script_id).map(|s| s.url.clone());
                        let bp_num = self.breakpoints.record(
                            Some(result.breakpoint_id),
                            BreakpointSite::Resolved(location.clone()),
                            condition,
                            url.clone(),
                        );
                        Ok(BreakpointSet::Resolved {
                            bp_num,
                            url: url.unwrap_or(name),
                            location,
                        })
                    }
                    None => {
                        let bp_num = self.breakpoints.record(
                            Some(result.breakpoint_id),
                            BreakpointSite::Pending {
                                url_regex,
                                line_number: line - 1,
                            },
                            condition,
                            None,
                        );
                        Ok(BreakpointSet::Pending { bp_num, name })
                    }
                }
            }
        }
    }

    async fn set_breakpoint_at(
        &mut self,
        client: &dyn ProtocolClient,
        location: Location,
        condition: Option<String>,
    ) -> Result<BreakpointSet> {
        let result = DebuggerDomain::new(client)
            .set_breakpoint(location, condition.clone())
            .await?;
        let actual = result.actual_location;
        let url = self
            .scripts
            .lookup(&actual.script_id)
            .map(|script| script.url.clone());
        let bp_num = self.breakpoints.record(
            Some(result.breakpoint_id),
            BreakpointSite::Resolved(actual.clone()),
            condition,
            url.clone(),
        );
        debug!(bp_num, script_id = %actual.script_id, line = actual.line_number + 1, "breakpoint set");
        Ok(BreakpointSet::Resolved {
            bp_num,
            url: url.unwrap_or_else(|| actual.script_id.clone()),
            location: actual,
        })
    }

    /// Removes breakpoint `bp_num` remotely, then locally. A failed remote
    /// removal keeps the local record.
    pub async fn delete_breakpoint(
        &mut self,
        client: &dyn ProtocolClient,
        bp_num: u32,
    ) -> Result<Breakpoint> {
        let Some(entry) = self.breakpoints.find(bp_num) else {
            return Err(DebuggerError::precondition(format!(
                "Breakpoint {} not found",
                bp_num
            )));
        };
        if let Some(id) = entry.breakpoint_id.clone() {
            DebuggerDomain::new(client).remove_breakpoint(&id).await?;
        }
        self.breakpoints
            .remove(bp_num)
            .ok_or_else(|| DebuggerError::Internal(format!("breakpoint {} vanished", bp_num)))
    }

    /// Removes the first breakpoint whose script url contains `url` and
    /// whose 1-based line is `line`.
    pub async fn clear_breakpoint(
        &mut self,
        client: &dyn ProtocolClient,
        url: &str,
        line: i64,
    ) -> Result<Breakpoint> {
        let found = self.breakpoints.iter().find(|entry| {
            i64::from(entry.line_number()) + 1 == line
                && self
                    .breakpoint_url(entry)
                    .is_some_and(|entry_url| entry_url.contains(url))
        });
        let Some(bp_num) = found.map(|entry| entry.bp_num) else {
            return Err(DebuggerError::precondition(format!(
                "Could not find breakpoint at {}:{}",
                url, line
            )));
        };
        self.delete_breakpoint(client, bp_num).await
    }

    /// Url a breakpoint belongs to, as far as the session knows.
    pub fn breakpoint_url(&self, entry: &Breakpoint) -> Option<String> {
        if let Some(url) = &entry.script_url {
            return Some(url.clone());
        }
        let location = entry.location()?;
        self.scripts
            .lookup(&location.script_id)
            .map(|script| script.url.clone())
    }

    /// Re-creates every breakpoint with a known url after a (re)connect.
    /// Returns how many were restored. Breakpoints without a url are dropped.
    pub async fn restore_breakpoints(&mut self, client: &dyn ProtocolClient) -> Result<usize> {
        let previous = self.breakpoints.take_all();
        let debugger = DebuggerDomain::new(client);
        let mut restored = 0;

        let mut remaining = previous.into_iter();
        while let Some(entry) = remaining.next() {
            let line_number = entry.line_number();
            let Some(url) = entry.script_url else {
                debug!(bp_num = entry.bp_num, "dropping breakpoint without a script url");
                continue;
            };
            let url_regex = exact_url_pattern(&url);
            let result = match debugger
                .set_breakpoint_by_url(url_regex.clone(), line_number, entry.condition.clone())
                .await
            {
                Ok(result) => result,
                Err(err) if err.is_recoverable() => {
                    warn!(%url, line_number, error = %err, "failed to restore breakpoint");
                    continue;
                }
                Err(err) => {
                    let current = Breakpoint {
                        script_url: Some(url),
                        ..entry
                    };
                    self.breakpoints
                        .readd_unrestored(std::iter::once(current).chain(remaining));
                    return Err(err);
                }
            };

            let site = match result.locations.into_iter().next() {
                Some(location) => BreakpointSite::Resolved(location),
                None => BreakpointSite::Pending {
                    url_regex,
                    line_number,
                },
            };
            self.breakpoints.record(
                Some(result.breakpoint_id),
                site,
                entry.condition,
                Some(url),
            );
            restored += 1;
        }

        Ok(restored)
    }
}

fn positive_line(line: i64) -> Result<u32> {
    if line <= 0 {
        return Err(DebuggerError::precondition("Line should be a positive value"));
    }
    u32::try_from(line).map_err(|_| DebuggerError::precondition("Line number is too large"))
}
