mod breakpoints;
mod profiles;
mod scripts;
mod session;
mod source;
mod stepping;
mod watchers;

pub use breakpoints::{
    escape_regex, exact_url_pattern, url_suffix_pattern, BreakTarget, Breakpoint, BreakpointSet,
    BreakpointSite, BreakpointTable,
};
pub use profiles::{Profile, ProfileStore};
pub use scripts::{is_native_url, Script, ScriptMatch, ScriptRegistry};
pub use session::{
    ConnectionState, EvalOutcome, EventEffect, PauseReason, RemoteError, Session, Settings,
};
pub use source::{SourceLine, SourceSnippet};
pub use stepping::StepKind;
pub use watchers::WatchList;
