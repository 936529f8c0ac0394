use crate::error::Result;
use crate::protocol::DebuggerDomain;

/// Execution-control requests issued while paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Continue,
    Over,
    Into,
    Out,
}

impl StepKind {
    pub fn method(self) -> &'static str {
        match self {
            StepKind::Continue => "Debugger.resume",
            StepKind::Over => "Debugger.stepOver",
            StepKind::Into => "Debugger.stepInto",
            StepKind::Out => "Debugger.stepOut",
        }
    }

    pub async fn send(self, debugger: &DebuggerDomain<'_>) -> Result<()> {
        match self {
            StepKind::Continue => debugger.resume().await,
            StepKind::Over => debugger.step_over().await,
            StepKind::Into => debugger.step_into().await,
            StepKind::Out => debugger.step_out().await,
        }
    }
}
