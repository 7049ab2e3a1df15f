// Outcome of one handler or job run

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunOutcome {
    Succeeded,
    Failed,
    Panicked,
    /// Previous detached run still in flight
    Skipped,
    /// Detached run started; its result is recorded when reaped
    Launched,
}

impl RunOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, RunOutcome::Failed | RunOutcome::Panicked)
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Succeeded => write!(f, "SUCCEEDED"),
            RunOutcome::Failed => write!(f, "FAILED"),
            RunOutcome::Panicked => write!(f, "PANICKED"),
            RunOutcome::Skipped => write!(f, "SKIPPED"),
            RunOutcome::Launched => write!(f, "LAUNCHED"),
        }
    }
}
