//! Saga run state machine.

use serde::{Deserialize, Serialize};

/// The state of one booking saga run.
///
/// State transitions:
/// ```text
/// NotStarted ──► Running ──┬──► Completed
///                          ├──► AwaitingSupplier ──► Completed (webhook)
///                          └──► Compensating ──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    #[default]
    NotStarted,

    Running,

    /// The supplier did not give a final answer; the booking waits for a
    /// webhook or a manual check.
    AwaitingSupplier,

    /// Money is being returned after a failed step.
    Compensating,

    /// Terminal.
    Completed,

    /// Terminal.
    Failed,
}

impl SagaState {
    pub fn can_run(&self) -> bool {
        matches!(self, SagaState::NotStarted)
    }

    pub fn can_compensate(&self) -> bool {
        matches!(self, SagaState::Running | SagaState::AwaitingSupplier)
    }

    /// Returns true if a supplier answer can still complete the run.
    pub fn is_awaiting_supplier(&self) -> bool {
        matches!(self, SagaState::AwaitingSupplier)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaState::Completed | SagaState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::NotStarted => "NotStarted",
            SagaState::Running => "Running",
            SagaState::AwaitingSupplier => "AwaitingSupplier",
            SagaState::Compensating => "Compensating",
            SagaState::Completed => "Completed",
            SagaState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
