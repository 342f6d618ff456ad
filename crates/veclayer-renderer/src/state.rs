use serde::{Deserialize, Serialize};

/// Lifecycle of a single render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderPassState {
    #[default]
    Idle,
    Preparing,
    Streaming,
    Finalizing,
    Completed,
    Cancelled,
    Failed,
}

impl RenderPassState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RenderPassState::Completed | RenderPassState::Cancelled | RenderPassState::Failed
        )
    }

    pub fn can_transition_to(self, next: RenderPassState) -> bool {
        use RenderPassState::*;
        matches!(
            (self, next),
            (Idle, Preparing)
                | (Preparing, Streaming)
                | (Preparing, Failed)
                | (Streaming, Finalizing)
                | (Finalizing, Completed)
                | (Finalizing, Cancelled)
                | (Finalizing, Failed)
        )
    }
}

/// Result of a render pass as seen by its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderOutcome {
    Completed,
    Cancelled,
    Failed,
}

impl RenderOutcome {
    pub fn is_success(self) -> bool {
        self == RenderOutcome::Completed
    }

    pub fn state(self) -> RenderPassState {
        match self {
            RenderOutcome::Completed => RenderPassState::Completed,
            RenderOutcome::Cancelled => RenderPassState::Cancelled,
            RenderOutcome::Failed => RenderPassState::Failed,
        }
    }
}
