//! Run state machine.

use serde::{Deserialize, Serialize};

/// Lifecycle of one process run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    Idle,
    Spawning,
    Streaming,
    Draining,
    Resolved,
}

impl RunState {
    /// Whether moving from `self` to `next` follows the lifecycle.
    #[must_use]
    pub fn can_transition_to(self, next: RunState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Spawning)
                | (Self::Spawning, Self::Streaming | Self::Resolved)
                | (Self::Streaming, Self::Draining)
                | (Self::Draining, Self::Resolved)
        )
    }
}

/// State machine for tracking run progress.
#[derive(Debug, Clone, Default)]
pub struct RunStateMachine {
    state: RunState,
}

impl RunStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.state == RunState::Resolved
    }

    pub fn transition(&mut self, new_state: RunState) {
        if !self.state.can_transition_to(new_state) {
            tracing::warn!(from = ?self.state, to = ?new_state, "Unexpected run state transition");
        }
        tracing::debug!(from = ?self.state, to = ?new_state, "State transition");
        self.state = new_state;
    }
}

/// Counters collected while streaming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Non-empty lines handed to the parser.
    pub lines: usize,
    /// Content events delivered to the sink.
    pub events: usize,
    /// Sink invocations that panicked.
    pub sink_failures: usize,
}
