//! Run request and result types.

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::vendor::{InvocationRequest, ModeInstructions};

/// Inputs for one chat turn.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub prompt: String,
    pub mode_instructions: Option<ModeInstructions>,
    /// Vendor session to continue.
    pub resume_session_id: Option<String>,
    /// Cancelling this token asks the child process to terminate.
    pub cancel: CancellationToken,
}

impl RunRequest {
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn mode_instructions(mut self, instructions: ModeInstructions) -> Self {
        self.mode_instructions = Some(instructions);
        self
    }

    #[must_use]
    pub fn resume(mut self, session_id: impl Into<String>) -> Self {
        self.resume_session_id = Some(session_id.into());
        self
    }

    #[must_use]
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Borrowed view used by argument building.
    #[must_use]
    pub fn invocation_request(&self) -> InvocationRequest<'_> {
        InvocationRequest {
            prompt: &self.prompt,
            mode_instructions: self.mode_instructions.as_ref(),
            resume_session_id: self.resume_session_id.as_deref(),
        }
    }
}

/// Terminal outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub success: bool,
    /// Concatenation of every text event, in emission order.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl RunResult {
    #[must_use]
    pub fn success(content: String, session_id: Option<String>) -> Self {
        Self {
            success: true,
            content,
            error: None,
            session_id,
        }
    }

    #[must_use]
    pub fn failure(error: impl Into<String>, content: String, session_id: Option<String>) -> Self {
        Self {
            success: false,
            content,
            error: Some(error.into()),
            session_id,
        }
    }
}
