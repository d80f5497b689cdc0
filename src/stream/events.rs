//! Normalized content events shared by every vendor.
//!
//! Each vendor speaks its own line-oriented JSON grammar. Parsers translate
//! those envelopes into the small set of events defined here, which is all
//! the host ever sees.

use serde::{Deserialize, Serialize};

/// A piece of content decoded from one line of vendor output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentEvent {
    /// Model text. Fragments are delivered as they arrive.
    Text {
        /// The text fragment.
        text: String,
    },
    /// The agent started invoking a tool.
    ToolUse {
        /// Tool name (or the command line for shell executions).
        name: String,
    },
    /// A tool invocation finished.
    ToolResult {
        /// Tool name.
        name: String,
        /// Output text of the tool.
        content: String,
    },
    /// Model reasoning/thinking text.
    Reasoning {
        /// The reasoning text.
        text: String,
    },
}

impl ContentEvent {
    /// Create a `Text` event.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a `ToolUse` event.
    #[must_use]
    pub fn tool_use(name: impl Into<String>) -> Self {
        Self::ToolUse { name: name.into() }
    }

    /// Create a `ToolResult` event.
    #[must_use]
    pub fn tool_result(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::ToolResult {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Create a `Reasoning` event.
    #[must_use]
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self::Reasoning { text: text.into() }
    }

    /// Returns the text payload if this is a `Text` event.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Outcome of parsing one line.
///
/// A line yields at most one content event. The session id is independent of
/// the content: an init line typically carries only the id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseResult {
    pub content: Option<ContentEvent>,
    pub session_id: Option<String>,
}

impl ParseResult {
    /// A result with neither content nor session id.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn content(event: ContentEvent) -> Self {
        Self {
            content: Some(event),
            session_id: None,
        }
    }

    #[must_use]
    pub fn session(session_id: impl Into<String>) -> Self {
        Self {
            content: None,
            session_id: Some(session_id.into()),
        }
    }

    /// Attach a session id if one is present and non-empty.
    #[must_use]
    pub fn with_session(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id.filter(|id| !id.is_empty());
        self
    }

    /// True when the line produced nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.session_id.is_none()
    }
}

/// Decodes lines of one vendor's output grammar.
///
/// Implementations must never panic on input: anything they cannot decode
/// yields [`ParseResult::empty`]. A parser is created per run and may keep
/// state across lines (tool names keyed by id, for instance).
pub trait EventParser: Send {
    fn parse_line(&mut self, line: &str) -> ParseResult;
}

/// Cheap pre-check used before handing stderr lines to a JSON parser.
#[must_use]
pub fn looks_like_json(line: &str) -> bool {
    line.starts_with('{') || line.starts_with('[')
}
