//! Per-run streaming state.

use std::panic::{catch_unwind, AssertUnwindSafe};

use super::{RunResult, RunStats};
use crate::stream::{looks_like_json, ContentEvent, EventParser, LineFramer};
use crate::vendor::VendorKind;

/// Receiver for content events as they are decoded.
pub trait EventSink {
    fn on_event(&mut self, event: &ContentEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&ContentEvent),
{
    fn on_event(&mut self, event: &ContentEvent) {
        self(event);
    }
}

/// How the child process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    Code(i32),
    Signal(i32),
    /// Exited without a code or signal the platform could report.
    Unknown,
    /// Waiting for the process failed.
    WaitFailed(String),
}

impl From<std::process::ExitStatus> for ExitOutcome {
    fn from(status: std::process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Code(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Signal(signal);
            }
        }
        Self::Unknown
    }
}

/// Buffers, parser and accumulators for one run.
pub struct RunContext {
    vendor: VendorKind,
    parser: Box<dyn EventParser>,
    parse_stderr: bool,
    stdout: LineFramer,
    stderr: LineFramer,
    session_id: Option<String>,
    content: String,
    stderr_raw: Vec<u8>,
    stats: RunStats,
}

impl RunContext {
    #[must_use]
    pub fn new(vendor: VendorKind, parser: Box<dyn EventParser>, parse_stderr: bool) -> Self {
        Self {
            vendor,
            parser,
            parse_stderr,
            stdout: LineFramer::new(),
            stderr: LineFramer::new(),
            session_id: None,
            content: String::new(),
            stderr_raw: Vec::new(),
            stats: RunStats::default(),
        }
    }

    /// Frame a stdout chunk and deliver every complete line.
    pub fn on_stdout(&mut self, chunk: &[u8], sink: &mut dyn EventSink) {
        for line in self.stdout.feed(chunk) {
            self.handle_line(&line, sink);
        }
    }

    /// Record a stderr chunk; JSON-looking lines are parsed when enabled.
    pub fn on_stderr(&mut self, chunk: &[u8], sink: &mut dyn EventSink) {
        self.stderr_raw.extend_from_slice(chunk);
        let lines = self.stderr.feed(chunk);
        if self.parse_stderr {
            for line in lines.iter().filter(|line| looks_like_json(line)) {
                self.handle_line(line, sink);
            }
        }
    }

    /// Process unterminated trailing text on both streams.
    pub fn drain(&mut self, sink: &mut dyn EventSink) {
        if let Some(line) = self.stdout.flush() {
            self.handle_line(&line, sink);
        }
        if let Some(line) = self.stderr.flush() {
            if self.parse_stderr && looks_like_json(&line) {
                self.handle_line(&line, sink);
            }
        }
    }

    fn handle_line(&mut self, line: &str, sink: &mut dyn EventSink) {
        self.stats.lines += 1;
        let parsed = self.parser.parse_line(line);

        if let Some(id) = parsed.session_id {
            if self.session_id.is_none() {
                tracing::debug!(vendor = %self.vendor, session_id = %id, "Session started");
                self.session_id = Some(id);
            }
        }

        if let Some(event) = parsed.content {
            self.deliver(&event, sink);
        }
    }

    fn deliver(&mut self, event: &ContentEvent, sink: &mut dyn EventSink) {
        if let Some(text) = event.as_text() {
            self.content.push_str(text);
        }
        self.stats.events += 1;

        if catch_unwind(AssertUnwindSafe(|| sink.on_event(event))).is_err() {
            self.stats.sink_failures += 1;
            tracing::warn!(vendor = %self.vendor, "Event sink panicked; continuing");
        }
    }

    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Everything the process wrote to stderr, decoded lossily.
    #[must_use]
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr_raw).into_owned()
    }

    #[must_use]
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Build the run result from the way the process ended.
    #[must_use]
    pub fn finish(self, outcome: &ExitOutcome) -> RunResult {
        let failure = match outcome {
            ExitOutcome::Code(0) => None,
            ExitOutcome::Code(code) => Some(format!("{} exited with code {code}", self.vendor)),
            ExitOutcome::Signal(signal) => {
                Some(format!("{} terminated by signal {signal}", self.vendor))
            }
            ExitOutcome::Unknown => Some(format!("{} exited without a status code", self.vendor)),
            ExitOutcome::WaitFailed(reason) => {
                Some(format!("Failed to wait for {}: {reason}", self.vendor))
            }
        };

        match failure {
            None => RunResult::success(self.content, self.session_id),
            Some(mut message) => {
                let stderr = self.stderr_text();
                let stderr = stderr.trim();
                if !stderr.is_empty() {
                    message.push('\n');
                    message.push_str(stderr);
                }
                RunResult::failure(message, self.content, self.session_id)
            }
        }
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("vendor", &self.vendor)
            .field("parse_stderr", &self.parse_stderr)
            .field("session_id", &self.session_id)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
