//! Colored CLI display utilities for bridge output.
//!
//! Streamed chat content goes to stdout; status lines and errors go to
//! stderr so stdout stays pipeable.

use std::io::{self, Write};

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::runner::{EventSink, RunResult};
use crate::stream::ContentEvent;
use crate::vendor::{InstallationStatus, VendorKind};

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Truncate a string to a maximum number of characters, adding ellipsis if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize, raw_mode: bool) -> String {
    if raw_mode || s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return "...".to_string();
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    format!("{kept}...")
}

/// First line of a tool output, truncated for display.
#[must_use]
pub fn summarize_output(content: &str, raw_mode: bool) -> String {
    if raw_mode {
        return content.to_string();
    }
    let first = content.lines().find(|line| !line.trim().is_empty()).unwrap_or("");
    let extra = content.lines().filter(|line| !line.trim().is_empty()).count();
    let summary = truncate(first.trim(), 150, false);
    if extra > 1 {
        format!("{summary} (+{} lines)", extra - 1)
    } else {
        summary
    }
}

/// Human-readable sink for streamed content events.
#[derive(Debug)]
pub struct StreamPrinter {
    raw_mode: bool,
    at_line_start: bool,
}

impl StreamPrinter {
    #[must_use]
    pub fn new(raw_mode: bool) -> Self {
        Self {
            raw_mode,
            at_line_start: true,
        }
    }

    /// Terminate a partially printed line.
    pub fn finish_line(&mut self) {
        if !self.at_line_start {
            println!();
            self.at_line_start = true;
        }
        let _ = io::stdout().flush();
    }

    fn print_inline(&mut self, text: &str, dimmed: bool) {
        if text.is_empty() {
            return;
        }
        if dimmed {
            print!("{}", text.dimmed());
        } else {
            print!("{text}");
        }
        self.at_line_start = text.ends_with('\n');
        let _ = io::stdout().flush();
    }

    fn print_tool_use(&mut self, name: &str) {
        self.finish_line();
        println!("{} {}", "[TOOL]".cyan().bold(), name.bold());
        let _ = io::stdout().flush();
    }

    fn print_tool_result(&mut self, name: &str, content: &str) {
        self.finish_line();
        println!(
            "{} {} {}",
            "[RESULT]".green().bold(),
            name.dimmed(),
            summarize_output(content, self.raw_mode)
        );
        let _ = io::stdout().flush();
    }
}

impl EventSink for StreamPrinter {
    fn on_event(&mut self, event: &ContentEvent) {
        match event {
            ContentEvent::Text { text } => self.print_inline(text, false),
            ContentEvent::Reasoning { text } => self.print_inline(text, true),
            ContentEvent::ToolUse { name } => self.print_tool_use(name),
            ContentEvent::ToolResult { name, content } => self.print_tool_result(name, content),
        }
    }
}

/// Machine-readable sink: one JSON object per event.
#[derive(Debug, Default)]
pub struct JsonPrinter;

impl EventSink for JsonPrinter {
    fn on_event(&mut self, event: &ContentEvent) {
        print_json_line(event);
    }
}

fn print_json_line<T: serde::Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(e) => tracing::warn!(error = %e, "Failed to serialize output line"),
    }
    let _ = io::stdout().flush();
}

/// Print run start information.
pub fn print_run_start(vendor: VendorKind, resume: Option<&str>, raw_mode: bool) {
    let session = resume.map_or_else(
        || "new session".to_string(),
        |id| format!("session={}", truncate(id, 20, raw_mode)),
    );
    eprintln!(
        "{} {} vendor={}, {}",
        timestamp().dimmed(),
        "[RUN]".blue().bold(),
        vendor.cyan(),
        session.dimmed()
    );
}

/// Print run end information.
pub fn print_run_end(vendor: VendorKind, result: &RunResult, raw_mode: bool) {
    let ts = timestamp();
    let session = result
        .session_id
        .as_deref()
        .map_or(String::new(), |id| {
            format!("session_id={}", truncate(id, 20, raw_mode))
        });

    if result.success {
        eprintln!(
            "{} {} {} completed {}",
            ts.dimmed(),
            "[RUN]".blue().bold(),
            vendor,
            session.dimmed()
        );
    } else {
        eprintln!(
            "{} {} {} failed {}",
            ts.dimmed(),
            "[RUN]".red().bold(),
            vendor,
            session.dimmed()
        );
        if let Some(error) = result.error.as_deref().filter(|e| !e.is_empty()) {
            print_error(error);
        }
    }
}

/// Print the final result as a JSON line.
pub fn print_result_json(result: &RunResult) {
    print_json_line(&serde_json::json!({ "type": "result", "result": result }));
}

/// Print one vendor's installation check.
pub fn print_installation(vendor: VendorKind, status: &InstallationStatus, guidance: &str) {
    if status.installed {
        println!(
            "{} {} {}",
            "[OK]".green().bold(),
            vendor.bold(),
            status.version.as_deref().unwrap_or("unknown version").dimmed()
        );
    } else {
        println!("{} {} not installed", "[MISSING]".red().bold(), vendor.bold());
        println!("  {}", guidance.dimmed());
    }
    let _ = io::stdout().flush();
}

/// Print stored session ids.
pub fn print_sessions<'a>(sessions: impl Iterator<Item = (VendorKind, &'a str)>) {
    let mut any = false;
    for (vendor, id) in sessions {
        any = true;
        println!("{} {}", format!("{vendor:<8}").cyan(), id);
    }
    if !any {
        println!("{}", "No stored sessions".dimmed());
    }
    let _ = io::stdout().flush();
}

/// Print an informational message.
pub fn print_info(message: &str) {
    eprintln!("{} {}", "[INFO]".blue().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}
