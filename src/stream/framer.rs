//! Line framing for child process output.
//!
//! Pipes deliver arbitrary chunks; a JSON envelope may be split anywhere,
//! including inside a multi-byte UTF-8 character. The framer buffers raw
//! bytes and only decodes once a full line is available.

use std::sync::LazyLock;

use regex::Regex;

/// `ESC [ <params> <letter>` terminal control sequences.
static ANSI_SEQUENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B\[[^A-Za-z]*[A-Za-z]").expect("ANSI pattern is valid"));

/// Remove terminal control sequences from a line.
#[must_use]
pub fn strip_ansi(line: &str) -> String {
    ANSI_SEQUENCE.replace_all(line, "").into_owned()
}

/// Splits a byte stream into cleaned, non-empty lines.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
}

impl LineFramer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let Some(last_newline) = self.buffer.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);

        complete
            .split(|&b| b == b'\n')
            .filter_map(clean_line)
            .collect()
    }

    /// Return the unterminated tail, if any. Call once after the stream ends.
    pub fn flush(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let tail = std::mem::take(&mut self.buffer);
        clean_line(&tail)
    }

    /// Bytes currently held back waiting for a newline.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn clean_line(raw: &[u8]) -> Option<String> {
    let decoded = String::from_utf8_lossy(raw);
    let stripped = strip_ansi(&decoded);
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
