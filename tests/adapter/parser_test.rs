//! Framer and parser behavior over realistic vendor transcripts.

use agent_bridge::config::DeltaMode;
use agent_bridge::stream::{ContentEvent, EventParser, LineFramer};
use agent_bridge::vendor::{ClaudeParser, CodexParser, GeminiParser};

const CLAUDE_TRANSCRIPT: &str = concat!(
    r#"{"type":"system","subtype":"init","session_id":"9b1e","cwd":"/repo","tools":["Bash","Read"],"model":"claude-sonnet"}"#,
    "\n",
    r#"{"type":"assistant","message":{"id":"msg_1","role":"assistant","content":[{"type":"text","text":"Let me check the files. "}]},"session_id":"9b1e"}"#,
    "\n",
    r#"{"type":"assistant","message":{"id":"msg_1","role":"assistant","content":[{"type":"tool_use","id":"toolu_01","name":"Bash","input":{"command":"ls"}}]},"session_id":"9b1e"}"#,
    "\n",
    r#"{"type":"user","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"toolu_01","content":"Cargo.toml\nsrc","is_error":false}]},"session_id":"9b1e"}"#,
    "\r\n",
    r#"{"type":"assistant","message":{"id":"msg_2","role":"assistant","content":[{"type":"text","text":"Found Cargo.toml, a Rust crate ✓"}]},"session_id":"9b1e"}"#,
    "\n",
    r#"{"type":"result","subtype":"success","is_error":false,"duration_ms":1200,"result":"Found Cargo.toml","session_id":"9b1e"}"#,
    "\n",
);

const GEMINI_TRANSCRIPT: &str = concat!(
    r#"{"type":"init","timestamp":"2025-10-10T12:00:00.000Z","session_id":"gem-42","model":"gemini-2.5-pro"}"#,
    "\n",
    r#"{"type":"message","timestamp":"2025-10-10T12:00:00.100Z","role":"user","content":"list files"}"#,
    "\n",
    "\x1b[33mLoaded cached credentials.\x1b[0m\n",
    r#"{"type":"tool_use","timestamp":"2025-10-10T12:00:01.000Z","tool_name":"list_directory","tool_id":"ld-1","parameters":{"path":"."}}"#,
    "\n",
    r#"{"type":"tool_result","timestamp":"2025-10-10T12:00:01.500Z","tool_id":"ld-1","status":"success","output":"Cargo.toml"}"#,
    "\n",
    r#"{"type":"message","timestamp":"2025-10-10T12:00:02.000Z","role":"assistant","content":"There is ","delta":true}"#,
    "\n",
    r#"{"type":"message","timestamp":"2025-10-10T12:00:02.100Z","role":"assistant","content":"one file.","delta":true}"#,
    "\n",
    r#"{"type":"result","timestamp":"2025-10-10T12:00:02.200Z","status":"success","stats":{"total_tokens":10}}"#,
);

const CODEX_TRANSCRIPT: &str = concat!(
    r#"{"type":"thread.started","thread_id":"0199a213-81c0-7800-8aa1-bbab2a035a53"}"#,
    "\n",
    r#"{"type":"turn.started"}"#,
    "\n",
    r#"{"type":"item.completed","item":{"id":"item_0","type":"reasoning","text":"**Listing files**"}}"#,
    "\n",
    r#"{"type":"item.started","item":{"id":"item_1","type":"command_execution","command":"bash -lc ls","aggregated_output":"","status":"in_progress"}}"#,
    "\n",
    r#"{"type":"item.completed","item":{"id":"item_1","type":"command_execution","command":"bash -lc ls","aggregated_output":"Cargo.toml\n","exit_code":0,"status":"completed"}}"#,
    "\n",
    r#"{"type":"item.completed","item":{"id":"item_2","type":"agent_message","text":"One file: Cargo.toml."}}"#,
    "\n",
    r#"{"type":"turn.completed","usage":{"input_tokens":24763,"cached_input_tokens":24448,"output_tokens":122}}"#,
    "\n",
);

/// Feed `transcript` in chunks of `chunk_size` bytes, then flush.
fn replay(
    parser: &mut dyn EventParser,
    transcript: &[u8],
    chunk_size: usize,
) -> (Vec<ContentEvent>, Option<String>) {
    let mut framer = LineFramer::new();
    let mut lines = Vec::new();
    for chunk in transcript.chunks(chunk_size) {
        lines.extend(framer.feed(chunk));
    }
    lines.extend(framer.flush());

    let mut events = Vec::new();
    let mut session_id = None;
    for line in lines {
        let parsed = parser.parse_line(&line);
        if session_id.is_none() {
            session_id = parsed.session_id;
        }
        events.extend(parsed.content);
    }
    (events, session_id)
}

fn accumulated_text(events: &[ContentEvent]) -> String {
    events.iter().filter_map(ContentEvent::as_text).collect()
}

#[test]
fn claude_transcript_events() {
    let (events, session_id) = replay(&mut ClaudeParser::new(), CLAUDE_TRANSCRIPT.as_bytes(), 4096);

    assert_eq!(session_id.as_deref(), Some("9b1e"));
    assert_eq!(
        events,
        vec![
            ContentEvent::text("Let me check the files. "),
            ContentEvent::tool_use("Bash"),
            ContentEvent::tool_result("Bash", "Cargo.toml\nsrc"),
            ContentEvent::text("Found Cargo.toml, a Rust crate ✓"),
        ]
    );
    assert_eq!(
        accumulated_text(&events),
        "Let me check the files. Found Cargo.toml, a Rust crate ✓"
    );
}

#[test]
fn gemini_transcript_events() {
    let (events, session_id) = replay(
        &mut GeminiParser::new(DeltaMode::Incremental),
        GEMINI_TRANSCRIPT.as_bytes(),
        4096,
    );

    assert_eq!(session_id.as_deref(), Some("gem-42"));
    assert_eq!(
        events,
        vec![
            ContentEvent::tool_use("list_directory"),
            ContentEvent::tool_result("list_directory", "Cargo.toml"),
            ContentEvent::text("There is "),
            ContentEvent::text("one file."),
        ]
    );
}

#[test]
fn codex_transcript_events() {
    let (events, session_id) = replay(&mut CodexParser::new(), CODEX_TRANSCRIPT.as_bytes(), 4096);

    assert_eq!(
        session_id.as_deref(),
        Some("0199a213-81c0-7800-8aa1-bbab2a035a53")
    );
    assert_eq!(
        events,
        vec![
            ContentEvent::reasoning("**Listing files**"),
            ContentEvent::tool_use("bash -lc ls"),
            ContentEvent::tool_result("bash -lc ls", "Cargo.toml\n"),
            ContentEvent::text("One file: Cargo.toml."),
        ]
    );
}

#[test]
fn events_independent_of_chunk_boundaries() {
    fn claude() -> Box<dyn EventParser> {
        Box::new(ClaudeParser::new())
    }
    fn gemini() -> Box<dyn EventParser> {
        Box::new(GeminiParser::default())
    }
    fn codex() -> Box<dyn EventParser> {
        Box::new(CodexParser::new())
    }

    let cases: [(&str, fn() -> Box<dyn EventParser>); 3] = [
        (CLAUDE_TRANSCRIPT, claude),
        (GEMINI_TRANSCRIPT, gemini),
        (CODEX_TRANSCRIPT, codex),
    ];

    for (transcript, factory) in cases {
        let bytes = transcript.as_bytes();
        let expected = replay(factory().as_mut(), bytes, bytes.len());
        for chunk_size in [1, 2, 3, 7, 13, 64, 255] {
            let actual = replay(factory().as_mut(), bytes, chunk_size);
            assert_eq!(actual, expected, "chunk size {chunk_size}");
        }
    }
}

#[test]
fn garbage_between_events_is_skipped() {
    let transcript = concat!(
        "npm WARN deprecated something\n",
        "\n",
        "   \n",
        r#"{"type":"assistant","message":{"content":"ok"}}"#,
        "\n",
        "{\"type\":\"assistant\",\"message\":{\"content\":\"trunc",
        "\n",
        "Error: \u{fffd} weird bytes\n",
    );
    let (events, session_id) = replay(&mut ClaudeParser::new(), transcript.as_bytes(), 5);
    assert_eq!(events, vec![ContentEvent::text("ok")]);
    assert_eq!(session_id, None);
}

#[test]
fn cumulative_gemini_deltas_accumulate_once() {
    let transcript = concat!(
        r#"{"type":"message","role":"assistant","content":"The","delta":true}"#,
        "\n",
        r#"{"type":"message","role":"assistant","content":"The answer","delta":true}"#,
        "\n",
        r#"{"type":"message","role":"assistant","content":"The answer is 42.","delta":true}"#,
        "\n",
    );
    let (events, _) = replay(
        &mut GeminiParser::new(DeltaMode::Cumulative),
        transcript.as_bytes(),
        16,
    );
    assert_eq!(accumulated_text(&events), "The answer is 42.");
    assert_eq!(events.len(), 3);
}
