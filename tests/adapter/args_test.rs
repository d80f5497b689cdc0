//! Argument building across vendors.

use std::path::PathBuf;

use agent_bridge::config::{BridgeConfig, VendorSettings};
use agent_bridge::vendor::{
    adapter_for, ClaudeAdapter, CodexAdapter, GeminiAdapter, InvocationRequest, ModeInstructions,
    VendorAdapter, VendorKind,
};

fn settings() -> VendorSettings {
    VendorSettings {
        model: Some("m-1".to_string()),
        allowed_tools: vec!["Read".to_string()],
        ..Default::default()
    }
}

fn dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("/repo"), PathBuf::from("/docs")]
}

#[test]
fn codex_resume_follows_flags_and_precedes_prompt() {
    let adapter = CodexAdapter::new(settings(), dirs());
    let invocation = adapter.build_invocation(&InvocationRequest::new("continue").resume("th-1"));

    let resume = invocation.position("resume").unwrap();
    assert_eq!(invocation.args[resume + 1], "th-1");
    assert_eq!(invocation.args[resume + 2], "--");
    assert_eq!(resume + 3, invocation.args.len() - 1);
    assert!(invocation.args[..resume]
        .iter()
        .all(|arg| arg != "continue"));
    for flag in ["--json", "--model", "--cd", "--add-dir", "--full-auto"] {
        assert!(
            invocation.position(flag).unwrap() < resume,
            "{flag} must precede resume"
        );
    }
    assert_eq!(invocation.args.last().map(String::as_str), Some("continue"));
}

#[test]
fn prompts_starting_with_dash_follow_separator() {
    let request = InvocationRequest::new("-m foo").resume("th-2");
    for invocation in [
        ClaudeAdapter::new(settings(), dirs()).build_invocation(&request),
        GeminiAdapter::new(settings(), dirs()).build_invocation(&request),
        CodexAdapter::new(settings(), dirs()).build_invocation(&request),
    ] {
        let prompt = invocation.args.len() - 1;
        assert_eq!(invocation.args[prompt], "-m foo");
        assert_eq!(invocation.args[prompt - 1], "--", "{:?}", invocation.args);
    }
}

#[test]
fn claude_resume_sits_among_flags() {
    let adapter = ClaudeAdapter::new(settings(), dirs());
    let invocation = adapter.build_invocation(&InvocationRequest::new("continue").resume("c-1"));

    let resume = invocation.position("--resume").unwrap();
    assert_eq!(invocation.args[resume + 1], "c-1");
    assert!(resume < invocation.position("--add-dir").unwrap());
    assert_eq!(invocation.args.last().map(String::as_str), Some("continue"));
}

#[test]
fn empty_resume_id_is_omitted() {
    let request = InvocationRequest::new("hi").resume("");
    let claude = ClaudeAdapter::new(VendorSettings::default(), Vec::new()).build_invocation(&request);
    let gemini = GeminiAdapter::new(VendorSettings::default(), Vec::new()).build_invocation(&request);
    let codex = CodexAdapter::new(VendorSettings::default(), Vec::new()).build_invocation(&request);

    assert_eq!(claude.position("--resume"), None);
    assert_eq!(gemini.position("--resume"), None);
    assert_eq!(codex.position("resume"), None);
}

#[test]
fn mode_instructions_delivery_per_vendor() {
    let mode = ModeInstructions::new("reviewer", "Be strict.");
    let request = InvocationRequest::new("check this").mode_instructions(&mode);

    let claude = ClaudeAdapter::new(VendorSettings::default(), Vec::new()).build_invocation(&request);
    let flag = claude.position("--append-system-prompt").unwrap();
    assert_eq!(claude.args[flag + 1], "Be strict.");
    assert_eq!(claude.args.last().map(String::as_str), Some("check this"));

    for invocation in [
        GeminiAdapter::new(VendorSettings::default(), Vec::new()).build_invocation(&request),
        CodexAdapter::new(VendorSettings::default(), Vec::new()).build_invocation(&request),
    ] {
        let prompt = invocation.args.last().unwrap();
        assert!(prompt.starts_with("<mode_instructions name=\"reviewer\">"));
        assert!(prompt.contains("Be strict."));
        assert!(prompt.ends_with("<user_request>\ncheck this\n</user_request>"));
    }
}

#[test]
fn executable_override_is_used() {
    let mut config = BridgeConfig::default();
    config.vendor_mut(VendorKind::Gemini).executable = Some(PathBuf::from("/opt/bin/gemini-nightly"));

    let invocation = adapter_for(VendorKind::Gemini, &config)
        .build_invocation(&InvocationRequest::new("hi"));
    assert_eq!(invocation.program, "/opt/bin/gemini-nightly");

    let invocation = adapter_for(VendorKind::Claude, &config)
        .build_invocation(&InvocationRequest::new("hi"));
    assert_eq!(invocation.program, "claude");
}

#[test]
fn install_guidance_names_the_cli() {
    let config = BridgeConfig::default();
    for kind in VendorKind::ALL {
        let guidance = adapter_for(kind, &config).install_guidance();
        assert!(guidance.contains(kind.as_str()), "{kind}: {guidance}");
    }
}
