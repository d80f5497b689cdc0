//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::vendor::VendorKind;

/// Environment variable that forces verbose diagnostics on.
pub const DEBUG_ENV_VAR: &str = "AGENT_BRIDGE_DEBUG";

/// How a vendor's incremental text fragments relate to each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaMode {
    /// Each fragment is new text to append.
    #[default]
    Incremental,
    /// Each fragment repeats the whole message so far.
    Cumulative,
}

/// Per-vendor settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorSettings {
    /// Model name passed to the CLI. Vendor default when unset.
    pub model: Option<String>,
    /// Tools the agent may use without asking.
    pub allowed_tools: Vec<String>,
    /// Executable override. Vendor default binary name when unset.
    pub executable: Option<PathBuf>,
    /// Parse JSON-looking stderr lines as events. Vendor default when unset.
    pub stderr_json: Option<bool>,
    pub delta_mode: DeltaMode,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Log exact command lines and raw stderr at info level.
    pub debug: bool,
    /// Workspace folders. The first one is the working directory of the CLI.
    pub workspace_dirs: Vec<PathBuf>,
    pub claude: VendorSettings,
    pub gemini: VendorSettings,
    pub codex: VendorSettings,
}

impl BridgeConfig {
    /// Settings block for a vendor.
    #[must_use]
    pub fn vendor(&self, kind: VendorKind) -> &VendorSettings {
        match kind {
            VendorKind::Claude => &self.claude,
            VendorKind::Gemini => &self.gemini,
            VendorKind::Codex => &self.codex,
        }
    }

    /// Mutable settings block for a vendor.
    pub fn vendor_mut(&mut self, kind: VendorKind) -> &mut VendorSettings {
        match kind {
            VendorKind::Claude => &mut self.claude,
            VendorKind::Gemini => &mut self.gemini,
            VendorKind::Codex => &mut self.codex,
        }
    }

    /// Apply environment overrides on top of file values.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if debug_env_enabled(std::env::var(DEBUG_ENV_VAR).ok().as_deref()) {
            self.debug = true;
        }
        self
    }
}

/// Interpret the debug environment variable value.
#[must_use]
pub fn debug_env_enabled(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("" | "0") => false,
        Some(v) => !v.eq_ignore_ascii_case("false"),
    }
}

/// Read-only configuration consumed by argument building and the runner.
pub trait ConfigProvider: Send + Sync {
    fn vendor_settings(&self, kind: VendorKind) -> VendorSettings;

    fn workspace_dirs(&self) -> Vec<PathBuf>;

    fn debug_enabled(&self) -> bool;
}

impl ConfigProvider for BridgeConfig {
    fn vendor_settings(&self, kind: VendorKind) -> VendorSettings {
        self.vendor(kind).clone()
    }

    fn workspace_dirs(&self) -> Vec<PathBuf> {
        self.workspace_dirs.clone()
    }

    fn debug_enabled(&self) -> bool {
        self.debug
    }
}
