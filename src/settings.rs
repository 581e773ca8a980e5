//! User settings persistence.
//!
//! Settings come from `<workspace>/.claude/agentgate.json`, falling back to
//! `~/.agentgate/settings.json`. Loaded with env var > settings file >
//! default priority.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::hooks::{DEFAULT_LOG_PATH, FailMode};

/// Persisted settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Safety gate configuration.
    #[serde(default)]
    pub safety: SafetySettings,

    /// Explicit `.claude` directory; discovered by walking up from the
    /// working directory when unset.
    #[serde(default)]
    pub claude_dir: Option<PathBuf>,
}

/// Safety gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetySettings {
    /// Whether the pre-tool-use gate is enabled (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Behavior on unreadable or malformed gate input.
    #[serde(default)]
    pub fail_mode: FailMode,

    /// Audit log location, relative to the working directory.
    #[serde(default = "default_audit_log")]
    pub audit_log: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_audit_log() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_PATH)
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            fail_mode: FailMode::default(),
            audit_log: default_audit_log(),
        }
    }
}

impl Settings {
    /// Per-user settings path (~/.agentgate/settings.json).
    pub fn user_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".agentgate")
            .join("settings.json")
    }

    /// Load settings for a workspace: workspace file first, then the user
    /// file, then defaults; env overrides applied last.
    pub fn load(workspace: &Path) -> Self {
        let workspace_file = workspace.join(".claude").join("agentgate.json");
        let mut settings = if workspace_file.is_file() {
            Self::load_from(&workspace_file)
        } else {
            Self::load_from(&Self::user_path())
        };
        settings.apply_env();
        settings
    }

    /// Load from a specific path, returning defaults if missing or invalid.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|err| {
                warn!(path = %path.display(), %err, "invalid settings file, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    fn apply_env(&mut self) {
        if let Ok(mode) = std::env::var("AGENTGATE_FAIL_MODE") {
            match mode.as_str() {
                "open" => self.safety.fail_mode = FailMode::Open,
                "closed" => self.safety.fail_mode = FailMode::Closed,
                other => warn!(value = other, "unknown AGENTGATE_FAIL_MODE, ignoring"),
            }
        }
        if let Ok(path) = std::env::var("AGENTGATE_AUDIT_LOG") {
            self.safety.audit_log = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("AGENTGATE_CLAUDE_DIR") {
            self.claude_dir = Some(PathBuf::from(dir));
        }
    }
}
