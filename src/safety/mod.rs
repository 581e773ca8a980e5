//! Command & path safety filter for intercepted tool invocations.
//!
//! Classifies a proposed tool call (shell command, or tool + file path) as
//! blocked or allowed before the host assistant executes it. It covers:
//!
//! - Dangerous `rm` detection (recursive/force deletes of root-like targets,
//!   chained and substituted variants, `--no-preserve-root`)
//! - Sensitive `.env` file access (with the `.env.sample` template exemption)
//! - Injection-pattern warnings (chaining, substitution, expansion) that are
//!   recorded but never block on their own
//! - File-path allow/deny against system-directory patterns
//!
//! # Design
//!
//! Two-phase evaluation:
//! 1. **Quick reject**: keyword check via `aho-corasick` — a shell command
//!    containing none of the trigger keywords is allowed without running any
//!    regex.
//! 2. **Pattern match**: named regex tables evaluated in a fixed order.
//!    First blocking match wins; later phases only add diagnostics.
//!
//! The filter is pure and synchronous: no I/O, no shared mutable state, the
//! same input always yields the same verdict.

mod env_guard;
mod injection;
mod paths;
mod rm_guard;

pub use env_guard::is_env_file_access;
pub use injection::{InjectionPattern, detect_injection_patterns};
pub use paths::is_path_allowed;
pub use rm_guard::{is_dangerous_rm, is_safe_rm};

use std::sync::LazyLock;

use aho_corasick::AhoCorasick;
use serde::Serialize;

macro_rules! lazy_re {
    ($pat:expr) => {{
        static RE: std::sync::LazyLock<regex::Regex> =
            std::sync::LazyLock::new(|| regex::Regex::new($pat).unwrap());
        &RE
    }};
}
pub(crate) use lazy_re;

/// Reason string for a sensitive-env block.
pub const ENV_BLOCK_REASON: &str =
    "Access to .env files containing sensitive data is prohibited";

/// Reason string for a dangerous-rm block.
pub const RM_BLOCK_REASON: &str = "Dangerous rm command detected";

/// File-accessing tools whose `file_path` parameter the filter inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileTool {
    Read,
    Edit,
    MultiEdit,
    Write,
}

impl FileTool {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "Read",
            Self::Edit => "Edit",
            Self::MultiEdit => "MultiEdit",
            Self::Write => "Write",
        }
    }
}

/// One intercepted tool call, resolved into a typed shape at the parse
/// boundary. Constructed fresh per request and discarded after one
/// classification.
#[derive(Debug, Clone)]
pub enum ToolInvocation {
    /// The shell-executing tool.
    Bash { command: String },
    /// A file-accessing tool with its `file_path` parameter.
    File { tool: FileTool, path: String },
    /// Any other tool; never blocked by this filter.
    Other { tool: String },
}

impl ToolInvocation {
    /// Build from the wire form (`tool_name` + `tool_input` object).
    ///
    /// Missing or non-string parameters collapse to empty strings, which
    /// classify as not dangerous.
    pub fn from_wire(tool_name: &str, tool_input: &serde_json::Value) -> Self {
        if tool_name == "Bash" {
            let command = tool_input
                .get("command")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            return Self::Bash { command };
        }
        if let Some(tool) = env_guard::is_file_tool(tool_name) {
            let path = tool_input
                .get("file_path")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            return Self::File { tool, path };
        }
        Self::Other {
            tool: tool_name.to_string(),
        }
    }

    /// Tool name as the host reports it.
    pub fn tool_name(&self) -> &str {
        match self {
            Self::Bash { .. } => "Bash",
            Self::File { tool, .. } => tool.as_str(),
            Self::Other { tool } => tool,
        }
    }
}

/// The filter's output for one invocation.
#[derive(Debug, Clone, Serialize)]
pub struct SafetyVerdict {
    pub blocked: bool,
    /// Human-readable reason; absent when allowed.
    pub reason: Option<String>,
    /// Named heuristic categories that matched (diagnostics, not policy).
    pub patterns_detected: Vec<String>,
    /// Non-blocking observations.
    pub warnings: Vec<String>,
}

impl SafetyVerdict {
    fn allow() -> Self {
        Self {
            blocked: false,
            reason: None,
            patterns_detected: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn block(reason: impl Into<String>, pattern: &str) -> Self {
        Self {
            blocked: true,
            reason: Some(reason.into()),
            patterns_detected: vec![pattern.to_string()],
            warnings: Vec::new(),
        }
    }
}

/// Keywords that must appear in a shell command for any blocking or warning
/// pattern to possibly match. Absence short-circuits the regex phase.
static QUICK_KEYWORDS: LazyLock<AhoCorasick> = LazyLock::new(|| {
    AhoCorasick::builder()
        .ascii_case_insensitive(true)
        .build(["rm", ".env", "--no-preserve-root", ";", "&", "|", "$", "`"])
        .expect("static keyword set")
});

/// Composite safety assessment for one invocation.
///
/// Evaluation order (first blocking match wins):
/// 1. Sensitive `.env` access
/// 2. Dangerous rm (shell commands)
/// 3. Injection scan (shell commands, warnings only)
/// 4. Path allow/deny (file tools)
pub fn assess(invocation: &ToolInvocation) -> SafetyVerdict {
    match invocation {
        ToolInvocation::Bash { command } => {
            // Phase 1: quick reject.
            if !QUICK_KEYWORDS.is_match(command) {
                return SafetyVerdict::allow();
            }

            if is_env_file_access(invocation) {
                audit_block("env_file_access", command);
                return SafetyVerdict::block(ENV_BLOCK_REASON, "env_file_access");
            }

            if is_dangerous_rm(command) {
                audit_block("dangerous_rm", command);
                return SafetyVerdict::block(RM_BLOCK_REASON, "dangerous_rm");
            }

            let mut verdict = SafetyVerdict::allow();
            let injection = detect_injection_patterns(command);
            if !injection.is_empty() {
                let names: Vec<&str> = injection.iter().map(|p| p.as_str()).collect();
                verdict.warnings.push(format!(
                    "Command injection patterns detected: {}",
                    names.join(", ")
                ));
                verdict
                    .patterns_detected
                    .extend(names.iter().map(|n| n.to_string()));
            }
            verdict
        }
        ToolInvocation::File { path, .. } => {
            if is_env_file_access(invocation) {
                audit_block("env_file_access", path);
                return SafetyVerdict::block(ENV_BLOCK_REASON, "env_file_access");
            }
            if !path.is_empty() && !is_path_allowed(path) {
                audit_block("unsafe_file_access", path);
                return SafetyVerdict::block(
                    format!("File path access not allowed: {path}"),
                    "unsafe_file_access",
                );
            }
            SafetyVerdict::allow()
        }
        ToolInvocation::Other { .. } => SafetyVerdict::allow(),
    }
}

fn audit_block(pattern: &str, input: &str) {
    tracing::info!(
        target: "audit",
        safety = "block",
        pattern,
        input = truncate(input, 120),
    );
}

/// Truncate a string for log/display purposes.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        s
    } else {
        let end = s.char_indices().nth(max).map(|(i, _)| i).unwrap_or(s.len());
        &s[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bash(command: &str) -> ToolInvocation {
        ToolInvocation::Bash {
            command: command.to_string(),
        }
    }

    #[test]
    fn test_dangerous_rm_blocked() {
        let verdict = assess(&bash("rm -rf /"));
        assert!(verdict.blocked);
        assert_eq!(verdict.reason.as_deref(), Some(RM_BLOCK_REASON));
        assert_eq!(verdict.patterns_detected, vec!["dangerous_rm"]);
    }

    #[test]
    fn test_specific_rm_allowed() {
        let verdict = assess(&bash("rm -rf /tmp/my_temp_file"));
        assert!(!verdict.blocked);
    }

    #[test]
    fn test_echo_exemption_allowed() {
        let verdict = assess(&bash("echo 'rm -rf /' # comment"));
        assert!(!verdict.blocked);
    }

    #[test]
    fn test_env_read_blocked_before_rm() {
        // env check runs first: `rm .env` reports the env reason
        let verdict = assess(&bash("rm .env"));
        assert!(verdict.blocked);
        assert_eq!(verdict.reason.as_deref(), Some(ENV_BLOCK_REASON));
    }

    #[test]
    fn test_env_file_tool_blocked() {
        let verdict = assess(&ToolInvocation::from_wire(
            "Read",
            &serde_json::json!({"file_path": ".env"}),
        ));
        assert!(verdict.blocked);
        assert!(verdict.reason.as_deref().unwrap().contains("sensitive data"));
    }

    #[test]
    fn test_env_sample_allowed() {
        let verdict = assess(&ToolInvocation::from_wire(
            "Read",
            &serde_json::json!({"file_path": ".env.sample"}),
        ));
        assert!(!verdict.blocked);
    }

    #[test]
    fn test_bash_env_commands() {
        assert!(assess(&bash("cat .env")).blocked);
        assert!(!assess(&bash("cat .env.sample")).blocked);
    }

    #[test]
    fn test_injection_warns_without_blocking() {
        let verdict = assess(&bash("ls; make build"));
        assert!(!verdict.blocked);
        assert_eq!(verdict.warnings.len(), 1);
        assert!(
            verdict
                .patterns_detected
                .contains(&"command_chaining_semicolon".to_string())
        );
    }

    #[test]
    fn test_system_path_blocked() {
        let verdict = assess(&ToolInvocation::from_wire(
            "Write",
            &serde_json::json!({"file_path": "/etc/passwd"}),
        ));
        assert!(verdict.blocked);
        assert!(verdict.reason.as_deref().unwrap().contains("/etc/passwd"));
        assert_eq!(verdict.patterns_detected, vec!["unsafe_file_access"]);
    }

    #[test]
    fn test_relative_path_allowed() {
        let verdict = assess(&ToolInvocation::from_wire(
            "Edit",
            &serde_json::json!({"file_path": "src/lib.rs"}),
        ));
        assert!(!verdict.blocked);
    }

    #[test]
    fn test_other_tool_allowed() {
        let verdict = assess(&ToolInvocation::from_wire("Glob", &serde_json::json!({})));
        assert!(!verdict.blocked);
    }

    #[test]
    fn test_missing_parameters_allowed() {
        let verdict = assess(&ToolInvocation::from_wire("Bash", &serde_json::json!({})));
        assert!(!verdict.blocked);
        let verdict = assess(&ToolInvocation::from_wire(
            "Bash",
            &serde_json::json!({"command": 42}),
        ));
        assert!(!verdict.blocked);
    }

    #[test]
    fn test_quick_reject_everyday_commands() {
        assert!(!assess(&bash("cargo build --release")).blocked);
        assert!(!assess(&bash("ls -la")).blocked);
        assert!(!assess(&bash("python main.py")).blocked);
        assert!(assess(&bash("make test")).warnings.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let inv = bash("rm -rf /");
        let a = assess(&inv);
        let b = assess(&inv);
        assert_eq!(a.blocked, b.blocked);
        assert_eq!(a.patterns_detected, b.patterns_detected);
    }
}
