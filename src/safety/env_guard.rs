//! Sensitive `.env` file access classifier.
//!
//! Blocks reads/writes of dotenv-style secret files. The only exempt suffix
//! is `.env.sample` (template files). `.env.local` is deliberately NOT
//! exempt: the historical sources disagree on it, and the narrower policy is
//! canonical here.

use std::sync::LazyLock;

use regex::Regex;

use super::lazy_re;
use super::{FileTool, ToolInvocation};

/// File-reading/writing verbs paired with a `.env` token.
///
/// Each pattern is anchored at `\.env$` and matched against the command
/// prefix ending at a `.env` occurrence; the caller has already established
/// that the occurrence is not followed by `.sample`. This reproduces the
/// negative-lookahead form of the original tables without lookaround.
static ENV_VERB_PATTERNS: &[(&str, &LazyLock<Regex>)] = &[
    ("cat", lazy_re!(r"\bcat\s+.*\.env$")),
    ("less", lazy_re!(r"\bless\s+.*\.env$")),
    ("more", lazy_re!(r"\bmore\s+.*\.env$")),
    ("head", lazy_re!(r"\bhead\s+.*\.env$")),
    ("tail", lazy_re!(r"\btail\s+.*\.env$")),
    ("grep", lazy_re!(r"\bgrep\s+.*\.env$")),
    ("echo-redirect", lazy_re!(r"\becho\s+.*>\s*\.env$")),
    ("touch", lazy_re!(r"\btouch\s+.*\.env$")),
    ("cp", lazy_re!(r"\bcp\s+.*\.env$")),
    ("mv", lazy_re!(r"\bmv\s+.*\.env$")),
    ("rm", lazy_re!(r"\brm\s+.*\.env$")),
];

/// `.env` token with a word boundary after it (`.sample` begins with a
/// non-word char, so an exempt suffix still matches here and is filtered
/// by the caller).
static ENV_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.env\b").unwrap());

const EXEMPT_SUFFIX: &str = ".env.sample";

/// Does this invocation touch a `.env` file holding secrets?
pub fn is_env_file_access(invocation: &ToolInvocation) -> bool {
    match invocation {
        ToolInvocation::File { path, .. } => {
            path.contains(".env") && !path.ends_with(EXEMPT_SUFFIX)
        }
        ToolInvocation::Bash { command } => command_touches_env(command),
        ToolInvocation::Other { .. } => false,
    }
}

/// Check a shell command for `.env` access through a known verb.
fn command_touches_env(command: &str) -> bool {
    for token in ENV_TOKEN.find_iter(command) {
        // The sample template is the one .env variant tools may touch.
        if command[token.end()..].starts_with(".sample") {
            continue;
        }
        let prefix = &command[..token.end()];
        for (verb, re) in ENV_VERB_PATTERNS {
            if re.is_match(prefix) {
                tracing::debug!(verb, "env file access");
                return true;
            }
        }
    }
    false
}

/// Tools whose `file_path` parameter is subject to the env check.
pub(crate) fn is_file_tool(tool: &str) -> Option<FileTool> {
    match tool {
        "Read" => Some(FileTool::Read),
        "Edit" => Some(FileTool::Edit),
        "MultiEdit" => Some(FileTool::MultiEdit),
        "Write" => Some(FileTool::Write),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(path: &str) -> ToolInvocation {
        ToolInvocation::File {
            tool: FileTool::Read,
            path: path.to_string(),
        }
    }

    fn bash(command: &str) -> ToolInvocation {
        ToolInvocation::Bash {
            command: command.to_string(),
        }
    }

    #[test]
    fn test_file_tool_env_blocked() {
        assert!(is_env_file_access(&read(".env")));
        assert!(is_env_file_access(&read("config/.env")));
        assert!(is_env_file_access(&read(".env.production")));
        assert!(is_env_file_access(&read(".env.local")));
    }

    #[test]
    fn test_file_tool_sample_exempt() {
        assert!(!is_env_file_access(&read(".env.sample")));
        assert!(!is_env_file_access(&read("config/.env.sample")));
    }

    #[test]
    fn test_file_tool_unrelated_allowed() {
        assert!(!is_env_file_access(&read("src/main.rs")));
        assert!(!is_env_file_access(&read("environment.md")));
    }

    #[test]
    fn test_bash_read_verbs_blocked() {
        assert!(is_env_file_access(&bash("cat .env")));
        assert!(is_env_file_access(&bash("less .env")));
        assert!(is_env_file_access(&bash("head -n 5 .env")));
        assert!(is_env_file_access(&bash("tail .env")));
        assert!(is_env_file_access(&bash("grep SECRET .env")));
    }

    #[test]
    fn test_bash_write_verbs_blocked() {
        assert!(is_env_file_access(&bash("echo FOO=bar > .env")));
        assert!(is_env_file_access(&bash("touch .env")));
        assert!(is_env_file_access(&bash("cp .env /tmp/stolen.env")));
        assert!(is_env_file_access(&bash("mv old.env .env")));
        assert!(is_env_file_access(&bash("rm .env")));
    }

    #[test]
    fn test_bash_sample_exempt() {
        assert!(!is_env_file_access(&bash("cat .env.sample")));
        assert!(!is_env_file_access(&bash("cp .env.sample .env.sample.bak")));
    }

    #[test]
    fn test_bash_mixed_sample_and_real() {
        // The .env.sample occurrence is exempt; the bare .env is not.
        assert!(is_env_file_access(&bash("cat .env.sample .env")));
    }

    #[test]
    fn test_bash_local_not_exempt() {
        assert!(is_env_file_access(&bash("cat .env.local")));
    }

    #[test]
    fn test_bash_no_verb_allowed() {
        assert!(!is_env_file_access(&bash("ls -la")));
        assert!(!is_env_file_access(&bash("echo .env exists")));
    }

    #[test]
    fn test_other_tool_not_blocked() {
        let inv = ToolInvocation::Other {
            tool: "Glob".to_string(),
        };
        assert!(!is_env_file_access(&inv));
    }
}
