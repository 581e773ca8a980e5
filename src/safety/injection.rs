//! Command-injection pattern detection.
//!
//! These checks never block on their own; the composite assessment surfaces
//! them as warnings so the audit trail records chaining and substitution
//! attempts even when the command is otherwise allowed.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::lazy_re;

/// Named injection heuristic categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionPattern {
    CommandChainingSemicolon,
    CommandChainingAnd,
    CommandChainingOr,
    PipeInjection,
    CommandSubstitutionDollar,
    CommandSubstitutionBacktick,
    VariableExpansion,
}

impl InjectionPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CommandChainingSemicolon => "command_chaining_semicolon",
            Self::CommandChainingAnd => "command_chaining_and",
            Self::CommandChainingOr => "command_chaining_or",
            Self::PipeInjection => "pipe_injection",
            Self::CommandSubstitutionDollar => "command_substitution_dollar",
            Self::CommandSubstitutionBacktick => "command_substitution_backtick",
            Self::VariableExpansion => "variable_expansion",
        }
    }
}

impl fmt::Display for InjectionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static CHAIN_CHARS: &LazyLock<Regex> = lazy_re!(r"[;&|]+");
static DOLLAR_SUBSTITUTION: &LazyLock<Regex> = lazy_re!(r"\$\([^)]*\)");
static BACKTICK_SUBSTITUTION: &LazyLock<Regex> = lazy_re!(r"`[^`]*`");
static VARIABLE_EXPANSION: &LazyLock<Regex> = lazy_re!(r"\$\{[^}]*\}");

/// Scan a shell command for injection-shaped constructs.
///
/// Returns the matched categories in a fixed order; empty for clean input.
pub fn detect_injection_patterns(command: &str) -> Vec<InjectionPattern> {
    if command.is_empty() {
        return Vec::new();
    }

    let mut patterns = Vec::new();

    if CHAIN_CHARS.is_match(command) {
        if command.contains(';') {
            patterns.push(InjectionPattern::CommandChainingSemicolon);
        }
        if command.contains("&&") {
            patterns.push(InjectionPattern::CommandChainingAnd);
        }
        if command.contains("||") {
            patterns.push(InjectionPattern::CommandChainingOr);
        }
        if command.contains('|') && !command.contains("||") {
            patterns.push(InjectionPattern::PipeInjection);
        }
    }

    if DOLLAR_SUBSTITUTION.is_match(command) {
        patterns.push(InjectionPattern::CommandSubstitutionDollar);
    }
    if BACKTICK_SUBSTITUTION.is_match(command) {
        patterns.push(InjectionPattern::CommandSubstitutionBacktick);
    }
    if VARIABLE_EXPANSION.is_match(command) {
        patterns.push(InjectionPattern::VariableExpansion);
    }

    patterns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_command() {
        assert!(detect_injection_patterns("ls -la").is_empty());
        assert!(detect_injection_patterns("").is_empty());
    }

    #[test]
    fn test_chaining() {
        assert_eq!(
            detect_injection_patterns("ls; rm -rf /"),
            vec![InjectionPattern::CommandChainingSemicolon]
        );
        assert_eq!(
            detect_injection_patterns("true && ls"),
            vec![InjectionPattern::CommandChainingAnd]
        );
        assert_eq!(
            detect_injection_patterns("false || ls"),
            vec![InjectionPattern::CommandChainingOr]
        );
    }

    #[test]
    fn test_pipe_but_not_or() {
        assert_eq!(
            detect_injection_patterns("cat x | grep y"),
            vec![InjectionPattern::PipeInjection]
        );
        // `||` suppresses the pipe category
        assert_eq!(
            detect_injection_patterns("a || b"),
            vec![InjectionPattern::CommandChainingOr]
        );
    }

    #[test]
    fn test_substitution_and_expansion() {
        assert_eq!(
            detect_injection_patterns("ls $(dangerous)"),
            vec![InjectionPattern::CommandSubstitutionDollar]
        );
        assert_eq!(
            detect_injection_patterns("ls `dangerous`"),
            vec![InjectionPattern::CommandSubstitutionBacktick]
        );
        assert_eq!(
            detect_injection_patterns("echo ${HOME}"),
            vec![InjectionPattern::VariableExpansion]
        );
    }

    #[test]
    fn test_multiple_categories() {
        let found = detect_injection_patterns("a; b && c $(d)");
        assert!(found.contains(&InjectionPattern::CommandChainingSemicolon));
        assert!(found.contains(&InjectionPattern::CommandChainingAnd));
        assert!(found.contains(&InjectionPattern::CommandSubstitutionDollar));
    }
}
