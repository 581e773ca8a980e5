//! Dangerous `rm` command classifier.
//!
//! Pattern tables evaluated in a fixed, documented order. This is a heuristic
//! filter, not a shell parser: sufficiently obfuscated shells can evade it,
//! and that risk is accepted. The checks, in order:
//!
//! 1. Normalize (collapse whitespace, lowercase); `echo `/`#` prefixes are
//!    never dangerous.
//! 2. `--no-preserve-root` is dangerous unconditionally.
//! 3. `rm` with an `r`/`f` flag cluster plus shell chaining metacharacters.
//! 4. Chained/substituted `rm -r/-f …/` anywhere in the string.
//! 5. Recursive + force flags against a root/home/wildcard-style target.
//! 6. Recursive alone against a reduced target set.

use std::sync::LazyLock;

use regex::Regex;

use super::lazy_re;

/// A named pattern within one of the rm tables.
struct RmPattern {
    name: &'static str,
    regex: &'static LazyLock<Regex>,
}

/// `rm` carrying a recursive or force short-flag cluster.
static RM_WITH_RF_CLUSTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\brm\s+.*-[a-z]*[rf]").unwrap());

/// Shell chaining/backgrounding metacharacters around an rm-with-flags.
///
/// Any chaining around a recursive/force rm is suspicious: it can mask the
/// true target or side effects.
static CHAINING_PATTERNS: &[RmPattern] = &[
    RmPattern {
        name: "background-at-end",
        regex: lazy_re!(r"&\s*$"),
    },
    RmPattern {
        name: "semicolon-chain",
        regex: lazy_re!(r";\s*"),
    },
    RmPattern {
        name: "or-chain",
        regex: lazy_re!(r"\|\|\s*"),
    },
    RmPattern {
        name: "and-chain",
        regex: lazy_re!(r"&&\s*"),
    },
    RmPattern {
        name: "pipe",
        regex: lazy_re!(r"\|"),
    },
];

/// Dangerous rm reached through chaining or command substitution.
static INJECTION_PATTERNS: &[RmPattern] = &[
    RmPattern {
        name: "semicolon-rm-root",
        regex: lazy_re!(r";\s*rm\s+.*-[a-z]*[rf].*/"),
    },
    RmPattern {
        name: "and-rm-root",
        regex: lazy_re!(r"&&\s*rm\s+.*-[a-z]*[rf].*/"),
    },
    RmPattern {
        name: "or-rm-root",
        regex: lazy_re!(r"\|\|\s*rm\s+.*-[a-z]*[rf].*/"),
    },
    RmPattern {
        name: "pipe-rm-root",
        regex: lazy_re!(r"\|\s*rm\s+.*-[a-z]*[rf].*/"),
    },
    RmPattern {
        name: "dollar-substitution-rm",
        regex: lazy_re!(r"\$\(.*rm\s+.*-[a-z]*[rf].*\)"),
    },
    RmPattern {
        name: "backtick-substitution-rm",
        regex: lazy_re!(r"`.*rm\s+.*-[a-z]*[rf].*`"),
    },
];

static HAS_R_SHORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\brm\s+.*-[a-z]*r").unwrap());
static HAS_R_LONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\brm\s+.*--recursive").unwrap());
static HAS_F_SHORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\brm\s+.*-[a-z]*f").unwrap());
static HAS_F_LONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\brm\s+.*--force").unwrap());

/// Targets that make a recursive+force rm dangerous.
static RF_TARGET_PATTERNS: &[RmPattern] = &[
    RmPattern {
        name: "root",
        regex: lazy_re!(r"\brm\s+.*\s+/$"),
    },
    RmPattern {
        name: "root-trailing-space",
        regex: lazy_re!(r"\brm\s+.*\s+/\s*$"),
    },
    RmPattern {
        name: "root-wildcard",
        regex: lazy_re!(r"\brm\s+.*\s+/\*"),
    },
    RmPattern {
        name: "home",
        regex: lazy_re!(r"\brm\s+.*\s+~$"),
    },
    RmPattern {
        name: "home-slash",
        regex: lazy_re!(r"\brm\s+.*\s+~/$"),
    },
    RmPattern {
        name: "home-var",
        regex: lazy_re!(r"\brm\s+.*\s+\$home\s*$"),
    },
    RmPattern {
        name: "parent",
        regex: lazy_re!(r"\brm\s+.*\s+\.\.$"),
    },
    RmPattern {
        name: "grandparent",
        regex: lazy_re!(r"\brm\s+.*\s+\.\./\.\."),
    },
    RmPattern {
        name: "cwd",
        regex: lazy_re!(r"\brm\s+.*\s+\.$"),
    },
    RmPattern {
        name: "cwd-slash",
        regex: lazy_re!(r"\brm\s+.*\s+\./$"),
    },
    RmPattern {
        name: "wildcard",
        regex: lazy_re!(r"\brm\s+.*\s+\*$"),
    },
    RmPattern {
        name: "dollar-substitution-target",
        regex: lazy_re!(r"\brm\s+.*\s+\$\(.*\)"),
    },
    RmPattern {
        name: "backtick-target",
        regex: lazy_re!(r"\brm\s+.*\s+`.*`"),
    },
];

/// Reduced target set for recursive-without-force rm.
static RECURSIVE_TARGET_PATTERNS: &[RmPattern] = &[
    RmPattern {
        name: "root",
        regex: lazy_re!(r"\brm\s+.*\s+/$"),
    },
    RmPattern {
        name: "root-trailing-space",
        regex: lazy_re!(r"\brm\s+.*\s+/\s*$"),
    },
    RmPattern {
        name: "home",
        regex: lazy_re!(r"\brm\s+.*\s+~$"),
    },
    RmPattern {
        name: "parent",
        regex: lazy_re!(r"\brm\s+.*\s+\.\.$"),
    },
    RmPattern {
        name: "cwd",
        regex: lazy_re!(r"\brm\s+.*\s+\.$"),
    },
    RmPattern {
        name: "wildcard",
        regex: lazy_re!(r"\brm\s+.*\s+\*$"),
    },
];

/// Shapes an rm command may take when it is clearly scoped to specific paths.
static SAFE_RM_PATTERNS: &[RmPattern] = &[
    RmPattern {
        name: "no-flags",
        regex: lazy_re!(r"\brm\s+[^-]"),
    },
    RmPattern {
        name: "safe-flags-specific-path",
        regex: lazy_re!(r"\brm\s+-[^rf]*\s+[^/~\*]"),
    },
    RmPattern {
        name: "recursive-nested-path",
        regex: lazy_re!(r"\brm\s+-r\s+[a-zA-Z0-9_\-/]+/[a-zA-Z0-9_\-/]+"),
    },
    RmPattern {
        name: "rf-under-tmp",
        regex: lazy_re!(r"\brm\s+-rf\s+/tmp/[a-zA-Z0-9_\-/]+"),
    },
];

/// Collapse whitespace runs to single spaces and lowercase.
fn normalize(command: &str) -> String {
    command
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Classify a shell command as a dangerous rm.
///
/// Empty input is never dangerous. Matching runs against the normalized
/// form; the name of the first matching pattern is traced at debug level.
pub fn is_dangerous_rm(command: &str) -> bool {
    if command.is_empty() {
        return false;
    }

    let normalized = normalize(command);

    // Printing or commenting an rm command is not executing one. This must
    // win over every pattern below.
    if normalized.starts_with("echo ") || normalized.starts_with('#') {
        return false;
    }

    if normalized.contains("--no-preserve-root") {
        tracing::debug!(pattern = "no-preserve-root", "dangerous rm");
        return true;
    }

    if RM_WITH_RF_CLUSTER.is_match(&normalized) {
        for p in CHAINING_PATTERNS {
            if p.regex.is_match(&normalized) {
                tracing::debug!(pattern = p.name, "dangerous rm (chaining)");
                return true;
            }
        }
    }

    for p in INJECTION_PATTERNS {
        if p.regex.is_match(&normalized) {
            tracing::debug!(pattern = p.name, "dangerous rm (injection)");
            return true;
        }
    }

    let has_r_flag = HAS_R_SHORT.is_match(&normalized) || HAS_R_LONG.is_match(&normalized);
    let has_f_flag = HAS_F_SHORT.is_match(&normalized) || HAS_F_LONG.is_match(&normalized);

    if has_r_flag && has_f_flag {
        // Recursive + force is only dangerous against root/home/wildcard-style
        // targets; a specific subpath is allowed through.
        for p in RF_TARGET_PATTERNS {
            if p.regex.is_match(&normalized) {
                tracing::debug!(pattern = p.name, "dangerous rm (rf target)");
                return true;
            }
        }
    } else if has_r_flag {
        for p in RECURSIVE_TARGET_PATTERNS {
            if p.regex.is_match(&normalized) {
                tracing::debug!(pattern = p.name, "dangerous rm (recursive target)");
                return true;
            }
        }
    }

    false
}

/// Check whether an rm command is affirmatively safe.
///
/// Stricter than `!is_dangerous_rm`: the command must start with `rm ` and
/// match one of the known safe shapes.
pub fn is_safe_rm(command: &str) -> bool {
    if command.is_empty() {
        return false;
    }

    let normalized = command.to_lowercase().trim().to_string();
    if !normalized.starts_with("rm ") {
        return false;
    }
    if is_dangerous_rm(command) {
        return false;
    }

    SAFE_RM_PATTERNS.iter().any(|p| p.regex.is_match(&normalized))
}
