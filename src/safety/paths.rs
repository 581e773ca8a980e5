//! File-path allow/deny classification.
//!
//! Deny patterns (system directories, hidden files in user homes, traversal)
//! are checked before allow patterns (project-relative paths and temp dirs);
//! a path matching neither set is denied.

use std::sync::LazyLock;

use regex::Regex;

use super::lazy_re;

struct PathPattern {
    name: &'static str,
    regex: &'static LazyLock<Regex>,
}

static DENY_PATTERNS: &[PathPattern] = &[
    PathPattern {
        name: "etc",
        regex: lazy_re!(r"^/etc/"),
    },
    PathPattern {
        name: "bin",
        regex: lazy_re!(r"^/bin/"),
    },
    PathPattern {
        name: "sbin",
        regex: lazy_re!(r"^/sbin/"),
    },
    PathPattern {
        name: "usr-bin",
        regex: lazy_re!(r"^/usr/bin/"),
    },
    PathPattern {
        name: "root-home",
        regex: lazy_re!(r"^/root/"),
    },
    PathPattern {
        name: "home-hidden",
        regex: lazy_re!(r"^/home/[^/]+/\."),
    },
    PathPattern {
        name: "traversal",
        regex: lazy_re!(r"^\.\./.*/"),
    },
];

static ALLOW_PATTERNS: &[PathPattern] = &[
    PathPattern {
        name: "dot-relative",
        regex: lazy_re!(r"^\./[^/]"),
    },
    PathPattern {
        name: "relative",
        regex: lazy_re!(r"^[^/]"),
    },
    PathPattern {
        name: "tmp",
        regex: lazy_re!(r"^/tmp/"),
    },
    PathPattern {
        name: "var-tmp",
        regex: lazy_re!(r"^/var/tmp/"),
    },
];

/// Decide whether a file path may be touched.
///
/// Empty paths are denied.
pub fn is_path_allowed(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }

    for p in DENY_PATTERNS {
        if p.regex.is_match(path) {
            tracing::debug!(pattern = p.name, path, "path denied");
            return false;
        }
    }

    ALLOW_PATTERNS.iter().any(|p| p.regex.is_match(path))
}
