//! Shared validation report.
//!
//! Every validator produces the same three-tier output: errors (must fix),
//! warnings (should fix), and suggestions (consider, shown only in verbose
//! mode). Only errors affect exit codes.

use std::fmt::Write as _;

#[derive(Debug, Clone, Default)]
pub struct Report {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn suggest(&mut self, msg: impl Into<String>) {
        self.suggestions.push(msg.into());
    }

    pub fn merge(&mut self, other: Report) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.suggestions.extend(other.suggestions);
    }

    /// True when no errors were recorded (warnings do not fail validation).
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Render the report for terminal output.
    pub fn render(&self, title: &str, verbose: bool) -> String {
        let total = self.errors.len() + self.warnings.len() + self.suggestions.len();
        if total == 0 {
            return format!("{title}: all checks passed\n");
        }

        let mut out = String::new();
        let _ = writeln!(out, "{title}");
        let _ = writeln!(out, "{}", "=".repeat(title.len().max(20)));
        let _ = writeln!(
            out,
            "errors: {}  warnings: {}  suggestions: {}",
            self.errors.len(),
            self.warnings.len(),
            self.suggestions.len()
        );

        if !self.errors.is_empty() {
            let _ = writeln!(out, "\nErrors (must fix):");
            for e in &self.errors {
                let _ = writeln!(out, "  - {e}");
            }
        }
        if !self.warnings.is_empty() {
            let _ = writeln!(out, "\nWarnings (should fix):");
            for w in &self.warnings {
                let _ = writeln!(out, "  - {w}");
            }
        }
        if verbose && !self.suggestions.is_empty() {
            let _ = writeln!(out, "\nSuggestions (consider):");
            for s in &self.suggestions {
                let _ = writeln!(out, "  - {s}");
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_report() {
        let report = Report::new();
        assert!(report.is_clean());
        assert!(report.render("Checks", false).contains("all checks passed"));
    }

    #[test]
    fn test_warnings_stay_clean() {
        let mut report = Report::new();
        report.warn("something minor");
        assert!(report.is_clean());
    }

    #[test]
    fn test_errors_fail() {
        let mut report = Report::new();
        report.error("broken");
        assert!(!report.is_clean());
        let rendered = report.render("Checks", false);
        assert!(rendered.contains("Errors (must fix):"));
        assert!(rendered.contains("broken"));
    }

    #[test]
    fn test_suggestions_only_verbose() {
        let mut report = Report::new();
        report.suggest("maybe");
        assert!(!report.render("Checks", false).contains("maybe"));
        assert!(report.render("Checks", true).contains("maybe"));
    }

    #[test]
    fn test_merge() {
        let mut a = Report::new();
        a.error("e1");
        let mut b = Report::new();
        b.warn("w1");
        a.merge(b);
        assert_eq!(a.errors.len(), 1);
        assert_eq!(a.warnings.len(), 1);
    }
}
