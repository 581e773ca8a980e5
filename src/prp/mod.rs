//! PRP (Product Requirement Prompt) document validation.
//!
//! Structure, completeness, and clarity checks on PRP markdown files, plus
//! a warn-only status scan used before commits.

use std::path::{Path, PathBuf};

use crate::report::Report;
use crate::safety::lazy_re;

const REQUIRED_SECTIONS: &[&str] = &[
    "## Goal",
    "## Why",
    "## What",
    "## All Needed Context",
    "## Implementation Blueprint",
    "## Validation Loop",
];

/// Template fragments that must have been replaced with real content.
const PLACEHOLDERS: &[&str] = &[
    "[Specific, measurable end state",
    "[Concrete artifact",
    "[How you'll know this is complete",
    "[exact/path/to/pattern",
    "TODO:",
    "FIXME:",
];

const MAX_LINE_LEN: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum PrpError {
    #[error("{path} does not exist")]
    NotFound { path: PathBuf },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Validation outcome for one PRP file.
#[derive(Debug)]
pub struct PrpResult {
    pub path: PathBuf,
    pub report: Report,
}

impl PrpResult {
    pub fn is_valid(&self) -> bool {
        self.report.is_clean()
    }
}

/// Required-section structure check.
pub fn check_structure(content: &str, report: &mut Report) {
    for section in REQUIRED_SECTIONS {
        if !content.contains(section) {
            report.error(format!("Missing required section: {section}"));
        }
    }
}

/// Placeholder and YAML-context completeness check.
pub fn check_completeness(content: &str, report: &mut Report) {
    for placeholder in PLACEHOLDERS {
        if content.contains(placeholder) {
            report.error(format!("Contains unfilled placeholder: {placeholder}"));
        }
    }

    let yaml_re = lazy_re!(r"(?s)```yaml\n(.*?)```");
    match yaml_re.captures(content) {
        Some(caps) => {
            let block = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let has_content = block
                .lines()
                .map(str::trim)
                .any(|line| !line.is_empty() && !line.starts_with('#'));
            if !has_content {
                report.error("YAML context section is empty or only has comments");
            }
        }
        None => report.error("Missing YAML context section"),
    }
}

/// Readability check: line length, numbered tasks, validation commands.
pub fn check_clarity(content: &str, report: &mut Report) {
    for (i, line) in content.lines().enumerate() {
        let chars = line.chars().count();
        if chars > MAX_LINE_LEN {
            report.error(format!("Line {} is too long ({chars} chars)", i + 1));
        }
    }
    if !content.contains("Task 1:") {
        report.error("Missing numbered implementation tasks");
    }
    if !content.contains("```bash") {
        report.error("Missing bash validation commands");
    }
}

/// Run all checks on one PRP file's content.
pub fn validate_content(content: &str) -> Report {
    let mut report = Report::new();
    check_structure(content, &mut report);
    check_completeness(content, &mut report);
    check_clarity(content, &mut report);
    report
}

/// Validate a PRP file, or every `*.md` in a directory (templates and
/// README files excluded).
pub fn validate_path(target: &Path) -> Result<Vec<PrpResult>, PrpError> {
    if !target.exists() {
        return Err(PrpError::NotFound {
            path: target.to_path_buf(),
        });
    }

    let files = if target.is_file() {
        vec![target.to_path_buf()]
    } else {
        let mut files: Vec<PathBuf> = std::fs::read_dir(target)
            .map_err(|source| PrpError::Read {
                path: target.to_path_buf(),
                source,
            })?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                name.ends_with(".md")
                    && !name.starts_with("README")
                    && !name.to_lowercase().contains("template")
            })
            .collect();
        files.sort();
        files
    };

    let mut results = Vec::with_capacity(files.len());
    for path in files {
        let content = std::fs::read_to_string(&path).map_err(|source| PrpError::Read {
            path: path.clone(),
            source,
        })?;
        results.push(PrpResult {
            report: validate_content(&content),
            path,
        });
    }
    Ok(results)
}

/// Scan files for an `IN_PROGRESS` status line. Warn-only: the returned
/// list names the offenders, the caller never fails on it.
pub fn files_in_progress(files: &[PathBuf]) -> Vec<PathBuf> {
    let status_re = lazy_re!(r"(?m)^Status:\s*IN_PROGRESS");

    let mut hits = Vec::new();
    for path in files {
        if path.extension().is_none_or(|ext| ext != "md") {
            continue;
        }
        let Ok(content) = std::fs::read_to_string(path) else {
            tracing::warn!(path = %path.display(), "could not read file for status check");
            continue;
        };
        if status_re.is_match(&content) {
            hits.push(path.clone());
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_prp() -> String {
        let mut s = String::new();
        s.push_str("# Feature\n\nStatus: COMPLETED\n\n");
        for section in REQUIRED_SECTIONS {
            s.push_str(section);
            s.push_str("\ncontent\n\n");
        }
        s.push_str("```yaml\nurl: https://example.com/docs\n```\n");
        s.push_str("Task 1: build the thing\n");
        s.push_str("```bash\ncargo test\n```\n");
        s
    }

    #[test]
    fn test_complete_prp_is_valid() {
        let report = validate_content(&complete_prp());
        assert!(report.is_clean(), "{:?}", report.errors);
    }

    #[test]
    fn test_missing_sections() {
        let report = validate_content("# Empty\n");
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.contains("Missing required section: ## Goal"))
        );
        assert_eq!(
            report
                .errors
                .iter()
                .filter(|e| e.contains("Missing required section"))
                .count(),
            REQUIRED_SECTIONS.len()
        );
    }

    #[test]
    fn test_placeholder_detected() {
        let content = complete_prp() + "\nTODO: finish this\n";
        let report = validate_content(&content);
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.contains("unfilled placeholder: TODO:"))
        );
    }

    #[test]
    fn test_comment_only_yaml_block() {
        let content = complete_prp().replace(
            "url: https://example.com/docs",
            "# nothing here yet",
        );
        let report = validate_content(&content);
        assert!(
            report
                .errors
                .iter()
                .any(|e| e.contains("empty or only has comments"))
        );
    }

    #[test]
    fn test_long_line_flagged() {
        let content = complete_prp() + &"x".repeat(250);
        let report = validate_content(&content);
        assert!(report.errors.iter().any(|e| e.contains("too long")));
    }

    #[test]
    fn test_line_length_counts_chars_not_bytes() {
        // 150 chars but 300 bytes; must not be flagged.
        let content = complete_prp() + &"é".repeat(150) + "\n";
        let report = validate_content(&content);
        assert!(!report.errors.iter().any(|e| e.contains("too long")));

        let report = validate_content(&(complete_prp() + &"é".repeat(201) + "\n"));
        assert!(report.errors.iter().any(|e| e.contains("too long (201 chars)")));
    }

    #[test]
    fn test_status_scan() {
        let tmp = tempfile::tempdir().unwrap();
        let active = tmp.path().join("active.md");
        let done = tmp.path().join("done.md");
        std::fs::write(&active, "# PRP\nStatus: IN_PROGRESS\n").unwrap();
        std::fs::write(&done, "# PRP\nStatus: COMPLETED\n").unwrap();

        let hits = files_in_progress(&[active.clone(), done]);
        assert_eq!(hits, vec![active]);
    }

    #[test]
    fn test_status_must_be_line_anchored() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("note.md");
        std::fs::write(&path, "mentions Status: IN_PROGRESS mid-line\n").unwrap();
        assert!(files_in_progress(&[path]).is_empty());
    }

    #[test]
    fn test_validate_path_skips_templates() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("feature.md"), complete_prp()).unwrap();
        std::fs::write(tmp.path().join("prp-template.md"), "x").unwrap();
        std::fs::write(tmp.path().join("README.md"), "x").unwrap();

        let results = validate_path(tmp.path()).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_valid());
    }
}
