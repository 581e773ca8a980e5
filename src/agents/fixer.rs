//! Mechanical fixers for common agent frontmatter breakage.
//!
//! Three rewrites, each a pure function on file content so it can be
//! previewed in dry-run mode: quoted descriptions with embedded newlines
//! become block scalars, wrapped `tools:` lines are joined, and duplicated
//! description tails are dropped.

use std::path::{Path, PathBuf};

use crate::safety::lazy_re;

use super::loader::discover_agent_files;

#[derive(Debug, thiserror::Error)]
pub enum FixError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Discover(#[from] super::loader::LoadError),
}

/// What a fix pass did to one file.
#[derive(Debug, Clone)]
pub struct FixOutcome {
    pub path: PathBuf,
    pub applied: Vec<&'static str>,
}

/// Rewrite a single-quoted description containing raw newlines into a block
/// scalar. Returns `None` when nothing needed fixing.
pub fn fix_description_newlines(content: &str) -> Option<String> {
    let re = lazy_re!(r"(?s)description: '([^']*\n[^']*)'");

    let caps = re.captures(content)?;
    let whole = caps.get(0)?;
    let inner = caps.get(1)?.as_str();

    let mut block = String::from("description: |");
    for line in inner.lines() {
        block.push_str("\n  ");
        block.push_str(line.trim());
    }

    let mut fixed = String::with_capacity(content.len());
    fixed.push_str(&content[..whole.start()]);
    fixed.push_str(&block);
    fixed.push_str(&content[whole.end()..]);
    Some(fixed)
}

/// Join a `tools:` line that wrapped onto indented continuation lines back
/// into a single line. Returns `None` when nothing needed fixing.
pub fn fix_tools_line(content: &str) -> Option<String> {
    let re = lazy_re!(r"tools: ([^\n]+),\n  ([^\n]+)");

    let mut current = content.to_string();
    let mut changed = false;
    // One pass joins one continuation line; iterate to a fixpoint.
    loop {
        let next = re.replace_all(&current, "tools: $1, $2");
        if next == current {
            break;
        }
        current = next.into_owned();
        changed = true;
    }
    changed.then_some(current)
}

/// Remove a duplicated tail inside a block-scalar description: the first
/// four indented lines are kept, a repeated `NEVER use when:` ..
/// `Hands off to:` chunk after them is dropped. Returns `None` when nothing
/// needed fixing.
pub fn clean_duplicate_description(content: &str) -> Option<String> {
    let re = lazy_re!(
        r"(?s)(description: \|\n(?:  [^\n]*\n){4})(\n  NEVER use when:.*?\n  Hands off to:.*?)'?"
    );

    let caps = re.captures(content)?;
    let whole = caps.get(0)?;
    let keep = caps.get(1)?.as_str().trim_end();

    let mut fixed = String::with_capacity(content.len());
    fixed.push_str(&content[..whole.start()]);
    fixed.push_str(keep);
    fixed.push_str(&content[whole.end()..]);
    Some(fixed)
}

/// Run all fixers over every agent file under `agents_dir`.
///
/// Returns an outcome per file that needed changes. With `dry_run` set the
/// files are left untouched.
pub fn fix_agents(agents_dir: &Path, dry_run: bool) -> Result<Vec<FixOutcome>, FixError> {
    let mut outcomes = Vec::new();

    for path in discover_agent_files(agents_dir)? {
        let original = std::fs::read_to_string(&path).map_err(|source| FixError::Read {
            path: path.clone(),
            source,
        })?;

        let mut content = original.clone();
        let mut applied = Vec::new();

        if let Some(fixed) = fix_description_newlines(&content) {
            content = fixed;
            applied.push("description-newlines");
        }
        if let Some(fixed) = fix_tools_line(&content) {
            content = fixed;
            applied.push("tools-formatting");
        }
        if let Some(fixed) = clean_duplicate_description(&content) {
            content = fixed;
            applied.push("duplicate-description");
        }

        if applied.is_empty() {
            continue;
        }

        if !dry_run {
            std::fs::write(&path, &content).map_err(|source| FixError::Write {
                path: path.clone(),
                source,
            })?;
        }
        outcomes.push(FixOutcome { path, applied });
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_description_newlines_to_block_scalar() {
        let content = "---\nname: debugger\ndescription: 'ALWAYS use when: x\n  NEVER use when: y'\nmodel: sonnet\n---\nbody\n";
        let fixed = fix_description_newlines(content).unwrap();
        assert!(fixed.contains("description: |\n  ALWAYS use when: x\n  NEVER use when: y"));
        assert!(!fixed.contains('\''));
    }

    #[test]
    fn test_description_single_line_untouched() {
        let content = "---\ndescription: 'one line'\n---\n";
        assert!(fix_description_newlines(content).is_none());
    }

    #[test]
    fn test_tools_line_joined() {
        let content = "---\ntools: Read, Grep,\n  Write, Edit\n---\n";
        let fixed = fix_tools_line(content).unwrap();
        assert!(fixed.contains("tools: Read, Grep, Write, Edit"));
    }

    #[test]
    fn test_tools_multiple_continuations() {
        let content = "tools: A,\n  B,\n  C\n";
        let fixed = fix_tools_line(content).unwrap();
        assert_eq!(fixed, "tools: A, B, C\n");
    }

    #[test]
    fn test_duplicate_description_tail_removed() {
        let content = "---\ndescription: |\n  ALWAYS use when: x\n  NEVER use when: y\n  Runs AFTER: z\n  Hands off to: w\n\n  NEVER use when: y\n  Hands off to: w\nmodel: sonnet\n---\n";
        let fixed = clean_duplicate_description(content).unwrap();
        assert_eq!(fixed.matches("NEVER use when:").count(), 1);
        assert!(fixed.contains("model: sonnet"));
    }

    #[test]
    fn test_fix_agents_dry_run_leaves_files() {
        let tmp = tempfile::tempdir().unwrap();
        let agents = tmp.path().join("agents");
        std::fs::create_dir_all(&agents).unwrap();
        let path = agents.join("debugger.md");
        let content = "---\ntools: Read,\n  Write\n---\n";
        std::fs::write(&path, content).unwrap();

        let outcomes = fix_agents(&agents, true).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].applied, vec!["tools-formatting"]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn test_fix_agents_writes_changes() {
        let tmp = tempfile::tempdir().unwrap();
        let agents = tmp.path().join("agents");
        std::fs::create_dir_all(&agents).unwrap();
        let path = agents.join("debugger.md");
        std::fs::write(&path, "---\ntools: Read,\n  Write\n---\n").unwrap();

        fix_agents(&agents, false).unwrap();
        let fixed = std::fs::read_to_string(&path).unwrap();
        assert!(fixed.contains("tools: Read, Write"));
    }
}
