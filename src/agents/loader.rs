//! Agent file discovery and loading.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::frontmatter::{AgentFrontmatter, RawFrontmatter, parse_frontmatter};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One agent definition file, parsed.
#[derive(Debug, Clone)]
pub struct AgentEntry {
    pub path: PathBuf,
    /// File stem, used as the agent name when the frontmatter omits one.
    pub stem: String,
    pub content: String,
    pub raw: RawFrontmatter,
    pub meta: AgentFrontmatter,
}

impl AgentEntry {
    pub fn from_content(path: PathBuf, content: String) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let raw = parse_frontmatter(&content);
        let meta = AgentFrontmatter::from_raw(&raw);
        Self {
            path,
            stem,
            content,
            raw,
            meta,
        }
    }

    pub fn name(&self) -> &str {
        self.meta.name.as_deref().unwrap_or(&self.stem)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory the agent sits in, relative to the agents root: the first
    /// path component, or `root` for files directly under the agents dir.
    pub fn category(&self, agents_dir: &Path) -> String {
        self.path
            .strip_prefix(agents_dir)
            .ok()
            .and_then(|rel| {
                let mut parts = rel.components();
                let first = parts.next()?;
                parts.next()?;
                Some(first.as_os_str().to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "root".to_string())
    }
}

/// Locate the workspace `.claude` directory by walking up from `start`.
///
/// A candidate counts only if it contains an `agents` subdirectory.
pub fn find_claude_dir(start: &Path) -> Option<PathBuf> {
    for dir in start.ancestors() {
        let candidate = dir.join(".claude");
        if candidate.join("agents").is_dir() {
            return Some(candidate);
        }
    }
    None
}

/// Recursively collect agent markdown files under `agents_dir`.
///
/// Skips `README.md`, hidden entries, and build/vendor directories. Results
/// are sorted for deterministic reports.
pub fn discover_agent_files(agents_dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();
    walk(agents_dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || name == "node_modules" || name == "target" {
            continue;
        }

        let path = entry.path();
        if path.is_dir() {
            walk(&path, out)?;
        } else if name.ends_with(".md") && name != "README.md" {
            out.push(path);
        }
    }
    Ok(())
}

/// Load and parse every agent file under `agents_dir`.
pub fn load_agents(agents_dir: &Path) -> Result<Vec<AgentEntry>, LoadError> {
    let files = discover_agent_files(agents_dir)?;
    debug!(count = files.len(), dir = %agents_dir.display(), "discovered agent files");

    let mut agents = Vec::with_capacity(files.len());
    for path in files {
        let content = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        agents.push(AgentEntry::from_content(path, content));
    }
    Ok(agents)
}
