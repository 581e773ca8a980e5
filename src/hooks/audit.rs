//! Append-only JSON audit log.
//!
//! Stores every evaluated invocation as an entry in a single JSON array
//! file. The file grows without rotation; a corrupt log is replaced with a
//! fresh array rather than repaired.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::warn;

/// Default log location, relative to the working directory.
pub const DEFAULT_LOG_PATH: &str = "logs/pre_tool_use.json";

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write log {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Audit sink owned by the gate. No process-wide state: each gate run
/// constructs its own `AuditLog`.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry to the log array.
    ///
    /// Creates parent directories as needed. An unreadable or corrupt log
    /// file is discarded and a fresh array started; no backup is kept.
    pub fn append(&self, entry: &Value) -> Result<(), AuditError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| AuditError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut entries = self.read_entries();
        entries.push(entry.clone());

        let rendered = serde_json::to_string_pretty(&entries)
            .unwrap_or_else(|_| "[]".to_string());
        std::fs::write(&self.path, rendered).map_err(|source| AuditError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn read_entries(&self) -> Vec<Value> {
        let Ok(raw) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) | Err(_) => {
                warn!(path = %self.path.display(), "corrupt audit log, starting fresh");
                Vec::new()
            }
        }
    }
}
