//! Pre-tool-use hook plumbing.
//!
//! The host assistant invokes the gate once per tool call with a JSON
//! description of the call on stdin. The gate classifies it through the
//! safety filter and answers with a process exit code: `0` allows the call,
//! `2` blocks it and surfaces a `BLOCKED:` diagnostic on stderr. Every
//! allowed invocation is appended to a JSON audit log.

mod audit;
mod gate;

pub use audit::{AuditError, AuditLog, DEFAULT_LOG_PATH};
pub use gate::{EXIT_ALLOW, EXIT_BLOCK, Gate};

/// How the gate behaves on malformed input or internal error.
///
/// `Open` (the default) allows the call — an explicit availability-over-
/// strictness trade-off. Deployments that need strict denial opt into
/// `Closed`, which blocks instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailMode {
    Open,
    Closed,
}

impl Default for FailMode {
    fn default() -> Self {
        Self::Open
    }
}
