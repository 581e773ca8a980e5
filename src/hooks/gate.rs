//! The invocation gate: one JSON tool-call description in, one exit code out.

use std::io::{Read, Write};

use serde::Deserialize;
use tracing::warn;

use crate::safety::{self, ENV_BLOCK_REASON, ToolInvocation};

use super::{AuditLog, FailMode};

/// Exit code for an allowed invocation (also used on internal errors when
/// failing open).
pub const EXIT_ALLOW: i32 = 0;

/// Exit code that blocks the tool call and shows the diagnostic to the host.
pub const EXIT_BLOCK: i32 = 2;

/// Wire form of one tool-call description.
#[derive(Debug, Deserialize)]
struct WireInvocation {
    #[serde(default)]
    tool_name: String,
    #[serde(default)]
    tool_input: serde_json::Value,
}

/// Single-shot pre-tool-use gate.
///
/// Owns its audit sink and fail-mode policy; lifecycle is one process
/// invocation.
pub struct Gate {
    audit: AuditLog,
    fail_mode: FailMode,
}

impl Gate {
    pub fn new(audit: AuditLog, fail_mode: FailMode) -> Self {
        Self { audit, fail_mode }
    }

    /// Evaluate one invocation read from `input`.
    ///
    /// Blocking diagnostics go to `diag` (stderr in production). Returns the
    /// process exit code. Malformed input follows the fail-mode policy;
    /// audit-write failures never change an already-computed verdict.
    pub fn run(&self, mut input: impl Read, diag: &mut impl Write) -> i32 {
        let mut raw = String::new();
        if input.read_to_string(&mut raw).is_err() {
            return self.fail(diag, "unreadable input");
        }

        let wire: WireInvocation = match serde_json::from_str(&raw) {
            Ok(wire) => wire,
            Err(err) => {
                warn!(%err, "malformed gate input");
                return self.fail(diag, "malformed JSON input");
            }
        };

        let invocation = ToolInvocation::from_wire(&wire.tool_name, &wire.tool_input);
        let verdict = safety::assess(&invocation);

        if verdict.blocked {
            let reason = verdict.reason.as_deref().unwrap_or("policy violation");
            let _ = writeln!(diag, "BLOCKED: {reason}");
            if reason == ENV_BLOCK_REASON {
                let _ = writeln!(diag, "Use .env.sample for template files instead");
            }
            return EXIT_BLOCK;
        }

        for warning in &verdict.warnings {
            warn!(tool = invocation.tool_name(), %warning);
        }

        // Log the raw wire object, not the typed form, so the audit trail
        // preserves parameters the filter does not inspect.
        let entry = serde_json::json!({
            "tool_name": wire.tool_name,
            "tool_input": wire.tool_input,
        });
        if let Err(err) = self.audit.append(&entry) {
            warn!(%err, "audit log write failed");
        }

        EXIT_ALLOW
    }

    fn fail(&self, diag: &mut impl Write, what: &str) -> i32 {
        match self.fail_mode {
            FailMode::Open => EXIT_ALLOW,
            FailMode::Closed => {
                let _ = writeln!(diag, "BLOCKED: {what} (fail-closed policy)");
                EXIT_BLOCK
            }
        }
    }
}
