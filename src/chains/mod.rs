//! Chain configuration validation and the chain execution scaffold.
//!
//! Chain definitions live in `.claude/agents/config/chain-definitions.yaml`
//! (types in [`crate::config`]). This module checks them for structural and
//! security compliance and can walk a chain's sequence with per-step
//! timeouts and condition gating.

pub mod executor;
pub mod validate;

pub use executor::{ChainExecutor, ChainRun, ChainStatus, StepRecord, StepStatus};
pub use validate::validate_chains;
