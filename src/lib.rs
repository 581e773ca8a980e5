//! Toolkit for a multi-agent AI coding-assistant configuration: a
//! pre-tool-use safety gate, agent/chain/PRP validators, and frontmatter
//! fixers.

pub mod agents;
pub mod chains;
pub mod config;
pub mod hooks;
pub mod prp;
pub mod report;
pub mod safety;
pub mod settings;
