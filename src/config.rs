//! On-disk configuration under `.claude/agents/config/`.
//!
//! Three YAML documents drive the validators: chain definitions, the agent
//! orchestration roster, and the tool-permissions matrix. Fields are kept
//! optional so structural validation can report what is missing instead of
//! failing at deserialization.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const CHAIN_DEFINITIONS_FILE: &str = "chain-definitions.yaml";
pub const ORCHESTRATION_FILE: &str = "agent-orchestration.yaml";
pub const TOOL_PERMISSIONS_FILE: &str = "tool-permissions.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// `chain-definitions.yaml` root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainFile {
    #[serde(default)]
    pub chains: BTreeMap<String, ChainDef>,
}

/// One chain of agent invocations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainDef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Chain type as written; validated against [`ChainKind`].
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub sequence: Vec<StepDef>,
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default)]
    pub validation_rules: Vec<String>,
}

/// One step in a chain sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepDef {
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Defaults to true: steps are required unless opted out.
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default = "default_timeout")]
    pub timeout_minutes: f64,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
}

fn default_required() -> bool {
    true
}

fn default_timeout() -> f64 {
    10.0
}

/// Valid chain types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKind {
    Mandatory,
    Optional,
    AutoTrigger,
    ManualTrigger,
}

impl ChainKind {
    pub const ALL: &[&str] = &["mandatory", "optional", "auto_trigger", "manual_trigger"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mandatory" => Some(Self::Mandatory),
            "optional" => Some(Self::Optional),
            "auto_trigger" => Some(Self::AutoTrigger),
            "manual_trigger" => Some(Self::ManualTrigger),
            _ => None,
        }
    }
}

/// `agent-orchestration.yaml` root: the roster of known agents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Orchestration {
    #[serde(default)]
    pub orchestrators: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub categories: BTreeMap<String, Category>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub agents: Vec<String>,
}

impl Orchestration {
    /// All agent names known to the roster (orchestrators + categories).
    pub fn agent_names(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self.orchestrators.keys().cloned().collect();
        for category in self.categories.values() {
            names.extend(category.agents.iter().cloned());
        }
        names
    }
}

/// `tool-permissions.yaml` root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolPermissions {
    #[serde(default)]
    pub agent_permissions: BTreeMap<String, AgentPermissions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentPermissions {
    #[serde(default)]
    pub specific_tools: Vec<String>,
}

impl ToolPermissions {
    /// Does `tool` match an allow pattern? Patterns are exact names or
    /// `prefix*` globs.
    pub fn tool_matches(tool: &str, pattern: &str) -> bool {
        if pattern == tool {
            return true;
        }
        pattern
            .strip_suffix('*')
            .is_some_and(|prefix| tool.starts_with(prefix))
    }
}

fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Everything loadable from `.claude/agents/config/`, with per-file load
/// failures collected instead of aborting.
#[derive(Debug, Default)]
pub struct ClaudeConfig {
    pub chains: Option<ChainFile>,
    pub orchestration: Option<Orchestration>,
    pub permissions: Option<ToolPermissions>,
    pub load_errors: Vec<String>,
}

impl ClaudeConfig {
    pub fn load(config_dir: &Path) -> Self {
        let mut config = Self::default();

        match load_yaml::<ChainFile>(&config_dir.join(CHAIN_DEFINITIONS_FILE)) {
            Ok(chains) => config.chains = Some(chains),
            Err(err) => config
                .load_errors
                .push(format!("Failed to load {CHAIN_DEFINITIONS_FILE}: {err}")),
        }
        match load_yaml::<Orchestration>(&config_dir.join(ORCHESTRATION_FILE)) {
            Ok(orchestration) => config.orchestration = Some(orchestration),
            Err(err) => config
                .load_errors
                .push(format!("Failed to load {ORCHESTRATION_FILE}: {err}")),
        }
        match load_yaml::<ToolPermissions>(&config_dir.join(TOOL_PERMISSIONS_FILE)) {
            Ok(permissions) => config.permissions = Some(permissions),
            Err(err) => config
                .load_errors
                .push(format!("Failed to load {TOOL_PERMISSIONS_FILE}: {err}")),
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAINS_YAML: &str = r#"
chains:
  security_validation:
    name: Security Validation
    description: Mandatory review chain
    type: mandatory
    sequence:
      - agent: code-reviewer
        role: reviewer
        outputs: [review_notes]
      - agent: security-orchestrator
        role: security
        required: true
        inputs: [review_notes]
    triggers:
      - code modification
    validation_rules:
      - All findings must be addressed before merge
"#;

    #[test]
    fn test_parse_chain_file() {
        let file: ChainFile = serde_yaml::from_str(CHAINS_YAML).unwrap();
        let chain = &file.chains["security_validation"];
        assert_eq!(chain.kind.as_deref(), Some("mandatory"));
        assert_eq!(chain.sequence.len(), 2);
        assert!(chain.sequence[0].required);
        assert_eq!(chain.sequence[0].timeout_minutes, 10.0);
        assert_eq!(chain.sequence[1].inputs, vec!["review_notes"]);
    }

    #[test]
    fn test_chain_kind_parse() {
        assert_eq!(ChainKind::parse("mandatory"), Some(ChainKind::Mandatory));
        assert_eq!(ChainKind::parse("auto_trigger"), Some(ChainKind::AutoTrigger));
        assert_eq!(ChainKind::parse("bogus"), None);
    }

    #[test]
    fn test_orchestration_agent_names() {
        let yaml = r#"
orchestrators:
  workflow-orchestrator: {}
  security-orchestrator: {}
categories:
  analyzers:
    agents: [code-reviewer, test-coverage-analyzer]
"#;
        let orch: Orchestration = serde_yaml::from_str(yaml).unwrap();
        let names = orch.agent_names();
        assert!(names.contains("workflow-orchestrator"));
        assert!(names.contains("code-reviewer"));
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_tool_pattern_matching() {
        assert!(ToolPermissions::tool_matches("Read", "Read"));
        assert!(ToolPermissions::tool_matches("mcp__github__search", "mcp__github__*"));
        assert!(!ToolPermissions::tool_matches("Write", "Read"));
    }

    #[test]
    fn test_load_errors_collected() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ClaudeConfig::load(tmp.path());
        assert!(config.chains.is_none());
        assert_eq!(config.load_errors.len(), 3);
    }
}
