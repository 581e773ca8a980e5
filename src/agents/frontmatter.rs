//! Agent-file frontmatter parsing.
//!
//! Agent definitions are markdown files whose YAML frontmatter (delimited by
//! `---` lines) carries the agent metadata: name, description, model tier,
//! tool list. The parser is deliberately hand-rolled and lenient — the fixers
//! must be able to read files whose frontmatter is not valid YAML (quoted
//! descriptions with raw embedded newlines are the common breakage).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Raw frontmatter key-value pairs from an agent file.
pub type RawFrontmatter = HashMap<String, String>;

/// Model tier an agent runs on. Tool budgets scale with tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Haiku,
    Sonnet,
    Opus,
}

impl ModelTier {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "haiku" => Some(Self::Haiku),
            "sonnet" => Some(Self::Sonnet),
            "opus" => Some(Self::Opus),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Haiku => "haiku",
            Self::Sonnet => "sonnet",
            Self::Opus => "opus",
        }
    }

    /// Cognitive-load ceiling: how many tools an agent on this tier should
    /// hold at most. `None` means no fixed ceiling.
    pub fn tool_budget(&self) -> Option<usize> {
        match self {
            Self::Haiku => Some(3),
            Self::Sonnet => Some(7),
            Self::Opus => None,
        }
    }
}

/// Typed agent metadata resolved from the raw frontmatter.
#[derive(Debug, Clone, Default)]
pub struct AgentFrontmatter {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Model string as written (kept for diagnostics on unknown tiers).
    pub model: Option<String>,
    pub tools: Vec<String>,
    pub color: Option<String>,
}

impl AgentFrontmatter {
    pub fn from_raw(raw: &RawFrontmatter) -> Self {
        Self {
            name: raw.get("name").cloned(),
            description: raw.get("description").cloned(),
            model: raw.get("model").cloned(),
            tools: raw.get("tools").map(|t| parse_tools(t)).unwrap_or_default(),
            color: raw.get("color").cloned(),
        }
    }

    pub fn model_tier(&self) -> Option<ModelTier> {
        self.model.as_deref().and_then(ModelTier::parse)
    }
}

/// Parse YAML frontmatter from an agent markdown file.
///
/// Returns an empty map if no frontmatter is found or the block is
/// malformed beyond recovery.
pub fn parse_frontmatter(content: &str) -> RawFrontmatter {
    let trimmed = content.trim_start();
    if !trimmed.starts_with("---") {
        return RawFrontmatter::new();
    }

    let after_first = &trimmed[3..];
    let rest = after_first.trim_start_matches(['\r', '\n']);

    let Some(closing_pos) = rest.find("\n---") else {
        return RawFrontmatter::new();
    };

    parse_yaml_block(&rest[..closing_pos])
}

/// Parse a simple YAML block into key-value pairs.
///
/// Handles single-line values, block scalars (`key: |`), and indented
/// continuation lines.
fn parse_yaml_block(yaml: &str) -> RawFrontmatter {
    let mut map = RawFrontmatter::new();
    let mut current_key: Option<String> = None;
    let mut current_value = String::new();

    for line in yaml.lines() {
        if !line.starts_with(' ') && !line.starts_with('\t') {
            flush(&mut map, &current_key, &current_value);

            if let Some(colon_pos) = line.find(':') {
                let key = line[..colon_pos].trim().to_string();
                let value = line[colon_pos + 1..].trim().to_string();
                current_key = Some(key);
                // Block scalar marker: content follows on indented lines.
                current_value = if value == "|" || value == ">" {
                    String::new()
                } else {
                    value
                };
            } else {
                current_key = None;
                current_value.clear();
            }
        } else if current_key.is_some() {
            if !current_value.is_empty() {
                current_value.push('\n');
            }
            current_value.push_str(line.trim_start());
        }
    }
    flush(&mut map, &current_key, &current_value);

    map
}

fn flush(map: &mut RawFrontmatter, key: &Option<String>, value: &str) {
    if let Some(key) = key {
        let val = value.trim();
        if !val.is_empty() {
            map.insert(key.clone(), strip_yaml_quotes(val));
        }
    }
}

/// Strip surrounding quotes from a YAML string value.
fn strip_yaml_quotes(s: &str) -> String {
    let trimmed = s.trim();
    if (trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2)
        || (trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2)
    {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Normalize a tools value: either a comma-separated string or a YAML list
/// captured as `- item` continuation lines.
pub fn parse_tools(raw: &str) -> Vec<String> {
    let items: Vec<String> = if raw.lines().any(|l| l.trim_start().starts_with("- ")) {
        raw.lines()
            .filter_map(|l| l.trim_start().strip_prefix("- "))
            .map(|s| s.trim().to_string())
            .collect()
    } else {
        raw.split(',').map(|s| s.trim().to_string()).collect()
    };
    items.into_iter().filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_agent() {
        let content = r#"---
name: code-reviewer
description: Reviews code for quality and security issues.
model: sonnet
tools: Read, Grep, Glob
---
# Code Reviewer
Instructions here.
"#;
        let raw = parse_frontmatter(content);
        let fm = AgentFrontmatter::from_raw(&raw);
        assert_eq!(fm.name.as_deref(), Some("code-reviewer"));
        assert_eq!(fm.model_tier(), Some(ModelTier::Sonnet));
        assert_eq!(fm.tools, vec!["Read", "Grep", "Glob"]);
    }

    #[test]
    fn test_parse_block_scalar_description() {
        let content = r#"---
name: debugger
description: |
  ALWAYS use when: tests fail unexpectedly
  NEVER use when: writing new features
model: sonnet
---
"#;
        let raw = parse_frontmatter(content);
        let description = raw.get("description").unwrap();
        assert!(description.starts_with("ALWAYS use when:"));
        assert!(description.contains("NEVER use when:"));
    }

    #[test]
    fn test_parse_tools_yaml_list() {
        let content = "---\nname: x\ntools:\n  - Read\n  - Write\n---\n";
        let raw = parse_frontmatter(content);
        let fm = AgentFrontmatter::from_raw(&raw);
        assert_eq!(fm.tools, vec!["Read", "Write"]);
    }

    #[test]
    fn test_no_frontmatter() {
        assert!(parse_frontmatter("# Just markdown\n").is_empty());
        assert!(parse_frontmatter("---\nnever closed\n").is_empty());
    }

    #[test]
    fn test_quoted_values() {
        let content = "---\nname: \"meta-agent\"\ncolor: 'blue'\n---\n";
        let raw = parse_frontmatter(content);
        assert_eq!(raw.get("name").unwrap(), "meta-agent");
        assert_eq!(raw.get("color").unwrap(), "blue");
    }

    #[test]
    fn test_model_tier_budget() {
        assert_eq!(ModelTier::Haiku.tool_budget(), Some(3));
        assert_eq!(ModelTier::Sonnet.tool_budget(), Some(7));
        assert_eq!(ModelTier::Opus.tool_budget(), None);
    }

    #[test]
    fn test_unknown_model_tier() {
        assert_eq!(ModelTier::parse("gpt-4"), None);
    }
}
