//! Agent compliance checks: hierarchical placement, frontmatter structure,
//! tool allocation, model allocation, description format, and handoff chain
//! integrity.

use std::path::Path;

use crate::config::{ClaudeConfig, ToolPermissions};
use crate::report::Report;

use super::loader::AgentEntry;

/// Expected directory per agent name. Agents not listed here may live
/// anywhere.
const EXPECTED_PLACEMENT: &[(&str, &[&str])] = &[
    (
        "orchestrators",
        &[
            "workflow-orchestrator",
            "security-orchestrator",
            "code-lifecycle-manager",
        ],
    ),
    (
        "specialists",
        &[
            "security-scanner",
            "test-automator",
            "smart-doc-generator",
            "debugger",
            "pr-optimizer",
            "dependency-manager",
            "technical-researcher",
            "adr-creator",
            "ai-engineering-researcher",
            "context-engineer",
            "github-checker",
        ],
    ),
    (
        "analyzers",
        &[
            "code-reviewer",
            "test-coverage-analyzer",
            "work-completion-summary",
            "codebase-researcher",
        ],
    ),
    ("root", &["meta-agent", "the-librarian"]),
];

/// Agents allowed on the opus tier without a suggestion.
const OPUS_AGENTS: &[&str] = &["workflow-orchestrator", "meta-agent", "technical-researcher"];

/// Sections a structured description must carry.
const DESCRIPTION_SECTIONS: &[&str] = &[
    "ALWAYS use when:",
    "NEVER use when:",
    "Runs AFTER:",
    "Hands off to:",
];

const REQUIRED_FIELDS: &[&str] = &["name", "description", "model"];

/// Check every loaded agent against the hierarchy rules.
///
/// Config load failures become errors; an empty agent set is itself an
/// error.
pub fn check_agents(entries: &[AgentEntry], agents_dir: &Path, config: &ClaudeConfig) -> Report {
    let mut report = Report::new();
    for err in &config.load_errors {
        report.error(err.clone());
    }

    if entries.is_empty() {
        report.error("No agent files found");
        return report;
    }

    let roster = config
        .orchestration
        .as_ref()
        .map(|orchestration| orchestration.agent_names());

    for entry in entries {
        check_entry(
            entry,
            agents_dir,
            config.permissions.as_ref(),
            roster.as_ref(),
            &mut report,
        );
    }

    report
}

fn check_entry(
    entry: &AgentEntry,
    agents_dir: &Path,
    permissions: Option<&ToolPermissions>,
    roster: Option<&std::collections::BTreeSet<String>>,
    report: &mut Report,
) {
    if entry.raw.is_empty() {
        report.error(format!(
            "{}: Missing or invalid frontmatter",
            entry.file_name()
        ));
        return;
    }

    let name = entry.name().to_string();

    check_placement(entry, agents_dir, &name, report);
    check_required_fields(entry, &name, report);
    check_tool_allocation(entry, &name, permissions, report);
    check_model_allocation(entry, &name, report);
    check_description_format(entry, &name, report);
    check_handoffs(entry, &name, roster, report);
}

fn check_placement(entry: &AgentEntry, agents_dir: &Path, name: &str, report: &mut Report) {
    let directory = entry.category(agents_dir);
    let expected = EXPECTED_PLACEMENT
        .iter()
        .find(|(_, agents)| agents.contains(&name))
        .map(|(dir, _)| *dir);

    if let Some(expected) = expected
        && expected != directory
    {
        if expected == "root" {
            report.error(format!(
                "{name}: Should be in root directory, not {directory}/"
            ));
        } else {
            report.error(format!(
                "{name}: Should be in {expected}/ directory, not {directory}/"
            ));
        }
    }
}

fn check_required_fields(entry: &AgentEntry, name: &str, report: &mut Report) {
    for field in REQUIRED_FIELDS {
        if !entry.raw.contains_key(*field) {
            report.error(format!(
                "{name}: Missing required field '{field}' in frontmatter"
            ));
        }
    }
}

fn check_tool_allocation(
    entry: &AgentEntry,
    name: &str,
    permissions: Option<&ToolPermissions>,
    report: &mut Report,
) {
    let tools = &entry.meta.tools;
    // No tools listed means full access; nothing to check.
    if tools.is_empty() {
        return;
    }

    if let Some(tier) = entry.meta.model_tier()
        && let Some(budget) = tier.tool_budget()
        && tools.len() > budget
    {
        report.warn(format!(
            "{name}: {} model should have \u{2264}{budget} tools, has {}",
            capitalize(tier.as_str()),
            tools.len()
        ));
    }

    let Some(allowed) = permissions
        .and_then(|p| p.agent_permissions.get(name))
        .map(|p| &p.specific_tools)
    else {
        return;
    };

    for tool in tools {
        // Task is the delegation primitive and always permitted.
        if tool == "Task" {
            continue;
        }
        if !allowed
            .iter()
            .any(|pattern| ToolPermissions::tool_matches(tool, pattern))
        {
            report.error(format!("{name}: Tool '{tool}' not in allowed list"));
        }
    }
}

fn check_model_allocation(entry: &AgentEntry, name: &str, report: &mut Report) {
    if entry.meta.model_tier() == Some(super::ModelTier::Opus) && !OPUS_AGENTS.contains(&name) {
        report.suggest(format!(
            "{name}: Consider if Opus is needed - reserved for orchestration/high complexity"
        ));
    }
}

fn check_description_format(entry: &AgentEntry, name: &str, report: &mut Report) {
    let Some(description) = entry.meta.description.as_deref() else {
        return;
    };

    if !description.contains("ALWAYS use when:") && !description.contains("NEVER use when:") {
        report.warn(format!(
            "{name}: Should use new description format with ALWAYS/NEVER triggers"
        ));
        return;
    }

    for section in DESCRIPTION_SECTIONS {
        if !description.contains(section) {
            report.warn(format!("{name}: Missing '{section}' in description"));
        }
    }
}

fn check_handoffs(
    entry: &AgentEntry,
    name: &str,
    roster: Option<&std::collections::BTreeSet<String>>,
    report: &mut Report,
) {
    let description = entry.meta.description.as_deref().unwrap_or_default();

    // Mandatory security chain: every code review hands off to the security
    // orchestrator.
    if name == "code-reviewer" && !description.contains("security-orchestrator") {
        report.error(format!(
            "{name}: Must hand off to security-orchestrator (mandatory security chain)"
        ));
    }

    let Some(roster) = roster else {
        return;
    };
    let Some(handoff_line) = description
        .lines()
        .find_map(|line| line.trim_start().strip_prefix("Hands off to:"))
    else {
        return;
    };

    for target in handoff_line.split(',').map(str::trim) {
        if target.is_empty() || target.starts_with("None") {
            continue;
        }
        if !roster.contains(target) {
            report.suggest(format!(
                "{name}: Handoff to '{target}' - verify agent exists"
            ));
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
