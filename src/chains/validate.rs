//! Structural and security validation of chain definitions.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::config::{ChainDef, ChainKind, ClaudeConfig, StepDef};
use crate::report::Report;

/// Trigger phrasings the system knows how to fire on.
const KNOWN_TRIGGER_PATTERNS: &[&str] = &[
    "code modification",
    "new file creation",
    "dependency changes",
    "new feature implementation",
    "test coverage below threshold",
    "explicit testing request",
    "public api changes",
    "architecture modifications",
    "release preparation",
    "production deployment",
];

/// Operations that must be covered by at least one chain trigger.
const CRITICAL_OPERATIONS: &[&str] = &[
    "code modification",
    "dependency changes",
    "production deployment",
];

const CONDITION_OPERATORS: &[&str] = &["==", "!=", ">", "<", ">=", "<=", "true", "false"];

/// Validate every chain definition plus system-wide integrity rules.
pub fn validate_chains(config: &ClaudeConfig) -> Report {
    let mut report = Report::new();
    for err in &config.load_errors {
        report.error(err.clone());
    }

    let Some(file) = config.chains.as_ref() else {
        report.error("No chain definitions found or failed to load");
        return report;
    };
    if file.chains.is_empty() {
        report.error("No chain definitions found or failed to load");
        return report;
    }

    let roster: BTreeSet<String> = config
        .orchestration
        .as_ref()
        .map(|orchestration| orchestration.agent_names())
        .unwrap_or_default();

    for (chain_id, chain) in &file.chains {
        validate_chain(chain_id, chain, &roster, &mut report);
    }

    validate_system_integrity(&file.chains, &mut report);
    validate_security_requirements(&file.chains, &mut report);

    report
}

fn validate_chain(chain_id: &str, chain: &ChainDef, roster: &BTreeSet<String>, report: &mut Report) {
    if chain.name.is_none() {
        report.error(format!("Chain '{chain_id}': Missing required field 'name'"));
    }
    if chain.description.is_none() {
        report.error(format!(
            "Chain '{chain_id}': Missing required field 'description'"
        ));
    }
    match chain.kind.as_deref() {
        None => report.error(format!("Chain '{chain_id}': Missing required field 'type'")),
        Some(kind) => {
            if ChainKind::parse(kind).is_none() {
                report.error(format!(
                    "Chain '{chain_id}': Invalid type '{kind}'. Must be one of: {:?}",
                    ChainKind::ALL
                ));
            }
        }
    }

    validate_sequence(chain_id, &chain.sequence, roster, report);
    validate_triggers(chain_id, &chain.triggers, report);
    validate_rules(chain_id, &chain.validation_rules, report);
}

fn validate_sequence(
    chain_id: &str,
    sequence: &[StepDef],
    roster: &BTreeSet<String>,
    report: &mut Report,
) {
    if sequence.is_empty() {
        report.error(format!("Chain '{chain_id}': Empty sequence"));
        return;
    }

    let mut available_outputs: HashSet<&str> = HashSet::new();

    for (i, step) in sequence.iter().enumerate() {
        let step_id = format!("Chain '{chain_id}', step {}", i + 1);

        let Some(agent) = step.agent.as_deref() else {
            report.error(format!("{step_id}: Missing 'agent' field"));
            continue;
        };
        if step.role.is_none() {
            report.error(format!("{step_id}: Missing 'role' field"));
        }
        if !roster.is_empty() && !roster.contains(agent) {
            report.error(format!(
                "{step_id}: Agent '{agent}' not found in orchestration config"
            ));
        }

        if !step.timeout_minutes.is_finite() || step.timeout_minutes <= 0.0 {
            report.warn(format!(
                "{step_id}: Invalid timeout '{}', should be positive number",
                step.timeout_minutes
            ));
        }

        if let Some(condition) = step.condition.as_deref()
            && !CONDITION_OPERATORS.iter().any(|op| condition.contains(op))
        {
            report.warn(format!(
                "{step_id}: Potentially invalid condition syntax: '{condition}'"
            ));
        }

        // Inputs must be produced by an earlier step.
        for input in &step.inputs {
            if !available_outputs.contains(input.as_str()) {
                report.warn(format!(
                    "{step_id}: Input '{input}' not produced by previous steps"
                ));
            }
        }
        available_outputs.extend(step.outputs.iter().map(String::as_str));
    }
}

fn validate_triggers(chain_id: &str, triggers: &[String], report: &mut Report) {
    if triggers.is_empty() {
        report.warn(format!("Chain '{chain_id}': No triggers defined"));
        return;
    }

    for trigger in triggers {
        let lower = trigger.to_lowercase();
        if !KNOWN_TRIGGER_PATTERNS
            .iter()
            .any(|pattern| lower.contains(pattern))
        {
            report.suggest(format!(
                "Chain '{chain_id}': Unusual trigger pattern '{trigger}' - verify intent"
            ));
        }
    }
}

fn validate_rules(chain_id: &str, rules: &[String], report: &mut Report) {
    if rules.is_empty() {
        report.warn(format!("Chain '{chain_id}': No validation rules defined"));
        return;
    }
    for rule in rules {
        if rule.trim().len() < 10 {
            report.warn(format!(
                "Chain '{chain_id}': Very short validation rule: '{rule}'"
            ));
        }
    }
}

fn validate_system_integrity(chains: &BTreeMap<String, ChainDef>, report: &mut Report) {
    let has_mandatory_security = chains.iter().any(|(chain_id, chain)| {
        chain.kind.as_deref() == Some("mandatory") && chain_id.to_lowercase().contains("security")
    });
    if !has_mandatory_security {
        report.error("No mandatory security chain found - security validation is required");
    }

    let mut covered: BTreeSet<&str> = BTreeSet::new();
    for chain in chains.values() {
        for trigger in &chain.triggers {
            let lower = trigger.to_lowercase();
            for op in CRITICAL_OPERATIONS {
                if lower.contains(op) {
                    covered.insert(op);
                }
            }
        }
    }
    let missing: Vec<&str> = CRITICAL_OPERATIONS
        .iter()
        .copied()
        .filter(|op| !covered.contains(op))
        .collect();
    if !missing.is_empty() {
        report.warn(format!(
            "Missing chain coverage for critical operations: {missing:?}"
        ));
    }

    check_handoff_cycles(chains, report);
}

/// Detect cycles in the agent handoff graph built from step order across
/// all chains.
fn check_handoff_cycles(chains: &BTreeMap<String, ChainDef>, report: &mut Report) {
    let mut graph: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    for chain in chains.values() {
        let agents: Vec<&str> = chain
            .sequence
            .iter()
            .filter_map(|step| step.agent.as_deref())
            .collect();
        for pair in agents.windows(2) {
            graph.entry(pair[0]).or_default().insert(pair[1]);
        }
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut in_stack: HashSet<&str> = HashSet::new();

    fn has_cycle<'a>(
        node: &'a str,
        graph: &HashMap<&'a str, BTreeSet<&'a str>>,
        visited: &mut HashSet<&'a str>,
        in_stack: &mut HashSet<&'a str>,
    ) -> bool {
        if in_stack.contains(node) {
            return true;
        }
        if !visited.insert(node) {
            return false;
        }
        in_stack.insert(node);
        if let Some(next) = graph.get(node) {
            for neighbor in next {
                if has_cycle(neighbor, graph, visited, in_stack) {
                    return true;
                }
            }
        }
        in_stack.remove(node);
        false
    }

    let nodes: Vec<&str> = graph.keys().copied().collect();
    for node in nodes {
        if !visited.contains(node) && has_cycle(node, &graph, &mut visited, &mut in_stack) {
            report.error(format!(
                "Circular dependency detected involving agent '{node}'"
            ));
            return;
        }
    }
}

fn validate_security_requirements(chains: &BTreeMap<String, ChainDef>, report: &mut Report) {
    let Some(security_chain) = chains.get("security_validation") else {
        report.error("Missing 'security_validation' chain - required for compliance");
        return;
    };

    let agents: Vec<&str> = security_chain
        .sequence
        .iter()
        .filter_map(|step| step.agent.as_deref())
        .collect();
    for required in ["code-reviewer", "security-orchestrator"] {
        if !agents.contains(&required) {
            report.error(format!(
                "Security chain missing required agent: '{required}'"
            ));
        }
    }

    for step in &security_chain.sequence {
        if step.agent.as_deref() == Some("security-orchestrator") && !step.required {
            report.error("security-orchestrator must be marked as required in security chain");
        }
    }
}
