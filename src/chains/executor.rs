//! Chain execution scaffold.
//!
//! Walks a chain's sequence in order with per-step timeout enforcement and
//! condition gating against a caller-supplied context. The step body is
//! simulated work; wiring a real agent invocation in is the integration
//! point this scaffold leaves open.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ChainDef;

/// How long a simulated step body runs.
const SIMULATED_STEP: Duration = Duration::from_millis(10);

/// Budget used when a step's timeout is non-finite, negative, or too large
/// for a `Duration`. Matches the per-step default.
const FALLBACK_BUDGET: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Timeout,
    /// Stopped early: a required step failed.
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Waiting,
    Running,
    Completed,
    Failed,
    Skipped,
    Timeout,
}

/// Audit record for one executed (or skipped) step.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub agent: String,
    pub role: Option<String>,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub detail: Option<String>,
}

/// Outcome of one chain run.
#[derive(Debug, Clone, Serialize)]
pub struct ChainRun {
    pub chain_id: String,
    pub status: ChainStatus,
    pub steps: Vec<StepRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

pub struct ChainExecutor {
    dry_run: bool,
}

impl ChainExecutor {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Run `chain` against `context`, producing a full step audit trail.
    pub async fn run(
        &self,
        chain_id: &str,
        chain: &ChainDef,
        context: &HashMap<String, String>,
    ) -> ChainRun {
        let mut run = ChainRun {
            chain_id: chain_id.to_string(),
            status: ChainStatus::Running,
            steps: Vec::with_capacity(chain.sequence.len()),
            started_at: Utc::now(),
            finished_at: None,
        };
        info!(chain = chain_id, steps = chain.sequence.len(), dry_run = self.dry_run, "chain started");

        for step in &chain.sequence {
            let agent = step.agent.clone().unwrap_or_default();
            let mut record = StepRecord {
                agent: agent.clone(),
                role: step.role.clone(),
                status: StepStatus::Waiting,
                started_at: None,
                finished_at: None,
                detail: None,
            };

            // A step without an agent cannot run; a required one halts the
            // chain, matching the required-step-failure rule below.
            if agent.is_empty() {
                record.status = StepStatus::Failed;
                record.detail = Some("step has no agent".to_string());
                warn!(chain = chain_id, "step without agent");
                let required = step.required;
                run.steps.push(record);
                if required {
                    run.status = ChainStatus::Halted;
                    break;
                }
                continue;
            }

            if let Some(condition) = step.condition.as_deref()
                && !eval_condition(condition, context)
            {
                record.status = StepStatus::Skipped;
                record.detail = Some(format!("condition not met: {condition}"));
                debug!(chain = chain_id, agent, condition, "step skipped");
                run.steps.push(record);
                continue;
            }

            record.status = StepStatus::Running;
            record.started_at = Some(Utc::now());

            // timeout_minutes comes straight from YAML; `.inf` and absurd
            // magnitudes deserialize fine and must not panic here.
            let budget = Duration::try_from_secs_f64(step.timeout_minutes * 60.0)
                .unwrap_or(FALLBACK_BUDGET);
            let outcome = if self.dry_run {
                Ok(())
            } else {
                tokio::time::timeout(budget, simulate_step())
                    .await
                    .map_err(|_| ())
            };
            record.finished_at = Some(Utc::now());

            match outcome {
                Ok(()) => {
                    record.status = StepStatus::Completed;
                    debug!(chain = chain_id, agent, "step completed");
                    run.steps.push(record);
                }
                Err(()) => {
                    record.status = StepStatus::Timeout;
                    record.detail = Some(format!(
                        "exceeded timeout of {} minutes",
                        step.timeout_minutes
                    ));
                    warn!(chain = chain_id, agent, "step timed out");
                    let required = step.required;
                    run.steps.push(record);
                    if required {
                        run.status = ChainStatus::Timeout;
                        break;
                    }
                }
            }
        }

        if run.status == ChainStatus::Running {
            run.status = ChainStatus::Completed;
        }
        run.finished_at = Some(Utc::now());
        info!(chain = chain_id, status = ?run.status, "chain finished");
        run
    }
}

// Stands in for the real agent invocation.
async fn simulate_step() {
    tokio::time::sleep(SIMULATED_STEP).await;
}

/// Evaluate a step condition against the context map.
///
/// Supports `true`/`false` literals and `key == value` / `key != value`
/// comparisons; anything else evaluates to true so an unparseable condition
/// never silently drops a step.
pub fn eval_condition(condition: &str, context: &HashMap<String, String>) -> bool {
    let trimmed = condition.trim();
    match trimmed {
        "true" => return true,
        "false" => return false,
        _ => {}
    }

    for (op, negate) in [("==", false), ("!=", true)] {
        if let Some((key, value)) = trimmed.split_once(op) {
            let key = key.trim();
            let value = value.trim().trim_matches('\'').trim_matches('"');
            let matches = context.get(key).is_some_and(|v| v == value);
            return matches != negate;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainFile;

    fn chain(yaml: &str) -> ChainDef {
        let file: ChainFile = serde_yaml::from_str(yaml).unwrap();
        file.chains.into_values().next().unwrap()
    }

    fn ctx(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_runs_all_steps() {
        let c = chain(
            r#"
chains:
  demo:
    sequence:
      - agent: code-reviewer
        role: reviewer
      - agent: security-orchestrator
        role: security
"#,
        );
        let run = ChainExecutor::new(false).run("demo", &c, &HashMap::new()).await;
        assert_eq!(run.status, ChainStatus::Completed);
        assert_eq!(run.steps.len(), 2);
        assert!(run.steps.iter().all(|s| s.status == StepStatus::Completed));
        assert!(run.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_condition_skips_optional_step() {
        let c = chain(
            r#"
chains:
  demo:
    sequence:
      - agent: debugger
        role: fixer
        required: false
        condition: tests_failed == yes
      - agent: code-reviewer
        role: reviewer
"#,
        );
        let run = ChainExecutor::new(false)
            .run("demo", &c, &ctx(&[("tests_failed", "no")]))
            .await;
        assert_eq!(run.status, ChainStatus::Completed);
        assert_eq!(run.steps[0].status, StepStatus::Skipped);
        assert_eq!(run.steps[1].status, StepStatus::Completed);
    }

    #[tokio::test]
    async fn test_unmet_condition_skips_required_step_too() {
        let c = chain(
            r#"
chains:
  demo:
    sequence:
      - agent: code-reviewer
        role: reviewer
        condition: reviewed == yes
      - agent: security-orchestrator
        role: security
"#,
        );
        let run = ChainExecutor::new(false).run("demo", &c, &HashMap::new()).await;
        assert_eq!(run.status, ChainStatus::Completed);
        assert_eq!(run.steps[0].status, StepStatus::Skipped);
        assert_eq!(run.steps[1].status, StepStatus::Completed);
    }

    #[tokio::test]
    async fn test_required_step_without_agent_halts_chain() {
        let c = chain(
            r#"
chains:
  demo:
    sequence:
      - role: reviewer
      - agent: security-orchestrator
        role: security
"#,
        );
        let run = ChainExecutor::new(false).run("demo", &c, &HashMap::new()).await;
        assert_eq!(run.status, ChainStatus::Halted);
        assert_eq!(run.steps.len(), 1);
        assert_eq!(run.steps[0].status, StepStatus::Failed);
    }

    #[tokio::test]
    async fn test_optional_step_without_agent_continues() {
        let c = chain(
            r#"
chains:
  demo:
    sequence:
      - role: reviewer
        required: false
      - agent: security-orchestrator
        role: security
"#,
        );
        let run = ChainExecutor::new(false).run("demo", &c, &HashMap::new()).await;
        assert_eq!(run.status, ChainStatus::Completed);
        assert_eq!(run.steps[0].status, StepStatus::Failed);
        assert_eq!(run.steps[1].status, StepStatus::Completed);
    }

    #[tokio::test]
    async fn test_required_step_timeout_fails_chain() {
        let c = chain(
            r#"
chains:
  demo:
    sequence:
      - agent: code-reviewer
        role: reviewer
        timeout_minutes: 0.000001
      - agent: security-orchestrator
        role: security
"#,
        );
        let run = ChainExecutor::new(false).run("demo", &c, &HashMap::new()).await;
        assert_eq!(run.status, ChainStatus::Timeout);
        assert_eq!(run.steps.len(), 1);
        assert_eq!(run.steps[0].status, StepStatus::Timeout);
    }

    #[tokio::test]
    async fn test_absurd_timeout_values_do_not_panic() {
        let c = chain(
            r#"
chains:
  demo:
    sequence:
      - agent: code-reviewer
        role: reviewer
        timeout_minutes: 1.0e300
      - agent: security-orchestrator
        role: security
        timeout_minutes: .inf
      - agent: pr-optimizer
        role: packager
        timeout_minutes: -3
"#,
        );
        let run = ChainExecutor::new(false).run("demo", &c, &HashMap::new()).await;
        assert_eq!(run.status, ChainStatus::Completed);
        assert!(run.steps.iter().all(|s| s.status == StepStatus::Completed));
    }

    #[tokio::test]
    async fn test_dry_run_ignores_timeouts() {
        let c = chain(
            r#"
chains:
  demo:
    sequence:
      - agent: code-reviewer
        role: reviewer
        timeout_minutes: 0.000001
"#,
        );
        let run = ChainExecutor::new(true).run("demo", &c, &HashMap::new()).await;
        assert_eq!(run.status, ChainStatus::Completed);
    }

    #[test]
    fn test_eval_condition() {
        let context = ctx(&[("env", "prod")]);
        assert!(eval_condition("true", &context));
        assert!(!eval_condition("false", &context));
        assert!(eval_condition("env == prod", &context));
        assert!(!eval_condition("env == dev", &context));
        assert!(eval_condition("env != dev", &context));
        assert!(!eval_condition("env != prod", &context));
        // Missing key: equality fails, inequality holds.
        assert!(!eval_condition("missing == x", &context));
        assert!(eval_condition("missing != x", &context));
        // Unparseable conditions never drop a step.
        assert!(eval_condition("whenever it feels right", &context));
    }
}
