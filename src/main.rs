use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use agentgate::agents::{self, fixer};
use agentgate::chains::{ChainExecutor, ChainStatus, validate_chains};
use agentgate::config::ClaudeConfig;
use agentgate::hooks::{AuditLog, EXIT_ALLOW, Gate};
use agentgate::prp;
use agentgate::report::Report;
use agentgate::settings::Settings;

#[derive(Parser)]
#[command(
    name = "agentgate",
    about = "Safety gate and configuration validators for markdown-defined AI agent workflows",
    version,
    propagate_version = true
)]
struct Cli {
    /// Workspace root (default: current directory)
    #[arg(long, global = true, env = "AGENTGATE_WORKSPACE")]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one tool invocation from stdin (exit 0 allows, 2 blocks)
    Gate,

    /// Agent definition checks and fixers
    Agents {
        #[command(subcommand)]
        subcommand: AgentsCommand,
    },

    /// Chain definition validation and execution
    Chains {
        #[command(subcommand)]
        subcommand: ChainsCommand,
    },

    /// PRP document validation
    Prp {
        #[command(subcommand)]
        subcommand: PrpCommand,
    },
}

#[derive(Subcommand)]
enum AgentsCommand {
    /// Check all agents against the hierarchy rules
    Check {
        /// Show suggestions in addition to errors and warnings
        #[arg(long, short)]
        verbose: bool,
    },
    /// Repair common frontmatter formatting breakage
    Fix {
        /// Report what would change without writing files
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum ChainsCommand {
    /// Validate chain definitions against the agent roster
    Validate {
        /// Show suggestions in addition to errors and warnings
        #[arg(long, short)]
        verbose: bool,
    },
    /// Execute a chain's sequence (simulated step bodies)
    Run {
        /// Chain id from chain-definitions.yaml
        chain_id: String,

        /// Evaluate conditions and ordering without running step bodies
        #[arg(long)]
        dry_run: bool,

        /// Context values for condition evaluation (key=value, repeatable)
        #[arg(long = "context", value_parser = parse_key_val)]
        context: Vec<(String, String)>,
    },
    /// List defined chains
    List,
}

#[derive(Subcommand)]
enum PrpCommand {
    /// Validate a PRP file or every PRP in a directory
    Validate { path: PathBuf },
    /// Warn about files still marked IN_PROGRESS (never fails)
    Status { files: Vec<PathBuf> },
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let workspace = match cli.workspace {
        Some(workspace) => workspace,
        None => std::env::current_dir().context("cannot determine working directory")?,
    };
    let settings = Settings::load(&workspace);

    let code = match cli.command {
        Commands::Gate => run_gate(&settings),
        Commands::Agents { subcommand } => run_agents(subcommand, &workspace, &settings)?,
        Commands::Chains { subcommand } => run_chains(subcommand, &workspace, &settings).await?,
        Commands::Prp { subcommand } => run_prp(subcommand)?,
    };
    std::process::exit(code);
}

fn run_gate(settings: &Settings) -> i32 {
    if !settings.safety.enabled {
        return EXIT_ALLOW;
    }
    let gate = Gate::new(
        AuditLog::new(settings.safety.audit_log.clone()),
        settings.safety.fail_mode,
    );
    gate.run(std::io::stdin().lock(), &mut std::io::stderr())
}

fn claude_dir(workspace: &std::path::Path, settings: &Settings) -> anyhow::Result<PathBuf> {
    if let Some(dir) = &settings.claude_dir {
        return Ok(dir.clone());
    }
    agents::find_claude_dir(workspace).context("could not find .claude/agents directory")
}

fn run_agents(
    command: AgentsCommand,
    workspace: &std::path::Path,
    settings: &Settings,
) -> anyhow::Result<i32> {
    let claude = claude_dir(workspace, settings)?;
    let agents_dir = claude.join("agents");

    match command {
        AgentsCommand::Check { verbose } => {
            let config = ClaudeConfig::load(&agents_dir.join("config"));
            let entries = agents::load_agents(&agents_dir)?;
            println!("Checking {} agent files in {}", entries.len(), agents_dir.display());
            let report = agents::check_agents(&entries, &agents_dir, &config);
            print!("{}", report.render("Agent Compliance Report", verbose));
            Ok(exit_code(&report))
        }
        AgentsCommand::Fix { dry_run } => {
            let outcomes = fixer::fix_agents(&agents_dir, dry_run)?;
            for outcome in &outcomes {
                let verb = if dry_run { "would fix" } else { "fixed" };
                println!(
                    "{verb} {}: {}",
                    outcome.path.display(),
                    outcome.applied.join(", ")
                );
            }
            println!("{} agent files needed fixes", outcomes.len());
            Ok(0)
        }
    }
}

async fn run_chains(
    command: ChainsCommand,
    workspace: &std::path::Path,
    settings: &Settings,
) -> anyhow::Result<i32> {
    let claude = claude_dir(workspace, settings)?;
    let config = ClaudeConfig::load(&claude.join("agents").join("config"));

    match command {
        ChainsCommand::Validate { verbose } => {
            let report = validate_chains(&config);
            print!(
                "{}",
                report.render("Chain Configuration Validation Report", verbose)
            );
            Ok(exit_code(&report))
        }
        ChainsCommand::Run {
            chain_id,
            dry_run,
            context,
        } => {
            let chains = config
                .chains
                .context("chain-definitions.yaml not found or invalid")?;
            let chain = chains
                .chains
                .get(&chain_id)
                .with_context(|| format!("unknown chain '{chain_id}'"))?;

            let context: HashMap<String, String> = context.into_iter().collect();
            let run = ChainExecutor::new(dry_run).run(&chain_id, chain, &context).await;

            println!("chain {} -> {:?}", run.chain_id, run.status);
            for step in &run.steps {
                let role = step.role.as_deref().unwrap_or("-");
                let detail = step
                    .detail
                    .as_deref()
                    .map(|d| format!(" ({d})"))
                    .unwrap_or_default();
                println!("  {:?} {} [{role}]{detail}", step.status, step.agent);
            }
            Ok(if run.status == ChainStatus::Completed { 0 } else { 1 })
        }
        ChainsCommand::List => {
            let chains = config
                .chains
                .context("chain-definitions.yaml not found or invalid")?;
            for (chain_id, chain) in &chains.chains {
                println!(
                    "{chain_id} [{}] - {} step(s): {}",
                    chain.kind.as_deref().unwrap_or("untyped"),
                    chain.sequence.len(),
                    chain.description.as_deref().unwrap_or("")
                );
            }
            Ok(0)
        }
    }
}

fn run_prp(command: PrpCommand) -> anyhow::Result<i32> {
    match command {
        PrpCommand::Validate { path } => {
            let results = prp::validate_path(&path)?;
            if results.is_empty() {
                println!("No PRP files found in {}", path.display());
                return Ok(0);
            }

            let valid = results.iter().filter(|r| r.is_valid()).count();
            println!("PRP Validation Results: {valid}/{} files valid", results.len());
            for result in &results {
                let status = if result.is_valid() { "VALID" } else { "INVALID" };
                println!("\n{status}: {}", result.path.display());
                for error in &result.report.errors {
                    println!("  - {error}");
                }
            }
            Ok(if valid == results.len() { 0 } else { 1 })
        }
        PrpCommand::Status { files } => {
            let in_progress = prp::files_in_progress(&files);
            if !in_progress.is_empty() {
                println!("Warning: files with IN_PROGRESS status:");
                for path in &in_progress {
                    println!("  - {}", path.display());
                }
                println!("Consider updating status to COMPLETED, PROPOSED, or OBSOLETE");
            }
            Ok(0)
        }
    }
}

fn exit_code(report: &Report) -> i32 {
    if report.is_clean() { 0 } else { 1 }
}
