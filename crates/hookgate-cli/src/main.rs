//! hookgate - git lifecycle validation gatekeeper
//!
//! The `hookgate` command is installed as the entry point for git hooks
//! and doubles as a standalone validator.
//!
//! ## Commands
//!
//! - `hook`: run the pipeline for a lifecycle stage (called by git hooks)
//! - `validate`: standalone validation of explicit or staged files
//! - `checks`: list the registered check catalog
//! - `audit`: show recent bypass audit records

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, Level};

use hookgate_core::bypass::{AuditLog, BypassFlags};
use hookgate_core::config::Config;
use hookgate_core::stage::Stage;
use hookgate_pipeline::{Pipeline, RunOutcome, Targets};

/// Reserved exit code for operational errors, distinct from a blocked
/// verdict (1) and a pass (0).
const SYSTEM_ERROR_CODE: i32 = 2;

#[derive(Parser)]
#[command(name = "hookgate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Concurrent validation gatekeeper for git lifecycle events", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the validation pipeline for one lifecycle stage
    Hook {
        /// Stage name (pre-commit, prepare-message, validate-message,
        /// post-commit, pre-push, pre-merge, post-merge); git hook names
        /// like commit-msg are accepted as aliases
        stage: String,

        /// Explicit target files; falls back to the stage's natural set
        files: Vec<String>,

        /// Pending commit message file (message stages)
        #[arg(long)]
        message_file: Option<PathBuf>,

        /// Revision range for push/merge stages
        #[arg(long, default_value = "@{upstream}..HEAD")]
        range: String,

        /// Emit a machine-readable JSON report instead of human output
        #[arg(long)]
        json: bool,

        /// Bound on concurrent check workers
        #[arg(long, env = "HOOKGATE_JOBS")]
        jobs: Option<usize>,
    },

    /// Validate files without a git operation (defaults to the staged set)
    Validate {
        /// Files to validate; staged files when omitted
        files: Vec<String>,

        /// Emit a machine-readable JSON report instead of human output
        #[arg(long)]
        json: bool,

        /// Bound on concurrent check workers
        #[arg(long, env = "HOOKGATE_JOBS")]
        jobs: Option<usize>,
    },

    /// List the registered check catalog
    Checks,

    /// Show recent bypass audit records
    Audit {
        /// Number of records to show, newest last
        #[arg(long, default_value_t = 20)]
        tail: usize,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    hookgate_core::init_tracing(cli.json_logs, level);

    let code = match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            error!("hookgate error: {e:#}");
            SYSTEM_ERROR_CODE
        }
    };
    std::process::exit(code);
}

async fn run(command: Commands) -> Result<i32> {
    let cwd = std::env::current_dir().context("resolve working directory")?;
    let config = Config::from_env()?;
    let flags = BypassFlags::from_env();

    match command {
        Commands::Hook {
            stage,
            files,
            message_file,
            range,
            json,
            jobs,
        } => {
            let stage: Stage = stage.parse()?;
            let mut config = config;
            if let Some(jobs) = jobs {
                config.jobs = jobs;
            }
            let pipeline = Pipeline::new(config, flags);

            let outcome = if stage.is_message_stage() {
                let message_file = message_file
                    .unwrap_or_else(|| cwd.join(".git").join("COMMIT_EDITMSG"));
                pipeline
                    .run_message_stage(stage, &message_file, &cwd)
                    .await?
            } else {
                let targets = if !files.is_empty() {
                    Targets::Explicit(files)
                } else if stage.uses_staged_files() {
                    Targets::Staged
                } else {
                    Targets::Range(range)
                };
                pipeline.run(stage, targets, &cwd).await?
            };

            report(&outcome, json)?;
            Ok(exit_code(&outcome))
        }

        Commands::Validate { files, json, jobs } => {
            let mut config = config;
            if let Some(jobs) = jobs {
                config.jobs = jobs;
            }
            let pipeline = Pipeline::new(config, flags);
            let targets = if files.is_empty() {
                Targets::Staged
            } else {
                Targets::Explicit(files)
            };
            let outcome = pipeline.run(Stage::PreCommit, targets, &cwd).await?;

            report(&outcome, json)?;
            Ok(exit_code(&outcome))
        }

        Commands::Checks => {
            let pipeline = Pipeline::new(config, flags);
            for check in pipeline.registry().all() {
                let stages: Vec<_> = check.stages.iter().map(Stage::name).collect();
                println!(
                    "{:<18} {:?}  timeout={}s  bypass={}  stages={}",
                    check.id,
                    check.category,
                    check.timeout_secs,
                    check.bypass_flag,
                    stages.join(",")
                );
            }
            Ok(0)
        }

        Commands::Audit { tail } => {
            let log = AuditLog::new(config.audit_log_path.clone());
            let lines = log.tail(tail)?;
            if lines.is_empty() {
                println!("no bypass records at {:?}", log.path());
            }
            for line in lines {
                println!("{line}");
            }
            Ok(0)
        }
    }
}

fn report(outcome: &RunOutcome, json: bool) -> Result<()> {
    if json {
        let artifact = hookgate_pipeline::artifact(outcome);
        println!("{}", serde_json::to_string_pretty(&artifact)?);
    } else {
        print!("{}", hookgate_pipeline::render_human(outcome));
    }
    Ok(())
}

fn exit_code(outcome: &RunOutcome) -> i32 {
    if outcome.verdict.blocked() {
        1
    } else {
        0
    }
}
