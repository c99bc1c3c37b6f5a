//! Stage pipeline orchestration.
//!
//! Control flow for one run: resolve targets from the git collaborator,
//! honor the master skip flag, select applicable checks, fork-join the
//! workers, classify commit size, derive the verdict, and audit every
//! bypass that was used.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use hookgate_core::bypass::{AuditLog, BypassEvent, BypassFlags, MASTER_SKIP_FLAG};
use hookgate_core::check::{Check, CheckResult};
use hookgate_core::config::Config;
use hookgate_core::git::{self, DiffStats};
use hookgate_core::message;
use hookgate_core::policy::{oversize_files, OversizeFile, Tier};
use hookgate_core::registry::CheckRegistry;
use hookgate_core::stage::Stage;
use hookgate_core::store::store_key;

use crate::invoker::{CheckInvoker, ProcessInvoker};
use crate::run::ValidationRun;
use crate::verdict::{self, Verdict, VerdictInput, VerdictStatus};

/// Where the target file set comes from.
#[derive(Debug, Clone)]
pub enum Targets {
    /// Explicit paths from the CLI.
    Explicit(Vec<String>),
    /// The staged file set (commit stages).
    Staged,
    /// A revision range (push/merge stages).
    Range(String),
}

/// Everything one completed run produced, for reporting.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub stage: Stage,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub files: Vec<String>,

    /// Applicable checks in reporting order, aligned with `results`.
    pub checks: Vec<Check>,
    pub results: Vec<CheckResult>,

    pub tier: Tier,
    pub tier_metrics: (u64, u64),
    pub oversize: Vec<OversizeFile>,
    pub verdict: Verdict,

    /// True when the master skip flag short-circuited the run.
    pub skipped_all: bool,
}

impl RunOutcome {
    pub fn passed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == hookgate_core::check::CheckStatus::Pass)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_failure()).count()
    }
}

/// The validation pipeline orchestrator.
pub struct Pipeline {
    registry: CheckRegistry,
    config: Config,
    flags: BypassFlags,
    invoker: Arc<dyn CheckInvoker>,
    audit: AuditLog,
}

impl Pipeline {
    /// Production pipeline: builtin catalog plus the process invoker.
    pub fn new(config: Config, flags: BypassFlags) -> Self {
        let audit = AuditLog::new(config.audit_log_path.clone());
        Self {
            registry: CheckRegistry::with_builtins(),
            config,
            flags,
            invoker: Arc::new(ProcessInvoker),
            audit,
        }
    }

    /// Pipeline with injected registry and invoker (tests, embedding).
    pub fn with_parts(
        registry: CheckRegistry,
        config: Config,
        flags: BypassFlags,
        invoker: Arc<dyn CheckInvoker>,
    ) -> Self {
        let audit = AuditLog::new(config.audit_log_path.clone());
        Self {
            registry,
            config,
            flags,
            invoker,
            audit,
        }
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    /// Run a file-validation stage.
    pub async fn run(
        &self,
        stage: Stage,
        targets: Targets,
        cwd: &Path,
    ) -> anyhow::Result<RunOutcome> {
        let started = Instant::now();
        let (files, stats) = self.resolve_targets(&targets, cwd)?;
        let run = ValidationRun::new(stage, files, cwd.to_path_buf());

        info!(
            run_id = %run.id,
            stage = %stage,
            files = run.files.len(),
            "validation run started"
        );

        if self.flags.master_skip() {
            self.audit_bypass(MASTER_SKIP_FLAG, cwd)?;
            info!(run_id = %run.id, "all checks skipped by master flag");
            return Ok(self.skipped_outcome(&run, started));
        }

        let applicable: Vec<Check> = self
            .registry
            .applicable(stage, &run.files)
            .into_iter()
            .cloned()
            .collect();

        crate::executor::run_checks(
            Arc::clone(&self.invoker),
            applicable.clone(),
            Arc::clone(&run.files),
            run.cwd.clone(),
            Arc::clone(&run.store),
            self.config.jobs,
        )
        .await;

        // Read-back in reporting order; the executor guarantees a terminal
        // result per applicable check.
        let results: Vec<CheckResult> = applicable
            .iter()
            .map(|c| {
                run.store
                    .get(&store_key(&c.id))
                    .unwrap_or_else(|| CheckResult::fail(&c.id, "result missing", None, 0))
            })
            .collect();

        let tier = self
            .config
            .thresholds
            .classify(stats.files, stats.lines());
        let oversize = oversize_files(
            &absolute_paths(&run.files, cwd),
            self.config.thresholds.max_file_bytes,
        );

        let pairs: Vec<(&Check, CheckResult)> = applicable
            .iter()
            .zip(results.iter().cloned())
            .collect();
        let verdict = verdict::evaluate(VerdictInput {
            stage,
            results: pairs,
            tier,
            tier_metrics: (stats.files, stats.lines()),
            oversize: oversize.clone(),
            message_issues: Vec::new(),
            flags: &self.flags,
        });

        for flag in verdict.used_bypasses() {
            self.audit_bypass(&flag, cwd)?;
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            run_id = %run.id,
            verdict = ?verdict.status,
            tier = tier.label(),
            duration_ms,
            "validation run finished"
        );

        Ok(RunOutcome {
            run_id: run.id,
            stage,
            started_at: run.started_at,
            duration_ms,
            files: run.files.as_ref().clone(),
            checks: applicable,
            results,
            tier,
            tier_metrics: (stats.files, stats.lines()),
            oversize,
            verdict,
            skipped_all: false,
        })
    }

    /// Run one of the two message stages against the pending message file.
    ///
    /// `prepare-message` rewrites the file in place and never blocks;
    /// `validate-message` inspects the (already prepared) result.
    pub async fn run_message_stage(
        &self,
        stage: Stage,
        message_file: &Path,
        cwd: &Path,
    ) -> anyhow::Result<RunOutcome> {
        anyhow::ensure!(
            stage.is_message_stage(),
            "{stage} is not a message stage"
        );
        let started = Instant::now();
        let run = ValidationRun::new(stage, Vec::new(), cwd.to_path_buf());
        info!(run_id = %run.id, stage = %stage, "message stage started");

        if self.flags.master_skip() {
            self.audit_bypass(MASTER_SKIP_FLAG, cwd)?;
            return Ok(self.skipped_outcome(&run, started));
        }

        let content = std::fs::read_to_string(message_file)
            .with_context(|| format!("read commit message file {message_file:?}"))?;

        let mut issues = Vec::new();
        match stage {
            Stage::PrepareMessage => {
                let branch = git::current_branch(cwd)?;
                let prepared = message::prepare_message(&content, &branch);
                if prepared != content {
                    std::fs::write(message_file, &prepared)
                        .with_context(|| format!("write commit message file {message_file:?}"))?;
                    info!(run_id = %run.id, branch = %branch, "commit message prefixed from branch");
                }
            }
            Stage::ValidateMessage => {
                issues = message::validate_message(&content);
            }
            _ => unreachable!("guarded above"),
        }

        let verdict = verdict::evaluate(VerdictInput {
            stage,
            results: Vec::new(),
            tier: Tier::None,
            tier_metrics: (0, 0),
            oversize: Vec::new(),
            message_issues: issues,
            flags: &self.flags,
        });

        for flag in verdict.used_bypasses() {
            self.audit_bypass(&flag, cwd)?;
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        Ok(RunOutcome {
            run_id: run.id,
            stage,
            started_at: run.started_at,
            duration_ms,
            files: Vec::new(),
            checks: Vec::new(),
            results: Vec::new(),
            tier: Tier::None,
            tier_metrics: (0, 0),
            oversize: Vec::new(),
            verdict,
            skipped_all: false,
        })
    }

    fn resolve_targets(
        &self,
        targets: &Targets,
        cwd: &Path,
    ) -> anyhow::Result<(Vec<String>, DiffStats)> {
        match targets {
            Targets::Explicit(files) => {
                let stats = DiffStats {
                    files: files.len() as u64,
                    insertions: 0,
                    deletions: 0,
                };
                Ok((files.clone(), stats))
            }
            Targets::Staged => {
                let files = git::staged_files(cwd).context("resolve staged files")?;
                let stats = git::staged_stats(cwd).context("resolve staged diff stats")?;
                Ok((files, stats))
            }
            Targets::Range(range) => {
                let files = git::range_files(cwd, range)
                    .with_context(|| format!("resolve files for range {range}"))?;
                let stats = git::range_stats(cwd, range)
                    .with_context(|| format!("resolve diff stats for range {range}"))?;
                Ok((files, stats))
            }
        }
    }

    fn audit_bypass(&self, flag: &str, cwd: &Path) -> anyhow::Result<()> {
        let event = BypassEvent::now(flag, &git::invocation_command(), cwd);
        self.audit
            .append(&event)
            .context("append bypass audit record")?;
        Ok(())
    }

    fn skipped_outcome(&self, run: &ValidationRun, started: Instant) -> RunOutcome {
        RunOutcome {
            run_id: run.id,
            stage: run.stage,
            started_at: run.started_at,
            duration_ms: started.elapsed().as_millis() as u64,
            files: run.files.as_ref().clone(),
            checks: Vec::new(),
            results: Vec::new(),
            tier: Tier::None,
            tier_metrics: (0, 0),
            oversize: Vec::new(),
            verdict: Verdict {
                status: VerdictStatus::PassedWithWarnings,
                findings: Vec::new(),
                warnings: vec![format!("all checks skipped via {MASTER_SKIP_FLAG}")],
                tier: Tier::None,
            },
            skipped_all: true,
        }
    }
}

/// Resolve file paths relative to the run's working directory so size
/// checks see the actual files, not where hookgate happens to run from.
fn absolute_paths(files: &[String], cwd: &Path) -> Vec<String> {
    files
        .iter()
        .map(|f| {
            let path = Path::new(f);
            if path.is_absolute() {
                f.clone()
            } else {
                cwd.join(path).to_string_lossy().to_string()
            }
        })
        .collect()
}
