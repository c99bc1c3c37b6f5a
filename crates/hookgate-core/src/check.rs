//! Check definitions, outcomes, and the builtin catalog.
//!
//! A `Check` is an immutable description of one external validation tool:
//! how to decide whether it applies to a file set, how to invoke it, how
//! long to let it run, and which flag bypasses it. Check internals are
//! opaque; hookgate only sees the exit code / output contract.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::stage::Stage;

/// Severity class of a check. Decides whether a failing check blocks the
/// git operation or only surfaces a warning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    /// A failure blocks the operation.
    Blocking,
    /// A failure is surfaced but does not block (unless promoted).
    Warning,
    /// Informational only.
    Advisory,
}

impl CheckCategory {
    /// Default wall-clock timeout for checks of this category.
    pub fn default_timeout_secs(&self) -> u64 {
        match self {
            CheckCategory::Blocking => 30,
            CheckCategory::Warning => 20,
            CheckCategory::Advisory => 10,
        }
    }
}

/// Terminal status of one check execution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    Warn,
    /// The underlying tool is not installed. Never blocking.
    Skip,
    /// The worker exceeded its timeout and was killed. Blocks like `Fail`
    /// but is reported distinctly.
    Timeout,
}

impl CheckStatus {
    /// Whether this status counts as a failure for blocking purposes.
    pub fn is_failure(&self) -> bool {
        matches!(self, CheckStatus::Fail | CheckStatus::Timeout)
    }

    /// Short human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Warn => "warn",
            CheckStatus::Skip => "skip",
            CheckStatus::Timeout => "TIMEOUT",
        }
    }
}

/// Produced exactly once per (run, applicable check) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckResult {
    /// Id of the check this result belongs to.
    pub check_id: String,

    /// Terminal status.
    pub status: CheckStatus,

    /// Category-appropriate summary for the user.
    pub message: Option<String>,

    /// Captured tool output, kept as a reportable artifact.
    pub output: Option<String>,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl CheckResult {
    pub fn pass(check_id: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            check_id: check_id.into(),
            status: CheckStatus::Pass,
            message: None,
            output: None,
            duration_ms,
        }
    }

    pub fn fail(
        check_id: impl Into<String>,
        message: impl Into<String>,
        output: Option<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            check_id: check_id.into(),
            status: CheckStatus::Fail,
            message: Some(message.into()),
            output,
            duration_ms,
        }
    }

    pub fn warn(
        check_id: impl Into<String>,
        message: impl Into<String>,
        output: Option<String>,
        duration_ms: u64,
    ) -> Self {
        Self {
            check_id: check_id.into(),
            status: CheckStatus::Warn,
            message: Some(message.into()),
            output,
            duration_ms,
        }
    }

    pub fn skip(check_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            check_id: check_id.into(),
            status: CheckStatus::Skip,
            message: Some(message.into()),
            output: None,
            duration_ms: 0,
        }
    }

    pub fn timeout(check_id: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            check_id: check_id.into(),
            status: CheckStatus::Timeout,
            message: Some(format!("timed out after {timeout_secs}s and was killed")),
            output: None,
            duration_ms: timeout_secs * 1000,
        }
    }
}

/// Applicability predicate over the target file set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilePattern {
    /// Applies whenever the file set is non-empty.
    Any,
    /// Applies to files with one of the given extensions (no leading dot).
    Extensions(Vec<&'static str>),
}

impl FilePattern {
    /// Whether a single path matches this pattern.
    pub fn matches(&self, path: &Path) -> bool {
        match self {
            FilePattern::Any => true,
            FilePattern::Extensions(exts) => path
                .extension()
                .and_then(|e| e.to_str())
                .map(|ext| exts.iter().any(|e| ext.eq_ignore_ascii_case(e)))
                .unwrap_or(false),
        }
    }

    /// The subset of `files` this pattern selects, in input order.
    pub fn select<'a>(&self, files: &'a [String]) -> Vec<&'a str> {
        files
            .iter()
            .filter(|f| self.matches(Path::new(f.as_str())))
            .map(String::as_str)
            .collect()
    }
}

/// Exit-code contract of the external tool.
///
/// Most linters exit non-zero on findings; grep-style pattern checks exit
/// zero when the offending pattern *is* present, so their contract is
/// inverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassWhen {
    Zero,
    NonZero,
}

impl PassWhen {
    /// Map an exit code onto pass/fail under this contract.
    pub fn passes(&self, exit_code: i32) -> bool {
        match self {
            PassWhen::Zero => exit_code == 0,
            PassWhen::NonZero => exit_code != 0,
        }
    }
}

/// How to run a check: program, fixed arguments, and whether the matching
/// target files are appended to the argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub append_files: bool,
    pub pass_when: PassWhen,
}

impl Invocation {
    pub fn tool(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            append_files: true,
            pass_when: PassWhen::Zero,
        }
    }

    pub fn without_files(mut self) -> Self {
        self.append_files = false;
        self
    }

    pub fn pass_when(mut self, pass_when: PassWhen) -> Self {
        self.pass_when = pass_when;
        self
    }

    /// Full argument vector for the given selected files.
    pub fn argv(&self, files: &[&str]) -> Vec<String> {
        let mut argv = self.args.clone();
        if self.append_files {
            argv.extend(files.iter().map(|f| f.to_string()));
        }
        argv
    }
}

/// An immutable check definition. Registered once at process start.
#[derive(Debug, Clone)]
pub struct Check {
    /// Unique identifier, kebab-case.
    pub id: String,

    /// Severity class.
    pub category: CheckCategory,

    /// Applicability predicate over the target file set.
    pub pattern: FilePattern,

    /// External tool invocation.
    pub invocation: Invocation,

    /// Wall-clock timeout in seconds.
    pub timeout_secs: u64,

    /// Environment flag that bypasses this check (always audited).
    pub bypass_flag: String,

    /// Flag that promotes a warning-category check to blocking, if any.
    pub promote_flag: Option<String>,

    /// Stages at which this check runs.
    pub stages: Vec<Stage>,
}

/// File-check stages: the pipeline points where content checks run.
const FILE_STAGES: [Stage; 3] = [Stage::PreCommit, Stage::PrePush, Stage::PreMerge];

/// Derive the bypass flag name for a check id.
pub fn bypass_flag_for(id: &str) -> String {
    format!(
        "HOOKGATE_SKIP_{}",
        id.to_ascii_uppercase().replace('-', "_")
    )
}

impl Check {
    /// Create a check with category-default timeout and derived bypass flag.
    pub fn new(
        id: &str,
        category: CheckCategory,
        pattern: FilePattern,
        invocation: Invocation,
    ) -> Self {
        Self {
            id: id.to_string(),
            category,
            pattern,
            invocation,
            timeout_secs: category.default_timeout_secs(),
            bypass_flag: bypass_flag_for(id),
            promote_flag: None,
            stages: FILE_STAGES.to_vec(),
        }
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn promoted_by(mut self, flag: &str) -> Self {
        self.promote_flag = Some(flag.to_string());
        self
    }

    pub fn stages(mut self, stages: &[Stage]) -> Self {
        self.stages = stages.to_vec();
        self
    }

    /// Whether this check applies at `stage` to `files`.
    pub fn applicable(&self, stage: Stage, files: &[String]) -> bool {
        self.stages.contains(&stage) && !self.pattern.select(files).is_empty()
    }
}

/// The builtin check catalog, in reporting priority order.
///
/// Every entry is an opaque external tool; a tool missing from PATH
/// downgrades that check to `Skip` at execution time.
pub fn builtin_checks() -> Vec<Check> {
    vec![
        Check::new(
            "shell-syntax",
            CheckCategory::Blocking,
            FilePattern::Extensions(vec!["sh", "bash", "zsh"]),
            Invocation::tool("bash", &["-n"]),
        ),
        Check::new(
            "conflict-markers",
            CheckCategory::Blocking,
            FilePattern::Any,
            Invocation::tool("grep", &["-l", "-E", "^(<<<<<<< |=======$|>>>>>>> )"])
                .pass_when(PassWhen::NonZero),
        ),
        Check::new(
            "secret-scan",
            CheckCategory::Blocking,
            FilePattern::Any,
            Invocation::tool("gitleaks", &["protect", "--staged", "--no-banner"]).without_files(),
        )
        .timeout_secs(60)
        .stages(&[Stage::PreCommit, Stage::PrePush]),
        Check::new(
            "json-syntax",
            CheckCategory::Blocking,
            FilePattern::Extensions(vec!["json"]),
            Invocation::tool("jq", &["empty"]),
        ),
        Check::new(
            "shellcheck",
            CheckCategory::Warning,
            FilePattern::Extensions(vec!["sh", "bash"]),
            Invocation::tool("shellcheck", &[]),
        ),
        Check::new(
            "yaml-lint",
            CheckCategory::Warning,
            FilePattern::Extensions(vec!["yml", "yaml"]),
            Invocation::tool("yamllint", &["-f", "parsable"]),
        ),
        Check::new(
            "format",
            CheckCategory::Warning,
            FilePattern::Extensions(vec!["sh", "bash"]),
            Invocation::tool("shfmt", &["-d"]),
        )
        .promoted_by("HOOKGATE_BLOCK_FORMATTING"),
        Check::new(
            "circular-deps",
            CheckCategory::Warning,
            FilePattern::Extensions(vec!["js", "ts", "mjs"]),
            Invocation::tool("madge", &["--circular"]),
        )
        .promoted_by("HOOKGATE_BLOCK_CIRCULAR"),
    ]
}
