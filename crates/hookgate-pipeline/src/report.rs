//! Run reporting: human-readable rendering and the machine artifact.
//!
//! The human form tells the user which checks failed, why, and the exact
//! bypass incantation available for each blocking finding. The machine
//! form is a versioned JSON artifact with per-file status and summary
//! counts.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use hookgate_core::check::{CheckStatus, FilePattern};
use hookgate_core::policy::Tier;

use crate::pipeline::RunOutcome;
use crate::verdict::VerdictStatus;

/// Version marker carried by every machine-readable report.
pub const REPORT_SCHEMA_VERSION: &str = "1";

/// Per-check entry in the report artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckReport {
    pub id: String,
    pub status: CheckStatus,
    pub message: Option<String>,
    pub duration_ms: u64,
}

/// Per-file status: `ok`, or `finding` when a failing check selected the
/// file or it tripped the size ceiling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileReport {
    pub path: String,
    pub status: String,
}

/// Summary counts over all checks in the run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SummaryReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub warned: usize,
    pub skipped: usize,
    pub timed_out: usize,
}

/// Machine-readable report for one validation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportArtifact {
    pub schema_version: String,
    pub run_id: String,
    pub stage: String,
    pub verdict: VerdictStatus,
    pub tier: Tier,
    pub duration_ms: u64,
    pub skipped_all: bool,
    pub checks: Vec<CheckReport>,
    pub files: Vec<FileReport>,
    pub warnings: Vec<String>,
    pub summary: SummaryReport,
}

/// Build the machine artifact for a completed run.
pub fn artifact(outcome: &RunOutcome) -> ReportArtifact {
    let mut summary = SummaryReport {
        total: outcome.results.len(),
        ..Default::default()
    };
    for result in &outcome.results {
        match result.status {
            CheckStatus::Pass => summary.passed += 1,
            CheckStatus::Fail => summary.failed += 1,
            CheckStatus::Warn => summary.warned += 1,
            CheckStatus::Skip => summary.skipped += 1,
            CheckStatus::Timeout => summary.timed_out += 1,
        }
    }

    ReportArtifact {
        schema_version: REPORT_SCHEMA_VERSION.to_string(),
        run_id: outcome.run_id.to_string(),
        stage: outcome.stage.to_string(),
        verdict: outcome.verdict.status,
        tier: outcome.tier,
        duration_ms: outcome.duration_ms,
        skipped_all: outcome.skipped_all,
        checks: outcome
            .results
            .iter()
            .map(|r| CheckReport {
                id: r.check_id.clone(),
                status: r.status,
                message: r.message.clone(),
                duration_ms: r.duration_ms,
            })
            .collect(),
        files: file_reports(outcome),
        warnings: outcome.verdict.warnings.clone(),
        summary,
    }
}

fn file_reports(outcome: &RunOutcome) -> Vec<FileReport> {
    let failing_patterns: Vec<&FilePattern> = outcome
        .checks
        .iter()
        .zip(outcome.results.iter())
        .filter(|(_, r)| r.status.is_failure())
        .map(|(c, _)| &c.pattern)
        .collect();

    outcome
        .files
        .iter()
        .map(|file| {
            // Component-wise suffix match, so "a.txt" does not claim
            // "/repo/bad-a.txt".
            let oversize = outcome
                .oversize
                .iter()
                .any(|o| std::path::Path::new(&o.path).ends_with(file.as_str()));
            let flagged = failing_patterns
                .iter()
                .any(|p| p.matches(std::path::Path::new(file)));
            FileReport {
                path: file.clone(),
                status: if oversize || flagged {
                    "finding".to_string()
                } else {
                    "ok".to_string()
                },
            }
        })
        .collect()
}

/// Render the report for a human at a terminal.
pub fn render_human(outcome: &RunOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "hookgate {}: {} checks over {} files",
        outcome.stage,
        outcome.results.len(),
        outcome.files.len()
    );

    if outcome.skipped_all {
        let _ = writeln!(out, "  all checks skipped (master skip flag set, audited)");
    }

    for result in &outcome.results {
        let mut line = format!(
            "  [{:>7}] {} ({}ms)",
            result.status.label(),
            result.check_id,
            result.duration_ms
        );
        if let Some(message) = &result.message {
            if result.status != CheckStatus::Pass {
                line.push_str(": ");
                line.push_str(message);
            }
        }
        let _ = writeln!(out, "{line}");
        if result.status.is_failure() {
            if let Some(output) = &result.output {
                for l in output.lines().take(10) {
                    let _ = writeln!(out, "            {l}");
                }
            }
        }
    }

    let (files, lines) = outcome.tier_metrics;
    if outcome.tier != Tier::None {
        let _ = writeln!(
            out,
            "  commit size tier: {} ({files} files, {lines} lines)",
            outcome.tier.label()
        );
    }

    for warning in &outcome.verdict.warnings {
        let _ = writeln!(out, "  warning: {warning}");
    }

    match outcome.verdict.status {
        VerdictStatus::Passed => {
            let _ = writeln!(out, "PASSED");
        }
        VerdictStatus::PassedWithWarnings => {
            let _ = writeln!(out, "PASSED (with warnings)");
        }
        VerdictStatus::Blocked => {
            let unbypassed: Vec<_> = outcome
                .verdict
                .findings
                .iter()
                .filter(|f| !f.bypassed)
                .collect();
            let _ = writeln!(out, "BLOCKED: {} finding(s)", unbypassed.len());
            for finding in unbypassed {
                let _ = writeln!(out, "  - {}: {}", finding.source, finding.message);
                let _ = writeln!(
                    out,
                    "    to override (audited): {}=1 <git command>",
                    finding.bypass_flag
                );
            }
        }
    }

    for finding in outcome.verdict.findings.iter().filter(|f| f.bypassed) {
        let _ = writeln!(
            out,
            "  bypassed: {} via {} (audited)",
            finding.source, finding.bypass_flag
        );
    }

    out
}
