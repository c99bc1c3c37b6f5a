//! Verdict computation: aggregate every terminal result into one decision.
//!
//! The verdict is derived, never stored. It is computed only after all
//! workers have terminated and does not depend on the order results
//! arrived in, only on the completed set.

use serde::{Deserialize, Serialize};

use hookgate_core::bypass::BypassFlags;
use hookgate_core::check::{Check, CheckCategory, CheckResult, CheckStatus};
use hookgate_core::policy::{OversizeFile, Tier, FILE_SIZE_BYPASS_FLAG, TIER_BYPASS_FLAG};
use hookgate_core::stage::Stage;

/// Bypass flag for commit-message validation findings.
pub const MESSAGE_BYPASS_FLAG: &str = "HOOKGATE_SKIP_COMMIT_MESSAGE";

/// A would-be-blocking finding, possibly downgraded by a bypass flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    /// What produced it: a check id, `commit-size`, `file-size`, or
    /// `commit-message`.
    pub source: String,

    pub message: String,

    /// The exact flag that downgrades (or downgraded) this finding.
    pub bypass_flag: String,

    pub bypassed: bool,
}

/// Final decision for one validation run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Passed,
    PassedWithWarnings,
    Blocked,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    pub status: VerdictStatus,

    /// Blocking-class findings, bypassed or not.
    pub findings: Vec<Finding>,

    /// Non-blocking problems surfaced to the user.
    pub warnings: Vec<String>,

    pub tier: Tier,
}

impl Verdict {
    pub fn blocked(&self) -> bool {
        self.status == VerdictStatus::Blocked
    }

    /// Flags actually used to downgrade findings, one entry per downgrade.
    pub fn used_bypasses(&self) -> Vec<String> {
        self.findings
            .iter()
            .filter(|f| f.bypassed)
            .map(|f| f.bypass_flag.clone())
            .collect()
    }
}

/// Everything the verdict derives from.
pub struct VerdictInput<'a> {
    pub stage: Stage,

    /// (check, terminal result) pairs in reporting order.
    pub results: Vec<(&'a Check, CheckResult)>,

    pub tier: Tier,
    pub tier_metrics: (u64, u64),
    pub oversize: Vec<OversizeFile>,
    pub message_issues: Vec<String>,
    pub flags: &'a BypassFlags,
}

/// Compute the verdict for a completed run.
pub fn evaluate(input: VerdictInput<'_>) -> Verdict {
    let mut findings = Vec::new();
    let mut warnings = Vec::new();

    for (check, result) in &input.results {
        match result.status {
            CheckStatus::Pass | CheckStatus::Skip => {}
            CheckStatus::Fail | CheckStatus::Timeout => {
                let message = describe(result);
                if check.category == CheckCategory::Blocking || promoted(check, input.flags) {
                    findings.push(finding(&check.id, message, &check.bypass_flag, input.flags));
                } else {
                    warnings.push(format!("{}: {message}", check.id));
                }
            }
            CheckStatus::Warn => {
                let message = describe(result);
                if promoted(check, input.flags) {
                    findings.push(finding(&check.id, message, &check.bypass_flag, input.flags));
                } else {
                    warnings.push(format!("{}: {message}", check.id));
                }
            }
        }
    }

    let (file_count, line_count) = input.tier_metrics;
    match input.tier {
        Tier::None => {}
        Tier::Info => {
            warnings.push(format!(
                "commit size reached the info tier ({file_count} files, {line_count} lines)"
            ));
        }
        Tier::Warning | Tier::Extreme => {
            let message = format!(
                "commit size classified as {} ({file_count} files, {line_count} lines)",
                input.tier.label()
            );
            findings.push(finding("commit-size", message, TIER_BYPASS_FLAG, input.flags));
        }
    }

    for oversize in &input.oversize {
        let message = format!(
            "{} is {} bytes, over the per-file limit",
            oversize.path, oversize.bytes
        );
        findings.push(finding("file-size", message, FILE_SIZE_BYPASS_FLAG, input.flags));
    }

    for issue in &input.message_issues {
        findings.push(finding(
            "commit-message",
            issue.clone(),
            MESSAGE_BYPASS_FLAG,
            input.flags,
        ));
    }

    let would_block = findings.iter().any(|f| !f.bypassed);
    let status = if would_block && input.stage.can_block() {
        VerdictStatus::Blocked
    } else if findings.is_empty() && warnings.is_empty() {
        VerdictStatus::Passed
    } else {
        VerdictStatus::PassedWithWarnings
    };

    Verdict {
        status,
        findings,
        warnings,
        tier: input.tier,
    }
}

fn promoted(check: &Check, flags: &BypassFlags) -> bool {
    check
        .promote_flag
        .as_deref()
        .map(|f| flags.is_set(f))
        .unwrap_or(false)
}

fn finding(source: &str, message: String, bypass_flag: &str, flags: &BypassFlags) -> Finding {
    Finding {
        source: source.to_string(),
        message,
        bypass_flag: bypass_flag.to_string(),
        bypassed: flags.is_set(bypass_flag),
    }
}

fn describe(result: &CheckResult) -> String {
    result
        .message
        .clone()
        .unwrap_or_else(|| result.status.label().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookgate_core::check::{FilePattern, Invocation};

    fn check(id: &str, category: CheckCategory) -> Check {
        Check::new(id, category, FilePattern::Any, Invocation::tool("true", &[]))
    }

    fn base_input<'a>(
        stage: Stage,
        results: Vec<(&'a Check, CheckResult)>,
        flags: &'a BypassFlags,
    ) -> VerdictInput<'a> {
        VerdictInput {
            stage,
            results,
            tier: Tier::None,
            tier_metrics: (0, 0),
            oversize: Vec::new(),
            message_issues: Vec::new(),
            flags,
        }
    }

    #[test]
    fn test_blocking_fail_blocks() {
        let c = check("lint", CheckCategory::Blocking);
        let flags = BypassFlags::default();
        let verdict = evaluate(base_input(
            Stage::PreCommit,
            vec![(&c, CheckResult::fail("lint", "bad", None, 1))],
            &flags,
        ));
        assert!(verdict.blocked());
        assert_eq!(verdict.findings.len(), 1);
        assert!(!verdict.findings[0].bypassed);
    }

    #[test]
    fn test_timeout_blocks_like_fail() {
        let c = check("slow", CheckCategory::Blocking);
        let flags = BypassFlags::default();
        let verdict = evaluate(base_input(
            Stage::PreCommit,
            vec![(&c, CheckResult::timeout("slow", 30))],
            &flags,
        ));
        assert!(verdict.blocked());
    }

    #[test]
    fn test_bypass_downgrades_and_is_recorded() {
        let c = check("lint", CheckCategory::Blocking);
        let flags = BypassFlags::from_flags(["HOOKGATE_SKIP_LINT"]);
        let verdict = evaluate(base_input(
            Stage::PreCommit,
            vec![(&c, CheckResult::fail("lint", "bad", None, 1))],
            &flags,
        ));
        assert!(!verdict.blocked());
        assert_eq!(verdict.status, VerdictStatus::PassedWithWarnings);
        assert_eq!(verdict.used_bypasses(), vec!["HOOKGATE_SKIP_LINT"]);
    }

    #[test]
    fn test_warning_category_never_blocks_unpromoted() {
        let c = check("style", CheckCategory::Warning);
        let flags = BypassFlags::default();
        let verdict = evaluate(base_input(
            Stage::PreCommit,
            vec![(&c, CheckResult::warn("style", "untidy", None, 1))],
            &flags,
        ));
        assert_eq!(verdict.status, VerdictStatus::PassedWithWarnings);
        assert!(verdict.findings.is_empty());
        assert_eq!(verdict.warnings.len(), 1);
    }

    #[test]
    fn test_promotion_flag_makes_warning_blocking() {
        let c = check("format", CheckCategory::Warning).promoted_by("HOOKGATE_BLOCK_FORMATTING");
        let flags = BypassFlags::from_flags(["HOOKGATE_BLOCK_FORMATTING"]);
        let verdict = evaluate(base_input(
            Stage::PreCommit,
            vec![(&c, CheckResult::warn("format", "diff", None, 1))],
            &flags,
        ));
        assert!(verdict.blocked());
    }

    #[test]
    fn test_skip_never_blocks() {
        let c = check("optional", CheckCategory::Blocking);
        let flags = BypassFlags::default();
        let verdict = evaluate(base_input(
            Stage::PreCommit,
            vec![(&c, CheckResult::skip("optional", "tool missing"))],
            &flags,
        ));
        assert_eq!(verdict.status, VerdictStatus::Passed);
    }

    #[test]
    fn test_blocking_tier_blocks_and_is_bypassable() {
        let flags = BypassFlags::default();
        let mut input = base_input(Stage::PreCommit, Vec::new(), &flags);
        input.tier = Tier::Extreme;
        input.tier_metrics = (80, 200);
        let verdict = evaluate(input);
        assert!(verdict.blocked());
        assert_eq!(verdict.findings[0].source, "commit-size");

        let flags = BypassFlags::from_flags([TIER_BYPASS_FLAG]);
        let mut input = base_input(Stage::PreCommit, Vec::new(), &flags);
        input.tier = Tier::Extreme;
        input.tier_metrics = (80, 200);
        let verdict = evaluate(input);
        assert!(!verdict.blocked());
    }

    #[test]
    fn test_info_tier_is_advisory() {
        let flags = BypassFlags::default();
        let mut input = base_input(Stage::PreCommit, Vec::new(), &flags);
        input.tier = Tier::Info;
        input.tier_metrics = (15, 0);
        let verdict = evaluate(input);
        assert_eq!(verdict.status, VerdictStatus::PassedWithWarnings);
        assert!(verdict.findings.is_empty());
    }

    #[test]
    fn test_oversize_file_always_blocking_finding() {
        let flags = BypassFlags::default();
        let mut input = base_input(Stage::PreCommit, Vec::new(), &flags);
        input.oversize = vec![OversizeFile {
            path: "big.bin".to_string(),
            bytes: 6 * 1024 * 1024,
        }];
        let verdict = evaluate(input);
        assert!(verdict.blocked());
        assert_eq!(verdict.findings[0].source, "file-size");
    }

    #[test]
    fn test_advisory_stage_cannot_block() {
        let c = check("lint", CheckCategory::Blocking);
        let flags = BypassFlags::default();
        let verdict = evaluate(base_input(
            Stage::PostCommit,
            vec![(&c, CheckResult::fail("lint", "bad", None, 1))],
            &flags,
        ));
        assert!(!verdict.blocked());
        assert_eq!(verdict.status, VerdictStatus::PassedWithWarnings);
    }

    #[test]
    fn test_message_issues_block_validate_stage() {
        let flags = BypassFlags::default();
        let mut input = base_input(Stage::ValidateMessage, Vec::new(), &flags);
        input.message_issues = vec!["commit subject is empty".to_string()];
        let verdict = evaluate(input);
        assert!(verdict.blocked());
        assert_eq!(verdict.findings[0].source, "commit-message");
    }

    #[test]
    fn test_clean_run_passes() {
        let c = check("lint", CheckCategory::Blocking);
        let flags = BypassFlags::default();
        let verdict = evaluate(base_input(
            Stage::PreCommit,
            vec![(&c, CheckResult::pass("lint", 3))],
            &flags,
        ));
        assert_eq!(verdict.status, VerdictStatus::Passed);
    }
}
