//! Commit-size policy: tier classification and the per-file size ceiling.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{HookgateError, Result};

/// Bypass flag that downgrades a blocking tier finding.
pub const TIER_BYPASS_FLAG: &str = "HOOKGATE_ALLOW_LARGE_COMMIT";

/// Bypass flag that downgrades oversize-file findings.
pub const FILE_SIZE_BYPASS_FLAG: &str = "HOOKGATE_ALLOW_LARGE_FILES";

/// Policy bucket computed from aggregate change-size metrics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    None,
    Info,
    Warning,
    Extreme,
}

impl Tier {
    /// Whether this tier blocks by default. `info` is advisory-only.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Tier::Warning | Tier::Extreme)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::None => "none",
            Tier::Info => "info",
            Tier::Warning => "warning",
            Tier::Extreme => "extreme",
        }
    }
}

/// One tier's (file count, line count) threshold pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TierThreshold {
    pub files: u64,
    pub lines: u64,
}

/// Ordered tier thresholds plus the flat per-file byte ceiling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PolicyThresholds {
    pub info: TierThreshold,
    pub warning: TierThreshold,
    pub extreme: TierThreshold,

    /// Flat per-file ceiling; any file over it is a blocking finding
    /// regardless of tier.
    pub max_file_bytes: u64,
}

impl Default for PolicyThresholds {
    fn default() -> Self {
        Self {
            info: TierThreshold {
                files: 15,
                lines: 1000,
            },
            warning: TierThreshold {
                files: 25,
                lines: 3000,
            },
            extreme: TierThreshold {
                files: 76,
                lines: 5001,
            },
            max_file_bytes: 5 * 1024 * 1024,
        }
    }
}

impl PolicyThresholds {
    /// Thresholds must increase strictly across tiers on both metrics.
    pub fn validate(&self) -> Result<()> {
        let ok = self.info.files < self.warning.files
            && self.warning.files < self.extreme.files
            && self.info.lines < self.warning.lines
            && self.warning.lines < self.extreme.lines;
        if ok {
            Ok(())
        } else {
            Err(HookgateError::Config(
                "tier thresholds must be monotonically increasing".to_string(),
            ))
        }
    }

    /// Classify aggregate metrics into a tier.
    ///
    /// A run lands in the highest tier whose threshold is met by *either*
    /// metric: file count OR changed-line count, not both.
    pub fn classify(&self, file_count: u64, line_count: u64) -> Tier {
        if file_count >= self.extreme.files || line_count >= self.extreme.lines {
            Tier::Extreme
        } else if file_count >= self.warning.files || line_count >= self.warning.lines {
            Tier::Warning
        } else if file_count >= self.info.files || line_count >= self.info.lines {
            Tier::Info
        } else {
            Tier::None
        }
    }
}

/// A file over the flat size ceiling. Always a blocking finding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OversizeFile {
    pub path: String,
    pub bytes: u64,
}

/// Scan target files against the per-file ceiling.
///
/// Files that no longer exist on disk (staged deletions) are ignored.
/// The ceiling is deliberately independent of tier classification: many
/// files each just under the limit never escalate the tier.
pub fn oversize_files(files: &[String], max_file_bytes: u64) -> Vec<OversizeFile> {
    let mut findings = Vec::new();
    for file in files {
        if let Ok(meta) = std::fs::metadata(Path::new(file)) {
            if meta.is_file() && meta.len() > max_file_bytes {
                findings.push(OversizeFile {
                    path: file.clone(),
                    bytes: meta.len(),
                });
            }
        }
    }
    findings
}
