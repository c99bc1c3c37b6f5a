//! Environment-driven configuration: thresholds, concurrency, audit path.

use std::path::PathBuf;

use crate::error::{HookgateError, Result};
use crate::policy::PolicyThresholds;

/// Default bound on concurrent check workers.
pub const DEFAULT_JOBS: usize = 4;

/// Runtime configuration resolved from the process environment.
///
/// A malformed numeric override is a configuration error (reported as an
/// operational failure, reserved exit code), never a blocked verdict.
#[derive(Debug, Clone)]
pub struct Config {
    pub thresholds: PolicyThresholds,

    /// Maximum concurrent check workers.
    pub jobs: usize,

    /// Append-only bypass audit log location.
    pub audit_log_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thresholds: PolicyThresholds::default(),
            jobs: DEFAULT_JOBS,
            audit_log_path: default_audit_path(),
        }
    }
}

fn default_audit_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".hookgate")
        .join("audit.log")
}

impl Config {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an explicit lookup function
    /// (injectable for tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(v) = lookup("HOOKGATE_MAX_FILE_BYTES") {
            config.thresholds.max_file_bytes = parse_num("HOOKGATE_MAX_FILE_BYTES", &v)?;
        }
        if let Some(v) = lookup("HOOKGATE_TIER_INFO_FILES") {
            config.thresholds.info.files = parse_num("HOOKGATE_TIER_INFO_FILES", &v)?;
        }
        if let Some(v) = lookup("HOOKGATE_TIER_INFO_LINES") {
            config.thresholds.info.lines = parse_num("HOOKGATE_TIER_INFO_LINES", &v)?;
        }
        if let Some(v) = lookup("HOOKGATE_TIER_WARN_FILES") {
            config.thresholds.warning.files = parse_num("HOOKGATE_TIER_WARN_FILES", &v)?;
        }
        if let Some(v) = lookup("HOOKGATE_TIER_WARN_LINES") {
            config.thresholds.warning.lines = parse_num("HOOKGATE_TIER_WARN_LINES", &v)?;
        }
        if let Some(v) = lookup("HOOKGATE_TIER_EXTREME_FILES") {
            config.thresholds.extreme.files = parse_num("HOOKGATE_TIER_EXTREME_FILES", &v)?;
        }
        if let Some(v) = lookup("HOOKGATE_TIER_EXTREME_LINES") {
            config.thresholds.extreme.lines = parse_num("HOOKGATE_TIER_EXTREME_LINES", &v)?;
        }
        if let Some(v) = lookup("HOOKGATE_JOBS") {
            let jobs: u64 = parse_num("HOOKGATE_JOBS", &v)?;
            if jobs == 0 {
                return Err(HookgateError::Config(
                    "HOOKGATE_JOBS must be at least 1".to_string(),
                ));
            }
            config.jobs = jobs as usize;
        }
        if let Some(v) = lookup("HOOKGATE_AUDIT_LOG") {
            config.audit_log_path = PathBuf::from(v);
        }

        config.thresholds.validate()?;
        Ok(config)
    }
}

fn parse_num(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| HookgateError::Config(format!("{key}: expected a number, got {value:?}")))
}
