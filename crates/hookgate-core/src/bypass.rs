//! Bypass flag resolution and the append-only audit trail.
//!
//! Every recognized override that actually downgrades a finding appends
//! exactly one line to the audit log. Bypass usage is never silent,
//! including the master skip flag that short-circuits the whole pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{HookgateError, Result};

/// Master flag: skips the entire pipeline (no workers run), still audited.
pub const MASTER_SKIP_FLAG: &str = "HOOKGATE_SKIP_ALL";

/// One record per override flag actually used. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BypassEvent {
    /// Flag name, e.g. `HOOKGATE_SKIP_SHELL_SYNTAX`.
    pub flag: String,

    /// Resolved git command being overridden.
    pub command: String,

    /// Working directory at the time of the bypass.
    pub cwd: String,

    pub timestamp: DateTime<Utc>,
}

impl BypassEvent {
    pub fn now(flag: &str, command: &str, cwd: &Path) -> Self {
        Self {
            flag: flag.to_string(),
            command: command.to_string(),
            cwd: cwd.display().to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Render the audit line for this event.
    pub fn render(&self) -> String {
        format!(
            "[{}] BYPASS: {} | Command: {} | CWD: {}",
            self.timestamp.to_rfc3339(),
            self.flag,
            self.command,
            self.cwd
        )
    }
}

/// Snapshot of the override flags present in the invocation environment.
///
/// Captured once per run so that repeated queries are consistent and tests
/// can inject flags without touching process-wide state.
#[derive(Debug, Clone, Default)]
pub struct BypassFlags {
    set: BTreeSet<String>,
}

impl BypassFlags {
    /// Capture all `HOOKGATE_`-prefixed flags that are enabled in the
    /// process environment. `0`, `false`, and empty values do not count.
    pub fn from_env() -> Self {
        let set = std::env::vars()
            .filter(|(k, v)| k.starts_with("HOOKGATE_") && enabled(v))
            .map(|(k, _)| k)
            .collect();
        Self { set }
    }

    /// Build from explicit flag names (tests, embedding).
    pub fn from_flags<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            set: flags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_set(&self, flag: &str) -> bool {
        self.set.contains(flag)
    }

    pub fn master_skip(&self) -> bool {
        self.is_set(MASTER_SKIP_FLAG)
    }
}

fn enabled(value: &str) -> bool {
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}

/// Append-only audit log. Lines are added, never rewritten or deleted.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one audit line for `event`. Also emits a structured warning
    /// so bypass usage shows up in logs even when the file is elsewhere.
    pub fn append(&self, event: &BypassEvent) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| HookgateError::Audit(format!("create {:?}: {e}", parent)))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| HookgateError::Audit(format!("open {:?}: {e}", self.path)))?;
        writeln!(file, "{}", event.render())
            .map_err(|e| HookgateError::Audit(format!("append {:?}: {e}", self.path)))?;

        warn!(
            flag = %event.flag,
            command = %event.command,
            cwd = %event.cwd,
            "validation bypass used"
        );
        Ok(())
    }

    /// Read the last `n` audit lines, oldest first. Missing log is empty.
    pub fn tail(&self, n: usize) -> Result<Vec<String>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(HookgateError::Audit(format!("read {:?}: {e}", self.path))),
        };
        let lines: Vec<String> = content.lines().map(str::to_string).collect();
        let start = lines.len().saturating_sub(n);
        Ok(lines[start..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_line_format() {
        let ts = DateTime::parse_from_rfc3339("2026-02-01T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let event = BypassEvent {
            flag: "HOOKGATE_SKIP_SHELL_SYNTAX".to_string(),
            command: "git commit -m fix".to_string(),
            cwd: "/work/repo".to_string(),
            timestamp: ts,
        };
        assert_eq!(
            event.render(),
            "[2026-02-01T10:30:00+00:00] BYPASS: HOOKGATE_SKIP_SHELL_SYNTAX | Command: git commit -m fix | CWD: /work/repo"
        );
    }

    #[test]
    fn test_flag_values_zero_and_false_disabled() {
        assert!(enabled("1"));
        assert!(enabled("yes"));
        assert!(!enabled("0"));
        assert!(!enabled("false"));
        assert!(!enabled("FALSE"));
        assert!(!enabled(""));
    }

    #[test]
    fn test_flags_from_explicit_set() {
        let flags = BypassFlags::from_flags(["HOOKGATE_SKIP_ALL"]);
        assert!(flags.master_skip());
        assert!(!flags.is_set("HOOKGATE_SKIP_FORMAT"));
    }

    #[test]
    fn test_append_is_additive() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("nested/audit.log"));

        let first = BypassEvent::now("HOOKGATE_SKIP_ALL", "git commit", Path::new("/a"));
        let second = BypassEvent::now("HOOKGATE_SKIP_FORMAT", "git push", Path::new("/b"));
        log.append(&first).unwrap();
        log.append(&second).unwrap();

        let lines = log.tail(10).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("HOOKGATE_SKIP_ALL"));
        assert!(lines[1].contains("HOOKGATE_SKIP_FORMAT"));
    }

    #[test]
    fn test_tail_of_missing_log_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("absent.log"));
        assert!(log.tail(5).unwrap().is_empty());
    }

    #[test]
    fn test_tail_limits_to_last_n() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("audit.log"));
        for i in 0..5 {
            let event =
                BypassEvent::now(&format!("HOOKGATE_FLAG_{i}"), "git commit", Path::new("/r"));
            log.append(&event).unwrap();
        }
        let lines = log.tail(2).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("HOOKGATE_FLAG_4"));
    }
}
