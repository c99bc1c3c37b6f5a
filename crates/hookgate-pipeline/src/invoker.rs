//! The invocation seam between the executor and external check tools.
//!
//! `CheckInvoker` is the trait the fork-join executor drives; the
//! production backend spawns the tool as a child process, and tests swap
//! in a scripted fake. Timeouts are enforced by the executor, not here.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use hookgate_core::check::Check;

/// What happened when a check's tool was invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// The tool ran to completion.
    Completed {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    /// The tool is not installed. A missing optional tool must never
    /// prevent a commit; this maps to `Skip`.
    ToolMissing,

    /// The tool could not be started for another reason.
    SpawnFailed(String),
}

/// Backend that runs one check invocation against a file set.
#[async_trait]
pub trait CheckInvoker: Send + Sync {
    async fn invoke(&self, check: &Check, files: &[String], cwd: &Path) -> InvocationOutcome;
}

/// Production invoker: spawns the check's tool as a child process.
///
/// The child is spawned with `kill_on_drop`, so when the executor's
/// timeout cancels the invoke future the process is forcibly terminated.
pub struct ProcessInvoker;

#[async_trait]
impl CheckInvoker for ProcessInvoker {
    async fn invoke(&self, check: &Check, files: &[String], cwd: &Path) -> InvocationOutcome {
        let selected = check.pattern.select(files);
        let argv = check.invocation.argv(&selected);

        let spawned = Command::new(&check.invocation.program)
            .args(&argv)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match spawned {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return InvocationOutcome::ToolMissing;
            }
            Err(e) => {
                return InvocationOutcome::SpawnFailed(format!(
                    "failed to spawn {}: {e}",
                    check.invocation.program
                ));
            }
        };

        match child.wait_with_output().await {
            Ok(output) => InvocationOutcome::Completed {
                exit_code: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            },
            Err(e) => InvocationOutcome::SpawnFailed(format!(
                "failed to collect output from {}: {e}",
                check.invocation.program
            )),
        }
    }
}

/// Test double: scripted outcomes per check id, with optional per-check
/// delays to exercise timeout and isolation behavior.
pub struct ScriptedInvoker {
    outcomes: std::collections::HashMap<String, InvocationOutcome>,
    delays_ms: std::collections::HashMap<String, u64>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self {
            outcomes: Default::default(),
            delays_ms: Default::default(),
        }
    }

    pub fn outcome(mut self, check_id: &str, outcome: InvocationOutcome) -> Self {
        self.outcomes.insert(check_id.to_string(), outcome);
        self
    }

    pub fn passing(self, check_id: &str) -> Self {
        self.outcome(
            check_id,
            InvocationOutcome::Completed {
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
            },
        )
    }

    pub fn failing(self, check_id: &str, stderr: &str) -> Self {
        self.outcome(
            check_id,
            InvocationOutcome::Completed {
                exit_code: 1,
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        )
    }

    /// Delay the check's completion, simulating a slow or hanging tool.
    pub fn delayed(mut self, check_id: &str, delay_ms: u64) -> Self {
        self.delays_ms.insert(check_id.to_string(), delay_ms);
        self
    }
}

impl Default for ScriptedInvoker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckInvoker for ScriptedInvoker {
    async fn invoke(&self, check: &Check, _files: &[String], _cwd: &Path) -> InvocationOutcome {
        if let Some(delay) = self.delays_ms.get(&check.id) {
            tokio::time::sleep(std::time::Duration::from_millis(*delay)).await;
        }
        self.outcomes
            .get(&check.id)
            .cloned()
            .unwrap_or(InvocationOutcome::ToolMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookgate_core::check::{CheckCategory, FilePattern, Invocation};

    fn sh_check(id: &str, program: &str, args: &[&str]) -> Check {
        Check::new(
            id,
            CheckCategory::Blocking,
            FilePattern::Any,
            Invocation::tool(program, args).without_files(),
        )
    }

    #[tokio::test]
    async fn test_process_invoker_captures_exit_and_output() {
        let check = sh_check("echo-check", "sh", &["-c", "echo out; echo err >&2"]);
        let outcome = ProcessInvoker
            .invoke(&check, &[], Path::new("."))
            .await;
        match outcome {
            InvocationOutcome::Completed {
                exit_code,
                stdout,
                stderr,
            } => {
                assert_eq!(exit_code, 0);
                assert!(stdout.contains("out"));
                assert!(stderr.contains("err"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_process_invoker_nonzero_exit() {
        let check = sh_check("false-check", "sh", &["-c", "exit 3"]);
        let outcome = ProcessInvoker.invoke(&check, &[], Path::new(".")).await;
        assert_eq!(
            outcome,
            InvocationOutcome::Completed {
                exit_code: 3,
                stdout: String::new(),
                stderr: String::new(),
            }
        );
    }

    #[tokio::test]
    async fn test_process_invoker_missing_tool_is_not_an_error() {
        let check = sh_check("ghost", "hookgate-no-such-tool-exists", &[]);
        let outcome = ProcessInvoker.invoke(&check, &[], Path::new(".")).await;
        assert_eq!(outcome, InvocationOutcome::ToolMissing);
    }

    #[tokio::test]
    async fn test_scripted_invoker_defaults_to_missing() {
        let invoker = ScriptedInvoker::new().passing("a");
        let known = sh_check("a", "true", &[]);
        let unknown = sh_check("b", "true", &[]);

        assert!(matches!(
            invoker.invoke(&known, &[], Path::new(".")).await,
            InvocationOutcome::Completed { exit_code: 0, .. }
        ));
        assert_eq!(
            invoker.invoke(&unknown, &[], Path::new(".")).await,
            InvocationOutcome::ToolMissing
        );
    }
}
