//! Fork-join execution of applicable checks.
//!
//! One worker task per check, bounded by a semaphore. Workers share
//! nothing mutable except the write-once result store; the orchestrator
//! suspends once, on worker termination, and only then reads results.
//! A worker that panics, hangs, or never reports is recorded as a
//! failure, never a silent pass, and cannot disturb its siblings.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use hookgate_core::check::{Check, CheckCategory, CheckResult};
use hookgate_core::store::{store_key, ResultStore};

use crate::invoker::{CheckInvoker, InvocationOutcome};

/// Run every check concurrently and collect all results into `store`.
///
/// Returns once every worker has terminated (completed, panicked, or been
/// cut off by its timeout). After return, `store` holds exactly one
/// result per check.
pub async fn run_checks(
    invoker: Arc<dyn CheckInvoker>,
    checks: Vec<Check>,
    files: Arc<Vec<String>>,
    cwd: PathBuf,
    store: Arc<ResultStore>,
    jobs: usize,
) {
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let mut workers: Vec<(String, JoinHandle<()>)> = Vec::with_capacity(checks.len());

    for check in checks.clone() {
        let invoker = Arc::clone(&invoker);
        let files = Arc::clone(&files);
        let cwd = cwd.clone();
        let store = Arc::clone(&store);
        let semaphore = Arc::clone(&semaphore);
        let check_id = check.id.clone();

        let handle = tokio::spawn(async move {
            // Queue time waiting for a permit does not count against the
            // check's wall-clock timeout.
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("executor semaphore closed");

            debug!(check = %check.id, "worker started");
            let started = Instant::now();

            let outcome = tokio::time::timeout(
                Duration::from_secs(check.timeout_secs),
                invoker.invoke(&check, &files, &cwd),
            )
            .await;

            let result = match outcome {
                Err(_) => {
                    warn!(check = %check.id, timeout_secs = check.timeout_secs, "worker killed on timeout");
                    CheckResult::timeout(&check.id, check.timeout_secs)
                }
                Ok(outcome) => map_outcome(&check, outcome, started.elapsed()),
            };

            if let Err(e) = store.set(&store_key(&check.id), result) {
                // Write-once violation: the first result stands.
                error!(check = %check.id, error = %e, "duplicate result write");
            }
        });

        workers.push((check_id, handle));
    }

    for (check_id, handle) in workers {
        if let Err(join_err) = handle.await {
            // A panicking worker is contained to a failed result for its
            // own check; siblings keep their slots.
            error!(check = %check_id, error = %join_err, "worker crashed");
            let result = CheckResult::fail(&check_id, "check worker crashed", None, 0);
            let _ = store.set(&store_key(&check_id), result);
        }
    }

    // Terminal-result invariant: every applicable check reports before the
    // verdict is computed. A worker that terminated without writing its
    // slot becomes a failure, never a silent pass.
    for check in &checks {
        let key = store_key(&check.id);
        if store.get(&key).is_none() {
            let result = CheckResult::fail(&check.id, "worker terminated without reporting", None, 0);
            let _ = store.set(&key, result);
        }
    }
}

fn map_outcome(check: &Check, outcome: InvocationOutcome, elapsed: Duration) -> CheckResult {
    let duration_ms = elapsed.as_millis() as u64;
    match outcome {
        InvocationOutcome::ToolMissing => CheckResult::skip(
            &check.id,
            format!("{} not installed; skipping", check.invocation.program),
        ),
        InvocationOutcome::SpawnFailed(message) => {
            CheckResult::fail(&check.id, message, None, duration_ms)
        }
        InvocationOutcome::Completed {
            exit_code,
            stdout,
            stderr,
        } => {
            if check.invocation.pass_when.passes(exit_code) {
                CheckResult::pass(&check.id, duration_ms)
            } else {
                let message = format!("exited with code {exit_code}");
                let combined = format!("{}{}", stdout, stderr);
                let output = (!combined.trim().is_empty()).then(|| combined.trim().to_string());
                match check.category {
                    CheckCategory::Blocking => {
                        CheckResult::fail(&check.id, message, output, duration_ms)
                    }
                    CheckCategory::Warning | CheckCategory::Advisory => {
                        CheckResult::warn(&check.id, message, output, duration_ms)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::ScriptedInvoker;
    use hookgate_core::check::{CheckStatus, FilePattern, Invocation};

    fn check(id: &str, category: CheckCategory) -> Check {
        Check::new(
            id,
            category,
            FilePattern::Any,
            Invocation::tool("true", &[]),
        )
    }

    fn result_for(store: &ResultStore, id: &str) -> CheckResult {
        store.get(&store_key(id)).expect("result present")
    }

    #[tokio::test]
    async fn test_every_check_yields_exactly_one_result() {
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .passing("a")
                .failing("b", "broken")
                .passing("c"),
        );
        let checks = vec![
            check("a", CheckCategory::Blocking),
            check("b", CheckCategory::Blocking),
            check("c", CheckCategory::Warning),
        ];
        let store = Arc::new(ResultStore::new());

        run_checks(
            invoker,
            checks,
            Arc::new(vec!["f.sh".to_string()]),
            PathBuf::from("."),
            Arc::clone(&store),
            4,
        )
        .await;

        assert_eq!(store.len(), 3);
        assert_eq!(result_for(&store, "a").status, CheckStatus::Pass);
        assert_eq!(result_for(&store, "b").status, CheckStatus::Fail);
        assert_eq!(result_for(&store, "c").status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn test_warning_category_failure_is_warn_not_fail() {
        let invoker = Arc::new(ScriptedInvoker::new().failing("style", "ugly"));
        let store = Arc::new(ResultStore::new());

        run_checks(
            invoker,
            vec![check("style", CheckCategory::Warning)],
            Arc::new(vec!["f.sh".to_string()]),
            PathBuf::from("."),
            Arc::clone(&store),
            2,
        )
        .await;

        let result = result_for(&store, "style");
        assert_eq!(result.status, CheckStatus::Warn);
        assert_eq!(result.output.as_deref(), Some("ugly"));
    }

    #[tokio::test]
    async fn test_missing_tool_is_skip() {
        let invoker = Arc::new(ScriptedInvoker::new());
        let store = Arc::new(ResultStore::new());

        run_checks(
            invoker,
            vec![check("ghost", CheckCategory::Blocking)],
            Arc::new(vec!["f.sh".to_string()]),
            PathBuf::from("."),
            Arc::clone(&store),
            2,
        )
        .await;

        assert_eq!(result_for(&store, "ghost").status, CheckStatus::Skip);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_check_times_out_without_blocking_siblings() {
        let invoker = Arc::new(
            ScriptedInvoker::new()
                .passing("fast")
                .delayed("hang", 120_000)
                .passing("hang"),
        );
        let slow = check("hang", CheckCategory::Blocking).timeout_secs(1);
        let store = Arc::new(ResultStore::new());

        run_checks(
            invoker,
            vec![slow, check("fast", CheckCategory::Blocking)],
            Arc::new(vec!["f.sh".to_string()]),
            PathBuf::from("."),
            Arc::clone(&store),
            4,
        )
        .await;

        assert_eq!(result_for(&store, "fast").status, CheckStatus::Pass);
        let hung = result_for(&store, "hang");
        assert_eq!(hung.status, CheckStatus::Timeout);
        assert!(hung.message.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded_but_all_complete() {
        let mut invoker = ScriptedInvoker::new();
        let mut checks = Vec::new();
        for i in 0..10 {
            let id = format!("check-{i}");
            invoker = invoker.passing(&id).delayed(&id, 5);
            checks.push(check(&id, CheckCategory::Blocking));
        }
        let store = Arc::new(ResultStore::new());

        run_checks(
            Arc::new(invoker),
            checks,
            Arc::new(vec!["f.sh".to_string()]),
            PathBuf::from("."),
            Arc::clone(&store),
            2,
        )
        .await;

        assert_eq!(store.len(), 10);
        assert!(!store.has_any(|r| r.status.is_failure()));
    }
}
