//! Per-run context: one invocation of the pipeline at one stage.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use hookgate_core::stage::Stage;
use hookgate_core::store::ResultStore;

/// One invocation of the validation pipeline.
///
/// Owns exactly one result store for its lifetime. The context is an
/// explicit value handed to the executor and the aggregator, never
/// process-wide state, so concurrent runs (tests included) cannot
/// interfere with each other.
#[derive(Debug, Clone)]
pub struct ValidationRun {
    pub id: Uuid,
    pub stage: Stage,
    pub files: Arc<Vec<String>>,
    pub cwd: PathBuf,
    pub started_at: DateTime<Utc>,
    pub store: Arc<ResultStore>,
}

impl ValidationRun {
    pub fn new(stage: Stage, files: Vec<String>, cwd: PathBuf) -> Self {
        Self {
            id: Uuid::new_v4(),
            stage,
            files: Arc::new(files),
            cwd,
            started_at: Utc::now(),
            store: Arc::new(ResultStore::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_run_owns_a_fresh_store() {
        let a = ValidationRun::new(Stage::PreCommit, vec!["x.sh".to_string()], PathBuf::from("."));
        let b = ValidationRun::new(Stage::PreCommit, vec!["x.sh".to_string()], PathBuf::from("."));

        assert_ne!(a.id, b.id);
        a.store
            .set("k", hookgate_core::check::CheckResult::pass("k", 1))
            .unwrap();
        assert!(b.store.is_empty());
    }
}
