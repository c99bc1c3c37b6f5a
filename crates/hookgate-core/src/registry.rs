//! Ordered catalog of registered checks.

use crate::check::Check;
use crate::error::{HookgateError, Result};
use crate::stage::Stage;

/// Registry of immutable check definitions.
///
/// Checks are registered once at process start and never mutated. A run
/// selects a subset via [`CheckRegistry::applicable`]. Registration order
/// is preserved and used only for reporting order; execution is concurrent.
#[derive(Debug, Default)]
pub struct CheckRegistry {
    checks: Vec<Check>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the builtin catalog.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for check in crate::check::builtin_checks() {
            registry
                .register(check)
                .expect("builtin catalog has unique ids");
        }
        registry
    }

    /// Add a check. Duplicate or empty ids fail loudly at startup.
    pub fn register(&mut self, check: Check) -> Result<()> {
        if check.id.is_empty() {
            return Err(HookgateError::Registry(
                "check id must not be empty".to_string(),
            ));
        }
        if self.checks.iter().any(|c| c.id == check.id) {
            return Err(HookgateError::Registry(format!(
                "duplicate check id: {}",
                check.id
            )));
        }
        self.checks.push(check);
        Ok(())
    }

    /// Look up a check by id.
    pub fn get(&self, id: &str) -> Option<&Check> {
        self.checks.iter().find(|c| c.id == id)
    }

    /// All registered checks, in registration order.
    pub fn all(&self) -> &[Check] {
        &self.checks
    }

    /// Checks applicable at `stage` for `files`, in registration order.
    ///
    /// Deterministic for a fixed (stage, file set, registry).
    pub fn applicable(&self, stage: Stage, files: &[String]) -> Vec<&Check> {
        self.checks
            .iter()
            .filter(|c| c.applicable(stage, files))
            .collect()
    }
}
