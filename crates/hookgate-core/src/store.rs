//! Write-once result store shared between concurrent check workers.
//!
//! Each key is written at most once, atomically, and readers only scan
//! after every writer has terminated. A second write to the same key is
//! a loud violation, never a silent overwrite.

use std::collections::HashMap;
use std::sync::Mutex;

use sha2::{Digest, Sha256};

use crate::check::CheckResult;
use crate::error::{HookgateError, Result};

/// Derive a stable, collision-free store key from a check id.
///
/// Identifier-safe characters pass through; anything else is stripped and
/// the key gains a short content-hash suffix so distinct ids can never
/// collapse onto the same key.
pub fn store_key(check_id: &str) -> String {
    let sanitized: String = check_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized == check_id {
        sanitized
    } else {
        let digest = Sha256::digest(check_id.as_bytes());
        format!("{}_{}", sanitized, &hex::encode(digest)[..8])
    }
}

/// Process-shared key space for check outcomes and artifacts.
///
/// One writer per worker, single reader (the executor) after all workers
/// have joined. Each `set` is atomic; there are no cross-key transactions.
#[derive(Debug, Default)]
pub struct ResultStore {
    results: Mutex<HashMap<String, CheckResult>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a result under `key`. Write-once: a duplicate key is an
    /// error, surfaced instead of silently replacing the first outcome.
    pub fn set(&self, key: &str, result: CheckResult) -> Result<()> {
        let mut results = self.results.lock().expect("result store poisoned");
        if results.contains_key(key) {
            return Err(HookgateError::DuplicateResult {
                key: key.to_string(),
            });
        }
        results.insert(key.to_string(), result);
        Ok(())
    }

    /// Read back a single result.
    pub fn get(&self, key: &str) -> Option<CheckResult> {
        self.results
            .lock()
            .expect("result store poisoned")
            .get(key)
            .cloned()
    }

    /// Whether any stored result satisfies `predicate`.
    pub fn has_any(&self, predicate: impl Fn(&CheckResult) -> bool) -> bool {
        self.results
            .lock()
            .expect("result store poisoned")
            .values()
            .any(|r| predicate(r))
    }

    /// Number of stored results.
    pub fn len(&self) -> usize {
        self.results.lock().expect("result store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All results. Only meaningful after every writer has terminated.
    pub fn snapshot(&self) -> Vec<CheckResult> {
        self.results
            .lock()
            .expect("result store poisoned")
            .values()
            .cloned()
            .collect()
    }
}
