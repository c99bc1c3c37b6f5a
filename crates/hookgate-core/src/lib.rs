//! hookgate core library
//!
//! Domain types for the git lifecycle validation gatekeeper: the check
//! catalog and registry, the write-once result store, the commit-size
//! policy evaluator, bypass/audit handling, and git collaborators.

pub mod bypass;
pub mod check;
pub mod config;
pub mod error;
pub mod git;
pub mod message;
pub mod policy;
pub mod registry;
pub mod stage;
pub mod store;
pub mod telemetry;

pub use bypass::{AuditLog, BypassEvent, BypassFlags, MASTER_SKIP_FLAG};
pub use check::{
    builtin_checks, bypass_flag_for, Check, CheckCategory, CheckResult, CheckStatus, FilePattern,
    Invocation, PassWhen,
};
pub use config::{Config, DEFAULT_JOBS};
pub use error::{HookgateError, Result};
pub use git::DiffStats;
pub use policy::{
    oversize_files, OversizeFile, PolicyThresholds, Tier, TierThreshold, FILE_SIZE_BYPASS_FLAG,
    TIER_BYPASS_FLAG,
};
pub use registry::CheckRegistry;
pub use stage::{Continuation, Stage};
pub use store::{store_key, ResultStore};
pub use telemetry::init_tracing;
