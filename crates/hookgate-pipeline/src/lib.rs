//! hookgate pipeline - concurrent validation orchestration
//!
//! Provides the validation pipeline orchestrator that:
//! - Selects applicable checks for a git lifecycle stage
//! - Fork-joins them as isolated concurrent workers with timeouts
//! - Classifies commit size into policy tiers
//! - Derives a blocked/passed verdict and audits every bypass

pub mod executor;
pub mod invoker;
pub mod pipeline;
pub mod report;
pub mod run;
pub mod verdict;

// Re-export key types
pub use invoker::{CheckInvoker, InvocationOutcome, ProcessInvoker, ScriptedInvoker};
pub use pipeline::{Pipeline, RunOutcome, Targets};
pub use report::{artifact, render_human, ReportArtifact, REPORT_SCHEMA_VERSION};
pub use run::ValidationRun;
pub use verdict::{Finding, Verdict, VerdictStatus, MESSAGE_BYPASS_FLAG};
