//! Domain-level error taxonomy for hookgate.
//!
//! These are *system* errors: the orchestrator itself cannot proceed.
//! They are distinct from validation outcomes (a failing check is a
//! `CheckResult`, never an error) and map to the reserved exit code.

/// hookgate system errors.
#[derive(Debug, thiserror::Error)]
pub enum HookgateError {
    #[error("git error: {0}")]
    Git(String),

    #[error("unknown stage: {0}")]
    UnknownStage(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("check registration error: {0}")]
    Registry(String),

    #[error("result store violation: key {key} written twice")]
    DuplicateResult { key: String },

    #[error("audit log error: {0}")]
    Audit(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for hookgate domain operations.
pub type Result<T> = std::result::Result<T, HookgateError>;
