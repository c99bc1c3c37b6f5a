//! Git lifecycle stage definitions and the stage transition graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HookgateError;

/// A named point in the git lifecycle at which the pipeline may run.
///
/// The commit chain is `pre-commit -> prepare-message -> validate-message ->
/// post-commit`, after which the lifecycle branches to either `pre-push`
/// (on push) or `pre-merge -> post-merge` (on merge).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    PreCommit,
    PrepareMessage,
    ValidateMessage,
    PostCommit,
    PrePush,
    PreMerge,
    PostMerge,
}

/// Which git operation follows the commit chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    Push,
    Merge,
}

impl Stage {
    /// All stages, in lifecycle order.
    pub const ALL: [Stage; 7] = [
        Stage::PreCommit,
        Stage::PrepareMessage,
        Stage::ValidateMessage,
        Stage::PostCommit,
        Stage::PrePush,
        Stage::PreMerge,
        Stage::PostMerge,
    ];

    /// Get the stage name as used by the matching git hook.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::PreCommit => "pre-commit",
            Stage::PrepareMessage => "prepare-message",
            Stage::ValidateMessage => "validate-message",
            Stage::PostCommit => "post-commit",
            Stage::PrePush => "pre-push",
            Stage::PreMerge => "pre-merge",
            Stage::PostMerge => "post-merge",
        }
    }

    /// Whether this stage may transition to the terminal `blocked` state,
    /// aborting the corresponding git operation.
    ///
    /// `post-commit` and `post-merge` fire after the git object already
    /// exists and cannot prevent it. `prepare-message` only transforms the
    /// pending message and never blocks.
    pub fn can_block(&self) -> bool {
        matches!(
            self,
            Stage::PreCommit | Stage::ValidateMessage | Stage::PrePush | Stage::PreMerge
        )
    }

    /// Whether this stage operates on the pending commit message rather
    /// than on target files.
    pub fn is_message_stage(&self) -> bool {
        matches!(self, Stage::PrepareMessage | Stage::ValidateMessage)
    }

    /// The successor stage in the lifecycle graph, if any.
    ///
    /// `post-commit` branches on the follow-up operation; terminal stages
    /// return `None`.
    pub fn next(&self, continuation: Option<Continuation>) -> Option<Stage> {
        match self {
            Stage::PreCommit => Some(Stage::PrepareMessage),
            Stage::PrepareMessage => Some(Stage::ValidateMessage),
            Stage::ValidateMessage => Some(Stage::PostCommit),
            Stage::PostCommit => match continuation {
                Some(Continuation::Push) => Some(Stage::PrePush),
                Some(Continuation::Merge) => Some(Stage::PreMerge),
                None => None,
            },
            Stage::PrePush => None,
            Stage::PreMerge => Some(Stage::PostMerge),
            Stage::PostMerge => None,
        }
    }

    /// Whether target files come from the staged set (commit stages) or
    /// from a range diff (push/merge stages).
    pub fn uses_staged_files(&self) -> bool {
        matches!(
            self,
            Stage::PreCommit | Stage::PrepareMessage | Stage::ValidateMessage | Stage::PostCommit
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = HookgateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre-commit" => Ok(Stage::PreCommit),
            "prepare-message" | "prepare-commit-msg" => Ok(Stage::PrepareMessage),
            "validate-message" | "commit-msg" => Ok(Stage::ValidateMessage),
            "post-commit" => Ok(Stage::PostCommit),
            "pre-push" => Ok(Stage::PrePush),
            "pre-merge" | "pre-merge-commit" => Ok(Stage::PreMerge),
            "post-merge" => Ok(Stage::PostMerge),
            other => Err(HookgateError::UnknownStage(other.to_string())),
        }
    }
}
