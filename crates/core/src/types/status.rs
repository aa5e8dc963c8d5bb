//! Target lifecycle states and run outcomes

use crate::constants::{
    EXIT_CONFIGURATION_ERROR, EXIT_FAILURE, EXIT_SUCCESS, EXIT_USER_CANCELLED,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a target was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A static or dynamic condition evaluated to false
    ConditionFalse,
    /// A `requires` predicate did not hold
    RequirementNotMet,
    /// Named in (or covered by) the user's skip selection
    SkippedByUser,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ConditionFalse => f.write_str("condition false"),
            SkipReason::RequirementNotMet => f.write_str("requirement not met"),
            SkipReason::SkippedByUser => f.write_str("skipped by user"),
        }
    }
}

/// Lifecycle of a target within one run.
///
/// `Pending → {Skipped | Running → Succeeded | Running → Failed} | Aborted`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum TargetStatus {
    Pending,
    Running,
    Skipped(SkipReason),
    Succeeded,
    Failed,
    Aborted,
}

impl TargetStatus {
    /// Whether a dependent may run after this target.
    ///
    /// Skipped counts as satisfied: skip means "not needed", not "failed".
    pub fn satisfies_dependents(&self) -> bool {
        matches!(self, TargetStatus::Succeeded | TargetStatus::Skipped(_))
    }

    /// Whether this status blocks dependents (`Failed` or `Aborted`)
    pub fn blocks_dependents(&self) -> bool {
        matches!(self, TargetStatus::Failed | TargetStatus::Aborted)
    }

    /// Checks that moving to `next` is a legal lifecycle transition
    pub fn can_transition_to(&self, next: TargetStatus) -> bool {
        matches!(
            (self, next),
            (TargetStatus::Pending, TargetStatus::Skipped(_))
                | (TargetStatus::Pending, TargetStatus::Running)
                | (TargetStatus::Pending, TargetStatus::Aborted)
                | (TargetStatus::Running, TargetStatus::Succeeded)
                | (TargetStatus::Running, TargetStatus::Failed)
        )
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetStatus::Pending => f.write_str("Pending"),
            TargetStatus::Running => f.write_str("Running"),
            TargetStatus::Skipped(reason) => write!(f, "Skipped ({reason})"),
            TargetStatus::Succeeded => f.write_str("Succeeded"),
            TargetStatus::Failed => f.write_str("Failed"),
            TargetStatus::Aborted => f.write_str("Aborted"),
        }
    }
}

/// Overall result of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Success,
    Failure,
    ConfigurationError,
    UserCancelled,
}

impl RunOutcome {
    /// Process exit code the invoking layer should use
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Success => EXIT_SUCCESS,
            RunOutcome::Failure => EXIT_FAILURE,
            RunOutcome::ConfigurationError => EXIT_CONFIGURATION_ERROR,
            RunOutcome::UserCancelled => EXIT_USER_CANCELLED,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success)
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Success => f.write_str("Build succeeded"),
            RunOutcome::Failure => f.write_str("Build failed"),
            RunOutcome::ConfigurationError => f.write_str("Build configuration invalid"),
            RunOutcome::UserCancelled => f.write_str("Build cancelled"),
        }
    }
}
