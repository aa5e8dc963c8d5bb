//! Run policy knobs supplied by the invoking CLI layer

use super::names::TargetName;
use serde::{Deserialize, Serialize};

/// What happens to unrelated targets after a failure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort everything that has not run yet and stop
    #[default]
    FailFast,
    /// Abort only dependents of the failed target; independent branches finish
    Continue,
}

impl FailurePolicy {
    /// Map the CLI's "continue on failure" flag
    pub fn from_continue_flag(continue_on_failure: bool) -> Self {
        if continue_on_failure {
            FailurePolicy::Continue
        } else {
            FailurePolicy::FailFast
        }
    }
}

/// Targets forced to `Skipped` regardless of their conditions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipSelection {
    #[default]
    None,
    /// Skip every target that was not explicitly requested
    All,
    Named(Vec<TargetName>),
}

impl SkipSelection {
    /// Whether a target is skipped under this selection
    pub fn skips(&self, name: &TargetName, requested: bool) -> bool {
        match self {
            SkipSelection::None => false,
            SkipSelection::All => !requested,
            SkipSelection::Named(names) => names.contains(name),
        }
    }
}
