use super::plan::Inclusion;
use rivet_core::{RunOutcome, TargetName, TargetStatus};
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Final state of one target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub name: TargetName,
    pub inclusion: Inclusion,
    pub status: TargetStatus,
    /// Skip reason, abort cause or captured error text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    pub duration: Duration,
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis().try_into().unwrap_or(u64::MAX))
}

/// Outcome of one run, in execution order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    outcome: RunOutcome,
    /// Run-level error such as a configuration problem
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(rename = "duration_ms", serialize_with = "as_millis")]
    duration: Duration,
    targets: Vec<ReportEntry>,
}

impl RunReport {
    pub(crate) fn new(
        outcome: RunOutcome,
        error: Option<String>,
        duration: Duration,
        targets: Vec<ReportEntry>,
    ) -> Self {
        Self {
            outcome,
            error,
            duration,
            targets,
        }
    }

    pub fn outcome(&self) -> RunOutcome {
        self.outcome
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.targets
    }

    pub fn entry(&self, name: &str) -> Option<&ReportEntry> {
        self.targets.iter().find(|entry| entry.name.matches(name))
    }

    /// Final status of a target, if it was part of the run
    pub fn status(&self, name: &str) -> Option<TargetStatus> {
        self.entry(name).map(|entry| entry.status)
    }

    pub fn message(&self, name: &str) -> Option<&str> {
        self.entry(name).and_then(|entry| entry.message.as_deref())
    }

    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }

    pub fn to_json(&self) -> rivet_core::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
