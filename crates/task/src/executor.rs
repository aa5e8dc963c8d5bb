mod context;
mod engine;
mod graph;
mod plan;
mod report;

pub use context::{CancellationFlag, TargetContext};
pub use engine::{ExecutionEngine, RunOptions};
pub use graph::{Relation, TargetGraph};
pub use plan::{ExecutionPlan, Inclusion, PlanEntry};
pub use report::{ReportEntry, RunReport};
