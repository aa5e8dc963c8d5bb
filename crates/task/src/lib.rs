//! Target graph, planning and execution for rivet
//!
//! A [`BuildDefinition`] declares [`Target`]s and parameter descriptors.
//! [`TargetGraph::build`] validates the declarations, [`ExecutionPlan`]
//! orders the targets a request needs, and [`ExecutionEngine`] walks the plan
//! and produces a [`RunReport`].

pub mod command_executor;
pub mod definition;
pub mod executor;
pub mod target;

pub use command_executor::CommandBody;
pub use definition::{BuildDefinition, BuildMetadata, PreparedBuild, TargetInfo};
pub use executor::*;
pub use target::{
    Condition, ConditionCheck, ConditionTiming, FnBody, Requirement, Target, TargetBody,
};
