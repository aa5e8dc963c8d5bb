//! Domain types shared by the resolver, the graph and the engine

pub mod names;
pub mod policy;
pub mod status;

pub use names::TargetName;
pub use policy::{FailurePolicy, SkipSelection};
pub use status::{RunOutcome, SkipReason, TargetStatus};
