//! Command line front end for rivet builds
//!
//! A build crate implements [`BuildDefinition`] and hands it to [`execute`]
//! from its own `main`:
//!
//! ```no_run
//! use clap::Parser;
//! use rivet::{BuildDefinition, Cli, Target};
//!
//! struct Build;
//!
//! impl BuildDefinition for Build {
//!     fn targets(&self) -> Vec<Target> {
//!         vec![Target::new("Compile")]
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     std::process::exit(rivet::execute(&Build, Cli::parse()).await);
//! }
//! ```

pub mod cli;
pub mod execute;
pub mod summary;

pub use cli::Cli;
pub use execute::{execute, run};

// Re-export what a build definition needs
pub use rivet_core::{Error, Result, TargetName};
pub use rivet_params::{ParameterDescriptor, ParameterValue, RawValue, ValueProviders};
pub use rivet_task::{BuildDefinition, CommandBody, Requirement, Target, TargetContext};
