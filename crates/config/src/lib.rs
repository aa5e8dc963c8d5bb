//! Run configuration for rivet
//!
//! The CLI layer hands its parsed flags to a [`ConfigLoader`], which folds in
//! the tool's own environment variables and captures the build context. The
//! resulting [`Config`] is immutable and is the only thing the rest of a run
//! reads its settings from.

pub mod config;
pub mod loader;

pub use config::{Config, RuntimeSettings};
pub use loader::{ConfigLoader, RuntimeOptions};
