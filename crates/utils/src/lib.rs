//! Shared utilities for rivet
//!
//! Tracing initialisation with span and event helpers used by the engine,
//! plus atomic file writes for run reports.

pub mod atomic_file;
pub mod tracing;

pub use atomic_file::*;
