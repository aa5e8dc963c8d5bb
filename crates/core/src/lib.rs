//! Core domain types, errors, and constants for `rivet`.
//!
//! Everything the parameter resolver, the target graph and the execution
//! engine have to agree on lives here:
//!
//! - **`errors`**: the primary `Error` enum, the `ConfigurationError`
//!   taxonomy and the `Result` alias.
//! - **`types`**: case-insensitive target names, target statuses, run
//!   outcomes and the run policy knobs supplied by the CLI layer.
//! - **`constants`**: environment variable names and exit codes.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{ConfigurationError, Error, ErrorKind, Result},
    types::*,
};
