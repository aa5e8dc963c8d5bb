//! Error types for rivet operations

mod builders;
mod conversions;
mod display;
mod types;

pub use types::{ConfigurationError, Error, ErrorKind, Result};
