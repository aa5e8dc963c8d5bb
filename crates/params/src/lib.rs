//! Build parameter declaration and resolution for rivet
//!
//! A build definition declares its parameters as [`ParameterDescriptor`]s.
//! The [`ParameterResolver`] binds each one to a value exactly once per run,
//! looking at the command line, then the environment, then a named
//! [`ValueProvider`], and finally the type default.

pub mod arguments;
pub mod coercion;
pub mod context;
pub mod descriptor;
pub mod names;
pub mod provider;
pub mod resolver;
pub mod value;

pub use arguments::{ArgumentEntry, ArgumentMap};
pub use context::{BuildContext, BuildContextBuilder};
pub use descriptor::{ParameterDescriptor, ParameterInfo, ParameterShape, ParameterType};
pub use names::normalize_name;
pub use provider::{RawValue, ValueProvider, ValueProviders};
pub use resolver::ParameterResolver;
pub use value::{ParameterValue, ResolvedParameter, ValueSource};
