//! Display implementations for error types

use super::types::{ConfigurationError, Error};
use std::fmt;

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::DuplicateTargets { names } => {
                write!(f, "duplicate target names: {}", names.join(", "))
            }
            ConfigurationError::UnknownTarget {
                name,
                referenced_by,
            } => match referenced_by {
                Some(owner) => write!(f, "target '{owner}' references unknown target '{name}'"),
                None => write!(f, "target '{name}' not found"),
            },
            ConfigurationError::DependencyCycle { path } => {
                write!(f, "circular dependency detected: {}", path.join(" → "))
            }
            ConfigurationError::NoTargetsRequested => {
                write!(f, "no targets requested and no default targets declared")
            }
            ConfigurationError::UnknownParameter { name } => {
                write!(f, "parameter '{name}' is not declared")
            }
            ConfigurationError::DuplicateParameter { name } => {
                write!(f, "parameter '{name}' is declared more than once")
            }
            ConfigurationError::MissingParameter { name } => {
                write!(f, "required parameter '{name}' was not supplied")
            }
            ConfigurationError::MalformedParameter {
                name,
                value,
                message,
            } => {
                write!(f, "invalid value '{value}' for parameter '{name}': {message}")
            }
            ConfigurationError::UnknownValueProvider {
                parameter,
                provider,
            } => {
                write!(
                    f,
                    "parameter '{parameter}' references unknown value provider '{provider}'"
                )
            }
            ConfigurationError::ValueProviderFailed {
                parameter,
                provider,
                message,
            } => {
                write!(
                    f,
                    "value provider '{provider}' failed for parameter '{parameter}': {message}"
                )
            }
            ConfigurationError::Invalid { message } => write!(f, "{message}"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(inner) => write!(f, "configuration error: {inner}"),
            Error::CommandExecution {
                command,
                args,
                message,
                exit_code,
            } => {
                let args_str = args.join(" ");
                let invocation = if args_str.is_empty() {
                    command.clone()
                } else {
                    format!("{command} {args_str}")
                };
                match exit_code {
                    Some(code) => write!(
                        f,
                        "command '{invocation}' failed with exit code {code}: {message}"
                    ),
                    None => write!(f, "command '{invocation}' failed: {message}"),
                }
            }
            Error::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "file system {} operation failed for '{}': {}",
                    operation,
                    path.display(),
                    source
                )
            }
            Error::Json { message, .. } => write!(f, "JSON error: {message}"),
            Error::Cancelled => write!(f, "run cancelled by user"),
        }
    }
}
