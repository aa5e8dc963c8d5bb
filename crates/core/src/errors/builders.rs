//! Builder methods for creating errors with context

use super::types::{ConfigurationError, Error};
use std::path::PathBuf;

// Helper methods for creating errors with context
impl Error {
    /// Create a generic configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(ConfigurationError::Invalid {
            message: message.into(),
        })
    }

    /// Create a duplicate target error naming every colliding target
    #[must_use]
    pub fn duplicate_targets<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Error::Configuration(ConfigurationError::DuplicateTargets {
            names: names.into_iter().map(Into::into).collect(),
        })
    }

    /// Create an unknown target error
    #[must_use]
    pub fn unknown_target(name: impl Into<String>, referenced_by: Option<String>) -> Self {
        Error::Configuration(ConfigurationError::UnknownTarget {
            name: name.into(),
            referenced_by,
        })
    }

    /// Create a dependency cycle error from the ordered cycle members
    #[must_use]
    pub fn dependency_cycle(path: Vec<String>) -> Self {
        Error::Configuration(ConfigurationError::DependencyCycle { path })
    }

    /// Create a missing required parameter error
    #[must_use]
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Error::Configuration(ConfigurationError::MissingParameter { name: name.into() })
    }

    /// Create an unknown parameter error
    #[must_use]
    pub fn unknown_parameter(name: impl Into<String>) -> Self {
        Error::Configuration(ConfigurationError::UnknownParameter { name: name.into() })
    }

    /// Create a malformed parameter value error
    #[must_use]
    pub fn malformed_parameter(
        name: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Configuration(ConfigurationError::MalformedParameter {
            name: name.into(),
            value: value.into(),
            message: message.into(),
        })
    }

    /// Create a command execution error
    #[must_use]
    pub fn command_execution(
        command: impl Into<String>,
        args: Vec<String>,
        message: impl Into<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Error::CommandExecution {
            command: command.into(),
            args,
            message: message.into(),
            exit_code,
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }
}
