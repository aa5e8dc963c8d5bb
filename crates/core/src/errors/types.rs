//! Core error type definitions

use std::path::PathBuf;

/// Result type alias for rivet operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors in the build declaration or its inputs.
///
/// These are always fatal: they are detected before the first target body
/// runs (or halt the run as soon as a body discovers one). The type is
/// `Clone` so the parameter cache can hand out the same failure every time a
/// parameter is read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// Two or more targets share a (case-insensitive) name
    DuplicateTargets { names: Vec<String> },

    /// A relation or the requested selection names an undeclared target
    UnknownTarget {
        name: String,
        referenced_by: Option<String>,
    },

    /// The ordering relations contain a cycle; `path` revisits its first member
    DependencyCycle { path: Vec<String> },

    /// Nothing was requested and the build declares no default targets
    NoTargetsRequested,

    /// A parameter declared as an unknown name
    UnknownParameter { name: String },

    /// Two parameter descriptors resolve to the same lookup name
    DuplicateParameter { name: String },

    /// A required parameter has no explicitly supplied value
    MissingParameter { name: String },

    /// A raw value could not be coerced to the declared type
    MalformedParameter {
        name: String,
        value: String,
        message: String,
    },

    /// A descriptor references a value provider that was never registered
    UnknownValueProvider { parameter: String, provider: String },

    /// A registered value provider failed
    ValueProviderFailed {
        parameter: String,
        provider: String,
        message: String,
    },

    /// Any other invalid declaration
    Invalid { message: String },
}

/// Core error type for rivet operations using thiserror
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Build declaration or parameter errors
    Configuration(ConfigurationError),

    /// Command execution errors
    CommandExecution {
        command: String,
        args: Vec<String>,
        message: String,
        exit_code: Option<i32>,
    },

    /// File system operations
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// The run was interrupted by the user
    Cancelled,
}

/// Coarse classification used for exit codes and report rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Execution,
    Io,
    Cancelled,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::CommandExecution { .. } => ErrorKind::Execution,
            Error::FileSystem { .. } | Error::Json { .. } => ErrorKind::Io,
            Error::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Whether this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    /// The configuration error, if this is one
    pub fn as_configuration(&self) -> Option<&ConfigurationError> {
        match self {
            Error::Configuration(inner) => Some(inner),
            _ => None,
        }
    }
}
