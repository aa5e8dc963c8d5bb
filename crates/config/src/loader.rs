//! Configuration loader for rivet
//!
//! Combines the CLI's parsed flags with the tool's environment variables and
//! captures the build context (parameter arguments, environment, working
//! directory) exactly once at startup.

use crate::config::{Config, RuntimeSettings};
use rivet_core::{
    constants::{RIVET_CONTINUE_VAR, RIVET_SKIP_VAR},
    Error, FailurePolicy, Result, SkipSelection, TargetName,
};
use rivet_params::BuildContext;
use std::path::PathBuf;

/// Flags as the CLI parsed them, before environment fallbacks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub targets: Vec<String>,
    /// `Some(empty)` means "skip everything not requested"
    pub skip: Option<Vec<String>>,
    pub continue_on_failure: bool,
    pub plan_only: bool,
    pub describe: bool,
    pub report_path: Option<PathBuf>,
    pub verbosity: u8,
    /// Build parameter tokens in `-name value` form
    pub parameter_args: Vec<String>,
}

/// Configuration loader that handles all startup configuration
#[derive(Debug, Default)]
pub struct ConfigLoader {
    runtime: RuntimeOptions,
    /// Injected environment; the process environment when unset
    environment: Option<Vec<(String, String)>>,
    /// Injected working directory; the current directory when unset
    directory: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set runtime options
    pub fn runtime(mut self, runtime: RuntimeOptions) -> Self {
        self.runtime = runtime;
        self
    }

    /// Use these variables instead of the process environment
    pub fn environment<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Set the directory the build runs in
    pub fn directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directory = Some(dir.into());
        self
    }

    /// Load the configuration
    pub fn load(self) -> Result<Config> {
        let working_directory = match self.directory {
            Some(dir) => dir,
            None => std::env::current_dir()
                .map_err(|e| Error::file_system(".", "determine working directory", e))?,
        };
        let environment = match self.environment {
            Some(vars) => vars,
            None => std::env::vars().collect(),
        };

        let runtime = self.runtime;
        let context = BuildContext::builder()
            .args(&runtime.parameter_args)
            .environment(environment)
            .working_directory(working_directory)
            .build();

        let policy = if runtime.continue_on_failure {
            FailurePolicy::Continue
        } else {
            match context.environment_var(RIVET_CONTINUE_VAR) {
                Some(value) => {
                    FailurePolicy::from_continue_flag(parse_flag(RIVET_CONTINUE_VAR, value)?)
                }
                None => FailurePolicy::FailFast,
            }
        };

        let skip = match &runtime.skip {
            Some(names) => skip_selection(names.iter().map(String::as_str))?,
            None => match context.environment_var(RIVET_SKIP_VAR) {
                Some(value) => skip_selection([value])?,
                None => SkipSelection::None,
            },
        };

        let settings = RuntimeSettings {
            targets: runtime.targets,
            skip,
            policy,
            plan_only: runtime.plan_only,
            describe: runtime.describe,
            report_path: runtime.report_path,
            verbosity: runtime.verbosity,
        };
        tracing::debug!(
            policy = ?settings.policy,
            skip = ?settings.skip,
            dir = %context.working_directory().display(),
            "loaded configuration"
        );

        Ok(Config::new(context, settings))
    }
}

fn parse_flag(variable: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        _ => Err(Error::configuration(format!(
            "{variable} must be a boolean, got '{value}'"
        ))),
    }
}

/// Comma-separated names; nothing at all selects every non-requested target
fn skip_selection<'a>(values: impl IntoIterator<Item = &'a str>) -> Result<SkipSelection> {
    let names = values
        .into_iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(TargetName::new)
        .collect::<Result<Vec<_>>>()?;

    if names.is_empty() {
        Ok(SkipSelection::All)
    } else {
        Ok(SkipSelection::Named(names))
    }
}
