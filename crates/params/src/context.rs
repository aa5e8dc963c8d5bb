//! Explicit per-run context replacing ambient process state

use crate::arguments::ArgumentMap;
use crate::names::normalize_name;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Everything a run reads from its surroundings.
///
/// The resolver and the engine only ever see this value, so tests can
/// substitute arguments, environment and working directory freely.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    arguments: ArgumentMap,
    /// normalised name -> (declared key, value)
    environment: IndexMap<String, (String, String)>,
    working_directory: PathBuf,
}

impl BuildContext {
    pub fn builder() -> BuildContextBuilder {
        BuildContextBuilder::default()
    }

    /// Capture the current process environment and working directory
    pub fn capture<I, S>(parameter_args: I) -> std::io::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(BuildContext::builder()
            .arguments(ArgumentMap::parse(parameter_args))
            .environment(std::env::vars())
            .working_directory(std::env::current_dir()?)
            .build())
    }

    pub fn arguments(&self) -> &ArgumentMap {
        &self.arguments
    }

    /// Environment lookup using parameter name matching rules.
    ///
    /// Empty values are treated as unset.
    pub fn environment_value(&self, name: &str) -> Option<&str> {
        self.environment
            .get(&normalize_name(name))
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
    }

    /// Exact-key environment lookup, for the tool's own settings
    pub fn environment_var(&self, key: &str) -> Option<&str> {
        self.environment
            .values()
            .find(|(declared, _)| declared == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }
}

/// Builder for [`BuildContext`]
#[derive(Debug, Default)]
pub struct BuildContextBuilder {
    arguments: ArgumentMap,
    environment: Vec<(String, String)>,
    working_directory: Option<PathBuf>,
}

impl BuildContextBuilder {
    pub fn arguments(mut self, arguments: ArgumentMap) -> Self {
        self.arguments = arguments;
        self
    }

    /// Parse `-name value` tokens into the argument map
    pub fn args<I, S>(self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.arguments(ArgumentMap::parse(tokens))
    }

    pub fn environment<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.push((key.into(), value.into()));
        self
    }

    pub fn working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn build(self) -> BuildContext {
        let mut environment = IndexMap::with_capacity(self.environment.len());
        for (key, value) in self.environment {
            // First declaration wins when two keys normalise identically
            environment
                .entry(normalize_name(&key))
                .or_insert((key, value));
        }

        BuildContext {
            arguments: self.arguments,
            environment,
            working_directory: self
                .working_directory
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}
