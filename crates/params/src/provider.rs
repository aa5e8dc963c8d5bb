//! Named value providers

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Uncoerced text found for a parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// The name was given without any value (`-sign`)
    Flag,
    Values(Vec<String>),
}

impl RawValue {
    pub fn single(value: impl Into<String>) -> Self {
        RawValue::Values(vec![value.into()])
    }

    pub fn many<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RawValue::Values(values.into_iter().map(Into::into).collect())
    }

    /// Text for error messages
    pub fn display(&self) -> String {
        match self {
            RawValue::Flag => String::new(),
            RawValue::Values(values) => values.join(" "),
        }
    }
}

/// A pure fallback for a parameter's value. `Ok(None)` means "no value".
pub type ValueProvider =
    Arc<dyn Fn() -> std::result::Result<Option<RawValue>, String> + Send + Sync>;

/// Typed registry from provider name to provider function
#[derive(Clone, Default)]
pub struct ValueProviders {
    providers: IndexMap<String, ValueProvider>,
}

impl ValueProviders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under `name`, replacing any earlier registration
    pub fn register<F>(&mut self, name: impl Into<String>, provider: F) -> &mut Self
    where
        F: Fn() -> std::result::Result<Option<RawValue>, String> + Send + Sync + 'static,
    {
        self.providers.insert(name.into(), Arc::new(provider));
        self
    }

    /// Builder-style registration
    pub fn with<F>(mut self, name: impl Into<String>, provider: F) -> Self
    where
        F: Fn() -> std::result::Result<Option<RawValue>, String> + Send + Sync + 'static,
    {
        self.register(name, provider);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ValueProvider> {
        self.providers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}

impl fmt::Debug for ValueProviders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueProviders")
            .field("names", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}
