//! Command-line parameter arguments in `-name value` form

use crate::names::normalize_name;
use crate::provider::RawValue;
use indexmap::IndexMap;

/// One named argument and every value that followed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentEntry {
    /// The name as the user typed it, without leading dashes
    pub spelled: String,
    pub values: Vec<String>,
}

impl ArgumentEntry {
    /// Raw value for coercion; a bare `-name` is a flag
    pub fn raw(&self) -> RawValue {
        if self.values.is_empty() {
            RawValue::Flag
        } else {
            RawValue::Values(self.values.clone())
        }
    }
}

/// Parsed parameter arguments, keyed by normalised name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentMap {
    entries: IndexMap<String, ArgumentEntry>,
    positionals: Vec<String>,
}

impl ArgumentMap {
    /// Parse tokens such as `-configuration Release --items a b --verbose`.
    ///
    /// Every token up to the next name belongs to the preceding name.
    /// `--name=value` is accepted as well. Repeating a name appends values.
    /// Tokens before the first name are kept as positionals. A token such as
    /// `-5` is a value, not a name.
    pub fn parse<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = ArgumentMap::default();
        let mut current: Option<String> = None;

        for token in tokens {
            let token = token.as_ref();
            match parameter_name(token) {
                Some(name) => {
                    let (name, inline_value) = match name.split_once('=') {
                        Some((name, value)) => (name, Some(value)),
                        None => (name, None),
                    };
                    let key = normalize_name(name);
                    let entry = map.entries.entry(key.clone()).or_insert_with(|| ArgumentEntry {
                        spelled: name.to_string(),
                        values: Vec::new(),
                    });
                    if let Some(value) = inline_value {
                        entry.values.push(value.to_string());
                    }
                    current = Some(key);
                }
                None => match current.as_ref().and_then(|key| map.entries.get_mut(key)) {
                    Some(entry) => entry.values.push(token.to_string()),
                    None => map.positionals.push(token.to_string()),
                },
            }
        }

        map
    }

    /// Look up an argument by any spelling of its name
    pub fn get(&self, name: &str) -> Option<&ArgumentEntry> {
        self.entries.get(&normalize_name(name))
    }

    /// Whether an argument with this name was given
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All named arguments in the order they first appeared
    pub fn entries(&self) -> impl Iterator<Item = &ArgumentEntry> {
        self.entries.values()
    }

    /// Tokens that appeared before the first name
    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.positionals.is_empty()
    }
}

fn parameter_name(token: &str) -> Option<&str> {
    let stripped = token
        .strip_prefix("--")
        .or_else(|| token.strip_prefix('-'))?;
    stripped
        .chars()
        .next()
        .filter(char::is_ascii_alphabetic)
        .map(|_| stripped)
}
