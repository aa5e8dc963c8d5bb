//! Resolved parameter values

use rivet_core::SECRET_MASK;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A coerced parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Path(PathBuf),
    List(Vec<ParameterValue>),
}

impl ParameterValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ParameterValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParameterValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParameterValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterValue::Float(value) => Some(*value),
            ParameterValue::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            ParameterValue::Path(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ParameterValue]> {
        match self {
            ParameterValue::List(values) => Some(values),
            _ => None,
        }
    }

    /// Text elements of a list value
    pub fn as_strings(&self) -> Vec<&str> {
        self.as_list()
            .map(|values| values.iter().filter_map(ParameterValue::as_str).collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Null => f.write_str("<null>"),
            ParameterValue::Bool(value) => write!(f, "{value}"),
            ParameterValue::Integer(value) => write!(f, "{value}"),
            ParameterValue::Float(value) => write!(f, "{value}"),
            ParameterValue::Text(value) => f.write_str(value),
            ParameterValue::Path(value) => write!(f, "{}", value.display()),
            ParameterValue::List(values) => {
                let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
        }
    }
}

/// Where a resolved value came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum ValueSource {
    CommandLine,
    Environment,
    Provider(String),
    /// Nothing was supplied; the type default was used
    Default,
}

impl ValueSource {
    /// Whether the value was explicitly supplied by some source
    pub fn is_explicit(&self) -> bool {
        !matches!(self, ValueSource::Default)
    }
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::CommandLine => f.write_str("command line"),
            ValueSource::Environment => f.write_str("environment"),
            ValueSource::Provider(name) => write!(f, "value provider '{name}'"),
            ValueSource::Default => f.write_str("default"),
        }
    }
}

/// The cached outcome of resolving one descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParameter {
    /// Member name of the descriptor
    pub name: String,
    pub value: ParameterValue,
    pub source: ValueSource,
    pub secret: bool,
}

impl ResolvedParameter {
    /// Whether the value was explicitly supplied (never true for defaults)
    pub fn is_supplied(&self) -> bool {
        self.source.is_explicit()
    }

    /// Value text safe for logs
    pub fn display_value(&self) -> String {
        if self.secret && self.is_supplied() {
            SECRET_MASK.to_string()
        } else {
            self.value.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secrets_are_masked_for_display() {
        let resolved = ResolvedParameter {
            name: "ApiKey".into(),
            value: ParameterValue::Text("hunter2".into()),
            source: ValueSource::Environment,
            secret: true,
        };
        assert_eq!(resolved.display_value(), SECRET_MASK);
    }

    #[test]
    fn list_display_and_text_elements() {
        let value = ParameterValue::List(vec![
            ParameterValue::Text("a".into()),
            ParameterValue::Text("b".into()),
        ]);
        assert_eq!(value.to_string(), "[a, b]");
        assert_eq!(value.as_strings(), vec!["a", "b"]);
    }

    #[test]
    fn default_source_is_not_explicit() {
        assert!(!ValueSource::Default.is_explicit());
        assert!(ValueSource::Provider("git".into()).is_explicit());
    }
}
