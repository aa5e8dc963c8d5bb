//! Parameter descriptors declared by a build definition

use crate::value::ParameterValue;
use rivet_core::DEFAULT_LIST_SEPARATOR;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Conversion used by [`ParameterType::Custom`]
pub type CustomConverter =
    Arc<dyn Fn(&str) -> std::result::Result<ParameterValue, String> + Send + Sync>;

/// Element type of a parameter
#[derive(Clone)]
pub enum ParameterType {
    Bool,
    Integer,
    Float,
    String,
    Path,
    /// One of a fixed set of values, matched case-insensitively
    Choice(Vec<String>),
    Custom {
        type_name: String,
        convert: CustomConverter,
    },
}

impl ParameterType {
    pub fn choice<I, S>(choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ParameterType::Choice(choices.into_iter().map(Into::into).collect())
    }

    pub fn custom<F>(type_name: impl Into<String>, convert: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<ParameterValue, String> + Send + Sync + 'static,
    {
        ParameterType::Custom {
            type_name: type_name.into(),
            convert: Arc::new(convert),
        }
    }

    /// Name used in metadata and error messages
    pub fn type_name(&self) -> &str {
        match self {
            ParameterType::Bool => "bool",
            ParameterType::Integer => "integer",
            ParameterType::Float => "float",
            ParameterType::String => "string",
            ParameterType::Path => "path",
            ParameterType::Choice(_) => "choice",
            ParameterType::Custom { type_name, .. } => type_name,
        }
    }
}

impl fmt::Debug for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterType::Choice(choices) => f.debug_tuple("Choice").field(choices).finish(),
            ParameterType::Custom { type_name, .. } => {
                f.debug_struct("Custom").field("type_name", type_name).finish()
            }
            other => f.write_str(other.type_name()),
        }
    }
}

/// Whether a parameter holds one value, an optional value, or many
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterShape {
    /// Falls back to the type's zero value
    #[default]
    Scalar,
    /// Falls back to null
    Nullable,
    /// Falls back to an empty list
    List,
}

/// Declaration of one build parameter
#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    member: String,
    name: Option<String>,
    description: Option<String>,
    value_type: ParameterType,
    shape: ParameterShape,
    separator: char,
    split_lists: bool,
    required: bool,
    secret: bool,
    value_provider: Option<String>,
}

impl ParameterDescriptor {
    pub fn new(member: impl Into<String>, value_type: ParameterType) -> Self {
        Self {
            member: member.into(),
            name: None,
            description: None,
            value_type,
            shape: ParameterShape::Scalar,
            separator: DEFAULT_LIST_SEPARATOR,
            split_lists: true,
            required: false,
            secret: false,
            value_provider: None,
        }
    }

    pub fn bool(member: impl Into<String>) -> Self {
        Self::new(member, ParameterType::Bool)
    }

    pub fn integer(member: impl Into<String>) -> Self {
        Self::new(member, ParameterType::Integer)
    }

    pub fn float(member: impl Into<String>) -> Self {
        Self::new(member, ParameterType::Float)
    }

    pub fn string(member: impl Into<String>) -> Self {
        Self::new(member, ParameterType::String)
    }

    pub fn path(member: impl Into<String>) -> Self {
        Self::new(member, ParameterType::Path)
    }

    pub fn choice<I, S>(member: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(member, ParameterType::choice(choices))
    }

    /// Override the name used on the command line and in the environment
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.shape = ParameterShape::Nullable;
        self
    }

    pub fn list(mut self) -> Self {
        self.shape = ParameterShape::List;
        self
    }

    pub fn separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Treat each raw list value as a single element
    pub fn without_splitting(mut self) -> Self {
        self.split_lists = false;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    /// Fall back to the named value provider
    pub fn provided_by(mut self, provider: impl Into<String>) -> Self {
        self.value_provider = Some(provider.into());
        self
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn override_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name matched against CLI and environment; an override replaces the member name
    pub fn lookup_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.member)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn value_type(&self) -> &ParameterType {
        &self.value_type
    }

    pub fn shape(&self) -> ParameterShape {
        self.shape
    }

    pub fn list_separator(&self) -> char {
        self.separator
    }

    pub fn splits_lists(&self) -> bool {
        self.split_lists
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_secret(&self) -> bool {
        self.secret
    }

    pub fn value_provider(&self) -> Option<&str> {
        self.value_provider.as_deref()
    }

    /// Serialisable summary for renderers and `--describe`
    pub fn info(&self) -> ParameterInfo {
        ParameterInfo {
            name: self.name.clone().unwrap_or_else(|| self.member.clone()),
            member: self.member.clone(),
            value_type: self.value_type.type_name().to_string(),
            shape: self.shape,
            description: self.description.clone(),
            required: self.required,
            secret: self.secret,
            choices: match &self.value_type {
                ParameterType::Choice(choices) => choices.clone(),
                _ => Vec::new(),
            },
            value_provider: self.value_provider.clone(),
        }
    }
}

/// Parameter metadata exposed to external renderers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterInfo {
    pub name: String,
    pub member: String,
    #[serde(rename = "type")]
    pub value_type: String,
    pub shape: ParameterShape,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub secret: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_provider: Option<String>,
}
