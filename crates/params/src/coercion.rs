//! Type coercion from raw text to parameter values

use crate::descriptor::{ParameterDescriptor, ParameterShape, ParameterType};
use crate::provider::RawValue;
use crate::value::ParameterValue;
use rivet_core::{Error, Result};
use std::path::Path;

/// Coerce a raw value according to the descriptor's type and shape.
///
/// Relative paths are resolved against `working_directory`.
pub fn coerce(
    descriptor: &ParameterDescriptor,
    raw: &RawValue,
    working_directory: &Path,
) -> Result<ParameterValue> {
    match descriptor.shape() {
        ParameterShape::List => {
            let values = match raw {
                RawValue::Flag => return Ok(ParameterValue::List(Vec::new())),
                RawValue::Values(values) => values,
            };

            let mut elements = Vec::new();
            for value in values {
                if descriptor.splits_lists() {
                    for part in value.split(descriptor.list_separator()) {
                        let part = part.trim();
                        if !part.is_empty() {
                            elements.push(coerce_scalar(descriptor, part, working_directory)?);
                        }
                    }
                } else {
                    elements.push(coerce_scalar(descriptor, value, working_directory)?);
                }
            }
            Ok(ParameterValue::List(elements))
        }
        ParameterShape::Scalar | ParameterShape::Nullable => match raw {
            RawValue::Values(values) if values.len() == 1 => {
                coerce_scalar(descriptor, &values[0], working_directory)
            }
            RawValue::Values(values) if values.len() > 1 => Err(Error::malformed_parameter(
                descriptor.member(),
                raw.display(),
                format!("expected a single value, got {}", values.len()),
            )),
            // A bare flag only makes sense for booleans
            _ => match descriptor.value_type() {
                ParameterType::Bool => Ok(ParameterValue::Bool(true)),
                _ => Err(Error::malformed_parameter(
                    descriptor.member(),
                    "",
                    "expected a value",
                )),
            },
        },
    }
}

/// The value used when no source supplies one
pub fn default_value(descriptor: &ParameterDescriptor) -> ParameterValue {
    match descriptor.shape() {
        ParameterShape::List => ParameterValue::List(Vec::new()),
        ParameterShape::Nullable => ParameterValue::Null,
        ParameterShape::Scalar => match descriptor.value_type() {
            ParameterType::Bool => ParameterValue::Bool(false),
            ParameterType::Integer => ParameterValue::Integer(0),
            ParameterType::Float => ParameterValue::Float(0.0),
            ParameterType::String => ParameterValue::Text(String::new()),
            // No meaningful zero value
            ParameterType::Path | ParameterType::Choice(_) | ParameterType::Custom { .. } => {
                ParameterValue::Null
            }
        },
    }
}

fn coerce_scalar(
    descriptor: &ParameterDescriptor,
    text: &str,
    working_directory: &Path,
) -> Result<ParameterValue> {
    let malformed = |message: String| Error::malformed_parameter(descriptor.member(), text, message);
    let trimmed = text.trim();

    match descriptor.value_type() {
        ParameterType::Bool => parse_bool(trimmed)
            .map(ParameterValue::Bool)
            .ok_or_else(|| malformed("expected a boolean (true/false)".to_string())),
        ParameterType::Integer => trimmed
            .parse::<i64>()
            .map(ParameterValue::Integer)
            .map_err(|e| malformed(format!("expected an integer: {e}"))),
        ParameterType::Float => trimmed
            .parse::<f64>()
            .map(ParameterValue::Float)
            .map_err(|e| malformed(format!("expected a number: {e}"))),
        ParameterType::String => Ok(ParameterValue::Text(text.to_string())),
        ParameterType::Path => {
            if trimmed.is_empty() {
                return Err(malformed("expected a path".to_string()));
            }
            let path = Path::new(trimmed);
            if path.is_absolute() {
                Ok(ParameterValue::Path(path.to_path_buf()))
            } else {
                Ok(ParameterValue::Path(working_directory.join(path)))
            }
        }
        ParameterType::Choice(choices) => choices
            .iter()
            .find(|choice| choice.eq_ignore_ascii_case(trimmed))
            .map(|choice| ParameterValue::Text(choice.clone()))
            .ok_or_else(|| malformed(format!("expected one of: {}", choices.join(", ")))),
        ParameterType::Custom { convert, .. } => convert(trimmed).map_err(malformed),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
