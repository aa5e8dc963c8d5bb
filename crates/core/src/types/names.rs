//! Case-insensitive target names

use crate::errors::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A validated target name.
///
/// Equality, hashing and ordering ignore ASCII case so `compile`, `Compile`
/// and `COMPILE` are the same target. The declared spelling is kept for
/// display.
#[derive(Debug, Clone)]
pub struct TargetName(String);

impl TargetName {
    /// Create a new TargetName with validation
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::configuration("target name cannot be empty"));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(Error::configuration(format!(
                "target name '{name}' must not contain whitespace"
            )));
        }
        Ok(TargetName(name))
    }

    /// Create a TargetName without validation (use only when input is already validated)
    pub fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The declared spelling
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a raw string
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }

    /// Convert to String
    pub fn into_string(self) -> String {
        self.0
    }
}

impl PartialEq for TargetName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for TargetName {}

impl Hash for TargetName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
        state.write_u8(0xff);
    }
}

impl PartialOrd for TargetName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TargetName {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.0.bytes().map(|b| b.to_ascii_lowercase());
        let rhs = other.0.bytes().map(|b| b.to_ascii_lowercase());
        lhs.cmp(rhs)
    }
}

impl Display for TargetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TargetName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for TargetName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for TargetName {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for TargetName {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl Serialize for TargetName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TargetName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TargetName::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_compare_case_insensitively() {
        let a = TargetName::new("Compile").unwrap();
        let b = TargetName::new("COMPILE").unwrap();
        assert_eq!(a, b);
        assert!(a.matches("compile"));

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn declared_spelling_is_kept() {
        let name = TargetName::new("RunUnitTests").unwrap();
        assert_eq!(name.to_string(), "RunUnitTests");
    }

    #[test]
    fn invalid_names_are_rejected() {
        assert!(TargetName::new("").is_err());
        assert!(TargetName::new("two words").is_err());
    }

    #[test]
    fn serde_round_trips_as_plain_string() {
        let name = TargetName::new("Pack").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"Pack\"");
    }
}
