use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// How invalid filters and dimensions are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterPolicy {
    /// Drop the offending rule (or dimension) and keep going
    #[default]
    Permissive,
    /// Reject the request
    Strict,
}

impl FilterPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterPolicy::Permissive => "permissive",
            FilterPolicy::Strict => "strict",
        }
    }

    pub fn is_strict(&self) -> bool {
        *self == FilterPolicy::Strict
    }
}

impl fmt::Display for FilterPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ParsePolicyError {
    pub input: String,
}

impl fmt::Display for ParsePolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown filter policy '{}'. Valid options: permissive, strict",
            self.input
        )
    }
}

impl std::error::Error for ParsePolicyError {}

impl FromStr for FilterPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "permissive" | "lenient" => Ok(FilterPolicy::Permissive),
            "strict" => Ok(FilterPolicy::Strict),
            _ => Err(ParsePolicyError { input: s.to_string() }),
        }
    }
}

impl<'de> Deserialize<'de> for FilterPolicy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FilterPolicy::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for FilterPolicy {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policy() {
        assert_eq!("strict".parse::<FilterPolicy>().unwrap(), FilterPolicy::Strict);
        assert_eq!(" Permissive ".parse::<FilterPolicy>().unwrap(), FilterPolicy::Permissive);
        assert!("loose".parse::<FilterPolicy>().is_err());
        assert_eq!(FilterPolicy::default(), FilterPolicy::Permissive);
    }
}
