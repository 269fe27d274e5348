//! Engine configuration
//!
//! Loaded from the YAML file named by `BIZQUERY_CONFIG` (default
//! `bizquery.yaml`, optional), then overridden by environment variables.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::filter::FilterPolicy;
use crate::planner::DEFAULT_LIMIT;

pub const CONFIG_ENV: &str = "BIZQUERY_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "bizquery.yaml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// What to do with invalid filters and dimensions
    pub filter_policy: FilterPolicy,
    /// Row limit when a request does not give one
    pub default_limit: u32,
    /// Per-query timeout at the runner boundary
    pub query_timeout_ms: u64,
    /// YAML catalog replacing the built-in one
    pub catalog_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            filter_policy: FilterPolicy::Permissive,
            default_limit: DEFAULT_LIMIT,
            query_timeout_ms: 30_000,
            catalog_path: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from file and environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.display().to_string(), e.to_string()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `BIZQUERY_*` overrides from `lookup`; unparsable values are ignored
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(policy) = lookup("BIZQUERY_FILTER_POLICY") {
            if let Ok(p) = policy.parse() {
                self.filter_policy = p;
            }
        }

        if let Some(limit) = lookup("BIZQUERY_DEFAULT_LIMIT") {
            if let Ok(n) = limit.trim().parse() {
                self.default_limit = n;
            }
        }

        if let Some(timeout) = lookup("BIZQUERY_QUERY_TIMEOUT_MS") {
            if let Ok(ms) = timeout.trim().parse() {
                self.query_timeout_ms = ms;
            }
        }

        if let Some(path) = lookup("BIZQUERY_CATALOG") {
            if !path.trim().is_empty() {
                self.catalog_path = Some(PathBuf::from(path));
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    FileRead(String, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.filter_policy, FilterPolicy::Permissive);
        assert_eq!(config.default_limit, 5);
        assert_eq!(config.query_timeout(), Duration::from_secs(30));
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
filter_policy: strict
default_limit: 10
catalog_path: /etc/bizquery/catalog.yaml
"#;
        let config = EngineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.filter_policy, FilterPolicy::Strict);
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.query_timeout_ms, 30_000);
        assert_eq!(config.catalog_path, Some(PathBuf::from("/etc/bizquery/catalog.yaml")));
    }

    #[test]
    fn test_invalid_policy_is_parse_error() {
        let err = EngineConfig::from_yaml("filter_policy: sometimes\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "query_timeout_ms: 1500").unwrap();
        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.query_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(..)));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("BIZQUERY_FILTER_POLICY", "strict"),
            ("BIZQUERY_DEFAULT_LIMIT", "12"),
            ("BIZQUERY_QUERY_TIMEOUT_MS", "not-a-number"),
            ("BIZQUERY_CATALOG", "custom.yaml"),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.filter_policy, FilterPolicy::Strict);
        assert_eq!(config.default_limit, 12);
        assert_eq!(config.query_timeout_ms, 30_000);
        assert_eq!(config.catalog_path, Some(PathBuf::from("custom.yaml")));
    }
}
