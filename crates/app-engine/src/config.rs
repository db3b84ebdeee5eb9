use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming a config file when none is passed explicitly.
pub const CONFIG_ENV: &str = "APPDEF_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Contact source used when a document's CRM block leaves it blank.
    pub default_source: String,
    /// Applied independently to each side effect of a submission.
    pub side_effect_timeout_ms: u64,
    pub event_prefix: String,
    /// Status passed to the document store when loading by slug.
    pub store_status: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_source: "app-engine".to_string(),
            side_effect_timeout_ms: 10_000,
            event_prefix: "app_submission_".to_string(),
            store_status: "active".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config; blank input yields the defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(text).map_err(ConfigError::Parse)
    }

    /// Load from `path`, else from `$APPDEF_CONFIG`, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match env::var_os(CONFIG_ENV) {
                Some(value) if !value.is_empty() => PathBuf::from(value),
                _ => return Ok(Self::default()),
            },
        };
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn side_effect_timeout(&self) -> Duration {
        Duration::from_millis(self.side_effect_timeout_ms)
    }

    pub fn event_name(&self, slug: &str) -> String {
        format!("{}{}", self.event_prefix, slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "sideEffectTimeoutMs": 250 }"#).expect("config");
        assert_eq!(config.side_effect_timeout(), Duration::from_millis(250));
        assert_eq!(config.default_source, "app-engine");
        assert_eq!(config.event_name("quote"), "app_submission_quote");
        assert_eq!(EngineConfig::from_json("  ").expect("blank"), EngineConfig::default());
    }

    #[test]
    fn bad_config_is_reported() {
        let err = EngineConfig::from_json("{ nope").unwrap_err();
        assert!(err.to_string().starts_with("failed to parse config"));

        let err = EngineConfig::load(Some(Path::new("/definitely/missing.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
