use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

pub const CONFIG_ENV_VAR: &str = "PRICEWINDOW_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub analytics: AnalyticsSettings,
    pub ingestion: IngestionSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyticsSettings {
    /// Sort records by timestamp before looking for the most expensive window.
    pub sort_by_timestamp: bool,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            sort_by_timestamp: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestionSettings {
    /// How many degraded fields per upload are logged individually.
    pub issue_log_limit: usize,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            issue_log_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    pub pretty_json: bool,
}

impl Settings {
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Toml {
            path: origin.to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        Self::from_toml_str(&content, &display)
    }

    /// Loads from `explicit`, else from `$PRICEWINDOW_CONFIG`, else returns defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit.map(Path::to_path_buf).or_else(|| {
            env::var_os(CONFIG_ENV_VAR)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        });
        match path {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}
