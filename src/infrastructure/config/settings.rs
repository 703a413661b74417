use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::domain::api_config::ApiConfig;
use crate::domain::error::{AppError, Result};
use crate::domain::import::ValidationConfig;

pub const ENV_PREFIX: &str = "ROSTER_";
pub const CONFIG_PATH_ENV: &str = "ROSTER_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "roster.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ImportConfig {
    /// Rows shown in an upload preview
    #[validate(range(min = 1, max = 100))]
    pub preview_rows: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self { preview_rows: 5 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    #[validate(nested)]
    pub api: ApiConfig,
    #[validate(nested)]
    pub validation: ValidationConfig,
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub import: ImportConfig,
}

impl Settings {
    /// Defaults, then the TOML file (if present), then `ROSTER_*` variables.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::from_figment(Self::figment(&path))
    }

    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let settings: Settings = figment
            .extract()
            .map_err(|e| AppError::ConfigError(e.to_string()))?;
        settings
            .validate()
            .map_err(|e| AppError::ConfigError(e.to_string()))?;
        Ok(settings)
    }
}
