//! Application configuration, stored as TOML in the platform config dir.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8188";

/// Environment variable overriding the configured server URL.
pub const SERVER_URL_ENV: &str = "GRAPHDASH_SERVER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the workflow server.
    pub server_url: String,
    /// Directory workflow files are saved to. Defaults to the platform data
    /// dir when unset.
    pub workflows_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            workflows_dir: None,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "", "graphdash")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from the platform config dir. A missing or unreadable file falls
    /// back to defaults; `GRAPHDASH_SERVER` wins over the file either way.
    pub fn load() -> Self {
        let mut config = Self::config_path()
            .filter(|path| path.exists())
            .and_then(|path| match Self::load_from(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!("ignoring unreadable config: {:#}", e);
                    None
                }
            })
            .unwrap_or_default();

        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            if !url.is_empty() {
                config.server_url = url;
            }
        }
        config
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        toml::from_str(&text).context("failed to parse config file")
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let text = toml::to_string_pretty(self).context("failed to serialize config")?;
        std::fs::write(path, text)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Directory workflows are saved to.
    pub fn workflows_dir(&self) -> PathBuf {
        if let Some(dir) = &self.workflows_dir {
            return dir.clone();
        }
        directories::ProjectDirs::from("com", "", "graphdash")
            .map(|dirs| dirs.data_dir().join("workflows"))
            .unwrap_or_else(|| PathBuf::from("workflows"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = AppConfig {
            server_url: "http://10.0.0.5:8188".to_string(),
            workflows_dir: Some(PathBuf::from("/tmp/workflows")),
        };
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert!(config.workflows_dir.is_none());
    }
}
