//! Application configuration management.
//!
//! Configuration comes from two places: the API base URL is read from the
//! environment (`CIM_API_URL`), and the remaining settings are stored at
//! `~/.config/cim-console/config.json`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/storage directory paths
pub const APP_NAME: &str = "cim-console";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable holding the API base URL
pub const API_URL_ENV: &str = "CIM_API_URL";

/// Base URL used when the environment does not provide one
pub const DEFAULT_API_URL: &str = "http://localhost:30050/v1";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub last_username: Option<String>,
    /// Overrides the platform storage directory when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Ok(serde_json::from_str(&contents).context("Failed to parse config file")?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted session and the log file
    pub fn storage_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.storage_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// API base URL from the environment, falling back to the local default.
    pub fn api_base_url() -> String {
        resolve_base_url(std::env::var(API_URL_ENV).ok())
    }
}

fn resolve_base_url(value: Option<String>) -> String {
    let url = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_base_url_fallback() {
        assert_eq!(resolve_base_url(None), "http://localhost:30050/v1");
        assert_eq!(resolve_base_url(Some("   ".to_string())), "http://localhost:30050/v1");
    }

    #[test]
    fn test_resolve_base_url_from_env_value() {
        assert_eq!(
            resolve_base_url(Some("https://iam.example.com/v1/".to_string())),
            "https://iam.example.com/v1"
        );
    }

    #[test]
    fn test_storage_dir_override() {
        let config = Config {
            last_username: None,
            storage_dir: Some(PathBuf::from("/tmp/cim")),
        };
        assert_eq!(config.storage_dir().unwrap(), PathBuf::from("/tmp/cim"));
    }

    #[test]
    fn test_config_roundtrip_skips_empty_storage_dir() {
        let config = Config {
            last_username: Some("alice".to_string()),
            storage_dir: None,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("storage_dir"));
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.last_username.as_deref(), Some("alice"));
    }
}
