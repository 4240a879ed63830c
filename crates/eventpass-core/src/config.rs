//! Application configuration management.
//!
//! Configuration is stored at `~/.config/eventpass/config.json` and holds the
//! backend URL, an optional API token, the last signed-in user, and an
//! optional override for where the local store lives. Environment variables
//! (`EVENTPASS_API_URL`, `EVENTPASS_API_TOKEN`, `EVENTPASS_STORE`) take
//! precedence over the file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::Role;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "eventpass";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Local key/value store file name
const STORE_FILE: &str = "store.json";

pub const ENV_API_URL: &str = "EVENTPASS_API_URL";
pub const ENV_API_TOKEN: &str = "EVENTPASS_API_TOKEN";
pub const ENV_STORE: &str = "EVENTPASS_STORE";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub last_user_id: Option<String>,
    pub last_role: Option<Role>,
    pub store_path: Option<PathBuf>,
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Overlay values from the environment. `lookup` is `std::env::var` in
    /// production; empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(url) = get(ENV_API_URL) {
            self.api_url = Some(url);
        }
        if let Some(token) = get(ENV_API_TOKEN) {
            self.api_token = Some(token);
        }
        if let Some(store) = get(ENV_STORE) {
            self.store_path = Some(PathBuf::from(store));
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Where the local key/value store lives.
    pub fn store_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.store_path {
            return Ok(path.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join(STORE_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.json");
        let config = Config {
            api_url: Some("https://api.campus.test".into()),
            last_user_id: Some("u1".into()),
            last_role: Some(Role::Organizer),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "https://override.test"),
            (ENV_API_TOKEN, "  "),
            (ENV_STORE, "/tmp/eventpass-store.json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config {
            api_url: Some("https://file.test".into()),
            api_token: Some("file-token".into()),
            ..Default::default()
        };
        config.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.api_url.as_deref(), Some("https://override.test"));
        assert_eq!(config.api_token.as_deref(), Some("file-token"));
        assert_eq!(
            config.store_path().unwrap(),
            PathBuf::from("/tmp/eventpass-store.json")
        );
    }
}
