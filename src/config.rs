// Store configuration loaded from YAML

use crate::models::TodoItem;
use crate::record::Record;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// File name of the config inside the store directory
pub const CONFIG_FILE: &str = "config.yaml";

/// Settings for a todo store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage key; names the JSONL file holding the list
    pub storage_key: String,
    /// Quiet window before search input is applied
    pub search_debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_key: TodoItem::collection_name().to_string(),
            search_debounce_ms: 300,
        }
    }
}

impl Config {
    /// Load `config.yaml` from `dir`, falling back to defaults if it does not exist
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            debug!(path = ?path, "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        debug!(?config, "Loaded config");
        Ok(config)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(temp.path()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.storage_key, "todos");
        assert_eq!(config.search_debounce(), Duration::from_millis(300));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "storage_key: work\n").unwrap();

        let config = Config::load(temp.path()).unwrap();
        assert_eq!(config.storage_key, "work");
        assert_eq!(config.search_debounce_ms, 300);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "search_debounce_ms: [not, a, number]\n").unwrap();

        assert!(Config::load(temp.path()).is_err());
    }
}
