//! Configuration for tasklist

use crate::filter::FilterMode;
use crate::storage::Backend;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the storage backend's files
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Storage backend
    #[serde(default)]
    pub backend: Backend,

    /// Filter applied when a session starts
    #[serde(default)]
    pub default_filter: FilterMode,

    /// Time a notification stays up before it slides out
    #[serde(default = "default_notification_duration_ms")]
    pub notification_duration_ms: u64,

    /// Length of the slide-in and slide-out transitions
    #[serde(default = "default_transition_ms")]
    pub transition_ms: u64,
}

fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tasklist")
}

fn default_notification_duration_ms() -> u64 {
    crate::notify::DEFAULT_DURATION.as_millis() as u64
}

fn default_transition_ms() -> u64 {
    crate::notify::DEFAULT_TRANSITION.as_millis() as u64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            backend: Backend::default(),
            default_filter: FilterMode::default(),
            notification_duration_ms: default_notification_duration_ms(),
            transition_ms: default_transition_ms(),
        }
    }
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            return Self::load_from(config_path);
        }

        // Try default locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("tasklist").join("config.yml")),
            Some(PathBuf::from("tasklist.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::load_from(path);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Config::default())
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read config file: {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&content).context(format!("Failed to parse config file: {}", path.display()))?;
        debug!(?path, "Loaded config");
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_duration_ms)
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.default_filter, FilterMode::All);
        assert_eq!(config.notification_duration(), Duration::from_millis(3000));
        assert_eq!(config.transition(), Duration::from_millis(300));
        assert!(config.store_path.ends_with("tasklist"));
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        std::fs::write(&path, "backend: file\ndefault_filter: pending\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.backend, Backend::File);
        assert_eq!(config.default_filter, FilterMode::Pending);
        assert_eq!(config.notification_duration_ms, 3000);
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        let config = Config {
            store_path: temp.path().join("data"),
            backend: Backend::Memory,
            default_filter: FilterMode::Completed,
            notification_duration_ms: 1500,
            transition_ms: 100,
        };

        config.save(&path).unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nope.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_load_invalid_backend_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        std::fs::write(&path, "backend: redis\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
