// Configuration for opening a store

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file
    pub database: PathBuf,
    /// How long SQLite waits on a locked database before giving up
    pub busy_timeout_ms: u64,
    /// Deadline applied to each CLI operation; none when unset
    pub statement_timeout_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("togo.db"),
            busy_timeout_ms: 5_000,
            statement_timeout_ms: None,
        }
    }
}

impl Config {
    /// `<config dir>/togo/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("togo").join("config.yaml"))
    }

    /// Load from an explicit file, or from the default location if present.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file yields `Config::default()`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(eyre!("Config file not found: {}", path.display()));
                }
                Self::from_file(path)
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = ?path, "Loading config");
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        serde_yaml::from_str(&content).context("Failed to parse config file")
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn statement_timeout(&self) -> Option<Duration> {
        self.statement_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database, PathBuf::from("togo.db"));
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
        assert!(config.statement_timeout().is_none());
    }

    #[test]
    fn test_from_file_partial() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "database: /var/lib/togo/tasks.db\nstatement_timeout_ms: 250\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.database, PathBuf::from("/var/lib/togo/tasks.db"));
        assert_eq!(config.busy_timeout_ms, 5_000);
        assert_eq!(config.statement_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = Config {
            database: PathBuf::from("x.db"),
            busy_timeout_ms: 10,
            statement_timeout_ms: Some(20),
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let result = Config::load(Some(&temp.path().join("missing.yaml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "busy_timeout_ms: [not a number]\n").unwrap();

        assert!(Config::from_file(&path).is_err());
    }
}
