//! Database configuration
//!
//! Read from a TOML table such as:
//!
//! ```toml
//! path = "brewken.db"
//! foreign_keys = true
//! journal_mode = "WAL"
//! busy_timeout_ms = 5000
//! ```
//!
//! Every key is optional. Without a `path` the database lives in memory.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::errors::{config_error, io_error, Result};

const JOURNAL_MODES: &[&str] = &["DELETE", "TRUNCATE", "PERSIST", "MEMORY", "WAL", "OFF"];

#[derive(Error, Debug)]
enum ConfigError {
    #[error("Failed to parse database config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unsupported journal_mode {0:?}; expected DELETE, TRUNCATE, PERSIST, MEMORY, WAL or OFF")]
    JournalMode(String),
}

/// Connection settings applied when a database is opened
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DbConfig {
    /// Database file; `None` opens an in-memory database
    pub path: Option<PathBuf>,
    pub foreign_keys: bool,
    /// Only applied to file databases
    pub journal_mode: String,
    pub busy_timeout_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: None,
            foreign_keys: true,
            journal_mode: "WAL".to_string(),
            busy_timeout_ms: 5000,
        }
    }
}

impl DbConfig {
    /// Config for a database file with every other setting at its default
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Parse a config from TOML text
    ///
    /// # Errors
    ///
    /// Returns a `Config` error if the text is not valid TOML, names an
    /// unknown key, or asks for an unsupported journal mode.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut config: DbConfig = toml::from_str(text)
            .map_err(|e| config_error(ConfigError::from(e).to_string()))?;
        config.journal_mode = config.journal_mode.to_ascii_uppercase();
        if !JOURNAL_MODES.contains(&config.journal_mode.as_str()) {
            return Err(config_error(
                ConfigError::JournalMode(config.journal_mode).to_string(),
            ));
        }
        Ok(config)
    }

    /// Read and parse a TOML config file
    ///
    /// # Errors
    ///
    /// Returns an `Io` error if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| io_error("config_load", e))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brewdb_core::ExErrorKind;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = DbConfig::from_toml_str("").unwrap();
        assert_eq!(config, DbConfig::default());
        assert!(config.foreign_keys);
        assert_eq!(config.journal_mode, "WAL");
        assert!(config.path.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let config = DbConfig::from_toml_str(
            r#"
            path = "/tmp/brew.db"
            foreign_keys = false
            journal_mode = "delete"
            busy_timeout_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.path, Some(PathBuf::from("/tmp/brew.db")));
        assert!(!config.foreign_keys);
        assert_eq!(config.journal_mode, "DELETE");
        assert_eq!(config.busy_timeout_ms, 250);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = DbConfig::from_toml_str("cache_size = 10").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
    }

    #[test]
    fn test_bad_journal_mode_rejected() {
        let err = DbConfig::from_toml_str(r#"journal_mode = "sideways""#).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Config);
        assert!(err.message().contains("SIDEWAYS"));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DbConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Io);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.toml");
        std::fs::write(&path, "busy_timeout_ms = 10\n").unwrap();

        let config = DbConfig::load(&path).unwrap();
        assert_eq!(config.busy_timeout_ms, 10);
        assert!(config.foreign_keys);
    }
}
