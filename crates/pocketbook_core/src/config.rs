//! Startup configuration for the core.
//!
//! # Responsibility
//! - Describe where the database, preference file and logs live.
//! - Carry tunables (page size cap, log level) with serde defaults so a
//!   shell can pass a partial JSON document.
//!
//! # Invariants
//! - `validate()` must pass before the configuration is used to open storage.
//! - `log.dir` is only checked when logging starts; storage opens without it.

use crate::logging::{default_log_level, normalize_level};
use crate::store::DEFAULT_MAX_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DATABASE_FILE_NAME: &str = "pocketbook.sqlite3";
pub const PREFERENCES_FILE_NAME: &str = "preferences.json";
pub const LOG_DIR_NAME: &str = "logs";

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid configuration document: {err}"),
            Self::Invalid(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// One of `trace|debug|info|warn|error`.
    pub level: String,
    /// Directory for rolling log files; must be absolute when logging starts.
    /// `None` disables file logging.
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite file; `None` keeps everything in memory.
    pub database_path: Option<PathBuf>,
    /// Preference JSON file; `None` keeps preferences in memory.
    pub preferences_path: Option<PathBuf>,
    /// Hard cap on rows returned by one list query.
    pub max_page_size: u32,
    pub log: LogConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            preferences_path: None,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            log: LogConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Conventional layout under one app data directory.
    ///
    /// A relative `data_dir` is resolved against the current directory.
    pub fn for_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        let data_dir = std::path::absolute(data_dir).unwrap_or_else(|_| data_dir.to_path_buf());
        let data_dir = data_dir.as_path();
        Self {
            database_path: Some(data_dir.join(DATABASE_FILE_NAME)),
            preferences_path: Some(data_dir.join(PREFERENCES_FILE_NAME)),
            log: LogConfig {
                dir: Some(data_dir.join(LOG_DIR_NAME)),
                ..LogConfig::default()
            },
            ..Self::default()
        }
    }

    /// Parses and validates a JSON document; absent fields take defaults.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_size == 0 {
            return Err(ConfigError::Invalid(
                "max_page_size must be at least 1".to_string(),
            ));
        }
        normalize_level(&self.log.level).map_err(ConfigError::Invalid)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, DATABASE_FILE_NAME};
    use std::path::Path;

    #[test]
    fn partial_document_fills_defaults() {
        let config = CoreConfig::from_json_str(r#"{ "max_page_size": 50 }"#).unwrap();
        assert_eq!(config.max_page_size, 50);
        assert_eq!(config.database_path, None);
        assert!(config.log.dir.is_none());
    }

    #[test]
    fn data_dir_layout() {
        let config = CoreConfig::for_data_dir("/data/app");
        assert_eq!(
            config.database_path.as_deref(),
            Some(Path::new("/data/app").join(DATABASE_FILE_NAME).as_path())
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn relative_data_dir_resolves_to_absolute_paths() {
        let config = CoreConfig::for_data_dir("app-data");
        let cwd = std::env::current_dir().unwrap();

        let database_path = config.database_path.unwrap();
        assert!(database_path.is_absolute());
        assert_eq!(database_path, cwd.join("app-data").join(DATABASE_FILE_NAME));
        assert!(config.preferences_path.unwrap().is_absolute());
        assert!(config.log.dir.unwrap().is_absolute());
    }

    #[test]
    fn relative_log_dir_is_left_to_logging_startup() {
        let config =
            CoreConfig::from_json_str(r#"{ "log": { "level": "info", "dir": "logs" } }"#).unwrap();
        assert_eq!(config.log.dir.as_deref(), Some(Path::new("logs")));
    }

    #[test]
    fn rejects_zero_page_size_and_bad_level() {
        let err = CoreConfig::from_json_str(r#"{ "max_page_size": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = CoreConfig::from_json_str(r#"{ "log": { "level": "loud" } }"#).unwrap_err();
        assert!(err.to_string().contains("unsupported log level"));

        let err = CoreConfig::from_json_str("[").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
