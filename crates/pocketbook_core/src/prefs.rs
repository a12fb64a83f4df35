//! Key/value preference store for app-level settings.
//!
//! # Responsibility
//! - Expose typed get/set for the launch flag and display preferences.
//! - Write every change through to an injected persistence backend.
//!
//! # Invariants
//! - One `PreferenceStore` is created at startup and passed explicitly;
//!   there is no global instance.
//! - Missing or mistyped keys read as their defaults; an unparsable file
//!   reads as empty and is renamed to `*.json.corrupt`.
//! - A failed backend write leaves the in-memory value unchanged.

use crate::model::user_settings::{
    DEFAULT_CURRENCY, DEFAULT_LANGUAGE, DEFAULT_THEME, DEFAULT_USER_ID,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

pub const KEY_FIRST_LAUNCH: &str = "first_launch";
pub const KEY_THEME: &str = "theme";
pub const KEY_NOTIFICATIONS_ENABLED: &str = "notifications_enabled";
pub const KEY_CURRENCY: &str = "currency";
pub const KEY_LANGUAGE: &str = "language";
pub const KEY_USER_ID: &str = "user_id";

pub type PreferenceMap = BTreeMap<String, Value>;
pub type PrefResult<T> = Result<T, PrefError>;

#[derive(Debug)]
pub enum PrefError {
    Io { path: PathBuf, source: std::io::Error },
    Serde(serde_json::Error),
}

impl Display for PrefError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "preference file `{}`: {source}", path.display())
            }
            Self::Serde(err) => write!(f, "preference encoding error: {err}"),
        }
    }
}

impl Error for PrefError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Serde(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for PrefError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// Persistence for the raw preference map.
pub trait PreferenceBackend: Send + Sync {
    fn load(&self) -> PrefResult<PreferenceMap>;
    fn save(&self, values: &PreferenceMap) -> PrefResult<()>;
}

/// Pretty-printed JSON object on disk, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PrefError {
        PrefError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl PreferenceBackend for JsonFileBackend {
    fn load(&self) -> PrefResult<PreferenceMap> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PreferenceMap::new());
            }
            Err(err) => return Err(self.io_error(err)),
        };
        if contents.trim().is_empty() {
            return Ok(PreferenceMap::new());
        }
        match serde_json::from_str(&contents) {
            Ok(values) => Ok(values),
            Err(err) => {
                // Keep the unreadable file for inspection; the next save rewrites the original.
                let aside = self.path.with_extension("json.corrupt");
                let moved_aside = std::fs::rename(&self.path, &aside).is_ok();
                warn!(
                    "event=prefs_open module=prefs status=fallback moved_aside={} error={}",
                    moved_aside, err
                );
                Ok(PreferenceMap::new())
            }
        }
    }

    fn save(&self, values: &PreferenceMap) -> PrefResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let contents = serde_json::to_string_pretty(values)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, contents).map_err(|err| self.io_error(err))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|err| self.io_error(err))?;
        Ok(())
    }
}

/// In-process backend. Clones share the same map, which lets tests reopen a
/// store and observe what was "persisted".
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    values: Arc<Mutex<PreferenceMap>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceBackend for MemoryBackend {
    fn load(&self) -> PrefResult<PreferenceMap> {
        Ok(self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, values: &PreferenceMap) -> PrefResult<()> {
        *self.values.lock().unwrap_or_else(PoisonError::into_inner) = values.clone();
        Ok(())
    }
}

/// All preferences resolved with defaults, for one-shot startup reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceSnapshot {
    pub first_launch: bool,
    pub theme: String,
    pub notifications_enabled: bool,
    pub currency: String,
    pub language: String,
    pub user_id: String,
}

pub struct PreferenceStore {
    backend: Box<dyn PreferenceBackend>,
    values: RwLock<PreferenceMap>,
}

impl PreferenceStore {
    /// Loads persisted values once; later reads are served from memory.
    pub fn open(backend: impl PreferenceBackend + 'static) -> PrefResult<Self> {
        let values = backend.load()?;
        info!(
            "event=prefs_open module=prefs status=ok keys={}",
            values.len()
        );
        Ok(Self {
            backend: Box::new(backend),
            values: RwLock::new(values),
        })
    }

    /// Store backed by a fresh `MemoryBackend`.
    pub fn in_memory() -> Self {
        Self {
            backend: Box::new(MemoryBackend::new()),
            values: RwLock::new(PreferenceMap::new()),
        }
    }

    pub fn first_launch(&self) -> bool {
        self.get_bool(KEY_FIRST_LAUNCH, true)
    }

    pub fn set_first_launch(&self, value: bool) -> PrefResult<()> {
        self.set(KEY_FIRST_LAUNCH, Value::Bool(value))
    }

    pub fn theme(&self) -> String {
        self.get_string(KEY_THEME, DEFAULT_THEME)
    }

    pub fn set_theme(&self, value: &str) -> PrefResult<()> {
        self.set(KEY_THEME, Value::from(value))
    }

    pub fn notifications_enabled(&self) -> bool {
        self.get_bool(KEY_NOTIFICATIONS_ENABLED, true)
    }

    pub fn set_notifications_enabled(&self, value: bool) -> PrefResult<()> {
        self.set(KEY_NOTIFICATIONS_ENABLED, Value::Bool(value))
    }

    pub fn currency(&self) -> String {
        self.get_string(KEY_CURRENCY, DEFAULT_CURRENCY)
    }

    pub fn set_currency(&self, value: &str) -> PrefResult<()> {
        self.set(KEY_CURRENCY, Value::from(value))
    }

    pub fn language(&self) -> String {
        self.get_string(KEY_LANGUAGE, DEFAULT_LANGUAGE)
    }

    pub fn set_language(&self, value: &str) -> PrefResult<()> {
        self.set(KEY_LANGUAGE, Value::from(value))
    }

    pub fn user_id(&self) -> String {
        self.get_string(KEY_USER_ID, DEFAULT_USER_ID)
    }

    pub fn set_user_id(&self, value: &str) -> PrefResult<()> {
        self.set(KEY_USER_ID, Value::from(value))
    }

    pub fn snapshot(&self) -> PreferenceSnapshot {
        PreferenceSnapshot {
            first_launch: self.first_launch(),
            theme: self.theme(),
            notifications_enabled: self.notifications_enabled(),
            currency: self.currency(),
            language: self.language(),
            user_id: self.user_id(),
        }
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get_raw(key) {
            Some(Value::Bool(value)) => value,
            Some(other) => {
                warn!("event=prefs_read module=prefs status=fallback key={key} found={other}");
                default
            }
            None => default,
        }
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        match self.get_raw(key) {
            Some(Value::String(value)) => value,
            Some(other) => {
                warn!("event=prefs_read module=prefs status=fallback key={key} found={other}");
                default.to_string()
            }
            None => default.to_string(),
        }
    }

    fn get_raw(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Value) -> PrefResult<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        let previous = values.insert(key.to_string(), value);
        if let Err(err) = self.backend.save(&values) {
            match previous {
                Some(previous) => values.insert(key.to_string(), previous),
                None => values.remove(key),
            };
            warn!("event=prefs_write module=prefs status=error key={key} error={err}");
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        JsonFileBackend, MemoryBackend, PrefError, PrefResult, PreferenceBackend, PreferenceMap,
        PreferenceStore, KEY_FIRST_LAUNCH,
    };
    use serde_json::Value;

    struct ReadOnlyBackend;

    impl PreferenceBackend for ReadOnlyBackend {
        fn load(&self) -> PrefResult<PreferenceMap> {
            Ok(PreferenceMap::new())
        }

        fn save(&self, _values: &PreferenceMap) -> PrefResult<()> {
            Err(PrefError::Io {
                path: "read-only".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }
    }

    #[test]
    fn defaults_apply_when_empty() {
        let prefs = PreferenceStore::in_memory();
        let snapshot = prefs.snapshot();
        assert!(snapshot.first_launch);
        assert_eq!(snapshot.theme, "system");
        assert!(snapshot.notifications_enabled);
        assert_eq!(snapshot.currency, "CNY");
        assert_eq!(snapshot.language, "zh");
        assert_eq!(snapshot.user_id, "default_user");
    }

    #[test]
    fn writes_survive_reopen_on_same_backend() {
        let backend = MemoryBackend::new();
        let prefs = PreferenceStore::open(backend.clone()).unwrap();
        prefs.set_first_launch(false).unwrap();
        prefs.set_currency("USD").unwrap();
        drop(prefs);

        let reopened = PreferenceStore::open(backend).unwrap();
        assert!(!reopened.first_launch());
        assert_eq!(reopened.currency(), "USD");
    }

    #[test]
    fn mistyped_value_reads_as_default() {
        let backend = MemoryBackend::new();
        let mut seeded = PreferenceMap::new();
        seeded.insert(KEY_FIRST_LAUNCH.to_string(), Value::from("nope"));
        backend.save(&seeded).unwrap();

        let prefs = PreferenceStore::open(backend).unwrap();
        assert!(prefs.first_launch());
    }

    #[test]
    fn failed_write_keeps_previous_value() {
        let prefs = PreferenceStore::open(ReadOnlyBackend).unwrap();
        assert!(prefs.set_theme("dark").is_err());
        assert_eq!(prefs.theme(), "system");
    }

    #[test]
    fn json_file_backend_roundtrips_and_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let prefs = PreferenceStore::open(JsonFileBackend::new(&path)).unwrap();
        assert!(prefs.first_launch());
        prefs.set_language("en").unwrap();
        prefs.set_notifications_enabled(false).unwrap();

        let reopened = PreferenceStore::open(JsonFileBackend::new(&path)).unwrap();
        assert_eq!(reopened.language(), "en");
        assert!(!reopened.notifications_enabled());
    }

    #[test]
    fn corrupt_json_file_falls_back_to_defaults_and_is_moved_aside() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"theme": "da"#).unwrap();

        let prefs = PreferenceStore::open(JsonFileBackend::new(&path)).unwrap();
        assert_eq!(prefs.theme(), "system");
        assert!(prefs.first_launch());
        assert!(dir.path().join("prefs.json.corrupt").exists());

        prefs.set_theme("dark").unwrap();
        let reopened = PreferenceStore::open(JsonFileBackend::new(&path)).unwrap();
        assert_eq!(reopened.theme(), "dark");
    }
}
