//! Credential store backed by `~/.dmc.yaml`
//!
//! The store is a flat map of string values. Keys are read and written
//! upper-case (`ID`, `PASSWORD`, ...) and stored lower-case on disk. Values
//! from environment variables of the same name shadow file values on read
//! but are never written back.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DmcError, Result};

/// File name of the config inside the home directory
pub const CONFIG_FILE_NAME: &str = ".dmc.yaml";

pub const KEY_TOKEN: &str = "TOKEN";
pub const KEY_ID: &str = "ID";
pub const KEY_PASSWORD: &str = "PASSWORD";
pub const KEY_FCU_URL: &str = "FCU_URL";
pub const KEY_GCS_URL: &str = "GCS_URL";
pub const KEY_DMC_URI: &str = "DMC_URI";
pub const KEY_DMC_SESSION_URI: &str = "DMC_SESSION_URI";
pub const KEY_DMC_ANIP_URI: &str = "DMC_ANIP_URI";
pub const KEY_MOCK_IMSI: &str = "MOCK_IMSI";
pub const KEY_MOCK_POSITION: &str = "MOCK_POSITION";
pub const KEY_IMAGE: &str = "IMAGE";
pub const KEY_SIM_TYPE: &str = "SIM_TYPE";

/// Every key the store knows about, in the order `config list` shows them
pub const KNOWN_KEYS: &[&str] = &[
    KEY_ID,
    KEY_PASSWORD,
    KEY_FCU_URL,
    KEY_GCS_URL,
    KEY_DMC_URI,
    KEY_DMC_SESSION_URI,
    KEY_DMC_ANIP_URI,
    KEY_MOCK_IMSI,
    KEY_MOCK_POSITION,
    KEY_IMAGE,
    KEY_SIM_TYPE,
    KEY_TOKEN,
];

/// Default location of the config file
pub fn default_config_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_FILE_NAME))
        .ok_or_else(|| DmcError::ConfigLoad {
            path: CONFIG_FILE_NAME.to_string(),
            message: "could not determine home directory".to_string(),
        })
}

/// Persisted key-value configuration
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl CredentialStore {
    /// Empty store that will persist to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            values: BTreeMap::new(),
            overrides: BTreeMap::new(),
        }
    }

    /// Load the store from `path`. A missing file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut store = Self::new(path.clone());

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(store),
            Err(e) => {
                return Err(DmcError::ConfigLoad {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(store);
        }

        let raw: BTreeMap<String, serde_yaml::Value> =
            serde_yaml::from_str(&content).map_err(|e| DmcError::ConfigLoad {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        for (key, value) in raw {
            if let Some(value) = scalar_to_string(&value) {
                store.values.insert(key.to_uppercase(), value);
            }
        }

        tracing::debug!(path = %path.display(), keys = store.values.len(), "Loaded config");
        Ok(store)
    }

    /// Shadow file values with environment variables named after known keys
    pub fn with_env_overrides(mut self) -> Self {
        for key in KNOWN_KEYS {
            if let Ok(value) = std::env::var(key) {
                self.overrides.insert(key.to_string(), value);
            }
        }
        self
    }

    /// Path the store persists to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a value. Empty strings are treated as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_uppercase();
        self.overrides
            .get(&key)
            .or_else(|| self.values.get(&key))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let key = key.to_uppercase();
        // An explicit set wins over the environment for the rest of the run
        self.overrides.remove(&key);
        self.values.insert(key, value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(&key.to_uppercase())
    }

    /// Write the file values back to disk, creating the file if needed
    pub fn persist(&self) -> Result<()> {
        let content = serde_yaml::to_string(&self.on_disk_values())
            .map_err(|e| DmcError::ConfigPersistError(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| DmcError::ConfigPersistError(e.to_string()))?;
            }
        }

        fs::write(&self.path, content).map_err(|e| {
            DmcError::ConfigPersistError(format!("{}: {}", self.path.display(), e))
        })?;

        tracing::debug!(path = %self.path.display(), "Persisted config");
        Ok(())
    }

    /// Delete the config file and forget all values.
    /// Returns false if there was no file to delete.
    pub fn clear(&mut self) -> Result<bool> {
        self.values.clear();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DmcError::IoError(e)),
        }
    }

    /// File values as stored on disk, minus the session token
    pub fn redacted(&self) -> BTreeMap<String, String> {
        let mut values = self.on_disk_values();
        values.remove(&KEY_TOKEN.to_lowercase());
        values
    }

    fn on_disk_values(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.clone()))
            .collect()
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::load(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(store.get(KEY_ID).is_none());
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut store = CredentialStore::new(&path);
        store.set(KEY_ID, "abc");
        store.set("fcu_url", "udp://:14650@");
        store.persist().unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("id: abc"));

        let reloaded = CredentialStore::load(&path).unwrap();
        assert_eq!(reloaded.get("id"), Some("abc"));
        assert_eq!(reloaded.get(KEY_FCU_URL), Some("udp://:14650@"));
    }

    #[test]
    fn test_empty_value_is_absent() {
        let mut store = CredentialStore::new("unused.yaml");
        store.set(KEY_GCS_URL, "");
        assert!(store.get(KEY_GCS_URL).is_none());
    }

    #[test]
    fn test_numeric_values_are_read_as_strings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "id: 1234\nimage: dmc-rpi\n").unwrap();

        let store = CredentialStore::load(&path).unwrap();
        assert_eq!(store.get(KEY_ID), Some("1234"));
        assert_eq!(store.get(KEY_IMAGE), Some("dmc-rpi"));
    }

    #[test]
    fn test_redacted_hides_token() {
        let mut store = CredentialStore::new("unused.yaml");
        store.set(KEY_TOKEN, "secret-token");
        store.set(KEY_ID, "abc");
        let listed = store.redacted();
        assert!(!listed.contains_key("token"));
        assert_eq!(listed.get("id").map(String::as_str), Some("abc"));
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut store = CredentialStore::new(&path);
        store.set(KEY_ID, "abc");
        store.persist().unwrap();

        assert!(store.clear().unwrap());
        assert!(!path.exists());
        assert!(!store.clear().unwrap());
    }

    #[test]
    fn test_malformed_file_fails_to_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "- just\n- a list\n").unwrap();
        assert!(matches!(
            CredentialStore::load(&path),
            Err(DmcError::ConfigLoad { .. })
        ));
    }
}
