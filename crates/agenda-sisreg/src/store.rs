//! Keyed string storage for everything the tool keeps between runs.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Well-known keys.
pub mod keys {
    pub const DRAFTS: &str = "escalas_salvas";
    pub const SELECTED_UNIT: &str = "unidade_selecionada";
    pub const SELECTED_CNES: &str = "cnes_selecionado";
    pub const SESSION: &str = "SISREG_SESSION";
    pub const MASTER_CACHE: &str = "SISREG_CACHE_MASTER_ALL";

    /// Last synced entries of one unit.
    pub fn unit_cache(unit: &str) -> String {
        format!("cache_{unit}")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io failure for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode value for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// String values by key, the way a browser's local storage behaves.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// JSON helpers over any [`LocalStore`].
pub trait JsonStoreExt: LocalStore {
    /// Missing keys and corrupt values both yield `default`; the latter is
    /// logged.
    fn load_json<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, StoreError> {
        let Some(raw) = self.get(key)? else {
            return Ok(default);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(key, error = %err, "discarding corrupt stored value");
                Ok(default)
            }
        }
    }

    fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.set(key, &encoded)
    }
}

impl<S: LocalStore + ?Sized> JsonStoreExt for S {}

/// One file per key under `root`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StoreError::Io {
            key: root.display().to_string(),
            source,
        })?;
        debug!(root = %root.display(), "opened file store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", encode_key(key)))
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let target = self.path_for(key);
        let temp = target.with_extension("json.tmp");
        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };

        let mut file = fs::File::create(&temp).map_err(io_err)?;
        file.write_all(value.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        fs::rename(&temp, &target).map_err(io_err)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// Unit names carry spaces and accents; anything outside `[A-Za-z0-9_-]`
/// is written as `%XX` per UTF-8 byte.
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

/// In-process store for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StoreError> {
        self.values
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_encoded_into_safe_file_names() {
        assert_eq!(encode_key("cache_UBS CENTRO"), "cache_UBS%20CENTRO");
        assert_eq!(encode_key("SISREG_SESSION"), "SISREG_SESSION");
        assert_eq!(encode_key("ç"), "%C3%A7");
        assert_eq!(encode_key("../x"), "%2E%2E%2Fx");
    }

    #[test]
    fn file_store_round_trips_and_removes() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = FileStore::open(dir.path().join("state")).expect("store opens");

        assert_eq!(store.get("cache_UBS SUL").expect("get"), None);
        store.set("cache_UBS SUL", "[1,2]").expect("set");
        assert_eq!(
            store.get("cache_UBS SUL").expect("get").as_deref(),
            Some("[1,2]")
        );

        store.remove("cache_UBS SUL").expect("remove");
        store.remove("cache_UBS SUL").expect("second remove is a no-op");
        assert_eq!(store.get("cache_UBS SUL").expect("get"), None);
    }

    #[test]
    fn corrupt_json_falls_back_to_default() {
        let store = MemoryStore::new();
        store.set(keys::DRAFTS, "{not json").expect("set");

        let drafts: Vec<u32> = store.load_json(keys::DRAFTS, Vec::new()).expect("load");
        assert!(drafts.is_empty());

        store.save_json(keys::DRAFTS, &vec![1u32, 2]).expect("save");
        let drafts: Vec<u32> = store.load_json(keys::DRAFTS, Vec::new()).expect("load");
        assert_eq!(drafts, vec![1, 2]);
    }

    #[test]
    fn unit_cache_key_uses_prefix() {
        assert_eq!(keys::unit_cache("UBS NORTE"), "cache_UBS NORTE");
    }
}
