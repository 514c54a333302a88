use crate::error::StorageError;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

pub type StorageMap = Map<String, Value>;

/// Key-value persistence shared by every context 💾
///
/// Mirrors the extension storage area: `get` returns only the keys that exist,
/// `remove(None)` wipes everything.
pub trait Storage: Send + Sync {
    fn get(&self, keys: &[&str]) -> Result<StorageMap, StorageError>;
    fn get_all(&self) -> Result<StorageMap, StorageError>;
    fn set(&self, items: StorageMap) -> Result<(), StorageError>;
    fn remove(&self, key: Option<&str>) -> Result<(), StorageError>;
}

pub type SharedStorage = Arc<dyn Storage>;

fn lock(map: &Mutex<StorageMap>) -> MutexGuard<'_, StorageMap> {
    map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn pick(map: &StorageMap, keys: &[&str]) -> StorageMap {
    keys.iter()
        .filter_map(|k| map.get(*k).map(|v| (k.to_string(), v.clone())))
        .collect()
}

/// Volatile store, used by tests and `--in-memory`.
#[derive(Default)]
pub struct MemoryStorage {
    map: Mutex<StorageMap>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStorage {
        Arc::new(Self::new())
    }
}

impl Storage for MemoryStorage {
    fn get(&self, keys: &[&str]) -> Result<StorageMap, StorageError> {
        Ok(pick(&lock(&self.map), keys))
    }

    fn get_all(&self) -> Result<StorageMap, StorageError> {
        Ok(lock(&self.map).clone())
    }

    fn set(&self, items: StorageMap) -> Result<(), StorageError> {
        lock(&self.map).extend(items);
        Ok(())
    }

    fn remove(&self, key: Option<&str>) -> Result<(), StorageError> {
        let mut map = lock(&self.map);
        match key {
            Some(k) => {
                map.remove(k);
            }
            None => map.clear(),
        }
        Ok(())
    }
}

/// JSON file store (`storage.json` in the config dir).
///
/// Every write is a read-modify-write of the whole file; the mutex keeps
/// the contexts of one process from interleaving.
pub struct FileStorage {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StorageMap, StorageError> {
        if !self.path.exists() {
            return Ok(StorageMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(StorageMap::new());
        }
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(StorageError::Corrupt),
        }
    }

    fn write(&self, map: &StorageMap) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, keys: &[&str]) -> Result<StorageMap, StorageError> {
        let _held = self.guard.lock().unwrap_or_else(|p| p.into_inner());
        Ok(pick(&self.read()?, keys))
    }

    fn get_all(&self) -> Result<StorageMap, StorageError> {
        let _held = self.guard.lock().unwrap_or_else(|p| p.into_inner());
        self.read()
    }

    fn set(&self, items: StorageMap) -> Result<(), StorageError> {
        let _held = self.guard.lock().unwrap_or_else(|p| p.into_inner());
        let mut map = self.read()?;
        map.extend(items);
        self.write(&map)
    }

    fn remove(&self, key: Option<&str>) -> Result<(), StorageError> {
        let _held = self.guard.lock().unwrap_or_else(|p| p.into_inner());
        let map = match key {
            Some(k) => {
                let mut map = self.read()?;
                map.remove(k);
                map
            }
            None => StorageMap::new(),
        };
        self.write(&map)
    }
}
