//! Key-value slots the gallery is persisted into.

use crate::error::{ModelShotError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A string-keyed store of string values.
pub trait StorageBackend: Send + Sync {
    /// Returns the value under `key`, or `None` if the slot was never written.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Overwrites the value under `key`.
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Uses `dir`, which is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the slots.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.slot_path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ModelShotError::Persistence(format!(
                "reading slot '{key}': {e}"
            ))),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let persist = || -> std::io::Result<()> {
            std::fs::create_dir_all(&self.dir)?;
            let target = self.slot_path(key);
            // Write beside the target and rename so readers never see a torn file.
            let tmp = self.dir.join(format!(".{key}.json.tmp"));
            std::fs::write(&tmp, value)?;
            std::fs::rename(&tmp, &target)
        };
        persist().map_err(|e| ModelShotError::Persistence(format!("writing slot '{key}': {e}")))
    }
}

/// Process-local slots.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let slots = self
            .slots
            .lock()
            .map_err(|_| ModelShotError::Persistence("memory backend poisoned".into()))?;
        Ok(slots.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| ModelShotError::Persistence("memory backend poisoned".into()))?;
        slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

impl<T: StorageBackend + ?Sized> StorageBackend for std::sync::Arc<T> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }
}
