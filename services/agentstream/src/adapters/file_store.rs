//! services/agentstream/src/adapters/file_store.rs
//!
//! The on-disk implementation of the `KeyValueStore` port: a single JSON
//! object mapping storage keys to their serialized values.

use agentstream_core::ports::{KeyValueStore, PortError, PortResult};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// A `KeyValueStore` persisted to one JSON file.
///
/// The file is read once at open; every write rewrites it through a temporary
/// file and a rename.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file opens empty; so does an
    /// unreadable one, with a warning.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let entries = match read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Starting with an empty store");
                BTreeMap::new()
            }
        };
        info!(path = %path.display(), keys = entries.len(), "Opened key-value store");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> PortResult<()> {
        write_entries(&self.path, entries).map_err(|e| {
            PortError::Storage(format!("failed to write {}: {e}", self.path.display()))
        })
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> PortResult<()> {
        let mut entries = self.entries();
        let previous = entries.insert(key.to_string(), value);
        let result = self.persist(&entries);
        if result.is_err() {
            // Keep memory consistent with what is on disk.
            match previous {
                Some(previous) => entries.insert(key.to_string(), previous),
                None => entries.remove(key),
            };
        }
        result
    }

    fn remove(&self, key: &str) -> PortResult<()> {
        let mut entries = self.entries();
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };
        let result = self.persist(&entries);
        if result.is_err() {
            entries.insert(key.to_string(), previous);
        }
        result
    }
}

fn read_entries(path: &Path) -> io::Result<BTreeMap<String, String>> {
    match fs::read(path) {
        Ok(data) => serde_json::from_slice(&data)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e),
    }
}

fn write_entries(path: &Path, entries: &BTreeMap<String, String>) -> io::Result<()> {
    let bytes = serde_json::to_vec_pretty(entries)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, bytes)?;
    match fs::rename(&tmp_path, path) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            if path.exists() {
                fs::remove_file(path)?;
                fs::rename(&tmp_path, path)
            } else {
                Err(rename_err)
            }
        }
    }
}
