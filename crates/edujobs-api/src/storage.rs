// Persisted client state.
//
// The session survives restarts through a small key/value store, the
// counterpart of browser local storage. Values are opaque strings; the
// session store decides what goes in them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::io::Write;
use std::sync::{Mutex, MutexGuard};

use tempfile::NamedTempFile;
use tracing::{debug, trace, warn};

use crate::error::Error;

/// Minimal string key/value storage.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;
    fn remove(&self, key: &str) -> Result<(), Error>;
}

// ── In-memory ────────────────────────────────────────────────────────

/// Process-local storage. Nothing outlives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(lock(&self.values)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        lock(&self.values)?.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        lock(&self.values)?.remove(key);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, Error> {
    mutex
        .lock()
        .map_err(|_| Error::Storage("storage lock poisoned".into()))
}

// ── File-backed ──────────────────────────────────────────────────────

/// Storage backed by a single JSON object on disk.
///
/// Every write rewrites the whole file through a temporary sibling that is
/// renamed over the target, so readers never see a partial file. The file
/// is created owner-only (0600 on Unix) since it holds the bearer token.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, Error> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(Error::Storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| Error::Deserialization {
            message: format!("corrupt storage file {}: {e}", self.path.display()),
            body: raw,
        })
    }

    /// Current contents for a read-modify-write. A corrupt file is replaced
    /// rather than blocking every later write.
    fn read_for_write(&self) -> Result<BTreeMap<String, String>, Error> {
        match self.read_all() {
            Err(Error::Deserialization { message, .. }) => {
                warn!(%message, "overwriting unreadable storage file");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), Error> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::Storage(format!("failed to create {}: {e}", parent.display())))?;
        let body = serde_json::to_string_pretty(values)
            .map_err(|e| Error::Storage(format!("failed to encode storage: {e}")))?;

        let write_err =
            |e: std::io::Error| Error::Storage(format!("failed to write {}: {e}", self.path.display()));
        // NamedTempFile is created with mode 0600 and keeps it across the rename.
        let mut tmp = NamedTempFile::new_in(parent).map_err(write_err)?;
        tmp.write_all(body.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        trace!(path = %self.path.display(), keys = values.len(), "storage flushed");
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let _guard = lock(&self.write_lock)?;
        let mut values = self.read_for_write()?;
        values.insert(key.to_owned(), value.to_owned());
        self.write_all(&values)
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let _guard = lock(&self.write_lock)?;
        let mut values = self.read_for_write()?;
        if values.remove(key).is_some() {
            debug!(key, "removed persisted value");
            self.write_all(&values)?;
        }
        Ok(())
    }
}
