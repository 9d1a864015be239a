//! Persistence collaborator: a key-value store holding the serialized session.
//!
//! Saving is fire-and-forget. A failed write is logged and never undoes the
//! transition that triggered it; a missing or unreadable entry loads as a
//! fresh session.

use crate::models::Session;
use crate::snapshot::{session_from_value, SnapshotError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key the single-session store uses.
pub const SESSION_KEY: &str = "court-session-state";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// String key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// In-memory store (tests, and servers without a data directory).
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir`, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(tmp, path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// What is written under the key: the snapshot plus when it was saved.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSession {
    saved_at: DateTime<Utc>,
    state: Value,
}

/// Load the session stored under `key`.
///
/// A missing key, unreadable store or broken snapshot all yield a fresh
/// session. Older layouts are upgraded. Entries written as a bare snapshot,
/// or wrapped as `{"state": ...}` without a timestamp, are accepted too.
pub fn load_session<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Session {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Session::new(),
        Err(e) => {
            log::warn!("could not read session '{}': {}", key, e);
            return Session::new();
        }
    };
    match decode_entry(&raw) {
        Ok(session) => session,
        Err(e) => {
            log::warn!("discarding unreadable session '{}': {}", key, e);
            Session::new()
        }
    }
}

fn decode_entry(raw: &str) -> Result<Session, StoreError> {
    let mut value: Value = serde_json::from_str(raw).map_err(SnapshotError::from)?;
    let wrapped = value.get("state").map_or(false, Value::is_object);
    if wrapped {
        value = value["state"].take();
    }
    Ok(session_from_value(value)?)
}

/// Write the session under `key`. Failures are logged, never returned.
pub fn persist_session<S: KeyValueStore + ?Sized>(store: &mut S, key: &str, session: &Session) {
    if let Err(e) = try_persist(store, key, session) {
        log::warn!("could not persist session '{}': {}", key, e);
    }
}

fn try_persist<S: KeyValueStore + ?Sized>(
    store: &mut S,
    key: &str,
    session: &Session,
) -> Result<(), StoreError> {
    let state = serde_json::to_value(session).map_err(SnapshotError::from)?;
    let entry = PersistedSession {
        saved_at: Utc::now(),
        state,
    };
    let raw = serde_json::to_string(&entry).map_err(SnapshotError::from)?;
    store.set(key, raw)
}
