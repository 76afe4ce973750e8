//! Tab-local persisted storage slots.
//!
//! The console keeps two JSON-encoded values outside of its in-memory state:
//! the in-progress wizard draft and the signed-in user's session profile.
//! Both live in string slots keyed by fixed constants. [`TabStorage`] is the
//! seam; [`MemoryStorage`] is scoped to one process, [`FileStorage`] survives
//! restarts the way browser tab storage survives a page reload.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Slot keys
// ---------------------------------------------------------------------------

/// Slot holding the in-progress wizard draft.
pub const DRAFT_STORAGE_KEY: &str = "draft_form_data";

/// Slot holding the authenticated user's session profile.
pub const SESSION_STORAGE_KEY: &str = "user_session";

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A string key/value store scoped to a single console session.
pub trait TabStorage: Send + Sync {
    /// Read a slot. `Ok(None)` when the slot has never been written.
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;

    /// Overwrite a slot.
    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;

    /// Remove a slot. Removing an absent slot is not an error.
    fn remove(&self, key: &str) -> Result<(), CoreError>;
}

impl<T: TabStorage + ?Sized> TabStorage for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        (**self).remove(key)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-scoped storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, CoreError> {
        self.slots
            .lock()
            .map_err(|_| CoreError::Storage("memory storage lock poisoned".into()))
    }
}

impl TabStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File-backed
// ---------------------------------------------------------------------------

/// Storage backed by one file per slot inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// The directory is created lazily on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl TabStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        match std::fs::read_to_string(self.slot_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::Storage(format!("failed to read slot '{key}': {e}"))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            CoreError::Storage(format!(
                "failed to create storage dir {}: {e}",
                self.dir.display()
            ))
        })?;
        std::fs::write(self.slot_path(key), value)
            .map_err(|e| CoreError::Storage(format!("failed to write slot '{key}': {e}")))
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        match std::fs::remove_file(self.slot_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::Storage(format!("failed to remove slot '{key}': {e}"))),
        }
    }
}
