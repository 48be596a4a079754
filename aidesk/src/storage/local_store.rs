//! Durable client-local key-value storage
//!
//! Each key maps to one JSON file holding a versioned envelope:
//! `{ "version": 1, "state": { ... } }`.
//! Reads happen once, synchronously, when a store is constructed.
//! Writes go to a temp file first and are renamed into place.

use crate::error::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A value that may be written to local storage.
///
/// Implementors list exactly the fields that survive a restart.
/// The `Serialize` bound keeps credential types out.
pub trait Persist: Serialize + DeserializeOwned {
    const KEY: &'static str;
    const VERSION: u32;
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    state: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    version: u32,
    state: T,
}

/// Directory of versioned JSON blobs
#[derive(Clone, Debug)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the storage directory if needed
    pub fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        tracing::info!("Local storage initialized at: {:?}", self.root);
        Ok(())
    }

    /// Load a persisted value.
    ///
    /// Missing, unreadable, or stale-version blobs yield `None` so the
    /// caller starts from defaults.
    pub fn load<T: Persist>(&self) -> Option<T> {
        let path = self.path_for(T::KEY);
        if !path.exists() {
            return None;
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read {:?}: {}", path, e);
                return None;
            }
        };

        match serde_json::from_str::<Envelope<T>>(&content) {
            Ok(envelope) if envelope.version == T::VERSION => {
                tracing::debug!("Restored {} (v{})", T::KEY, envelope.version);
                Some(envelope.state)
            }
            Ok(envelope) => {
                tracing::warn!(
                    "Discarding {} blob with version {} (expected {})",
                    T::KEY,
                    envelope.version,
                    T::VERSION
                );
                None
            }
            Err(e) => {
                tracing::warn!("Discarding unparsable {} blob: {}", T::KEY, e);
                None
            }
        }
    }

    /// Write a value atomically
    pub fn save<T: Persist>(&self, value: &T) -> Result<()> {
        let content = serde_json::to_string_pretty(&EnvelopeRef {
            version: T::VERSION,
            state: value,
        })?;

        fs::create_dir_all(&self.root)?;

        let path = self.path_for(T::KEY);
        let temp_path = path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)
            .map_err(|e| AppError::Storage(format!("Failed to store {}: {}", T::KEY, e)))?;

        tracing::debug!("Persisted {} to {:?}", T::KEY, path);

        Ok(())
    }

    /// Remove a persisted value
    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(());
        }
        fs::remove_file(&path)?;
        tracing::debug!("Removed {}", key);
        Ok(())
    }

    /// Raw file contents for a key, if present
    pub fn read_raw(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    /// Storage root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

/// Save a value, logging instead of failing.
///
/// Selection changes are synchronous setters; a storage hiccup must not
/// turn them into errors.
pub(crate) fn persist_quietly<T: Persist>(storage: &LocalStorage, value: &T) {
    if let Err(e) = storage.save(value) {
        tracing::warn!("Failed to persist {}: {}", T::KEY, e);
    }
}

/// Persist a selection, or remove its blob when nothing is selected
pub(crate) fn persist_or_forget<T: Persist>(storage: &LocalStorage, value: Option<T>) {
    match value {
        Some(value) => persist_quietly(storage, &value),
        None => {
            if let Err(e) = storage.remove(T::KEY) {
                tracing::warn!("Failed to remove {}: {}", T::KEY, e);
            }
        }
    }
}
