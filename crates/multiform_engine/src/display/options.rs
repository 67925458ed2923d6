//! Persistent options storage
//!
//! Every display toggle is backed by a key-value options store so state
//! survives restarts. Values are RON-encoded strings; the typed accessors
//! on `dyn OptionsStore` do the encoding.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ConfigError;

/// String-keyed persistent option storage
pub trait OptionsStore {
    /// Fetch the raw encoded value for `key`
    fn get_raw(&self, key: &str) -> Option<String>;

    /// Store the raw encoded value for `key`
    fn set_raw(&mut self, key: &str, value: String);

    /// Whether a value exists for `key`
    fn contains(&self, key: &str) -> bool {
        self.get_raw(key).is_some()
    }
}

impl<'a> dyn OptionsStore + 'a {
    /// Fetch and decode a typed value
    ///
    /// A missing key and an undecodable value both yield `None`; the
    /// latter is logged.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key)?;
        match ron::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("option '{}' holds an undecodable value: {}", key, err);
                None
            }
        }
    }

    /// Encode and store a typed value
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) {
        match ron::ser::to_string(value) {
            Ok(raw) => self.set_raw(key, raw),
            Err(err) => log::warn!("option '{}' failed to encode: {}", key, err),
        }
    }
}

/// In-memory options store for tests and tools
#[derive(Debug, Default)]
pub struct MemoryOptions {
    values: HashMap<String, String>,
}

impl MemoryOptions {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptionsStore for MemoryOptions {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_raw(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }
}

/// File-backed options store
///
/// The whole store is one RON map on disk. Reads are served from memory;
/// writes mark the store dirty until [`flush`](FileOptions::flush).
#[derive(Debug)]
pub struct FileOptions {
    path: PathBuf,
    values: HashMap<String, String>,
    dirty: bool,
}

impl FileOptions {
    /// Open the store at `path`
    ///
    /// A missing file is an empty store (first run); an unreadable one is
    /// logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => match ron::from_str(&contents) {
                Ok(values) => values,
                Err(err) => {
                    log::warn!("options file {} is unreadable: {}", path.display(), err);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            values,
            dirty: false,
        }
    }

    /// The file backing this store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether unsaved writes exist
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the store back to disk if anything changed
    pub fn flush(&mut self) -> Result<(), ConfigError> {
        if !self.dirty {
            return Ok(());
        }
        let contents = ron::ser::to_string_pretty(&self.values, Default::default())
            .map_err(|err| ConfigError::Serialize(err.to_string()))?;
        std::fs::write(&self.path, contents)?;
        self.dirty = false;
        log::debug!("flushed options to {}", self.path.display());
        Ok(())
    }
}

impl OptionsStore for FileOptions {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_raw(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
        self.dirty = true;
    }
}
