//! Key-value persistence for alert settings and history.
//!
//! Values are stored as JSON strings so any string store (browser
//! `localStorage`, a JSON file, a map in memory) can back the alert manager.
use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

pub const SETTINGS_KEY: &str = "alertSettings";
pub const HISTORY_KEY: &str = "alertHistory";
/// Most recent records kept under [`HISTORY_KEY`].
pub const HISTORY_LIMIT: usize = 100;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

/// Decode the JSON value under `key`; `Ok(None)` when absent.
pub fn load_json<T, S>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(text) => serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StoreError::Codec { key: key.to_string(), source }),
        None => Ok(None),
    }
}

pub fn save_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let text = serde_json::to_string(value)
        .map_err(|source| StoreError::Codec { key: key.to_string(), source })?;
    store.set(key, text)
}

#[derive(Debug, Clone, Default)]
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
}
