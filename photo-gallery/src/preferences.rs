//! Keyed persistence for gallery preferences
//!
//! Preferences are stored as one JSON record per storage key. Loading merges
//! the stored object over the caller's defaults, so records written by an
//! older build (missing newer fields) still load.

use crate::models::Preferences;
use crate::schema::init_preference_schema;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

/// Error type for preference storage
#[derive(Debug)]
pub enum StoreError {
    DatabaseError(rusqlite::Error),
    SerializationError(serde_json::Error),
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DatabaseError(e) => write!(f, "Database error: {}", e),
            StoreError::SerializationError(e) => write!(f, "Serialization error: {}", e),
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::DatabaseError(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::SerializationError(err)
    }
}

/// Generic string key-value persistence provided by the host
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Volatile store, used in tests and as a fallback when no database is available
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// SQLite-backed store (table `gallery_preferences`)
pub struct SqlitePreferenceStore {
    conn: Connection,
}

impl SqlitePreferenceStore {
    /// Wraps an open connection, creating the schema if needed
    pub fn new(conn: Connection) -> Result<Self, StoreError> {
        init_preference_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Opens (or creates) the database file at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Unavailable(format!(
                        "Failed to create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        log::debug!("Opening preference database {}", path.display());
        Self::new(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::new(Connection::open_in_memory()?)
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM gallery_preferences WHERE storage_key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO gallery_preferences (storage_key, payload) VALUES (?1, ?2)
             ON CONFLICT(storage_key) DO UPDATE SET payload = excluded.payload",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM gallery_preferences WHERE storage_key = ?1",
            [key],
        )?;
        Ok(())
    }
}

/// Merges a stored JSON record over `defaults`
///
/// Unknown keys in the stored record are ignored; keys absent from it keep
/// their default value.
pub fn merge_over_defaults(defaults: &Preferences, stored: &str) -> Result<Preferences, StoreError> {
    let mut merged = serde_json::to_value(defaults)?;
    let stored: serde_json::Value = serde_json::from_str(stored)?;

    match (merged.as_object_mut(), stored) {
        (Some(target), serde_json::Value::Object(source)) => {
            for (key, value) in source {
                if target.contains_key(&key) {
                    target.insert(key, value);
                }
            }
        }
        (_, other) => {
            return Err(StoreError::Unavailable(format!(
                "Stored preferences are not an object: {}",
                other
            )))
        }
    }

    Ok(serde_json::from_value(merged)?)
}

/// Reads preferences for `key`, falling back to `defaults` on any failure
pub fn load_preferences(store: &dyn PreferenceStore, key: &str, defaults: &Preferences) -> Preferences {
    let stored = match store.get(key) {
        Ok(Some(stored)) => stored,
        Ok(None) => return defaults.clone(),
        Err(e) => {
            log::warn!("Failed to load gallery preferences {}: {}", key, e);
            return defaults.clone();
        }
    };

    match merge_over_defaults(defaults, &stored) {
        Ok(preferences) => preferences,
        Err(e) => {
            log::warn!("Ignoring unreadable gallery preferences {}: {}", key, e);
            defaults.clone()
        }
    }
}

/// Writes preferences for `key`; failures are logged, never returned
pub fn save_preferences(store: &dyn PreferenceStore, key: &str, preferences: &Preferences) {
    let result = serde_json::to_string(preferences)
        .map_err(StoreError::from)
        .and_then(|json| store.set(key, &json));

    if let Err(e) = result {
        log::warn!("Failed to save gallery preferences {}: {}", key, e);
    }
}
