use crate::error::AppError;
use photo_gallery::{MemoryPreferenceStore, PreferenceStore, SqlitePreferenceStore};
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub const DATABASE_FILE: &str = "preferences.db";

/// Path of the preference database inside `data_dir`
pub fn get_database_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATABASE_FILE)
}

/// Opens the preference database, creating it and its schema if needed
pub fn init_database(data_dir: &Path) -> Result<SqlitePreferenceStore, AppError> {
    let db_path = get_database_path(data_dir);

    // Make sure the directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    Ok(SqlitePreferenceStore::open(&db_path)?)
}

/// The preference store for this run
///
/// Falls back to an in-memory store when the database cannot be opened, so
/// preferences then last until the app is closed.
pub fn open_preference_store(data_dir: &Path) -> Rc<dyn PreferenceStore> {
    match init_database(data_dir) {
        Ok(store) => {
            log::info!("Preferences stored in {}", get_database_path(data_dir).display());
            Rc::new(store)
        }
        Err(e) => {
            log::warn!("{} ({})", e.user_message(), e);
            Rc::new(MemoryPreferenceStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photo_gallery::preferences::{load_preferences, save_preferences};
    use photo_gallery::Preferences;

    #[test]
    fn test_preferences_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut preferences = Preferences::default();
        preferences.slideshow_interval = 5000;

        let store = open_preference_store(dir.path());
        save_preferences(store.as_ref(), "srm-gallery-preferences", &preferences);
        drop(store);

        assert!(get_database_path(dir.path()).exists());
        let store = open_preference_store(dir.path());
        let loaded = load_preferences(store.as_ref(), "srm-gallery-preferences", &Preferences::default());
        assert_eq!(loaded.slideshow_interval, 5000);
    }

    #[test]
    fn test_unusable_directory_falls_back_to_memory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let store = open_preference_store(&blocker.join("nested"));
        store.set("key", "{}").unwrap();
        assert_eq!(store.get("key").unwrap().as_deref(), Some("{}"));
    }
}
