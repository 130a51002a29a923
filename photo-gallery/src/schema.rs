use rusqlite::{Connection, Result};

/// Initialize the gallery preference schema
pub fn init_preference_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS gallery_schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    let current_version: i32 = conn
        .query_row(
            "SELECT version FROM gallery_schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current_version < 1 {
        create_preference_schema_v1(conn)?;
        conn.execute("INSERT INTO gallery_schema_version (version) VALUES (1)", [])?;
        log::debug!("Gallery preference schema v1 applied");
    }

    Ok(())
}

/// Create gallery preference schema version 1
fn create_preference_schema_v1(conn: &Connection) -> Result<()> {
    // One JSON record per storage key (one key per named collection)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS gallery_preferences (
            storage_key TEXT PRIMARY KEY,
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TRIGGER IF NOT EXISTS update_gallery_preferences_timestamp
         AFTER UPDATE OF payload ON gallery_preferences
         BEGIN
            UPDATE gallery_preferences SET updated_at = CURRENT_TIMESTAMP
            WHERE storage_key = NEW.storage_key;
         END",
        [],
    )?;

    Ok(())
}
