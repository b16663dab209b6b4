// Database migrations
// Migrations are forward-only. Never edit or delete a migration after it ships.

use rusqlite::Connection;
use anyhow::Result;

/// All migrations in order. Each migration is a SQL string.
const MIGRATIONS: &[&str] = &[
    // Migration 1: Projects and log entries
    r#"
    -- Projects table (settings is ProjectSettings JSON)
    CREATE TABLE projects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        settings TEXT NOT NULL DEFAULT '{}',
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    -- Log entries (one row per take)
    -- Sound is stored as a from/to pair; camera slots, rec flags and custom values as JSON.
    CREATE TABLE log_entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        project_id INTEGER NOT NULL REFERENCES projects(id),
        scene TEXT NOT NULL DEFAULT '',
        shot TEXT NOT NULL DEFAULT '',
        take TEXT NOT NULL DEFAULT '',
        classification TEXT NOT NULL DEFAULT 'normal'
            CHECK (classification IN ('normal', 'waste', 'insert', 'ambience', 'sfx')),
        sound_from TEXT,
        sound_to TEXT,
        camera_files TEXT NOT NULL DEFAULT '[]',
        rec_active TEXT NOT NULL DEFAULT '[]',
        mos INTEGER NOT NULL DEFAULT 0,
        episode TEXT,
        description TEXT,
        notes TEXT,
        card_numbers TEXT,
        custom_values TEXT NOT NULL DEFAULT '{}',
        created_at TEXT NOT NULL,
        updated_at TEXT
    );

    CREATE INDEX idx_log_entries_project ON log_entries(project_id);
    CREATE INDEX idx_log_entries_scene_shot ON log_entries(project_id, scene, shot);
    CREATE INDEX idx_log_entries_created ON log_entries(project_id, created_at);
    "#,

    // Migration 2: App settings KV
    r#"
    CREATE TABLE IF NOT EXISTS app_settings (
        key TEXT PRIMARY KEY NOT NULL,
        value TEXT NOT NULL
    );
    "#,
];

/// Get current schema version from database
fn get_schema_version(conn: &Connection) -> Result<u32> {
    let version: u32 = conn.query_row(
        "PRAGMA user_version",
        [],
        |row| row.get(0)
    )?;
    Ok(version)
}

/// Run all pending migrations (crash-safe)
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    let target_version = MIGRATIONS.len() as u32;

    // Refuse to open a DB created by a newer build
    if current_version > target_version {
        anyhow::bail!(
            "Database schema version {} is newer than this build supports (max {}). Please upgrade Slate Log.",
            current_version,
            target_version
        );
    }

    if current_version == target_version {
        return Ok(());
    }

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let migration_version = (i + 1) as u32;
        if migration_version <= current_version {
            continue;
        }

        conn.execute_batch(migration)?;
        conn.execute_batch(&format!("PRAGMA user_version = {}", migration_version))?;

        log::info!("Applied migration {}", migration_version);
    }

    Ok(())
}
