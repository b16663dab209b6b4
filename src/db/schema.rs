// Database schema types and query helpers

use std::collections::BTreeMap;
use rusqlite::{Connection, params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::continuity::shift::EntryUpdate;
use crate::continuity::{take_number, Classification, FieldId, Slot};
use crate::error::{Result, SlateLogError};
use crate::settings::ProjectSettings;

/// Current UTC time with millisecond precision (entries created in the same second still order)
pub fn now_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

// ----- Project -----

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub settings: ProjectSettings,
    pub created_at: String,
}

pub fn insert_project(conn: &Connection, name: &str, settings: &ProjectSettings) -> Result<i64> {
    conn.execute(
        "INSERT INTO projects (name, settings) VALUES (?1, ?2)",
        params![name, settings.to_json()?],
    )?;
    Ok(conn.last_insert_rowid())
}

fn map_project_row(row: &Row) -> rusqlite::Result<(i64, String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn project_from_parts(parts: (i64, String, String, String)) -> Result<Project> {
    let (id, name, settings, created_at) = parts;
    Ok(Project {
        id,
        name,
        settings: ProjectSettings::from_json(&settings)?,
        created_at,
    })
}

pub fn get_project(conn: &Connection, id: i64) -> Result<Option<Project>> {
    let result = conn.query_row(
        "SELECT id, name, settings, created_at FROM projects WHERE id = ?1",
        params![id],
        map_project_row,
    ).optional()?;
    result.map(project_from_parts).transpose()
}

pub fn get_project_by_name(conn: &Connection, name: &str) -> Result<Option<Project>> {
    let result = conn.query_row(
        "SELECT id, name, settings, created_at FROM projects WHERE name = ?1",
        params![name],
        map_project_row,
    ).optional()?;
    result.map(project_from_parts).transpose()
}

pub fn list_projects(conn: &Connection) -> Result<Vec<Project>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, settings, created_at FROM projects ORDER BY id"
    )?;
    let rows = stmt
        .query_map([], map_project_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter().map(project_from_parts).collect()
}

pub fn update_project_settings(conn: &Connection, id: i64, settings: &ProjectSettings) -> Result<()> {
    let changed = conn.execute(
        "UPDATE projects SET settings = ?1 WHERE id = ?2",
        params![settings.to_json()?, id],
    )?;
    if changed == 0 {
        return Err(SlateLogError::ProjectNotFound(id));
    }
    Ok(())
}

// ----- Log Entry -----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: i64,
    pub project_id: i64,
    pub scene: String,
    pub shot: String,
    pub take: String,
    pub classification: Classification,
    pub sound_file: Slot,
    pub camera_files: Vec<Slot>,
    pub rec_active: Vec<bool>,
    pub mos: bool,
    pub episode: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub card_numbers: Option<String>,
    pub custom_values: BTreeMap<String, String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl LogEntry {
    pub fn take_number(&self) -> u32 {
        take_number(&self.take)
    }

    pub fn is_normal(&self) -> bool {
        self.classification == Classification::Normal
    }

    /// Raw slot for a file field. Identity fields have no slot.
    pub fn slot(&self, field: FieldId) -> Slot {
        match field {
            FieldId::Sound => self.sound_file,
            FieldId::Camera(i) => self.camera_files.get(i).copied().unwrap_or_default(),
            _ => Slot::Blank,
        }
    }

    /// Channels missing from the flag list are active
    pub fn is_channel_active(&self, channel: usize) -> bool {
        self.rec_active.get(channel).copied().unwrap_or(true)
    }

    /// Slot as it takes part in numbering: inactive camera channels count as blank
    pub fn participating_slot(&self, field: FieldId) -> Slot {
        match field {
            FieldId::Camera(i) if !self.is_channel_active(i) => Slot::Blank,
            _ => self.slot(field),
        }
    }

    pub fn same_scene_shot(&self, scene: &str, shot: &str) -> bool {
        self.scene.trim() == scene.trim() && self.shot.trim() == shot.trim()
    }

    /// Human-readable location, e.g. "Scene 1 / Shot 1 / Take 2"
    pub fn location(&self) -> String {
        if self.classification.is_sound_only() {
            return format!("{} entry #{}", self.classification, self.id);
        }
        format!("Scene {} / Shot {} / Take {}", self.scene, self.shot, self.take)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewLogEntry {
    pub project_id: i64,
    pub scene: String,
    pub shot: String,
    pub take: String,
    pub classification: Classification,
    pub sound_file: Slot,
    pub camera_files: Vec<Slot>,
    pub rec_active: Vec<bool>,
    pub mos: bool,
    pub episode: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub card_numbers: Option<String>,
    pub custom_values: BTreeMap<String, String>,
}

const ENTRY_COLUMNS: &str = "id, project_id, scene, shot, take, classification, sound_from, sound_to,
    camera_files, rec_active, mos, episode, description, notes, card_numbers, custom_values,
    created_at, updated_at";

/// Raw row before JSON columns are decoded
struct EntryRow {
    id: i64,
    project_id: i64,
    scene: String,
    shot: String,
    take: String,
    classification: String,
    sound_from: Option<String>,
    sound_to: Option<String>,
    camera_files: String,
    rec_active: String,
    mos: bool,
    episode: Option<String>,
    description: Option<String>,
    notes: Option<String>,
    card_numbers: Option<String>,
    custom_values: String,
    created_at: String,
    updated_at: Option<String>,
}

fn map_entry_row(row: &Row) -> rusqlite::Result<EntryRow> {
    Ok(EntryRow {
        id: row.get(0)?,
        project_id: row.get(1)?,
        scene: row.get(2)?,
        shot: row.get(3)?,
        take: row.get(4)?,
        classification: row.get(5)?,
        sound_from: row.get(6)?,
        sound_to: row.get(7)?,
        camera_files: row.get(8)?,
        rec_active: row.get(9)?,
        mos: row.get(10)?,
        episode: row.get(11)?,
        description: row.get(12)?,
        notes: row.get(13)?,
        card_numbers: row.get(14)?,
        custom_values: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

impl EntryRow {
    fn into_entry(self) -> Result<LogEntry> {
        let sound_file = match self.sound_from {
            Some(from) => Slot::from_stored(Some(&crate::continuity::StoredSlot {
                from,
                to: self.sound_to,
            })),
            None => Slot::Blank,
        };

        Ok(LogEntry {
            id: self.id,
            project_id: self.project_id,
            scene: self.scene,
            shot: self.shot,
            take: self.take,
            classification: self.classification.parse()?,
            sound_file,
            camera_files: serde_json::from_str(&self.camera_files)?,
            rec_active: serde_json::from_str(&self.rec_active)?,
            mos: self.mos,
            episode: self.episode,
            description: self.description,
            notes: self.notes,
            card_numbers: self.card_numbers,
            custom_values: serde_json::from_str(&self.custom_values)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn sound_columns(slot: &Slot) -> (Option<String>, Option<String>) {
    match slot.to_stored() {
        Some(stored) => (Some(stored.from), stored.to),
        None => (None, None),
    }
}

pub fn insert_entry(conn: &Connection, entry: &NewLogEntry) -> Result<i64> {
    let (sound_from, sound_to) = sound_columns(&entry.sound_file);
    conn.execute(
        "INSERT INTO log_entries (project_id, scene, shot, take, classification, sound_from, sound_to,
                                  camera_files, rec_active, mos, episode, description, notes,
                                  card_numbers, custom_values, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            entry.project_id,
            entry.scene,
            entry.shot,
            entry.take,
            entry.classification.as_str(),
            sound_from,
            sound_to,
            serde_json::to_string(&entry.camera_files)?,
            serde_json::to_string(&entry.rec_active)?,
            entry.mos,
            entry.episode,
            entry.description,
            entry.notes,
            entry.card_numbers,
            serde_json::to_string(&entry.custom_values)?,
            now_timestamp(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_entry(conn: &Connection, id: i64) -> Result<Option<LogEntry>> {
    let result = conn.query_row(
        &format!("SELECT {} FROM log_entries WHERE id = ?1", ENTRY_COLUMNS),
        params![id],
        map_entry_row,
    ).optional()?;
    result.map(EntryRow::into_entry).transpose()
}

/// All entries of a project in creation order (oldest first)
pub fn list_entries(conn: &Connection, project_id: i64) -> Result<Vec<LogEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM log_entries WHERE project_id = ?1 ORDER BY created_at, id",
        ENTRY_COLUMNS
    ))?;
    let rows = stmt
        .query_map(params![project_id], map_entry_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter().map(EntryRow::into_entry).collect()
}

pub fn count_entries(conn: &Connection, project_id: i64) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM log_entries WHERE project_id = ?1",
        params![project_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Apply a batch of renumbering updates. Callers wrap this in a transaction.
pub fn apply_entry_updates(conn: &Connection, updates: &[EntryUpdate]) -> Result<()> {
    let now = now_timestamp();

    for update in updates {
        let mut entry = get_entry(conn, update.entry_id)?
            .ok_or(SlateLogError::EntryNotFound(update.entry_id))?;

        for (field, slot) in &update.fields {
            match *field {
                FieldId::Sound => entry.sound_file = *slot,
                FieldId::Camera(i) => {
                    if entry.camera_files.len() <= i {
                        entry.camera_files.resize(i + 1, Slot::Blank);
                    }
                    entry.camera_files[i] = *slot;
                }
                other => {
                    return Err(SlateLogError::InvalidInput(format!(
                        "{} is not a file field",
                        other
                    )))
                }
            }
        }

        let (sound_from, sound_to) = sound_columns(&entry.sound_file);
        conn.execute(
            "UPDATE log_entries
             SET take = COALESCE(?1, take), sound_from = ?2, sound_to = ?3, camera_files = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                update.take,
                sound_from,
                sound_to,
                serde_json::to_string(&entry.camera_files)?,
                now,
                update.entry_id,
            ],
        )?;
    }

    Ok(())
}

/// Add `increment` to every numeric take >= `from_take_inclusive` in a scene/shot.
/// Returns the number of entries renumbered.
pub fn shift_take_numbers(
    conn: &Connection,
    project_id: i64,
    scene: &str,
    shot: &str,
    from_take_inclusive: u32,
    increment: i64,
) -> Result<usize> {
    let now = now_timestamp();
    let entries = list_entries(conn, project_id)?;
    let mut shifted = 0;

    for entry in entries.iter().filter(|e| e.same_scene_shot(scene, shot)) {
        let Ok(take) = entry.take.trim().parse::<u32>() else {
            continue;
        };
        if take < from_take_inclusive {
            continue;
        }

        let new_take = (take as i64 + increment).max(0);
        conn.execute(
            "UPDATE log_entries SET take = ?1, updated_at = ?2 WHERE id = ?3",
            params![new_take.to_string(), now, entry.id],
        )?;
        shifted += 1;
    }

    Ok(shifted)
}

// ----- App Settings -----

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let result = conn.query_row(
        "SELECT value FROM app_settings WHERE key = ?1",
        params![key],
        |row| row.get(0),
    ).optional()?;
    Ok(result)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO app_settings (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}
