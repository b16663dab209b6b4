// Slate Log - Settings
// Project settings live as JSON on the project row. App settings live in the app_settings KV table.

use std::collections::BTreeSet;
use std::str::FromStr;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CAMERA_CHANNELS, DEFAULT_LOG_LEVEL, MAX_CAMERA_CHANNELS, SETTING_ACTIVE_PROJECT,
    SETTING_LOG_LEVEL,
};
use crate::continuity::FieldId;
use crate::db::schema;
use crate::error::{Result, SlateLogError};

/// Optional per-project fields that can be switched on or off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OptionalField {
    Episode,
    SoundFile,
    Description,
    Notes,
    CardNumbers,
}

impl FromStr for OptionalField {
    type Err = SlateLogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "episode" => Ok(OptionalField::Episode),
            "sound" | "soundfile" => Ok(OptionalField::SoundFile),
            "description" => Ok(OptionalField::Description),
            "notes" => Ok(OptionalField::Notes),
            "cardnumbers" | "cards" => Ok(OptionalField::CardNumbers),
            other => Err(SlateLogError::InvalidInput(format!("Unknown field: {}", other))),
        }
    }
}

/// User-defined free-text field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub key: String,
    pub label: String,
}

/// Per-project configuration consumed read-only by the continuity engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    pub camera_channel_count: usize,
    pub enabled_fields: BTreeSet<OptionalField>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            camera_channel_count: DEFAULT_CAMERA_CHANNELS,
            enabled_fields: [
                OptionalField::SoundFile,
                OptionalField::Description,
                OptionalField::Notes,
            ]
            .into_iter()
            .collect(),
            custom_fields: Vec::new(),
        }
    }
}

impl ProjectSettings {
    pub fn with_cameras(camera_channel_count: usize) -> Self {
        Self {
            camera_channel_count,
            ..Self::default()
        }
    }

    /// Camera channel count clamped to the supported range
    pub fn channels(&self) -> usize {
        self.camera_channel_count.clamp(1, MAX_CAMERA_CHANNELS)
    }

    pub fn is_enabled(&self, field: OptionalField) -> bool {
        self.enabled_fields.contains(&field)
    }

    pub fn sound_enabled(&self) -> bool {
        self.is_enabled(OptionalField::SoundFile)
    }

    /// File fields this project records, sound first when enabled
    pub fn file_fields(&self) -> Vec<FieldId> {
        FieldId::file_fields(self.channels())
            .into_iter()
            .filter(|f| *f != FieldId::Sound || self.sound_enabled())
            .collect()
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() || raw.trim() == "{}" {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// App-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub log_level: String,
    pub active_project: Option<i64>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            active_project: None,
        }
    }
}

/// Load app settings, falling back to defaults for keys never written
pub fn load_app_settings(conn: &Connection) -> Result<AppSettings> {
    let log_level = schema::get_setting(conn, SETTING_LOG_LEVEL)?
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    let active_project = schema::get_setting(conn, SETTING_ACTIVE_PROJECT)?
        .and_then(|v| v.parse::<i64>().ok());

    Ok(AppSettings {
        log_level,
        active_project,
    })
}

pub fn parse_log_level(level: &str) -> Result<log::LevelFilter> {
    match level.to_lowercase().as_str() {
        "debug" => Ok(log::LevelFilter::Debug),
        "info" => Ok(log::LevelFilter::Info),
        "warn" => Ok(log::LevelFilter::Warn),
        "error" => Ok(log::LevelFilter::Error),
        _ => Err(SlateLogError::InvalidInput(format!(
            "Invalid log level: {}. Use debug, info, warn, or error.",
            level
        ))),
    }
}

/// Validate, apply and persist a log level
pub fn set_log_level(conn: &Connection, level: &str) -> Result<()> {
    let filter = parse_log_level(level)?;

    log::set_max_level(filter);
    log::info!("Log level changed to: {}", level);

    schema::set_setting(conn, SETTING_LOG_LEVEL, &level.to_lowercase())
}

pub fn set_active_project(conn: &Connection, project_id: i64) -> Result<()> {
    schema::set_setting(conn, SETTING_ACTIVE_PROJECT, &project_id.to_string())
}
