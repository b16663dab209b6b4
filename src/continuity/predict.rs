// Auto-fill prediction for a freshly opened entry

use serde::Serialize;

use crate::constants::{DEFAULT_SCENE, DEFAULT_SHOT, FIRST_FILE_NUMBER, FIRST_TAKE_NUMBER};
use crate::db::schema::LogEntry;
use crate::settings::ProjectSettings;
use super::{FieldId, Slot};

/// Proposed values for the next entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub scene: String,
    pub shot: String,
    pub take: String,
    pub episode: Option<String>,
    pub sound_file: Slot,
    pub camera_files: Vec<Slot>,
    pub rec_active: Vec<bool>,
}

fn newest<'a>(entries: impl Iterator<Item = &'a LogEntry>) -> Option<&'a LogEntry> {
    entries.max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
}

/// Most recently created entry
pub fn most_recent(entries: &[LogEntry]) -> Option<&LogEntry> {
    newest(entries.iter())
}

/// Most recent Normal entry, falling back to the most recent entry that has a scene
pub fn last_valid(entries: &[LogEntry]) -> Option<&LogEntry> {
    newest(entries.iter().filter(|e| e.is_normal()))
        .or_else(|| newest(entries.iter().filter(|e| !e.scene.trim().is_empty())))
}

pub fn highest_take(entries: &[LogEntry], scene: &str, shot: &str) -> Option<u32> {
    entries
        .iter()
        .filter(|e| e.same_scene_shot(scene, shot))
        .map(LogEntry::take_number)
        .max()
}

/// Project-wide highest upper bound for a file field
pub fn highest_file_number(entries: &[LogEntry], field: FieldId) -> Option<u32> {
    entries
        .iter()
        .filter_map(|e| e.participating_slot(field).upper())
        .max()
}

pub fn next_file_number(entries: &[LogEntry], field: FieldId) -> u32 {
    highest_file_number(entries, field)
        .map(|n| n.saturating_add(1))
        .unwrap_or(FIRST_FILE_NUMBER)
}

/// Last value recorded on a channel, newest first
pub fn last_recorded(entries: &[LogEntry], field: FieldId) -> Slot {
    let mut ordered: Vec<&LogEntry> = entries.iter().collect();
    ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    ordered
        .into_iter()
        .map(|e| e.slot(field))
        .find(|s| !s.is_blank())
        .unwrap_or_default()
}

pub fn predict_next(settings: &ProjectSettings, entries: &[LogEntry]) -> Prediction {
    let channels = settings.channels();

    let rec_active: Vec<bool> = match most_recent(entries) {
        Some(last) => (0..channels).map(|i| last.is_channel_active(i)).collect(),
        None => vec![true; channels],
    };

    let (scene, shot, episode) = match last_valid(entries) {
        Some(valid) => (valid.scene.clone(), valid.shot.clone(), valid.episode.clone()),
        None => (DEFAULT_SCENE.to_string(), DEFAULT_SHOT.to_string(), None),
    };

    let take = highest_take(entries, &scene, &shot)
        .map(|t| t.saturating_add(1))
        .unwrap_or(FIRST_TAKE_NUMBER);

    let sound_file = if settings.sound_enabled() {
        Slot::Single(next_file_number(entries, FieldId::Sound))
    } else {
        Slot::Blank
    };

    let camera_files = (0..channels)
        .map(|i| {
            let field = FieldId::Camera(i);
            if rec_active[i] {
                Slot::Single(next_file_number(entries, field))
            } else {
                last_recorded(entries, field)
            }
        })
        .collect();

    Prediction {
        scene,
        shot,
        take: take.to_string(),
        episode,
        sound_file,
        camera_files,
        rec_active,
    }
}
