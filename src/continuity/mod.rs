// Continuity Engine
// Numbering prediction, conflict detection and insert-before renumbering for log entries

pub mod slot;
pub mod delta;
pub mod duplicate;
pub mod shift;
pub mod classification;
pub mod predict;
pub mod assembly;

#[cfg(test)]
mod tests;

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::SlateLogError;

pub use slot::{Slot, StoredSlot, parse_slot, format_padded, is_blank};
pub use duplicate::{Candidate, Detection};
pub use shift::{Carry, EntryUpdate, ShiftPlan};
pub use classification::{ClassificationChoice, EntryForm, WasteSelection};
pub use predict::Prediction;
pub use assembly::{CommitOptions, CommitOutcome};

/// A field on a log entry that the engine reasons about.
/// Camera channels are zero-based internally and displayed one-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldId {
    Scene,
    Shot,
    Take,
    Sound,
    Camera(usize),
}

impl FieldId {
    pub fn is_file_field(&self) -> bool {
        matches!(self, FieldId::Sound | FieldId::Camera(_))
    }

    /// Sound followed by every camera channel of the project
    pub fn file_fields(camera_channel_count: usize) -> Vec<FieldId> {
        std::iter::once(FieldId::Sound)
            .chain((0..camera_channel_count).map(FieldId::Camera))
            .collect()
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldId::Scene => write!(f, "Scene"),
            FieldId::Shot => write!(f, "Shot"),
            FieldId::Take => write!(f, "Take"),
            FieldId::Sound => write!(f, "Sound"),
            FieldId::Camera(i) => write!(f, "Camera {}", i + 1),
        }
    }
}

/// Mutually exclusive take classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    #[default]
    Normal,
    Waste,
    Insert,
    Ambience,
    Sfx,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Normal => "normal",
            Classification::Waste => "waste",
            Classification::Insert => "insert",
            Classification::Ambience => "ambience",
            Classification::Sfx => "sfx",
        }
    }

    /// Ambience and SFX takes are sound-only recordings without scene/shot/take identity
    pub fn is_sound_only(&self) -> bool {
        matches!(self, Classification::Ambience | Classification::Sfx)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = SlateLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "normal" => Ok(Classification::Normal),
            "waste" => Ok(Classification::Waste),
            "insert" => Ok(Classification::Insert),
            "ambience" => Ok(Classification::Ambience),
            "sfx" => Ok(Classification::Sfx),
            other => Err(SlateLogError::InvalidInput(format!("Unknown classification: {}", other))),
        }
    }
}

/// Coerce a take (or any numeric identifier) to a number. Non-numeric input is 0.
pub fn take_number(raw: &str) -> u32 {
    slot::parse_number(raw)
}
