// Slate Log Error Types

use thiserror::Error;

use crate::continuity::duplicate::BlockReason;
use crate::continuity::FieldId;

#[derive(Error, Debug)]
pub enum SlateLogError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Project not found: {0}")]
    ProjectNotFound(i64),

    #[error("Entry not found: {0}")]
    EntryNotFound(i64),

    #[error("Missing mandatory fields: {}", format_fields(.0))]
    Validation(Vec<FieldId>),

    #[error("Take {take} already exists in scene {scene} / shot {shot}; next free take is {suggested}")]
    TakeNumberConflict {
        scene: String,
        shot: String,
        take: String,
        suggested: u32,
    },

    #[error("File numbers conflict ({reason}) with {location}")]
    FileRangeConflict {
        reason: BlockReason,
        location: String,
    },

    #[error("This project cannot accept more entries on the current license")]
    QuotaExceeded,

    #[error("MOS cannot be set on {0} takes")]
    MosBlocked(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("License error: {0}")]
    License(String),

    #[error("{0}")]
    Other(String),
}

fn format_fields(fields: &[FieldId]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<anyhow::Error> for SlateLogError {
    fn from(err: anyhow::Error) -> Self {
        SlateLogError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SlateLogError>;
