// Slate Log - Library Entry Point

pub mod constants;
pub mod error;
pub mod db;
pub mod settings;
pub mod licensing;
pub mod continuity;

pub use error::{Result, SlateLogError};
