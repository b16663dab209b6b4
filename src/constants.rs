// Slate Log Constants
// Numbering values are part of the on-set contract with editorial. Do not change casually.

// File numbering
pub const FILE_NUMBER_WIDTH: usize = 4;
pub const FIRST_FILE_NUMBER: u32 = 1;
pub const FIRST_TAKE_NUMBER: u32 = 1;
pub const DEFAULT_SCENE: &str = "1";
pub const DEFAULT_SHOT: &str = "1";

// Typed marker for a wasted/blank slot
pub const WASTE_MARKER: &str = "WASTE";

// Project defaults
pub const DEFAULT_CAMERA_CHANNELS: usize = 1;
pub const MAX_CAMERA_CHANNELS: usize = 16;

// Paths
pub const SLATELOG_FOLDER: &str = ".slatelog";
pub const DB_FILENAME: &str = "slatelog.db";

// App settings keys
pub const SETTING_LOG_LEVEL: &str = "log_level";
pub const SETTING_ACTIVE_PROJECT: &str = "active_project";
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Licensing
pub const TRIAL_ENTRY_LIMIT: i64 = 50;
