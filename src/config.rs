//! Application configuration constants
//!
//! Central location for file names, formats and validation boundaries
//! used throughout the core.

/// Name of the SQLite database file inside the data directory
pub const DB_FILE_NAME: &str = "worship_flow.db";

/// Subdirectory of the data directory that holds recorded voice memos
pub const RECORDINGS_DIR_NAME: &str = "voice_memos";

/// Name of the append-only activity log file
pub const ACTIVITY_LOG_FILE_NAME: &str = "activity_log.txt";

/// Prefix for recorded memo files; the rest of the name is the capture
/// timestamp in epoch milliseconds
pub const MEMO_FILE_PREFIX: &str = "memo_";

/// Extension of recorded memo files
pub const MEMO_FILE_EXT: &str = "m4a";

/// Prefix for exported database copies
pub const DB_EXPORT_PREFIX: &str = "WorshipFlow_Backup_";

/// Date format stored in `date_created` / `date_recorded` columns
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Maximum length accepted for titles and names.
/// Longer values are rejected at validation, before any storage access.
pub const MAX_TITLE_LENGTH: usize = 200;
