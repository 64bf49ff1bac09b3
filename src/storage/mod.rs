//! Storage module
//!
//! Filesystem concerns: the recordings directory backing voice memos and
//! database file inspection/export.

pub mod db_file;
pub mod recordings;

pub use db_file::{db_file_info, export_copy, DbFileInfo};
pub use recordings::RecordingStore;
