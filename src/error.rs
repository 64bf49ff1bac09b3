//! Error types for the WorshipFlow core
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized to the presentation layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store not initialized")]
    NotInitialized,

    #[error("Audio capability unavailable: {0}")]
    Acquisition(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Filesystem error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Song not found: {0}")]
    SongNotFound(i64),

    #[error("Setlist not found: {0}")]
    SetlistNotFound(i64),

    #[error("Program part not found: {0}")]
    PartNotFound(i64),

    #[error("A recording session is already active")]
    RecordingActive,

    #[error("A voice memo already exists for this target")]
    MemoExists,
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
