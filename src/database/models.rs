//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde for serialization to the presentation layer.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A song in the library
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Song {
    pub song_id: i64,
    pub title: String,
    pub artist: String,
    pub key: String,
    pub lyrics: String,
    pub category: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
}

/// Fields for creating a song, also used for full-row updates.
/// Every field is written on update; unsupplied optionals stay empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub key: String,
    pub lyrics: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// An ordered worship-service program
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Setlist {
    pub setlist_id: i64,
    pub name: String,
    /// ISO date, set at creation and never modified afterwards
    pub date_created: String,
    pub description: String,
}

/// A named segment of a setlist, optionally linked to one song
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProgramPart {
    pub part_id: i64,
    pub setlist_id: i64,
    pub song_id: Option<i64>,
    pub title: String,
}

/// A recorded audio note attached to a setlist and optionally a part
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VoiceMemo {
    pub memo_id: i64,
    pub setlist_id: i64,
    pub part_id: Option<i64>,
    /// Path of the audio artifact in the recordings directory
    pub file_path: String,
    pub date_recorded: String,
    /// Capture length in milliseconds, when known
    pub duration: Option<i64>,
}
