//! Repository layer for database operations
//!
//! CRUD operations for all four entities. Required-field validation is
//! raised before any storage access, and referential checks run in the
//! application layer before every structural mutation because the store
//! only declares foreign keys.

use super::models::*;
use crate::config;
use crate::error::{AppError, Result};
use chrono::Utc;
use sqlx::SqlitePool;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

/// Reject empty or oversized required text fields.
fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    if value.len() > config::MAX_TITLE_LENGTH {
        return Err(AppError::Validation(format!(
            "{field} exceeds {} characters",
            config::MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

fn today() -> String {
    Utc::now().format(config::DATE_FORMAT).to_string()
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ===== Song =====

    /// Create a new song. Title and artist are required.
    pub async fn create_song(&self, req: NewSong) -> Result<Song> {
        require("title", &req.title)?;
        require("artist", &req.artist)?;

        let song = sqlx::query_as::<_, Song>(
            r#"
            INSERT INTO Song (title, artist, key, lyrics, category, type)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&req.title)
        .bind(&req.artist)
        .bind(&req.key)
        .bind(&req.lyrics)
        .bind(&req.category)
        .bind(&req.kind)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created song: {}", song.song_id);
        Ok(song)
    }

    /// Get a song by ID
    pub async fn get_song(&self, song_id: i64) -> Result<Song> {
        sqlx::query_as::<_, Song>("SELECT * FROM Song WHERE song_id = ?")
            .bind(song_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::SongNotFound(song_id))
    }

    /// List all songs in ascending title order
    pub async fn list_songs(&self) -> Result<Vec<Song>> {
        let songs = sqlx::query_as::<_, Song>("SELECT * FROM Song ORDER BY title ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(songs)
    }

    /// Update a song with full-row-replace semantics: every field of `req`
    /// is written, so unsupplied optionals become empty.
    pub async fn update_song(&self, song_id: i64, req: NewSong) -> Result<Song> {
        require("title", &req.title)?;
        require("artist", &req.artist)?;

        let rows = sqlx::query(
            r#"
            UPDATE Song
            SET title = ?, artist = ?, key = ?, lyrics = ?, category = ?, type = ?
            WHERE song_id = ?
            "#,
        )
        .bind(&req.title)
        .bind(&req.artist)
        .bind(&req.key)
        .bind(&req.lyrics)
        .bind(&req.category)
        .bind(&req.kind)
        .bind(song_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::SongNotFound(song_id));
        }

        self.get_song(song_id).await
    }

    /// Clear `song_id` on every part referencing the song. Must run before
    /// the song row itself is deleted; see the cascade orchestrator.
    pub async fn unlink_song_from_parts(&self, song_id: i64) -> Result<u64> {
        let rows = sqlx::query("UPDATE ProgramPart SET song_id = NULL WHERE song_id = ?")
            .bind(song_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("Unlinked song {} from {} parts", song_id, rows);
        Ok(rows)
    }

    /// Raw song row delete. Callers should go through
    /// `CascadeService::delete_song`, which unlinks referencing parts first.
    pub async fn delete_song_row(&self, song_id: i64) -> Result<()> {
        let rows = sqlx::query("DELETE FROM Song WHERE song_id = ?")
            .bind(song_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::SongNotFound(song_id));
        }

        tracing::debug!("Deleted song: {}", song_id);
        Ok(())
    }

    // ===== Setlist =====

    /// Create a setlist. `date_created` is set to the current date and is
    /// never modified by any later update.
    pub async fn create_setlist(&self, name: &str, description: &str) -> Result<Setlist> {
        require("name", name)?;

        let setlist = sqlx::query_as::<_, Setlist>(
            r#"
            INSERT INTO Setlist (name, date_created, description)
            VALUES (?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(today())
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created setlist: {}", setlist.setlist_id);
        Ok(setlist)
    }

    /// Get a setlist by ID
    pub async fn get_setlist(&self, setlist_id: i64) -> Result<Setlist> {
        sqlx::query_as::<_, Setlist>("SELECT * FROM Setlist WHERE setlist_id = ?")
            .bind(setlist_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::SetlistNotFound(setlist_id))
    }

    /// List all setlists in storage-native order
    pub async fn list_setlists(&self) -> Result<Vec<Setlist>> {
        let setlists = sqlx::query_as::<_, Setlist>("SELECT * FROM Setlist")
            .fetch_all(&self.pool)
            .await?;

        Ok(setlists)
    }

    /// Update a setlist's name and description; `date_created` is untouched.
    pub async fn update_setlist(
        &self,
        setlist_id: i64,
        name: &str,
        description: &str,
    ) -> Result<Setlist> {
        require("name", name)?;

        let rows = sqlx::query("UPDATE Setlist SET name = ?, description = ? WHERE setlist_id = ?")
            .bind(name)
            .bind(description)
            .bind(setlist_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::SetlistNotFound(setlist_id));
        }

        self.get_setlist(setlist_id).await
    }

    /// Raw setlist row delete. Callers should go through
    /// `CascadeService::delete_setlist`, which removes children first.
    pub async fn delete_setlist_row(&self, setlist_id: i64) -> Result<()> {
        let rows = sqlx::query("DELETE FROM Setlist WHERE setlist_id = ?")
            .bind(setlist_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::SetlistNotFound(setlist_id));
        }

        tracing::debug!("Deleted setlist: {}", setlist_id);
        Ok(())
    }

    // ===== ProgramPart =====

    /// Create a program part under an existing setlist. Starts unlinked.
    pub async fn create_program_part(&self, setlist_id: i64, title: &str) -> Result<ProgramPart> {
        require("title", title)?;

        if !self.setlist_exists(setlist_id).await? {
            return Err(AppError::SetlistNotFound(setlist_id));
        }

        let part = sqlx::query_as::<_, ProgramPart>(
            r#"
            INSERT INTO ProgramPart (setlist_id, title)
            VALUES (?, ?)
            RETURNING *
            "#,
        )
        .bind(setlist_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created part {} in setlist {}", part.part_id, setlist_id);
        Ok(part)
    }

    /// List all program parts in storage-native order
    pub async fn list_program_parts(&self) -> Result<Vec<ProgramPart>> {
        let parts = sqlx::query_as::<_, ProgramPart>("SELECT * FROM ProgramPart")
            .fetch_all(&self.pool)
            .await?;

        Ok(parts)
    }

    /// Delete a single program part. Does not cascade to voice memos; a
    /// memo pointing at the deleted part is left orphaned in place.
    pub async fn delete_program_part(&self, part_id: i64) -> Result<()> {
        let rows = sqlx::query("DELETE FROM ProgramPart WHERE part_id = ?")
            .bind(part_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::PartNotFound(part_id));
        }

        tracing::debug!("Deleted part: {}", part_id);
        Ok(())
    }

    /// Set or clear the song linked to a part. `None` explicitly unlinks.
    pub async fn link_song_to_part(&self, part_id: i64, song_id: Option<i64>) -> Result<()> {
        if let Some(song_id) = song_id {
            if !self.song_exists(song_id).await? {
                return Err(AppError::SongNotFound(song_id));
            }
        }

        let rows = sqlx::query("UPDATE ProgramPart SET song_id = ? WHERE part_id = ?")
            .bind(song_id)
            .bind(part_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::PartNotFound(part_id));
        }

        tracing::debug!("Linked part {} to song {:?}", part_id, song_id);
        Ok(())
    }

    /// Delete every part of a setlist, returning the number removed
    pub async fn delete_parts_for_setlist(&self, setlist_id: i64) -> Result<u64> {
        let rows = sqlx::query("DELETE FROM ProgramPart WHERE setlist_id = ?")
            .bind(setlist_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("Deleted {} parts of setlist {}", rows, setlist_id);
        Ok(rows)
    }

    // ===== VoiceMemo =====

    /// Insert a voice memo row for a finished recording
    pub async fn create_voice_memo(
        &self,
        setlist_id: i64,
        part_id: Option<i64>,
        file_path: &str,
        date_recorded: &str,
        duration: Option<i64>,
    ) -> Result<VoiceMemo> {
        if !self.setlist_exists(setlist_id).await? {
            return Err(AppError::SetlistNotFound(setlist_id));
        }
        if let Some(part_id) = part_id {
            if !self.part_exists(part_id).await? {
                return Err(AppError::PartNotFound(part_id));
            }
        }

        let memo = sqlx::query_as::<_, VoiceMemo>(
            r#"
            INSERT INTO VoiceMemo (setlist_id, part_id, file_path, date_recorded, duration)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(setlist_id)
        .bind(part_id)
        .bind(file_path)
        .bind(date_recorded)
        .bind(duration)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created memo {} in setlist {}", memo.memo_id, setlist_id);
        Ok(memo)
    }

    /// List all voice memos in storage-native order
    pub async fn list_voice_memos(&self) -> Result<Vec<VoiceMemo>> {
        let memos = sqlx::query_as::<_, VoiceMemo>("SELECT * FROM VoiceMemo")
            .fetch_all(&self.pool)
            .await?;

        Ok(memos)
    }

    /// List the memos of one setlist
    pub async fn memos_for_setlist(&self, setlist_id: i64) -> Result<Vec<VoiceMemo>> {
        let memos = sqlx::query_as::<_, VoiceMemo>("SELECT * FROM VoiceMemo WHERE setlist_id = ?")
            .bind(setlist_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(memos)
    }

    /// Delete a memo row. A row that is already gone is not an error; the
    /// lifecycle manager's delete path is deliberately best-effort.
    pub async fn delete_voice_memo_row(&self, memo_id: i64) -> Result<()> {
        let rows = sqlx::query("DELETE FROM VoiceMemo WHERE memo_id = ?")
            .bind(memo_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("Deleted memo {} ({} rows)", memo_id, rows);
        Ok(())
    }

    /// Delete every memo row of a setlist, returning the number removed
    pub async fn delete_memos_for_setlist(&self, setlist_id: i64) -> Result<u64> {
        let rows = sqlx::query("DELETE FROM VoiceMemo WHERE setlist_id = ?")
            .bind(setlist_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("Deleted {} memos of setlist {}", rows, setlist_id);
        Ok(rows)
    }

    // ===== Referential checks =====

    pub(crate) async fn setlist_exists(&self, setlist_id: i64) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM Setlist WHERE setlist_id = ?)")
                .bind(setlist_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    pub(crate) async fn song_exists(&self, song_id: i64) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM Song WHERE song_id = ?)")
                .bind(song_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    pub(crate) async fn part_exists(&self, part_id: i64) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM ProgramPart WHERE part_id = ?)")
                .bind(part_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}
