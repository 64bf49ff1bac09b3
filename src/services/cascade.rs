//! Cascade delete orchestrator
//!
//! Multi-step deletion protocols for songs and setlists. There is no
//! ambient transaction: each cascade is a fixed ordered sequence of
//! single-statement repository calls, and a storage failure aborts the
//! remaining steps with the data model left consistent for a full retry.

use crate::database::Repository;
use crate::error::Result;
use crate::services::ActivityLog;
use crate::storage::RecordingStore;
use std::path::Path;

/// Orchestrates the song and setlist deletion cascades
#[derive(Clone)]
pub struct CascadeService {
    repo: Repository,
    store: RecordingStore,
    activity: ActivityLog,
}

impl CascadeService {
    pub fn new(repo: Repository, store: RecordingStore, activity: ActivityLog) -> Self {
        Self {
            repo,
            store,
            activity,
        }
    }

    /// Delete a song: unlink every referencing part, then delete the row.
    ///
    /// The order is mandatory. If the unlink fails the song row is not
    /// touched; if the row delete fails the song survives already
    /// unlinked, which is a safe state to retry from.
    pub async fn delete_song(&self, song_id: i64) -> Result<()> {
        tracing::info!("Deleting song {}", song_id);

        self.repo.unlink_song_from_parts(song_id).await?;
        self.repo.delete_song_row(song_id).await?;

        self.activity.record("DELETE", "Song", Some(song_id));
        Ok(())
    }

    /// Delete a setlist and everything structurally dependent on it.
    ///
    /// Steps, in order: delete the setlist's parts; best-effort delete
    /// each memo's audio file (a missing file is tolerated and a failed
    /// delete is only logged, never aborts); delete the memo rows; delete
    /// the setlist row. File cleanup runs before row cleanup so a stuck
    /// file still lets the dangling reference be removed. Any storage
    /// failure aborts here and the caller re-invokes the whole cascade.
    pub async fn delete_setlist(&self, setlist_id: i64) -> Result<()> {
        tracing::info!("Deleting setlist {}", setlist_id);

        self.repo.delete_parts_for_setlist(setlist_id).await?;

        let memos = self.repo.memos_for_setlist(setlist_id).await?;
        for memo in &memos {
            if let Err(e) = self.store.remove(Path::new(&memo.file_path)).await {
                tracing::warn!("Could not delete file for memo {}: {}", memo.memo_id, e);
            }
        }

        self.repo.delete_memos_for_setlist(setlist_id).await?;
        self.repo.delete_setlist_row(setlist_id).await?;

        self.activity.record("DELETE", "Setlist", Some(setlist_id));
        Ok(())
    }
}
