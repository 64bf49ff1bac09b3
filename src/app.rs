//! Application facade and startup wiring
//!
//! Opens the store, builds the services and exposes the operations the
//! presentation layer calls. Every mutating operation here ends with a
//! wholesale cache reload (or, for memo deletion, the optimistic
//! tombstone) so screens always derive from a consistent snapshot.

use crate::audio::{AudioInput, AudioOutput};
use crate::cache::ViewCache;
use crate::config;
use crate::database::{self, NewSong, ProgramPart, Repository, Setlist, Song, VoiceMemo};
use crate::error::Result;
use crate::services::{ActivityLog, CascadeService, MemoService};
use crate::storage::{self, DbFileInfo, RecordingStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Central application state holding all services
pub struct App {
    db_path: PathBuf,
    repo: Repository,
    pub memos: Arc<MemoService>,
    cascade: CascadeService,
    pub cache: ViewCache,
    pub activity: ActivityLog,
}

impl App {
    /// One-time startup: create the data directories, open and repair the
    /// database, wire the services and load the initial snapshot.
    ///
    /// A failure here is unrecoverable for the process; callers must not
    /// retry individual operations against a half-opened core.
    pub async fn open(
        data_dir: impl Into<PathBuf>,
        input: Arc<dyn AudioInput>,
        output: Arc<dyn AudioOutput>,
    ) -> Result<Self> {
        let data_dir = data_dir.into();
        tracing::info!("Opening WorshipFlow core at {:?}", data_dir);

        tokio::fs::create_dir_all(&data_dir).await?;

        let db_path = data_dir.join(config::DB_FILE_NAME);
        let pool = database::create_pool(&db_path).await?;
        let repo = Repository::new(pool);

        let store = RecordingStore::new(data_dir.join(config::RECORDINGS_DIR_NAME));
        store.initialize().await?;

        let activity = ActivityLog::new(data_dir.join(config::ACTIVITY_LOG_FILE_NAME));

        let memos = Arc::new(MemoService::new(
            repo.clone(),
            store.clone(),
            input,
            output,
            activity.clone(),
        ));
        let cascade = CascadeService::new(repo.clone(), store, activity.clone());

        let cache = ViewCache::new();
        cache.reload_all(&repo).await?;

        tracing::info!("Core initialized successfully");

        Ok(Self {
            db_path,
            repo,
            memos,
            cascade,
            cache,
            activity,
        })
    }

    // ===== Songs =====

    pub async fn create_song(&self, req: NewSong) -> Result<Song> {
        let song = self.repo.create_song(req).await?;
        self.activity.record("CREATE", "Song", Some(song.song_id));
        self.cache.reload_all(&self.repo).await?;
        Ok(song)
    }

    pub async fn update_song(&self, song_id: i64, req: NewSong) -> Result<Song> {
        let song = self.repo.update_song(song_id, req).await?;
        self.activity.record("UPDATE", "Song", Some(song_id));
        self.cache.reload_all(&self.repo).await?;
        Ok(song)
    }

    /// Delete a song via the unlink-then-delete cascade
    pub async fn delete_song(&self, song_id: i64) -> Result<()> {
        self.cascade.delete_song(song_id).await?;
        self.cache.reload_all(&self.repo).await?;
        Ok(())
    }

    // ===== Setlists =====

    pub async fn create_setlist(&self, name: &str, description: &str) -> Result<Setlist> {
        let setlist = self.repo.create_setlist(name, description).await?;
        self.activity
            .record("CREATE", "Setlist", Some(setlist.setlist_id));
        self.cache.reload_all(&self.repo).await?;
        Ok(setlist)
    }

    pub async fn update_setlist(
        &self,
        setlist_id: i64,
        name: &str,
        description: &str,
    ) -> Result<Setlist> {
        let setlist = self.repo.update_setlist(setlist_id, name, description).await?;
        self.activity.record("UPDATE", "Setlist", Some(setlist_id));
        self.cache.reload_all(&self.repo).await?;
        Ok(setlist)
    }

    /// Delete a setlist and all of its parts and memos
    pub async fn delete_setlist(&self, setlist_id: i64) -> Result<()> {
        self.cascade.delete_setlist(setlist_id).await?;
        self.cache.reload_all(&self.repo).await?;
        Ok(())
    }

    // ===== Program parts =====

    pub async fn create_program_part(&self, setlist_id: i64, title: &str) -> Result<ProgramPart> {
        let part = self.repo.create_program_part(setlist_id, title).await?;
        self.activity
            .record("CREATE", "ProgramPart", Some(part.part_id));
        self.cache.reload_all(&self.repo).await?;
        Ok(part)
    }

    pub async fn delete_program_part(&self, part_id: i64) -> Result<()> {
        self.repo.delete_program_part(part_id).await?;
        self.activity.record("DELETE", "ProgramPart", Some(part_id));
        self.cache.reload_all(&self.repo).await?;
        Ok(())
    }

    /// Link a part to a song, or unlink with `None`
    pub async fn link_song_to_part(&self, part_id: i64, song_id: Option<i64>) -> Result<()> {
        self.repo.link_song_to_part(part_id, song_id).await?;
        self.activity.record_with_details(
            "UPDATE",
            "ProgramPart",
            Some(part_id),
            Some(serde_json::json!({ "song_id": song_id })),
        );
        self.cache.reload_all(&self.repo).await?;
        Ok(())
    }

    // ===== Voice memos =====

    pub async fn start_recording(&self, setlist_id: i64, part_id: Option<i64>) -> Result<()> {
        self.memos.start_recording(setlist_id, part_id).await
    }

    pub async fn stop_recording(&self) -> Result<Option<VoiceMemo>> {
        let memo = self.memos.stop_recording().await?;
        if memo.is_some() {
            self.cache.reload_all(&self.repo).await?;
        }
        Ok(memo)
    }

    /// Two-phase memo deletion: the memo leaves the view immediately, then
    /// durable cleanup runs best-effort. An id the view does not know is
    /// only warned about, matching the optimistic contract.
    pub async fn delete_memo(&self, memo_id: i64) {
        let Some(memo) = self.cache.remove_memo(memo_id) else {
            tracing::warn!("Memo {} not found in view, nothing to delete", memo_id);
            return;
        };

        self.memos.delete_memo(&memo).await;
    }

    pub async fn toggle_playback(&self, memo: &VoiceMemo) -> Result<()> {
        self.memos.toggle_playback(memo).await
    }

    // ===== Database file =====

    pub async fn db_file_info(&self) -> Result<DbFileInfo> {
        storage::db_file_info(&self.db_path).await
    }

    pub async fn export_database(&self, dest_dir: &Path) -> Result<PathBuf> {
        storage::export_copy(&self.db_path, dest_dir).await
    }
}
