//! Voice memo lifecycle manager
//!
//! Owns the single recording session and the single playback session and
//! ties audio artifacts on disk to VoiceMemo rows. A memo row and its file
//! are created and destroyed as a pair: the save pipeline cleans up the
//! moved file when the metadata insert fails, and the delete path removes
//! the row unconditionally while treating file cleanup as best-effort.

use crate::audio::{AudioInput, AudioOutput, CaptureSession, PlaybackHandle};
use crate::config;
use crate::database::{Repository, VoiceMemo};
use crate::error::{AppError, Result};
use crate::services::ActivityLog;
use crate::storage::RecordingStore;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

struct ActiveRecording {
    setlist_id: i64,
    part_id: Option<i64>,
    session: Box<dyn CaptureSession>,
}

struct ActivePlayback {
    memo_id: i64,
    handle: Box<dyn PlaybackHandle>,
}

/// Service coordinating recording sessions, playback and memo deletion
pub struct MemoService {
    repo: Repository,
    store: RecordingStore,
    input: Arc<dyn AudioInput>,
    output: Arc<dyn AudioOutput>,
    activity: ActivityLog,
    recording: Mutex<Option<ActiveRecording>>,
    playback: Mutex<Option<ActivePlayback>>,
}

impl MemoService {
    pub fn new(
        repo: Repository,
        store: RecordingStore,
        input: Arc<dyn AudioInput>,
        output: Arc<dyn AudioOutput>,
        activity: ActivityLog,
    ) -> Self {
        Self {
            repo,
            store,
            input,
            output,
            activity,
            recording: Mutex::new(None),
            playback: Mutex::new(None),
        }
    }

    /// True while a recording session is active
    pub async fn is_recording(&self) -> bool {
        self.recording.lock().await.is_some()
    }

    /// Begin a recording session for a setlist, optionally targeting one
    /// program part.
    ///
    /// Rejects a second session while one is active, and rejects a target
    /// that already has a memo (one memo per part; one part-less memo per
    /// setlist). The microphone is acquired last, so a rejected start
    /// leaves no partial state behind.
    pub async fn start_recording(&self, setlist_id: i64, part_id: Option<i64>) -> Result<()> {
        let mut slot = self.recording.lock().await;
        if slot.is_some() {
            return Err(AppError::RecordingActive);
        }

        if !self.repo.setlist_exists(setlist_id).await? {
            return Err(AppError::SetlistNotFound(setlist_id));
        }
        if let Some(part_id) = part_id {
            if !self.repo.part_exists(part_id).await? {
                return Err(AppError::PartNotFound(part_id));
            }
        }

        let memos = self.repo.memos_for_setlist(setlist_id).await?;
        if memos.iter().any(|m| m.part_id == part_id) {
            return Err(AppError::MemoExists);
        }

        // Release any playback before the microphone takes over.
        self.stop_playback().await;

        let session = self.input.acquire().await?;
        tracing::info!(
            "Recording started for setlist {} (part: {:?})",
            setlist_id,
            part_id
        );

        *slot = Some(ActiveRecording {
            setlist_id,
            part_id,
            session,
        });

        Ok(())
    }

    /// Finish the active recording session and persist its artifact.
    ///
    /// Steps, in order: finalize the capture; if nothing was captured,
    /// return to idle with no side effect; move the temp artifact into the
    /// recordings directory; insert the memo row. A failed insert deletes
    /// the moved file before the error is surfaced so no orphaned audio
    /// file survives the session.
    pub async fn stop_recording(&self) -> Result<Option<VoiceMemo>> {
        let Some(active) = self.recording.lock().await.take() else {
            return Ok(None);
        };

        // The session is consumed either way; any failure below leaves the
        // manager idle.
        let capture = active.session.finish().await?;
        let Some(capture) = capture else {
            tracing::info!("Recording stopped with nothing captured");
            return Ok(None);
        };

        let recorded_at = Utc::now();
        let file_path = self.store.adopt(&capture.temp_path, recorded_at).await?;

        let date = recorded_at.format(config::DATE_FORMAT).to_string();
        let duration = capture.duration.map(|d| d.as_millis() as i64);

        let memo = match self
            .repo
            .create_voice_memo(
                active.setlist_id,
                active.part_id,
                &file_path.to_string_lossy(),
                &date,
                duration,
            )
            .await
        {
            Ok(memo) => memo,
            Err(e) => {
                // Never leave an audio file with no database reference.
                if let Err(cleanup) = self.store.remove(&file_path).await {
                    tracing::warn!("Failed to clean up recording after insert error: {}", cleanup);
                }
                return Err(e);
            }
        };

        self.activity
            .record("CREATE", "VoiceMemo", Some(memo.memo_id));
        tracing::info!("Saved voice memo {} at {:?}", memo.memo_id, file_path);

        Ok(Some(memo))
    }

    /// Durable cleanup for a memo the caller has already removed from its
    /// view. Row removal and file removal are both best-effort here; once
    /// the user asked for the deletion, nothing on this path may fail the
    /// session or resurrect the memo.
    pub async fn delete_memo(&self, memo: &VoiceMemo) {
        // Stop playback first if it targets this memo's file.
        {
            let mut playback = self.playback.lock().await;
            if playback
                .as_ref()
                .is_some_and(|p| p.memo_id == memo.memo_id)
            {
                *playback = None;
            }
        }

        let path = Path::new(&memo.file_path);
        if let Err(e) = self.store.remove(path).await {
            tracing::warn!("Could not delete file for memo {}: {}", memo.memo_id, e);
        }

        if let Err(e) = self.repo.delete_voice_memo_row(memo.memo_id).await {
            tracing::error!("Could not delete row for memo {}: {}", memo.memo_id, e);
        }

        self.activity
            .record("DELETE", "VoiceMemo", Some(memo.memo_id));
    }

    /// Pause/resume the memo if it is the active playback, otherwise
    /// release any other playback and start this one. At most one playback
    /// session exists system-wide.
    pub async fn toggle_playback(&self, memo: &VoiceMemo) -> Result<()> {
        let mut slot = self.playback.lock().await;

        if let Some(active) = slot.as_mut() {
            if active.memo_id == memo.memo_id && !active.handle.is_finished() {
                if active.handle.is_playing() {
                    active.handle.pause().await?;
                } else {
                    active.handle.resume().await?;
                }
                return Ok(());
            }
            // Finished, or a different memo: release before starting anew.
            *slot = None;
        }

        let handle = self.output.open(Path::new(&memo.file_path)).await?;
        *slot = Some(ActivePlayback {
            memo_id: memo.memo_id,
            handle,
        });

        tracing::debug!("Playback started for memo {}", memo.memo_id);
        Ok(())
    }

    /// Release the playback session, if any
    pub async fn stop_playback(&self) {
        self.playback.lock().await.take();
    }

    /// True while the given memo is the active, playing playback
    pub async fn is_playing(&self, memo_id: i64) -> bool {
        self.playback
            .lock()
            .await
            .as_ref()
            .is_some_and(|p| p.memo_id == memo_id && p.handle.is_playing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::fake::{CaptureOutcome, FakeInput, FakeOutput};
    use crate::database::initialize_database;
    use sqlx::sqlite::SqlitePoolOptions;
    use tempfile::TempDir;

    struct Fixture {
        service: MemoService,
        repo: Repository,
        input: Arc<FakeInput>,
        output: Arc<FakeOutput>,
        store: RecordingStore,
        _temp: TempDir,
    }

    async fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();

        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();
        initialize_database(&pool).await.unwrap();
        let repo = Repository::new(pool);

        let store = RecordingStore::new(temp.path().join("voice_memos"));
        store.initialize().await.unwrap();

        let input = Arc::new(FakeInput::new(temp.path().to_path_buf()));
        let output = Arc::new(FakeOutput::new());
        let activity = ActivityLog::new(temp.path().join("activity_log.txt"));

        let service = MemoService::new(
            repo.clone(),
            store.clone(),
            input.clone(),
            output.clone(),
            activity,
        );

        Fixture {
            service,
            repo,
            input,
            output,
            store,
            _temp: temp,
        }
    }

    async fn recordings_in(store: &RecordingStore) -> usize {
        let mut count = 0;
        let mut entries = tokio::fs::read_dir(store.root()).await.unwrap();
        while let Some(_) = entries.next_entry().await.unwrap() {
            count += 1;
        }
        count
    }

    #[tokio::test]
    async fn test_record_and_stop_creates_paired_row_and_file() {
        let f = fixture().await;
        let setlist = f.repo.create_setlist("Service 1", "").await.unwrap();

        f.service
            .start_recording(setlist.setlist_id, None)
            .await
            .unwrap();
        assert!(f.service.is_recording().await);

        let memo = f.service.stop_recording().await.unwrap().unwrap();
        assert!(!f.service.is_recording().await);

        assert_eq!(memo.setlist_id, setlist.setlist_id);
        assert_eq!(memo.part_id, None);
        assert_eq!(memo.duration, Some(1500));
        assert!(f.store.exists(Path::new(&memo.file_path)).await);

        let rows = f.repo.list_voice_memos().await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_second_start_is_rejected() {
        let f = fixture().await;
        let setlist = f.repo.create_setlist("Service 1", "").await.unwrap();

        f.service
            .start_recording(setlist.setlist_id, None)
            .await
            .unwrap();

        let err = f
            .service
            .start_recording(setlist.setlist_id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::RecordingActive));
    }

    #[tokio::test]
    async fn test_start_rejected_when_target_already_has_memo() {
        let f = fixture().await;
        let setlist = f.repo.create_setlist("Service 1", "").await.unwrap();
        let part = f
            .repo
            .create_program_part(setlist.setlist_id, "Worship")
            .await
            .unwrap();

        f.service
            .start_recording(setlist.setlist_id, Some(part.part_id))
            .await
            .unwrap();
        f.service.stop_recording().await.unwrap().unwrap();

        let err = f
            .service
            .start_recording(setlist.setlist_id, Some(part.part_id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MemoExists));

        // A part-less memo on the same setlist is a different target.
        f.service
            .start_recording(setlist.setlist_id, None)
            .await
            .unwrap();
        f.service.stop_recording().await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_permission_denied_aborts_to_idle() {
        let f = fixture().await;
        let setlist = f.repo.create_setlist("Service 1", "").await.unwrap();

        f.input.set_outcome(CaptureOutcome::Deny);
        let err = f
            .service
            .start_recording(setlist.setlist_id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Acquisition(_)));
        assert!(!f.service.is_recording().await);
        assert_eq!(recordings_in(&f.store).await, 0);
    }

    #[tokio::test]
    async fn test_empty_capture_has_no_side_effect() {
        let f = fixture().await;
        let setlist = f.repo.create_setlist("Service 1", "").await.unwrap();

        f.input.set_outcome(CaptureOutcome::Empty);
        f.service
            .start_recording(setlist.setlist_id, None)
            .await
            .unwrap();

        let result = f.service.stop_recording().await.unwrap();
        assert!(result.is_none());
        assert!(!f.service.is_recording().await);
        assert_eq!(recordings_in(&f.store).await, 0);
        assert!(f.repo.list_voice_memos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_capability_loss_returns_to_idle() {
        let f = fixture().await;
        let setlist = f.repo.create_setlist("Service 1", "").await.unwrap();

        f.input.set_outcome(CaptureOutcome::LoseCapability);
        f.service
            .start_recording(setlist.setlist_id, None)
            .await
            .unwrap();

        let err = f.service.stop_recording().await.unwrap_err();
        assert!(matches!(err, AppError::Acquisition(_)));
        assert!(!f.service.is_recording().await);
        assert!(f.repo.list_voice_memos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_insert_cleans_up_moved_file() {
        let f = fixture().await;
        let setlist = f.repo.create_setlist("Service 1", "").await.unwrap();

        f.service
            .start_recording(setlist.setlist_id, None)
            .await
            .unwrap();

        // Force the metadata insert to fail: the setlist is gone by the
        // time the session stops.
        f.repo.delete_setlist_row(setlist.setlist_id).await.unwrap();

        let err = f.service.stop_recording().await.unwrap_err();
        assert!(matches!(err, AppError::SetlistNotFound(_)));

        assert_eq!(recordings_in(&f.store).await, 0);
        assert!(f.repo.list_voice_memos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_memo_row_removed_even_when_file_missing() {
        let f = fixture().await;
        let setlist = f.repo.create_setlist("Service 1", "").await.unwrap();

        f.service
            .start_recording(setlist.setlist_id, None)
            .await
            .unwrap();
        let memo = f.service.stop_recording().await.unwrap().unwrap();

        // Simulate the artifact vanishing out from under us.
        tokio::fs::remove_file(&memo.file_path).await.unwrap();

        f.service.delete_memo(&memo).await;

        assert!(f.repo.list_voice_memos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_memo_removes_file_and_row() {
        let f = fixture().await;
        let setlist = f.repo.create_setlist("Service 1", "").await.unwrap();

        f.service
            .start_recording(setlist.setlist_id, None)
            .await
            .unwrap();
        let memo = f.service.stop_recording().await.unwrap().unwrap();

        f.service.delete_memo(&memo).await;

        assert!(!f.store.exists(Path::new(&memo.file_path)).await);
        assert!(f.repo.list_voice_memos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_playback_pause_resume() {
        let f = fixture().await;
        let setlist = f.repo.create_setlist("Service 1", "").await.unwrap();

        f.service
            .start_recording(setlist.setlist_id, None)
            .await
            .unwrap();
        let memo = f.service.stop_recording().await.unwrap().unwrap();

        f.service.toggle_playback(&memo).await.unwrap();
        assert!(f.service.is_playing(memo.memo_id).await);

        f.service.toggle_playback(&memo).await.unwrap();
        assert!(!f.service.is_playing(memo.memo_id).await);

        f.service.toggle_playback(&memo).await.unwrap();
        assert!(f.service.is_playing(memo.memo_id).await);

        // Only one handle was ever opened.
        assert_eq!(f.output.opened().len(), 1);
    }

    #[tokio::test]
    async fn test_playback_switches_to_other_memo() {
        let f = fixture().await;
        let l1 = f.repo.create_setlist("Service 1", "").await.unwrap();
        let l2 = f.repo.create_setlist("Service 2", "").await.unwrap();

        f.service.start_recording(l1.setlist_id, None).await.unwrap();
        let m1 = f.service.stop_recording().await.unwrap().unwrap();
        f.service.start_recording(l2.setlist_id, None).await.unwrap();
        let m2 = f.service.stop_recording().await.unwrap().unwrap();

        f.service.toggle_playback(&m1).await.unwrap();
        f.service.toggle_playback(&m2).await.unwrap();

        assert!(f.service.is_playing(m2.memo_id).await);
        assert!(!f.service.is_playing(m1.memo_id).await);
        assert_eq!(f.output.opened().len(), 2);
    }

    #[tokio::test]
    async fn test_finished_playback_restarts_on_toggle() {
        let f = fixture().await;
        let setlist = f.repo.create_setlist("Service 1", "").await.unwrap();

        f.service
            .start_recording(setlist.setlist_id, None)
            .await
            .unwrap();
        let memo = f.service.stop_recording().await.unwrap().unwrap();

        f.service.toggle_playback(&memo).await.unwrap();
        f.output.mark_finished();
        assert!(!f.service.is_playing(memo.memo_id).await);

        // Toggling a finished memo opens a fresh handle instead of pausing.
        f.service.toggle_playback(&memo).await.unwrap();
        assert!(f.service.is_playing(memo.memo_id).await);
        assert_eq!(f.output.opened().len(), 2);
    }

    #[tokio::test]
    async fn test_stop_without_recording_is_noop() {
        let f = fixture().await;
        assert!(f.service.stop_recording().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_playback_of_missing_file_fails() {
        let f = fixture().await;
        let setlist = f.repo.create_setlist("Service 1", "").await.unwrap();

        let memo = f
            .repo
            .create_voice_memo(setlist.setlist_id, None, "/nonexistent.m4a", "2026-08-29", None)
            .await
            .unwrap();

        let err = f.service.toggle_playback(&memo).await.unwrap_err();
        assert!(matches!(err, AppError::Acquisition(_)));
    }
}
