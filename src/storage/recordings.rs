//! Recordings directory store
//!
//! Holds the permanent audio artifacts backing voice memo rows. Files are
//! named from their capture timestamp and are only ever added and removed,
//! never rewritten in place.

use crate::config;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Directory-backed store for recorded voice memos
#[derive(Clone)]
pub struct RecordingStore {
    root: PathBuf,
}

impl RecordingStore {
    /// Create a store rooted at the given directory
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the recordings directory if needed
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!("Recording store initialized at: {:?}", self.root);
        Ok(())
    }

    /// Unique permanent path for a capture finished at `recorded_at`.
    /// Epoch milliseconds keep names unique; a collision within the same
    /// millisecond gets a numeric suffix.
    async fn allocate_path(&self, recorded_at: DateTime<Utc>) -> PathBuf {
        let stem = format!("{}{}", config::MEMO_FILE_PREFIX, recorded_at.timestamp_millis());
        let mut path = self
            .root
            .join(format!("{stem}.{}", config::MEMO_FILE_EXT));

        let mut attempt = 1;
        while fs::try_exists(&path).await.unwrap_or(false) {
            path = self
                .root
                .join(format!("{stem}_{attempt}.{}", config::MEMO_FILE_EXT));
            attempt += 1;
        }

        path
    }

    /// Move a finished temporary capture into the store and return its
    /// permanent path. The temp file is consumed on success.
    pub async fn adopt(&self, temp: &Path, recorded_at: DateTime<Utc>) -> Result<PathBuf> {
        if !fs::try_exists(&self.root).await.unwrap_or(false) {
            return Err(AppError::NotInitialized);
        }

        let dest = self.allocate_path(recorded_at).await;

        match fs::rename(temp, &dest).await {
            Ok(()) => {}
            // Rename fails across filesystems; fall back to copy + remove.
            // A failed fallback must not leave the copy behind.
            Err(_) => {
                if let Err(e) = fs::copy(temp, &dest).await {
                    let _ = fs::remove_file(&dest).await;
                    return Err(e.into());
                }
                if let Err(e) = fs::remove_file(temp).await {
                    let _ = fs::remove_file(&dest).await;
                    return Err(e.into());
                }
            }
        }

        tracing::debug!("Adopted recording: {:?}", dest);
        Ok(dest)
    }

    /// Check whether an artifact exists
    pub async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    /// Delete an artifact. A file that is already gone is not an error.
    pub async fn remove(&self, path: &Path) -> Result<()> {
        if !self.exists(path).await {
            return Ok(());
        }

        fs::remove_file(path).await?;

        tracing::debug!("Removed recording: {:?}", path);
        Ok(())
    }

    /// Recordings directory root
    pub fn root(&self) -> &Path {
        &self.root
    }
}
