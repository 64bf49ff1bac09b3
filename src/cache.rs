//! In-memory view cache
//!
//! Holds the last-loaded snapshot of all four collections and serves
//! FK-filtered views to the presentation layer. The sole coherence
//! mechanism is the wholesale `reload_all` triggered after every mutation;
//! the one exception is the optimistic memo tombstone applied before a
//! memo's durable cleanup runs.

use crate::database::{ProgramPart, Repository, Setlist, Song, VoiceMemo};
use crate::error::Result;
use std::sync::RwLock;

#[derive(Debug, Clone, Default)]
struct Snapshot {
    songs: Vec<Song>,
    setlists: Vec<Setlist>,
    parts: Vec<ProgramPart>,
    memos: Vec<VoiceMemo>,
}

/// Working copy of the four entity collections
#[derive(Default)]
pub struct ViewCache {
    inner: RwLock<Snapshot>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all four collections wholesale from the repository.
    /// Reads happen before the lock is taken; the swap itself is atomic.
    pub async fn reload_all(&self, repo: &Repository) -> Result<()> {
        let snapshot = Snapshot {
            songs: repo.list_songs().await?,
            setlists: repo.list_setlists().await?,
            parts: repo.list_program_parts().await?,
            memos: repo.list_voice_memos().await?,
        };

        *self.inner.write().expect("cache lock poisoned") = snapshot;
        Ok(())
    }

    pub fn songs(&self) -> Vec<Song> {
        self.inner.read().expect("cache lock poisoned").songs.clone()
    }

    pub fn setlists(&self) -> Vec<Setlist> {
        self.inner
            .read()
            .expect("cache lock poisoned")
            .setlists
            .clone()
    }

    /// Parts of one setlist, in listing order
    pub fn parts_for_setlist(&self, setlist_id: i64) -> Vec<ProgramPart> {
        self.inner
            .read()
            .expect("cache lock poisoned")
            .parts
            .iter()
            .filter(|p| p.setlist_id == setlist_id)
            .cloned()
            .collect()
    }

    /// Memos of one setlist
    pub fn memos_for_setlist(&self, setlist_id: i64) -> Vec<VoiceMemo> {
        self.inner
            .read()
            .expect("cache lock poisoned")
            .memos
            .iter()
            .filter(|m| m.setlist_id == setlist_id)
            .cloned()
            .collect()
    }

    /// The memo attached to one part, if any
    pub fn memo_for_part(&self, part_id: i64) -> Option<VoiceMemo> {
        self.inner
            .read()
            .expect("cache lock poisoned")
            .memos
            .iter()
            .find(|m| m.part_id == Some(part_id))
            .cloned()
    }

    /// Optimistic tombstone: drop a memo from the view ahead of its
    /// durable cleanup. Returns the removed row so the caller can hand it
    /// to the lifecycle manager.
    pub fn remove_memo(&self, memo_id: i64) -> Option<VoiceMemo> {
        let mut inner = self.inner.write().expect("cache lock poisoned");
        let index = inner.memos.iter().position(|m| m.memo_id == memo_id)?;
        Some(inner.memos.remove(index))
    }

    /// Case-insensitive search across every text field of the song library
    pub fn search_songs(&self, query: &str) -> Vec<Song> {
        let query = query.to_lowercase();
        if query.is_empty() {
            return self.songs();
        }

        self.inner
            .read()
            .expect("cache lock poisoned")
            .songs
            .iter()
            .filter(|s| {
                s.title.to_lowercase().contains(&query)
                    || s.artist.to_lowercase().contains(&query)
                    || s.key.to_lowercase().contains(&query)
                    || s.lyrics.to_lowercase().contains(&query)
                    || s.category.to_lowercase().contains(&query)
                    || s.kind.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }
}
