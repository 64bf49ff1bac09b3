//! Device audio boundary
//!
//! Narrow trait seams over the platform's microphone and audio output.
//! The core never touches a device API directly; implementations of these
//! traits are injected at startup, and test doubles live in [`fake`].

pub mod fake;

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A finished capture: a temporary artifact awaiting adoption into the
/// recordings store, plus its measured length when the device reports one.
#[derive(Debug)]
pub struct Capture {
    pub temp_path: PathBuf,
    pub duration: Option<Duration>,
}

/// Microphone input capability.
///
/// `acquire` requests permission and starts capturing; it must fail
/// without creating any partial file when the device is unavailable.
#[async_trait]
pub trait AudioInput: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn CaptureSession>>;
}

/// An in-progress capture owned by the lifecycle manager.
#[async_trait]
pub trait CaptureSession: Send {
    /// Finalize and close the capture. `Ok(None)` means nothing was
    /// captured (including capability loss mid-session) and no artifact
    /// exists.
    async fn finish(self: Box<Self>) -> Result<Option<Capture>>;
}

/// Audio output capability for memo playback.
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Open a playback handle over an artifact and start playing.
    async fn open(&self, source: &Path) -> Result<Box<dyn PlaybackHandle>>;
}

/// A single playback session. At most one is held by the manager at a
/// time; dropping the handle releases the output channel.
#[async_trait]
pub trait PlaybackHandle: Send {
    async fn pause(&mut self) -> Result<()>;
    async fn resume(&mut self) -> Result<()>;
    fn is_playing(&self) -> bool;
    /// True once playback reached the end of the artifact
    fn is_finished(&self) -> bool;
}
