//! In-memory audio doubles
//!
//! Deterministic [`AudioInput`]/[`AudioOutput`] implementations used by
//! unit and integration tests, and handy for running the core on hosts
//! with no audio hardware.

use super::{AudioInput, AudioOutput, Capture, CaptureSession, PlaybackHandle};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::fs;

/// What the next capture session should do when finished
#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    /// Produce a temp artifact with these bytes
    Produce(Vec<u8>),
    /// Finish with nothing captured
    Empty,
    /// Refuse the microphone at acquire time
    Deny,
    /// Fail at finish time, as if the capability was lost mid-session
    LoseCapability,
}

/// Scriptable microphone double. Temp artifacts are written under `dir`.
pub struct FakeInput {
    dir: PathBuf,
    outcome: Mutex<CaptureOutcome>,
    counter: AtomicU64,
}

impl FakeInput {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            outcome: Mutex::new(CaptureOutcome::Produce(b"fake audio".to_vec())),
            counter: AtomicU64::new(0),
        }
    }

    /// Script the next sessions' behavior
    pub fn set_outcome(&self, outcome: CaptureOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }
}

#[async_trait]
impl AudioInput for FakeInput {
    async fn acquire(&self) -> Result<Box<dyn CaptureSession>> {
        let outcome = self.outcome.lock().unwrap().clone();

        if matches!(outcome, CaptureOutcome::Deny) {
            return Err(AppError::Acquisition("microphone permission denied".to_string()));
        }

        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(FakeSession {
            temp_path: self.dir.join(format!("capture_{n}.tmp")),
            outcome,
        }))
    }
}

struct FakeSession {
    temp_path: PathBuf,
    outcome: CaptureOutcome,
}

#[async_trait]
impl CaptureSession for FakeSession {
    async fn finish(self: Box<Self>) -> Result<Option<Capture>> {
        match self.outcome {
            CaptureOutcome::Produce(bytes) => {
                fs::write(&self.temp_path, &bytes).await?;
                Ok(Some(Capture {
                    temp_path: self.temp_path,
                    duration: Some(Duration::from_millis(1500)),
                }))
            }
            CaptureOutcome::Empty => Ok(None),
            CaptureOutcome::LoseCapability => {
                Err(AppError::Acquisition("audio capability lost".to_string()))
            }
            CaptureOutcome::Deny => unreachable!("rejected at acquire"),
        }
    }
}

/// Playback double that checks the artifact exists and tracks play state.
pub struct FakeOutput {
    /// Sources opened over the lifetime of the double, for assertions
    opened: Mutex<Vec<PathBuf>>,
    last_finished: Mutex<Option<Arc<std::sync::atomic::AtomicBool>>>,
}

impl FakeOutput {
    pub fn new() -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            last_finished: Mutex::new(None),
        }
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().unwrap().clone()
    }

    /// Simulate the most recently opened handle reaching end-of-file
    pub fn mark_finished(&self) {
        if let Some(flag) = self.last_finished.lock().unwrap().as_ref() {
            flag.store(true, Ordering::Relaxed);
        }
    }
}

impl Default for FakeOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioOutput for FakeOutput {
    async fn open(&self, source: &Path) -> Result<Box<dyn PlaybackHandle>> {
        if !fs::try_exists(source).await.unwrap_or(false) {
            return Err(AppError::Acquisition(format!(
                "cannot open audio source: {}",
                source.display()
            )));
        }

        self.opened.lock().unwrap().push(source.to_path_buf());

        let finished = Arc::new(std::sync::atomic::AtomicBool::new(false));
        *self.last_finished.lock().unwrap() = Some(finished.clone());

        Ok(Box::new(FakePlayback {
            playing: true,
            finished,
        }))
    }
}

struct FakePlayback {
    playing: bool,
    finished: Arc<std::sync::atomic::AtomicBool>,
}

#[async_trait]
impl PlaybackHandle for FakePlayback {
    async fn pause(&mut self) -> Result<()> {
        self.playing = false;
        Ok(())
    }

    async fn resume(&mut self) -> Result<()> {
        self.playing = true;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing && !self.is_finished()
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }
}
