//! WorshipFlow core
//!
//! Data and lifecycle model for worship-team setlists: songs, ordered
//! program parts, and voice memos whose audio artifacts are paired with
//! database rows. The presentation layer, audio devices and the activity
//! log are external collaborators reached through the seams in [`audio`]
//! and [`services`].

pub mod app;
pub mod audio;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod storage;

pub use app::App;
pub use error::{AppError, Result};
