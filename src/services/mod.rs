//! Services module
//!
//! Business logic services that coordinate between the presentation
//! boundary, the repository and the filesystem.

pub mod activity_log;
pub mod cascade;
pub mod memos;

pub use activity_log::ActivityLog;
pub use cascade::CascadeService;
pub use memos::MemoService;
