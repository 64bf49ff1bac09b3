//! Activity log collaborator
//!
//! Appends one line per mutating event to a plain text file. Writes are
//! fire-and-forget: a failed append is logged and never surfaces to, or
//! blocks, the operation that triggered it.

use chrono::Utc;
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Append-only activity log
#[derive(Clone)]
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Record a mutating event. Returns immediately; the append happens on
    /// a spawned task and its failure is only warned about.
    pub fn record(&self, action: &str, entity: &str, record_id: Option<i64>) {
        self.record_with_details(action, entity, record_id, None);
    }

    /// Like [`record`](Self::record) with an extra JSON detail payload
    pub fn record_with_details(
        &self,
        action: &str,
        entity: &str,
        record_id: Option<i64>,
        details: Option<serde_json::Value>,
    ) {
        let entry = format_entry(action, entity, record_id, details.as_ref());
        let path = self.path.clone();

        tokio::spawn(async move {
            if let Err(e) = append_line(&path, &entry).await {
                tracing::warn!("Failed to write activity log: {}", e);
            }
        });
    }

    /// Read the whole log; an absent file reads as empty.
    pub async fn read_all(&self) -> String {
        tokio::fs::read_to_string(&self.path)
            .await
            .unwrap_or_default()
    }
}

fn format_entry(
    action: &str,
    entity: &str,
    record_id: Option<i64>,
    details: Option<&serde_json::Value>,
) -> String {
    let mut entry = format!("[{}] {} on {}", Utc::now().to_rfc3339(), action, entity);
    if let Some(id) = record_id {
        entry.push_str(&format!(" (ID: {id})"));
    }
    if let Some(details) = details {
        entry.push_str(&format!(" | Details: {details}"));
    }
    entry.push('\n');
    entry
}

async fn append_line(path: &PathBuf, entry: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(entry.as_bytes()).await?;
    Ok(())
}
