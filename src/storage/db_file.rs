//! Database file management
//!
//! Reports on the on-disk database file and produces date-stamped copies
//! for sharing or manual backup. The database is never modified here.

use crate::config;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Summary of the on-disk database file
#[derive(Debug, Clone, Serialize)]
pub struct DbFileInfo {
    pub exists: bool,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub path: PathBuf,
}

/// Inspect the database file without opening it
pub async fn db_file_info(db_path: &Path) -> Result<DbFileInfo> {
    match fs::metadata(db_path).await {
        Ok(meta) => Ok(DbFileInfo {
            exists: true,
            size: meta.len(),
            modified: meta.modified().ok().map(DateTime::from),
            path: db_path.to_path_buf(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DbFileInfo {
            exists: false,
            size: 0,
            modified: None,
            path: db_path.to_path_buf(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Copy the database file into `dest_dir` under a date-stamped name and
/// return the path of the copy.
pub async fn export_copy(db_path: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let info = db_file_info(db_path).await?;
    if !info.exists {
        return Err(AppError::Validation("database file not found".to_string()));
    }

    fs::create_dir_all(dest_dir).await?;

    let stamp = Utc::now().format(config::DATE_FORMAT);
    let dest = dest_dir.join(format!("{}{stamp}.db", config::DB_EXPORT_PREFIX));
    fs::copy(db_path, &dest).await?;

    tracing::info!("Exported database copy to {:?}", dest);
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_info_for_missing_file() {
        let temp = TempDir::new().unwrap();
        let info = db_file_info(&temp.path().join("none.db")).await.unwrap();

        assert!(!info.exists);
        assert_eq!(info.size, 0);
        assert!(info.modified.is_none());
    }

    #[tokio::test]
    async fn test_export_copy() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("worship_flow.db");
        fs::write(&db_path, b"not really sqlite").await.unwrap();

        let out = export_copy(&db_path, &temp.path().join("exports"))
            .await
            .unwrap();

        assert!(out.exists());
        let name = out.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(config::DB_EXPORT_PREFIX));
        assert!(name.ends_with(".db"));
        assert_eq!(fs::read(&out).await.unwrap(), b"not really sqlite");
    }

    #[tokio::test]
    async fn test_export_missing_db_fails() {
        let temp = TempDir::new().unwrap();
        let err = export_copy(&temp.path().join("none.db"), temp.path())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
