//! Database schema
//!
//! Creates the four entity tables and performs additive column repair.
//! There is no versioned migration framework; schema changes are limited
//! to `CREATE TABLE IF NOT EXISTS` plus `ALTER TABLE ADD COLUMN` attempts
//! whose duplicate-column failures are swallowed.

use crate::error::Result;
use sqlx::sqlite::SqlitePool;

/// Table creation statements. Foreign keys are declared for documentation;
/// enforcement happens at the repository layer.
const CREATE_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS Song (
        song_id INTEGER PRIMARY KEY NOT NULL,
        title TEXT NOT NULL,
        artist TEXT NOT NULL DEFAULT '',
        key TEXT NOT NULL DEFAULT '',
        lyrics TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL DEFAULT '',
        type TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS Setlist (
        setlist_id INTEGER PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        date_created TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ProgramPart (
        part_id INTEGER PRIMARY KEY NOT NULL,
        setlist_id INTEGER NOT NULL,
        song_id INTEGER,
        title TEXT NOT NULL DEFAULT '',
        FOREIGN KEY (setlist_id) REFERENCES Setlist (setlist_id),
        FOREIGN KEY (song_id) REFERENCES Song (song_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS VoiceMemo (
        memo_id INTEGER PRIMARY KEY NOT NULL,
        setlist_id INTEGER NOT NULL,
        part_id INTEGER,
        file_path TEXT NOT NULL,
        date_recorded TEXT NOT NULL DEFAULT '',
        duration INTEGER,
        FOREIGN KEY (setlist_id) REFERENCES Setlist (setlist_id)
    )
    "#,
];

/// Columns added after the first release. Attempted unconditionally on
/// every startup so databases created before these columns existed are
/// repaired in place; a duplicate-column failure means the column is
/// already there and is not an error.
const ADD_COLUMNS: &[&str] = &[
    "ALTER TABLE VoiceMemo ADD COLUMN part_id INTEGER",
    "ALTER TABLE VoiceMemo ADD COLUMN duration INTEGER",
];

/// Initialize database with schema.
///
/// Safe to call on every process start. Table creation failures propagate
/// and must be treated as unrecoverable startup errors by the caller.
pub async fn initialize_database(pool: &SqlitePool) -> Result<()> {
    tracing::info!("Initializing database schema");

    for statement in CREATE_TABLES {
        sqlx::query(statement).execute(pool).await?;
    }

    for statement in ADD_COLUMNS {
        if let Err(e) = sqlx::query(statement).execute(pool).await {
            tracing::debug!("Additive column repair skipped: {}", e);
        }
    }

    tracing::info!("Database initialization complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn test_initialize_database() {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        for expected in ["Song", "Setlist", "ProgramPart", "VoiceMemo"] {
            assert!(tables.iter().any(|t| t == expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();
        initialize_database(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_column_repair_upgrades_old_memo_table() {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .unwrap();

        // Pre-create the table the way the first release shipped it,
        // without part_id and duration.
        sqlx::query(
            r#"
            CREATE TABLE VoiceMemo (
                memo_id INTEGER PRIMARY KEY NOT NULL,
                setlist_id INTEGER NOT NULL,
                file_path TEXT NOT NULL,
                date_recorded TEXT
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        initialize_database(&pool).await.unwrap();

        let columns: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM pragma_table_info('VoiceMemo')",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        assert!(columns.iter().any(|c| c == "part_id"));
        assert!(columns.iter().any(|c| c == "duration"));
    }
}
