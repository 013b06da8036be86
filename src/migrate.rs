//! Database schema setup (idempotent).
//!
//! | Object | Kind | Purpose |
//! |--------|------|---------|
//! | `doc` | table | Canonical documents, unique on `(dataset, location)` |
//! | `doc_fts` | FTS5 | Tokenized `title`, `body`, `location`; `rowid = doc.id` |
//! | `term` | table | Facet tuples `(doc_id, field, value)` |
//!
//! `doc_fts` is a regular (not external-content) FTS5 table, so the store
//! can drop an entry by rowid without re-supplying the old text. Nothing
//! here installs triggers: the store writes `doc_fts` and `term` itself,
//! inside the same transaction as the `doc` change.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Create every table and index the store needs. Safe to run repeatedly.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS doc (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            dataset TEXT NOT NULL,
            location TEXT NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            revision INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE(dataset, location)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS term (
            doc_id INTEGER NOT NULL,
            field TEXT NOT NULL,
            value TEXT NOT NULL,
            UNIQUE(doc_id, field, value)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // FTS5 CREATE is not idempotent natively, so we check first
    let fts_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='doc_fts'",
    )
    .fetch_one(pool)
    .await?;

    if !fts_exists {
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE doc_fts USING fts5(
                title,
                body,
                location,
                tokenize = 'porter unicode61 remove_diacritics 2'
            )
            "#,
        )
        .execute(pool)
        .await?;
    }

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_doc_dataset ON doc(dataset, id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_term_field_value ON term(field, value)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Open the configured database, apply the schema, and close the pool.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}
