//! SQLite-backed [`Store`] implementation.
//!
//! Maps each [`Store`] operation onto the `doc`, `doc_fts`, and `term`
//! tables created by [`migrate::apply_schema`](crate::migrate::apply_schema).
//! Every write runs in one transaction that touches the document row, its
//! FTS5 row, and (on creation or delete) its terms. Reads that join several
//! tables run in one transaction too, so they see a single snapshot.
//!
//! Ranking uses FTS5's built-in `bm25()` with the engine's field weights.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::trace;

use facetdex_core::analysis::fts5_match_expr;
use facetdex_core::facet::{normalize_terms, push_term, term_tuples};
use facetdex_core::models::{
    from_millis, now_millis, Candidate, Document, FieldWeights, NewDocument, Terms,
};
use facetdex_core::store::Store;

const DOC_COLUMNS: &str =
    "doc.id, doc.dataset, doc.location, doc.title, doc.body, doc.revision, doc.created_at, doc.updated_at";

/// SQLite implementation of the [`Store`] trait.
///
/// Wraps a caller-owned [`SqlitePool`]. Dropping the store does not close
/// the pool.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_document(row: &SqliteRow) -> Document {
    Document {
        id: row.get("id"),
        dataset: row.get("dataset"),
        location: row.get("location"),
        title: row.get("title"),
        body: row.get("body"),
        revision: row.get("revision"),
        created_at: from_millis(row.get("created_at")),
        updated_at: from_millis(row.get("updated_at")),
        terms: Terms::new(),
    }
}

async fn load_terms(conn: &mut SqliteConnection, doc_id: i64) -> Result<Terms> {
    let rows = sqlx::query("SELECT field, value FROM term WHERE doc_id = ? ORDER BY rowid")
        .bind(doc_id)
        .fetch_all(&mut *conn)
        .await?;

    let mut terms = Terms::new();
    for row in &rows {
        push_term(&mut terms, row.get("field"), row.get("value"));
    }
    Ok(terms)
}

async fn write_terms(conn: &mut SqliteConnection, doc_id: i64, terms: &Terms) -> Result<()> {
    let terms = normalize_terms(terms);
    for (field, value) in term_tuples(&terms) {
        sqlx::query("INSERT OR IGNORE INTO term (doc_id, field, value) VALUES (?, ?, ?)")
            .bind(doc_id)
            .bind(field)
            .bind(value)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Replace the FTS5 row for `doc_id` with the given field text.
async fn index_text(
    conn: &mut SqliteConnection,
    doc_id: i64,
    title: &str,
    body: &str,
    location: &str,
) -> Result<()> {
    sqlx::query("DELETE FROM doc_fts WHERE rowid = ?")
        .bind(doc_id)
        .execute(&mut *conn)
        .await?;

    sqlx::query("INSERT INTO doc_fts (rowid, title, body, location) VALUES (?, ?, ?, ?)")
        .bind(doc_id)
        .bind(title)
        .bind(body)
        .bind(location)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Attach terms to every candidate using the caller's transaction.
async fn with_terms(
    conn: &mut SqliteConnection,
    rows: Vec<SqliteRow>,
    ranked: bool,
) -> Result<Vec<Candidate>> {
    let mut candidates = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut document = row_to_document(row);
        document.terms = load_terms(&mut *conn, document.id).await?;
        let relevance = if ranked { row.get("relevance") } else { 0.0 };
        candidates.push(Candidate {
            document,
            relevance,
        });
    }
    Ok(candidates)
}

#[async_trait]
impl Store for SqliteStore {
    async fn ensure_schema(&self) -> Result<()> {
        crate::migrate::apply_schema(&self.pool).await
    }

    async fn get_document(&self, dataset: &str, location: &str) -> Result<Option<Document>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM doc WHERE dataset = ? AND location = ?",
            DOC_COLUMNS
        ))
        .bind(dataset)
        .bind(location)
        .fetch_optional(&mut *tx)
        .await?;

        let doc = match row {
            Some(row) => {
                let mut doc = row_to_document(&row);
                doc.terms = load_terms(&mut tx, doc.id).await?;
                Some(doc)
            }
            None => None,
        };

        tx.commit().await?;
        Ok(doc)
    }

    async fn insert_document(&self, doc: &NewDocument<'_>) -> Result<Option<i64>> {
        let mut tx = self.pool.begin().await?;
        let now = now_millis();

        let id: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO doc (dataset, location, title, body, revision, created_at, updated_at)
            VALUES (?, ?, ?, ?, 1, ?, ?)
            ON CONFLICT(dataset, location) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(doc.dataset)
        .bind(doc.location)
        .bind(doc.title)
        .bind(doc.body)
        .bind(now)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(id) = id else {
            tx.rollback().await?;
            return Ok(None);
        };

        index_text(&mut tx, id, doc.title, doc.body, doc.location).await?;
        write_terms(&mut tx, id, doc.terms).await?;

        tx.commit().await?;
        trace!(target: "facetdex::sqlite", id, dataset = doc.dataset, "inserted document");
        Ok(Some(id))
    }

    async fn update_document(&self, doc: &NewDocument<'_>) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let id: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE doc SET
                title = ?,
                body = ?,
                revision = revision + 1,
                updated_at = MAX(?, updated_at + 1)
            WHERE dataset = ? AND location = ?
            RETURNING id
            "#,
        )
        .bind(doc.title)
        .bind(doc.body)
        .bind(now_millis())
        .bind(doc.dataset)
        .bind(doc.location)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(id) = id else {
            tx.rollback().await?;
            return Ok(false);
        };

        index_text(&mut tx, id, doc.title, doc.body, doc.location).await?;

        tx.commit().await?;
        trace!(target: "facetdex::sqlite", id, dataset = doc.dataset, "updated document");
        Ok(true)
    }

    async fn upsert_document(&self, doc: &NewDocument<'_>) -> Result<i64> {
        let mut tx = self.pool.begin().await?;
        let now = now_millis();

        let row = sqlx::query(
            r#"
            INSERT INTO doc (dataset, location, title, body, revision, created_at, updated_at)
            VALUES (?, ?, ?, ?, 1, ?, ?)
            ON CONFLICT(dataset, location) DO UPDATE SET
                title = excluded.title,
                body = excluded.body,
                revision = doc.revision + 1,
                updated_at = MAX(excluded.updated_at, doc.updated_at + 1)
            RETURNING id, revision
            "#,
        )
        .bind(doc.dataset)
        .bind(doc.location)
        .bind(doc.title)
        .bind(doc.body)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let id: i64 = row.get("id");
        let revision: i64 = row.get("revision");

        index_text(&mut tx, id, doc.title, doc.body, doc.location).await?;
        if revision == 1 {
            write_terms(&mut tx, id, doc.terms).await?;
        }

        tx.commit().await?;
        trace!(target: "facetdex::sqlite", id, revision, dataset = doc.dataset, "upserted document");
        Ok(id)
    }

    async fn delete_document(&self, dataset: &str, location: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let id: Option<i64> =
            sqlx::query_scalar("DELETE FROM doc WHERE dataset = ? AND location = ? RETURNING id")
                .bind(dataset)
                .bind(location)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(id) = id else {
            tx.rollback().await?;
            return Ok(false);
        };

        sqlx::query("DELETE FROM doc_fts WHERE rowid = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM term WHERE doc_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        trace!(target: "facetdex::sqlite", id, dataset, "deleted document");
        Ok(true)
    }

    async fn count_documents(&self, dataset: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM doc WHERE dataset = ?")
            .bind(dataset)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn text_candidates(
        &self,
        dataset: &str,
        query: &str,
        weights: &FieldWeights,
    ) -> Result<Vec<Candidate>> {
        let Some(expr) = fts5_match_expr(query) else {
            return Ok(Vec::new());
        };

        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {}, bm25(doc_fts, ?, ?, ?) AS relevance
            FROM doc_fts
            JOIN doc ON doc.id = doc_fts.rowid
            WHERE doc_fts MATCH ? AND doc.dataset = ?
            ORDER BY relevance, doc.id
            "#,
            DOC_COLUMNS
        ))
        .bind(weights.title)
        .bind(weights.body)
        .bind(weights.location)
        .bind(&expr)
        .bind(dataset)
        .fetch_all(&mut *tx)
        .await?;

        let candidates = with_terms(&mut tx, rows, true).await?;
        tx.commit().await?;
        trace!(target: "facetdex::sqlite", dataset, query = %expr, hits = candidates.len(), "text candidates");
        Ok(candidates)
    }

    async fn scan_candidates(&self, dataset: &str) -> Result<Vec<Candidate>> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM doc WHERE dataset = ? ORDER BY doc.id",
            DOC_COLUMNS
        ))
        .bind(dataset)
        .fetch_all(&mut *tx)
        .await?;

        let candidates = with_terms(&mut tx, rows, false).await?;
        tx.commit().await?;
        Ok(candidates)
    }
}
