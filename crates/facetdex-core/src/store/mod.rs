//! Storage abstraction for facetdex.
//!
//! The [`Store`] trait is the transactional contract the engine relies on.
//! Every write method is one atomic unit: the document row, its text-index
//! entry, and (on creation or delete) its facet terms change together or
//! not at all. Every read method observes one consistent snapshot.
//!
//! Backends maintain the derived structures with explicit statements inside
//! their own transaction, never through storage-engine triggers.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Candidate, Document, FieldWeights, NewDocument};

/// Abstract storage backend for facetdex.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`ensure_schema`](Store::ensure_schema) | Idempotent structure setup |
/// | [`get_document`](Store::get_document) | Lookup by natural key, with terms |
/// | [`insert_document`](Store::insert_document) | Create document + text entry + terms |
/// | [`update_document`](Store::update_document) | Replace content + text entry |
/// | [`upsert_document`](Store::upsert_document) | Insert or update on the natural key |
/// | [`delete_document`](Store::delete_document) | Remove document, text entry, terms |
/// | [`count_documents`](Store::count_documents) | Live documents in a dataset |
/// | [`text_candidates`](Store::text_candidates) | Ranked full-text candidates |
/// | [`scan_candidates`](Store::scan_candidates) | Every document in a dataset |
#[async_trait]
pub trait Store: Send + Sync {
    /// Create any missing tables and indexes. Safe to call repeatedly.
    async fn ensure_schema(&self) -> Result<()>;

    /// Retrieve a document and its terms by natural key.
    async fn get_document(&self, dataset: &str, location: &str) -> Result<Option<Document>>;

    /// Create a document with `revision = 1`, index it, and attach its terms.
    ///
    /// Returns `None`, writing nothing, if the natural key already exists.
    async fn insert_document(&self, doc: &NewDocument<'_>) -> Result<Option<i64>>;

    /// Replace title and body, bump the revision, and re-index.
    ///
    /// Terms are left untouched. Returns `false` if no document matched.
    async fn update_document(&self, doc: &NewDocument<'_>) -> Result<bool>;

    /// Insert (with terms) if absent, otherwise update content only.
    async fn upsert_document(&self, doc: &NewDocument<'_>) -> Result<i64>;

    /// Remove the document, its text-index entry, and all its terms.
    async fn delete_document(&self, dataset: &str, location: &str) -> Result<bool>;

    /// Number of live documents in `dataset`.
    async fn count_documents(&self, dataset: &str) -> Result<i64>;

    /// Ranked candidates for `query` within `dataset`.
    ///
    /// Ordered by relevance ascending (best first), then id ascending.
    async fn text_candidates(
        &self,
        dataset: &str,
        query: &str,
        weights: &FieldWeights,
    ) -> Result<Vec<Candidate>>;

    /// All documents in `dataset` with relevance `0.0`, ordered by id.
    async fn scan_candidates(&self, dataset: &str) -> Result<Vec<Candidate>>;
}
