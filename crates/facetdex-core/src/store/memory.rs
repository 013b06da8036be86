//! In-memory [`Store`] implementation for tests and embedded use.
//!
//! Documents, the [`TextIndex`], and facet terms live in a single `State`
//! behind one `std::sync::RwLock`. Writers hold the write lock for the whole
//! mutation, so a reader never sees a document without its index entry or
//! terms. Ids come from a high-water counter and are never reused.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::facet::normalize_terms;
use crate::models::{
    from_millis, next_update_millis, now_millis, Candidate, Document, FieldWeights, NewDocument,
    Terms,
};
use crate::text_index::TextIndex;

use super::Store;

struct StoredDoc {
    dataset: String,
    location: String,
    title: String,
    body: String,
    revision: i64,
    created_at: i64,
    updated_at: i64,
    terms: Terms,
}

impl StoredDoc {
    fn to_document(&self, id: i64) -> Document {
        Document {
            id,
            dataset: self.dataset.clone(),
            location: self.location.clone(),
            title: self.title.clone(),
            body: self.body.clone(),
            revision: self.revision,
            created_at: from_millis(self.created_at),
            updated_at: from_millis(self.updated_at),
            terms: self.terms.clone(),
        }
    }
}

#[derive(Default)]
struct State {
    docs: BTreeMap<i64, StoredDoc>,
    keys: HashMap<(String, String), i64>,
    text: TextIndex,
    last_id: i64,
}

impl State {
    fn lookup(&self, dataset: &str, location: &str) -> Option<i64> {
        self.keys
            .get(&(dataset.to_string(), location.to_string()))
            .copied()
    }

    fn insert(&mut self, doc: &NewDocument<'_>) -> i64 {
        self.last_id += 1;
        let id = self.last_id;
        let now = now_millis();
        self.docs.insert(
            id,
            StoredDoc {
                dataset: doc.dataset.to_string(),
                location: doc.location.to_string(),
                title: doc.title.to_string(),
                body: doc.body.to_string(),
                revision: 1,
                created_at: now,
                updated_at: now,
                terms: normalize_terms(doc.terms),
            },
        );
        self.keys
            .insert((doc.dataset.to_string(), doc.location.to_string()), id);
        self.text.add(id, doc.title, doc.body, doc.location);
        id
    }

    fn update(&mut self, id: i64, doc: &NewDocument<'_>) {
        if let Some(stored) = self.docs.get_mut(&id) {
            stored.title = doc.title.to_string();
            stored.body = doc.body.to_string();
            stored.revision += 1;
            stored.updated_at = next_update_millis(stored.updated_at);
            self.text.add(id, &stored.title, &stored.body, &stored.location);
        }
    }
}

/// In-memory store backed by a [`TextIndex`].
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn get_document(&self, dataset: &str, location: &str) -> Result<Option<Document>> {
        let state = self.read()?;
        Ok(state
            .lookup(dataset, location)
            .and_then(|id| state.docs.get(&id).map(|d| d.to_document(id))))
    }

    async fn insert_document(&self, doc: &NewDocument<'_>) -> Result<Option<i64>> {
        let mut state = self.write()?;
        if state.lookup(doc.dataset, doc.location).is_some() {
            return Ok(None);
        }
        Ok(Some(state.insert(doc)))
    }

    async fn update_document(&self, doc: &NewDocument<'_>) -> Result<bool> {
        let mut state = self.write()?;
        match state.lookup(doc.dataset, doc.location) {
            Some(id) => {
                state.update(id, doc);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn upsert_document(&self, doc: &NewDocument<'_>) -> Result<i64> {
        let mut state = self.write()?;
        match state.lookup(doc.dataset, doc.location) {
            Some(id) => {
                state.update(id, doc);
                Ok(id)
            }
            None => Ok(state.insert(doc)),
        }
    }

    async fn delete_document(&self, dataset: &str, location: &str) -> Result<bool> {
        let mut state = self.write()?;
        let Some(id) = state
            .keys
            .remove(&(dataset.to_string(), location.to_string()))
        else {
            return Ok(false);
        };
        state.docs.remove(&id);
        state.text.remove(id);
        Ok(true)
    }

    async fn count_documents(&self, dataset: &str) -> Result<i64> {
        let state = self.read()?;
        Ok(state.docs.values().filter(|d| d.dataset == dataset).count() as i64)
    }

    async fn text_candidates(
        &self,
        dataset: &str,
        query: &str,
        weights: &FieldWeights,
    ) -> Result<Vec<Candidate>> {
        let state = self.read()?;
        Ok(state
            .text
            .search(query, weights)
            .into_iter()
            .filter_map(|(id, relevance)| {
                let stored = state.docs.get(&id)?;
                (stored.dataset == dataset).then(|| Candidate {
                    document: stored.to_document(id),
                    relevance,
                })
            })
            .collect())
    }

    async fn scan_candidates(&self, dataset: &str) -> Result<Vec<Candidate>> {
        let state = self.read()?;
        Ok(state
            .docs
            .iter()
            .filter(|(_, d)| d.dataset == dataset)
            .map(|(id, d)| Candidate {
                document: d.to_document(*id),
                relevance: 0.0,
            })
            .collect())
    }
}
