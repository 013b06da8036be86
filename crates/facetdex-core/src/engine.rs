//! Public façade over a [`Store`]: argument validation, diagnostics, and
//! delegation to the store and the search planner.
//!
//! The engine owns the store value it is handed but never opens, closes,
//! or deletes the underlying database. It keeps no mutable state of its
//! own, so an `Engine` can be shared behind an `Arc` whenever its store is
//! `Send + Sync`.
//!
//! # Facet terms and updates
//!
//! Terms are attached only when a document is created (`insert`, or
//! `upsert` taking the insert branch). `update` and the update branch of
//! `upsert` never add, change, or remove terms; delete and re-insert a
//! document to change them.

use tracing::debug;

use crate::error::{require, Error, Result};
use crate::models::{Document, FieldWeights, NewDocument, SearchHit, Terms};
use crate::search::{self, SearchRequest};
use crate::store::Store;

/// Construction options for [`Engine`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    /// BM25 field weights, fixed for the lifetime of the engine.
    pub weights: FieldWeights,
    /// Emit a `debug` event with inputs and outcome for every operation.
    pub debug: bool,
}

/// Indexing and query engine over a transactional [`Store`].
pub struct Engine<S> {
    store: S,
    weights: FieldWeights,
    debug: bool,
}

impl<S: Store> Engine<S> {
    /// Validate `options` and run the store's idempotent schema setup.
    pub async fn new(store: S, options: EngineOptions) -> Result<Self> {
        options.weights.validate().map_err(Error::InvalidConfig)?;
        store.ensure_schema().await?;
        Ok(Self {
            store,
            weights: options.weights,
            debug: options.debug,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn weights(&self) -> &FieldWeights {
        &self.weights
    }

    /// Look up a document (with its terms) by natural key.
    pub async fn get(&self, dataset: &str, location: &str) -> Result<Option<Document>> {
        require_key(dataset, location)?;
        let doc = self.store.get_document(dataset, location).await?;
        if self.debug {
            debug!(
                target: "facetdex::engine",
                dataset,
                location,
                found = doc.is_some(),
                revision = doc.as_ref().map(|d| d.revision),
                "get"
            );
        }
        Ok(doc)
    }

    /// Create a document. Fails with [`Error::Conflict`] if the key exists.
    pub async fn insert(
        &self,
        dataset: &str,
        location: &str,
        title: &str,
        body: &str,
        terms: &Terms,
    ) -> Result<i64> {
        require_key(dataset, location)?;
        require_term_fields(terms)?;
        let doc = NewDocument {
            dataset,
            location,
            title,
            body,
            terms,
        };
        let id = self.store.insert_document(&doc).await?;
        if self.debug {
            debug!(
                target: "facetdex::engine",
                dataset,
                location,
                title,
                terms = terms.len(),
                id,
                "insert"
            );
        }
        id.ok_or_else(|| Error::Conflict {
            dataset: dataset.to_string(),
            location: location.to_string(),
        })
    }

    /// Replace title and body. Returns `false` if no document matched.
    pub async fn update(
        &self,
        dataset: &str,
        location: &str,
        title: &str,
        body: &str,
    ) -> Result<bool> {
        require_key(dataset, location)?;
        let no_terms = Terms::new();
        let doc = NewDocument {
            dataset,
            location,
            title,
            body,
            terms: &no_terms,
        };
        let changed = self.store.update_document(&doc).await?;
        if self.debug {
            debug!(target: "facetdex::engine", dataset, location, title, changed, "update");
        }
        Ok(changed)
    }

    /// Insert with `terms` if absent, otherwise update content only.
    pub async fn upsert(
        &self,
        dataset: &str,
        location: &str,
        title: &str,
        body: &str,
        terms: &Terms,
    ) -> Result<i64> {
        require_key(dataset, location)?;
        require_term_fields(terms)?;
        let doc = NewDocument {
            dataset,
            location,
            title,
            body,
            terms,
        };
        let id = self.store.upsert_document(&doc).await?;
        if self.debug {
            debug!(
                target: "facetdex::engine",
                dataset,
                location,
                title,
                terms = terms.len(),
                id,
                "upsert"
            );
        }
        Ok(id)
    }

    /// Remove a document, its index entry, and its terms.
    pub async fn delete(&self, dataset: &str, location: &str) -> Result<bool> {
        require_key(dataset, location)?;
        let deleted = self.store.delete_document(dataset, location).await?;
        if self.debug {
            debug!(target: "facetdex::engine", dataset, location, deleted, "delete");
        }
        Ok(deleted)
    }

    /// Number of live documents in `dataset`.
    pub async fn count(&self, dataset: &str) -> Result<i64> {
        require("dataset", dataset)?;
        let count = self.store.count_documents(dataset).await?;
        if self.debug {
            debug!(target: "facetdex::engine", dataset, count, "count");
        }
        Ok(count)
    }

    /// Ranked and/or faceted search. See [`search::search`].
    pub async fn search(&self, req: &SearchRequest<'_>) -> Result<Vec<SearchHit>> {
        let hits = search::search(&self.store, req, &self.weights).await?;
        if self.debug {
            debug!(
                target: "facetdex::engine",
                dataset = req.dataset,
                query = req.query,
                facets = ?req.facets,
                hits = hits.len(),
                ids = ?hits.iter().map(|h| h.id).collect::<Vec<_>>(),
                "search"
            );
        }
        Ok(hits)
    }
}

/// Locations are opaque caller keys: only the empty string is rejected.
fn require_key(dataset: &str, location: &str) -> Result<()> {
    require("dataset", dataset)?;
    if location.is_empty() {
        return Err(Error::MissingArgument("location"));
    }
    Ok(())
}

fn require_term_fields(terms: &Terms) -> Result<()> {
    if terms.keys().any(|f| f.trim().is_empty()) {
        return Err(Error::MissingArgument("term field"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facet::FacetFilter;
    use crate::store::memory::InMemoryStore;

    async fn engine() -> Engine<InMemoryStore> {
        Engine::new(InMemoryStore::new(), EngineOptions::default())
            .await
            .unwrap()
    }

    fn terms(pairs: &[(&str, &str)]) -> Terms {
        let mut t = Terms::new();
        for (f, v) in pairs {
            crate::facet::push_term(&mut t, f.to_string(), v.to_string());
        }
        t
    }

    async fn insert_recipes(engine: &Engine<InMemoryStore>) {
        engine
            .insert(
                "recipe",
                "chicken-drumsticks",
                "Chicken Drumsticks",
                "Chicken drumsticks and things that go with it.",
                &terms(&[
                    ("ingredient", "chicken"),
                    ("cuisine", "american"),
                    ("difficulty", "easy"),
                    ("diet", "vegetarian"),
                ]),
            )
            .await
            .unwrap();
        engine
            .insert(
                "recipe",
                "honey-soy-chicken",
                "Honey Soy Chicken",
                "Lots of chicken, honey, and soy!",
                &terms(&[
                    ("ingredient", "chicken"),
                    ("ingredient", "honey"),
                    ("category", "appetiser"),
                    ("category", "desert"),
                    ("category", "dinner"),
                    ("cuisine", "chinese"),
                    ("difficulty", "hard"),
                    ("diet", "gluten-free"),
                ]),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insert_then_get_round_trip() {
        let engine = engine().await;
        let id = engine
            .insert("tweet", "jack/20", "", "just setting up my twttr", &Terms::new())
            .await
            .unwrap();
        let doc = engine.get("tweet", "jack/20").await.unwrap().unwrap();
        assert_eq!(doc.id, id);
        assert_eq!(doc.title, "");
        assert_eq!(doc.body, "just setting up my twttr");
        assert_eq!(doc.revision, 1);
        assert_eq!(doc.created_at, doc.updated_at);
        assert!(doc.terms.is_empty());
    }

    #[tokio::test]
    async fn test_insert_conflict() {
        let engine = engine().await;
        engine.insert("tweet", "a", "", "one", &Terms::new()).await.unwrap();
        let err = engine
            .insert("tweet", "a", "", "two", &Terms::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
        assert_eq!(engine.get("tweet", "a").await.unwrap().unwrap().body, "one");
    }

    #[tokio::test]
    async fn test_upsert_keeps_first_terms() {
        let engine = engine().await;
        let first = terms(&[("ingredient", "chicken")]);
        let second = terms(&[("ingredient", "beef")]);
        let a = engine.upsert("recipe", "x", "A", "", &first).await.unwrap();
        let b = engine.upsert("recipe", "x", "B", "", &second).await.unwrap();
        assert_eq!(a, b);
        let doc = engine.get("recipe", "x").await.unwrap().unwrap();
        assert_eq!(doc.revision, 2);
        assert_eq!(doc.title, "B");
        assert_eq!(doc.terms, first);
    }

    #[tokio::test]
    async fn test_revision_monotonic_and_noop_update() {
        let engine = engine().await;
        engine.insert("tweet", "w", "", "house", &Terms::new()).await.unwrap();
        assert!(!engine.update("wrong-dataset", "w", "", "").await.unwrap());
        assert!(!engine.update("tweet", "missing", "", "").await.unwrap());
        for i in 0..4 {
            assert!(engine.update("tweet", "w", &i.to_string(), "").await.unwrap());
        }
        let doc = engine.get("tweet", "w").await.unwrap().unwrap();
        assert_eq!(doc.revision, 5);
        assert!(doc.updated_at > doc.created_at);
    }

    #[tokio::test]
    async fn test_delete_cascade() {
        let engine = engine().await;
        insert_recipes(&engine).await;
        assert_eq!(engine.count("recipe").await.unwrap(), 2);
        assert!(engine.delete("recipe", "honey-soy-chicken").await.unwrap());
        assert!(engine.get("recipe", "honey-soy-chicken").await.unwrap().is_none());
        assert!(!engine.delete("recipe", "honey-soy-chicken").await.unwrap());
        assert_eq!(engine.count("recipe").await.unwrap(), 1);

        let hits = engine
            .search(&SearchRequest::new("recipe").query("honey"))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_facet_and_or_semantics() {
        let engine = engine().await;
        insert_recipes(&engine).await;

        let mut honey = FacetFilter::new();
        honey.insert("ingredient".into(), vec!["honey".into()]);
        let hits = engine
            .search(&SearchRequest::new("recipe").query("").facets(&honey))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].location, "honey-soy-chicken");
        assert_eq!(hits[0].matched().unwrap()["ingredient"], 1);

        let mut either = FacetFilter::new();
        either.insert("ingredient".into(), vec!["chicken".into(), "honey".into()]);
        let hits = engine
            .search(&SearchRequest::new("recipe").facets(&either))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].matched().unwrap()["ingredient"], 1);
        assert_eq!(hits[1].matched().unwrap()["ingredient"], 2);
    }

    #[tokio::test]
    async fn test_empty_query_scans_in_id_order() {
        let engine = engine().await;
        insert_recipes(&engine).await;
        for req in [
            SearchRequest::new("recipe"),
            SearchRequest::new("recipe").query(""),
        ] {
            let hits = engine.search(&req).await.unwrap();
            assert_eq!(hits.iter().map(|h| h.id).collect::<Vec<_>>(), vec![1, 2]);
            assert!(hits.iter().all(|h| h.relevance == 0.0));
            assert_eq!(hits[1].terms().unwrap()["ingredient"], vec!["chicken", "honey"]);
        }
    }

    #[tokio::test]
    async fn test_stemming_equivalence() {
        let engine = engine().await;
        let none = Terms::new();
        engine
            .insert(
                "health",
                "running-from-couch-to-5km",
                "Running: From Couch to 5KM",
                "This is an article about running.",
                &none,
            )
            .await
            .unwrap();
        engine
            .insert("health", "avocado-toast", "Avocado Toast", "How to eat it.", &none)
            .await
            .unwrap();

        let run = engine
            .search(&SearchRequest::new("health").query("run"))
            .await
            .unwrap();
        assert_eq!(run.len(), 1);
        for q in ["runs", "running"] {
            let hits = engine
                .search(&SearchRequest::new("health").query(q))
                .await
                .unwrap();
            assert_eq!(hits, run);
        }
        let ran = engine
            .search(&SearchRequest::new("health").query("ran"))
            .await
            .unwrap();
        assert!(ran.is_empty());
    }

    #[tokio::test]
    async fn test_namespace_isolation() {
        let engine = engine().await;
        engine
            .insert("recipe", "x", "Chicken", "chicken", &Terms::new())
            .await
            .unwrap();
        assert!(engine.get("car", "x").await.unwrap().is_none());
        assert!(engine
            .search(&SearchRequest::new("car").query("chicken"))
            .await
            .unwrap()
            .is_empty());
        assert!(engine.search(&SearchRequest::new("car")).await.unwrap().is_empty());
        assert_eq!(engine.count("car").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_arguments() {
        let engine = engine().await;
        assert!(matches!(
            engine.search(&SearchRequest::new("")).await,
            Err(Error::MissingArgument("dataset"))
        ));
        assert!(matches!(
            engine.get("recipe", "").await,
            Err(Error::MissingArgument("location"))
        ));
        assert!(matches!(
            engine.count(" ").await,
            Err(Error::MissingArgument("dataset"))
        ));
        let bad = terms(&[("", "x")]);
        assert!(matches!(
            engine.insert("recipe", "x", "", "", &bad).await,
            Err(Error::MissingArgument("term field"))
        ));
        assert_eq!(engine.count("recipe").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_whitespace_location_is_a_key() {
        let engine = engine().await;
        let id = engine
            .insert("recipe", " ", "Blank", "spaces only", &Terms::new())
            .await
            .unwrap();
        assert_eq!(engine.get("recipe", " ").await.unwrap().unwrap().id, id);
        assert!(engine.get("recipe", "  ").await.unwrap().is_none());
        assert!(engine.delete("recipe", " ").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_weights_rejected() {
        let options = EngineOptions {
            weights: FieldWeights {
                title: -1.0,
                ..Default::default()
            },
            debug: false,
        };
        let result = Engine::new(InMemoryStore::new(), options).await;
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
