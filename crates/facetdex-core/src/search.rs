//! Query planner combining ranked text retrieval with facet filtering.
//!
//! The planner operates entirely through the [`Store`] trait.
//!
//! # Algorithm
//!
//! 1. Reject an empty `dataset` with [`Error::MissingArgument`].
//! 2. Candidates: if the query has any non-whitespace content, ask the
//!    store for ranked text candidates (relevance ascending, id ascending);
//!    otherwise scan the dataset (relevance `0`, id ascending).
//! 3. With a non-empty facet filter, keep only candidates that hit every
//!    requested field and attach the per-field `matched` counts. Without
//!    one, attach the full `term` mapping.
//! 4. Return the survivors in candidate order. Filtering never re-ranks.

use crate::error::{require, Result};
use crate::facet::{match_terms, FacetFilter};
use crate::models::{Candidate, FacetEvidence, FieldWeights, SearchHit};
use crate::store::Store;

/// Bundles all inputs for a single search invocation.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    /// Namespace to search. Required.
    pub dataset: &'a str,
    /// Free-text query. Absent or blank means "every document".
    pub query: Option<&'a str>,
    /// Facet constraints. Absent or empty means "no filtering".
    pub facets: Option<&'a FacetFilter>,
}

impl<'a> SearchRequest<'a> {
    pub fn new(dataset: &'a str) -> Self {
        Self {
            dataset,
            query: None,
            facets: None,
        }
    }

    pub fn query(mut self, query: &'a str) -> Self {
        self.query = Some(query);
        self
    }

    pub fn facets(mut self, facets: &'a FacetFilter) -> Self {
        self.facets = Some(facets);
        self
    }

    /// The query text, if it has anything besides whitespace.
    fn ranked_query(&self) -> Option<&'a str> {
        self.query.filter(|q| !q.trim().is_empty())
    }

    fn active_facets(&self) -> Option<&'a FacetFilter> {
        self.facets.filter(|f| !f.is_empty())
    }
}

/// Run a combined text + facet search against a [`Store`] backend.
pub async fn search<S: Store + ?Sized>(
    store: &S,
    req: &SearchRequest<'_>,
    weights: &FieldWeights,
) -> Result<Vec<SearchHit>> {
    require("dataset", req.dataset)?;

    let candidates = match req.ranked_query() {
        Some(query) => store.text_candidates(req.dataset, query, weights).await?,
        None => store.scan_candidates(req.dataset).await?,
    };

    Ok(apply_facets(candidates, req.active_facets()))
}

/// Turn ordered candidates into hits, dropping those that fail `filter`.
pub fn apply_facets(candidates: Vec<Candidate>, filter: Option<&FacetFilter>) -> Vec<SearchHit> {
    candidates
        .into_iter()
        .filter_map(|Candidate { document: doc, relevance }| {
            let evidence = match filter {
                Some(f) => FacetEvidence::Matched(match_terms(f, &doc.terms)?),
                None => FacetEvidence::Term(doc.terms),
            };
            Some(SearchHit {
                id: doc.id,
                dataset: doc.dataset,
                location: doc.location,
                title: doc.title,
                body: doc.body,
                relevance,
                evidence,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{from_millis, Document, Terms};

    fn candidate(id: i64, relevance: f64, ingredients: &[&str]) -> Candidate {
        let mut terms = Terms::new();
        if !ingredients.is_empty() {
            terms.insert(
                "ingredient".to_string(),
                ingredients.iter().map(|s| s.to_string()).collect(),
            );
        }
        Candidate {
            document: Document {
                id,
                dataset: "recipe".to_string(),
                location: format!("r{}", id),
                title: String::new(),
                body: String::new(),
                revision: 1,
                created_at: from_millis(0),
                updated_at: from_millis(0),
                terms,
            },
            relevance,
        }
    }

    fn filter(values: &[&str]) -> FacetFilter {
        let mut f = FacetFilter::new();
        f.insert(
            "ingredient".to_string(),
            values.iter().map(|s| s.to_string()).collect(),
        );
        f
    }

    #[test]
    fn test_no_filter_carries_terms() {
        let hits = apply_facets(vec![candidate(1, 0.0, &["chicken"])], None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].terms().unwrap()["ingredient"], vec!["chicken"]);
        assert!(hits[0].matched().is_none());
    }

    #[test]
    fn test_filter_preserves_candidate_order() {
        let candidates = vec![
            candidate(3, -2.0, &["chicken", "honey"]),
            candidate(1, -1.5, &["beef"]),
            candidate(2, -1.0, &["chicken"]),
        ];
        let f = filter(&["chicken", "honey"]);
        let hits = apply_facets(candidates, Some(&f));
        assert_eq!(hits.iter().map(|h| h.id).collect::<Vec<_>>(), vec![3, 2]);
        assert_eq!(hits[0].matched().unwrap()["ingredient"], 2);
        assert_eq!(hits[1].matched().unwrap()["ingredient"], 1);
        assert_eq!(hits[0].relevance, -2.0);
    }

    #[test]
    fn test_request_normalizes_blank_inputs() {
        let empty = FacetFilter::new();
        let req = SearchRequest::new("recipe").query("   ").facets(&empty);
        assert_eq!(req.ranked_query(), None);
        assert!(req.active_facets().is_none());
    }
}
