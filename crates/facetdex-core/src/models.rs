//! Core data models shared by every backend.
//!
//! These types represent the documents, facet terms, and search hits that
//! flow between the engine, the store, and callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Facet mapping: field name → distinct values, in first-write order.
pub type Terms = BTreeMap<String, Vec<String>>;

/// Per-field count of requested facet values found on a document.
pub type MatchCounts = BTreeMap<String, usize>;

/// A stored document together with its facet terms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: i64,
    pub dataset: String,
    pub location: String,
    pub title: String,
    pub body: String,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "term")]
    pub terms: Terms,
}

/// Borrowed write payload for insert, update, and upsert.
///
/// `terms` is only consulted when the write creates the document.
#[derive(Debug, Clone, Copy)]
pub struct NewDocument<'a> {
    pub dataset: &'a str,
    pub location: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub terms: &'a Terms,
}

/// A candidate produced by the text index or a full dataset scan.
///
/// Carries the full document so the planner needs no further store reads.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub document: Document,
    /// BM25 score (lower is better), or `0.0` for unranked scans.
    pub relevance: f64,
}

/// Facet evidence attached to a [`SearchHit`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetEvidence {
    /// Full term mapping; emitted when no facet filter was applied.
    Term(Terms),
    /// Requested-value hit counts; emitted when a facet filter was applied.
    Matched(MatchCounts),
}

/// One entry in a search result sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: i64,
    pub dataset: String,
    pub location: String,
    pub title: String,
    pub body: String,
    pub relevance: f64,
    #[serde(flatten)]
    pub evidence: FacetEvidence,
}

impl SearchHit {
    /// The full term mapping, if this hit was produced without a facet filter.
    pub fn terms(&self) -> Option<&Terms> {
        match &self.evidence {
            FacetEvidence::Term(t) => Some(t),
            FacetEvidence::Matched(_) => None,
        }
    }

    /// The per-field match counts, if a facet filter was applied.
    pub fn matched(&self) -> Option<&MatchCounts> {
        match &self.evidence {
            FacetEvidence::Matched(m) => Some(m),
            FacetEvidence::Term(_) => None,
        }
    }
}

/// Relative BM25 weights of the three indexed fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldWeights {
    #[serde(default = "default_title_weight")]
    pub title: f64,
    #[serde(default = "default_body_weight")]
    pub body: f64,
    #[serde(default = "default_location_weight")]
    pub location: f64,
}

fn default_title_weight() -> f64 {
    5.0
}
fn default_body_weight() -> f64 {
    3.0
}
fn default_location_weight() -> f64 {
    1.0
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            title: default_title_weight(),
            body: default_body_weight(),
            location: default_location_weight(),
        }
    }
}

impl FieldWeights {
    /// Weights in index column order: title, body, location.
    pub fn as_array(&self) -> [f64; 3] {
        [self.title, self.body, self.location]
    }

    /// Checks that every weight is finite and non-negative and at least one is positive.
    pub fn validate(&self) -> Result<(), String> {
        let all = self.as_array();
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(format!(
                "field weights must be finite and >= 0 (title={}, body={}, location={})",
                self.title, self.body, self.location
            ));
        }
        if all.iter().all(|w| *w == 0.0) {
            return Err("at least one field weight must be > 0".to_string());
        }
        Ok(())
    }
}

/// Current time in Unix milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Timestamp for an update following `previous`: now, but strictly later than `previous`.
pub fn next_update_millis(previous: i64) -> i64 {
    now_millis().max(previous + 1)
}

/// Convert stored Unix milliseconds back into a UTC timestamp.
pub fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_ratio() {
        assert_eq!(FieldWeights::default().as_array(), [5.0, 3.0, 1.0]);
    }

    #[test]
    fn test_weights_validation() {
        assert!(FieldWeights::default().validate().is_ok());
        let negative = FieldWeights {
            body: -1.0,
            ..Default::default()
        };
        assert!(negative.validate().is_err());
        let zero = FieldWeights {
            title: 0.0,
            body: 0.0,
            location: 0.0,
        };
        assert!(zero.validate().is_err());
        let nan = FieldWeights {
            title: f64::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_next_update_is_strictly_later() {
        let future = now_millis() + 60_000;
        assert_eq!(next_update_millis(future), future + 1);
        assert!(next_update_millis(0) > 0);
    }

    #[test]
    fn test_hit_serializes_flat() {
        let mut matched = MatchCounts::new();
        matched.insert("ingredient".to_string(), 2);
        let hit = SearchHit {
            id: 2,
            dataset: "recipe".into(),
            location: "honey-soy-chicken".into(),
            title: "Honey Soy Chicken".into(),
            body: String::new(),
            relevance: 0.0,
            evidence: FacetEvidence::Matched(matched),
        };
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["matched"]["ingredient"], 2);
        assert!(json.get("term").is_none());
        assert!(hit.terms().is_none());
    }
}
