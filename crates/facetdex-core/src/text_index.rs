//! In-memory field-weighted inverted index with BM25 ranking.
//!
//! Each document contributes three fields (title, body, location). Postings
//! record per-field term frequencies so that field weights can be applied
//! at query time.
//!
//! # Scoring
//!
//! The score is the BM25 variant used by SQLite FTS5, so this index and the
//! SQLite backend rank identically:
//!
//! ```text
//! idf(q)  = ln((N - n(q) + 0.5) / (n(q) + 0.5)), clamped to 1e-6 if <= 0
//! f(q, D) = Σ_field weight_field × tf_field(q, D)
//! score   = -Σ_q idf(q) × f × (k1 + 1) / (f + k1 × (1 - b + b × |D| / avgdl))
//! ```
//!
//! `|D|` is the token count over all fields and `avgdl` its mean over the
//! whole index. Scores are negative; lower is better.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::analysis::Analyzer;
use crate::models::FieldWeights;

const K1: f64 = 1.2;
const B: f64 = 0.75;
const MIN_IDF: f64 = 1e-6;
const FIELD_COUNT: usize = 3;

type FieldFreqs = [u32; FIELD_COUNT];

struct Entry {
    tokens: HashSet<String>,
    len: u64,
}

/// Inverted index keyed by document id.
#[derive(Default)]
pub struct TextIndex {
    analyzer: Analyzer,
    postings: HashMap<String, BTreeMap<i64, FieldFreqs>>,
    entries: HashMap<i64, Entry>,
    total_len: u64,
}

impl TextIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.entries.contains_key(&id)
    }

    /// Index `title`, `body`, and `location` for `id`, replacing any previous entry.
    pub fn add(&mut self, id: i64, title: &str, body: &str, location: &str) {
        self.remove(id);

        let mut freqs: HashMap<String, FieldFreqs> = HashMap::new();
        let mut len = 0u64;
        for (field, text) in [title, body, location].into_iter().enumerate() {
            for token in self.analyzer.analyze(text) {
                freqs.entry(token).or_insert([0; FIELD_COUNT])[field] += 1;
                len += 1;
            }
        }

        let tokens: HashSet<String> = freqs.keys().cloned().collect();
        for (token, f) in freqs {
            self.postings.entry(token).or_default().insert(id, f);
        }
        self.total_len += len;
        self.entries.insert(id, Entry { tokens, len });
    }

    /// Drop the entry for `id`. Returns `false` if it was not indexed.
    pub fn remove(&mut self, id: i64) -> bool {
        let Some(entry) = self.entries.remove(&id) else {
            return false;
        };
        for token in &entry.tokens {
            if let Some(list) = self.postings.get_mut(token) {
                list.remove(&id);
                if list.is_empty() {
                    self.postings.remove(token);
                }
            }
        }
        self.total_len -= entry.len;
        true
    }

    /// Rank every document containing all words of `query`.
    ///
    /// Results are ordered by score ascending (best first), ties broken by
    /// id ascending. A query without words matches nothing.
    pub fn search(&self, query: &str, weights: &FieldWeights) -> Vec<(i64, f64)> {
        let terms = self.analyzer.analyze(query);
        if terms.is_empty() || self.entries.is_empty() {
            return Vec::new();
        }

        let mut lists = Vec::with_capacity(terms.len());
        for term in &terms {
            match self.postings.get(term) {
                Some(list) => lists.push(list),
                None => return Vec::new(),
            }
        }

        let n = self.entries.len() as f64;
        let avgdl = self.total_len as f64 / n;
        let w = weights.as_array();

        // Every list is non-empty; intersect starting from the shortest.
        let shortest = lists
            .iter()
            .min_by_key(|l| l.len())
            .copied()
            .unwrap_or(lists[0]);

        let mut hits: Vec<(i64, f64)> = shortest
            .keys()
            .filter(|id| lists.iter().all(|l| l.contains_key(id)))
            .map(|&id| {
                let dl = self.entries.get(&id).map(|e| e.len).unwrap_or(0) as f64;
                let norm = if avgdl > 0.0 {
                    K1 * (1.0 - B + B * dl / avgdl)
                } else {
                    K1
                };
                let score: f64 = lists
                    .iter()
                    .map(|list| {
                        let idf = idf(n, list.len() as f64);
                        let f: f64 = list[&id]
                            .iter()
                            .zip(w.iter())
                            .map(|(tf, wt)| *tf as f64 * wt)
                            .sum();
                        idf * (f * (K1 + 1.0)) / (f + norm)
                    })
                    .sum();
                (id, -score)
            })
            .collect();

        hits.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        hits
    }
}

fn idf(n: f64, hits: f64) -> f64 {
    let idf = ((n - hits + 0.5) / (hits + 0.5)).ln();
    if idf <= 0.0 {
        MIN_IDF
    } else {
        idf
    }
}
