//! Facet terms: normalization on write and filter evaluation on read.
//!
//! A facet filter maps field names to acceptable values. A document
//! qualifies when, for every requested field, at least one requested value
//! is among the document's values for that field: AND across fields, OR
//! within a field.

use std::collections::{BTreeMap, HashSet};

use crate::models::{MatchCounts, Terms};

/// Requested facet constraints: field → acceptable values.
pub type FacetFilter = BTreeMap<String, Vec<String>>;

/// Drop duplicate values per field (keeping first-seen order) and fields left empty.
pub fn normalize_terms(terms: &Terms) -> Terms {
    terms
        .iter()
        .filter_map(|(field, values)| {
            let mut seen = HashSet::new();
            let distinct: Vec<String> = values
                .iter()
                .filter(|v| seen.insert(v.as_str()))
                .cloned()
                .collect();
            (!distinct.is_empty()).then(|| (field.clone(), distinct))
        })
        .collect()
}

/// Flatten terms into `(field, value)` tuples in write order.
pub fn term_tuples(terms: &Terms) -> impl Iterator<Item = (&str, &str)> {
    terms
        .iter()
        .flat_map(|(f, vs)| vs.iter().map(move |v| (f.as_str(), v.as_str())))
}

/// Append `(field, value)` to `terms` unless already present.
pub fn push_term(terms: &mut Terms, field: String, value: String) {
    let values = terms.entry(field).or_default();
    if !values.contains(&value) {
        values.push(value);
    }
}

/// Evaluate `filter` against a document's `terms`.
///
/// Returns the per-field count of distinct requested values found on the
/// document when every requested field has at least one hit, `None`
/// otherwise. A field requested with an empty value list can never match.
pub fn match_terms(filter: &FacetFilter, terms: &Terms) -> Option<MatchCounts> {
    let mut matched = MatchCounts::new();
    for (field, wanted) in filter {
        let present = terms.get(field)?;
        let mut seen = HashSet::new();
        let count = wanted
            .iter()
            .filter(|v| seen.insert(v.as_str()) && present.contains(*v))
            .count();
        if count == 0 {
            return None;
        }
        matched.insert(field.clone(), count);
    }
    Some(matched)
}
