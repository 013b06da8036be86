//! # facetdex
//!
//! An embeddable document index with ranked full-text search and
//! multi-valued facet filtering.
//!
//! Documents are keyed by `(dataset, location)`, carry a title and body
//! for BM25-ranked full-text search, and can be tagged with caller-defined
//! `(field, value)` terms. A search combines an optional text query with an
//! optional facet filter (AND across fields, OR within a field).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────────┐
//! │ Engine       │──▶│ Store trait │──▶│ SqliteStore      │
//! │ validate+log │   │ (async)     │   │ doc/doc_fts/term │
//! └──────┬───────┘   └─────────────┘   └──────────────────┘
//!        │                  │
//!        ▼                  ▼
//! ┌──────────────┐   ┌─────────────────┐
//! │ search       │   │ InMemoryStore   │
//! │ rank+facets  │   │ BM25 TextIndex  │
//! └──────────────┘   └─────────────────┘
//! ```
//!
//! The storage-agnostic pieces live in [`facetdex_core`]; this crate adds
//! the SQLite backend, TOML configuration, and the `fdx` binary.
//!
//! ## Quick Start
//!
//! ```bash
//! fdx init
//! fdx insert recipe honey-soy-chicken "Honey Soy Chicken" "Lots of chicken" --term ingredient=honey
//! fdx search recipe chicken --facet ingredient=honey
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema setup |
//! | [`sqlite_store`] | SQLite implementation of [`Store`] |

pub mod config;
pub mod db;
pub mod migrate;
pub mod sqlite_store;

pub use facetdex_core::engine::{Engine, EngineOptions};
pub use facetdex_core::facet::FacetFilter;
pub use facetdex_core::models::{Document, FieldWeights, SearchHit, Terms};
pub use facetdex_core::search::SearchRequest;
pub use facetdex_core::store::memory::InMemoryStore;
pub use facetdex_core::store::Store;
pub use facetdex_core::{Error, Result};
pub use sqlite_store::SqliteStore;
