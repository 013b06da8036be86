//! # facetdex Core
//!
//! Storage-agnostic logic for facetdex: data models, text analysis, the
//! in-memory BM25 text index, facet matching, the [`store::Store`]
//! abstraction, the search planner, and the [`engine::Engine`] façade.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! backend-specific dependencies. The SQLite backend lives in the
//! `facetdex` crate.
//!
//! ```rust
//! use facetdex_core::engine::{Engine, EngineOptions};
//! use facetdex_core::search::SearchRequest;
//! use facetdex_core::store::memory::InMemoryStore;
//!
//! # async fn demo() -> facetdex_core::Result<()> {
//! let engine = Engine::new(InMemoryStore::new(), EngineOptions::default()).await?;
//! engine
//!     .insert("health", "couch-to-5k", "Running", "An article about running.", &Default::default())
//!     .await?;
//! let hits = engine.search(&SearchRequest::new("health").query("runs")).await?;
//! assert_eq!(hits.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod engine;
pub mod error;
pub mod facet;
pub mod models;
pub mod search;
pub mod store;
pub mod text_index;

pub use error::{Error, Result};
