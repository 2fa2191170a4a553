//! Movie embeddings and similarity search.
//!
//! This crate provides:
//! - Signal trait and implementations for per-movie features
//! - EmbeddingBuilder for combining weighted signals into one table
//! - SimilarityIndex for k-nearest-neighbour queries
//! - Export helpers for external consumers of the embeddings
//!
//! ## Architecture
//! Embeddings are built in stages:
//! 1. Each signal computes one row per movie (content, collaborative)
//! 2. Rows are normalized, weighted and concatenated into an EmbeddingTable
//! 3. The SimilarityIndex answers nearest-neighbour queries over the table
//!
//! ## Example Usage
//! ```ignore
//! use embeddings::{CollaborativeSignal, ContentSignal, EmbeddingBuilder, SimilarityIndex};
//! use std::sync::Arc;
//!
//! let table = EmbeddingBuilder::new()
//!     .add_signal(ContentSignal::new(), 1.0)
//!     .add_signal(CollaborativeSignal::new(), 0.5)
//!     .build(&data_index)?;
//!
//! let index = SimilarityIndex::new(Arc::new(table));
//! let similar = index.query("the_promise-das_versprechen-en-1995", 10)?;
//! ```

pub mod builder;
pub mod collaborative;
pub mod content;
pub mod export;
pub mod similarity;
pub mod traits;

// Re-export main types
pub use builder::{EmbeddingBuilder, EmbeddingTable};
pub use collaborative::CollaborativeSignal;
pub use content::ContentSignal;
pub use export::{EmbeddingRow, ProjectedPoint};
pub use similarity::{SimilarMovie, SimilarityIndex};
pub use traits::Signal;
