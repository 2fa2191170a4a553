//! Hybrid movie recommender.
//!
//! This crate exposes the `RecommenderSystem` trait and its hybrid
//! implementation, which combines:
//! - the merged movie table (`catalog`)
//! - content + collaborative embeddings and similarity search (`embeddings`)
//! - user favorites and the highly rated pool (`sources`)
//! - the randomized recommendation policy (`policy`)
//!
//! ## Example Usage
//! ```ignore
//! use recommender::{HybridRecommenderSystem, RecommenderSystem};
//!
//! let system = HybridRecommenderSystem::new(&ratings, &metadata, &keywords, &credits)?;
//! let for_user = system.recommend_movies_to_user(25, 10)?;
//! let similar = system.recommend_similar_movies("the_promise-das_versprechen-en-1995", 5)?;
//! ```

pub mod config;
pub mod hybrid;
pub mod policy;
pub mod traits;
pub mod types;

pub use config::RecommenderConfig;
pub use hybrid::HybridRecommenderSystem;
pub use policy::{allocate, RecommendationPolicy};
pub use traits::RecommenderSystem;
pub use types::{MovieRecommendation, RecommendationSource};

// Re-export the error type so callers need only this crate
pub use catalog::{RecommenderError, Result};
