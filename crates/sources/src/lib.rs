//! # Sources Crate
//!
//! This crate derives the inputs of the recommendation policy from the
//! ratings table.
//!
//! ## Components
//!
//! ### Preferences
//! Per-user view of the ratings table:
//! - Watched movies and the latest rating for each
//! - Favorites: movies rated at or above a "liked" threshold
//!
//! ### Highly Rated Pool
//! Movies whose average rating reaches the global mean rating. Used when a
//! user has no favorites, and to backfill short recommendation lists.
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{preferences::favorites, HighlyRatedPool, DEFAULT_LIKE_THRESHOLD};
//! use std::sync::Arc;
//!
//! let favorites = favorites(&data_index, user_id, DEFAULT_LIKE_THRESHOLD);
//! let fallback = HighlyRatedPool::new(data_index.clone()).movies();
//! ```

// Public modules
pub mod highly_rated;
pub mod preferences;

// Re-export commonly used types
pub use highly_rated::HighlyRatedPool;
pub use preferences::{build_user_context, favorites, UserContext, DEFAULT_LIKE_THRESHOLD};
