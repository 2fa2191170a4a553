//! The capability set every recommender variant provides.

use crate::types::MovieRecommendation;
use catalog::{MovieId, Result, UserId};
use embeddings::EmbeddingRow;

/// Core trait for recommender systems.
///
/// `HybridRecommenderSystem` is one implementation; pure content-based or
/// pure collaborative variants would be siblings.
///
/// ## Design Note
/// - `Send + Sync` so one instance can serve concurrent callers
/// - All operations take `&self`: the tables are read-only after construction
pub trait RecommenderSystem: Send + Sync {
    /// Returns the name of this recommender (for logging/debugging)
    fn name(&self) -> &str;

    /// Recommend up to `k` movies to a user.
    ///
    /// # Returns
    /// * `Ok(rows)` - exactly `k` rows unless fewer distinct candidates exist
    /// * `Err(InsufficientData)` - nothing at all can be recommended
    fn recommend_movies_to_user(&self, user_id: UserId, k: usize)
    -> Result<Vec<MovieRecommendation>>;

    /// The `k` movies most similar to `movie_id`, never including itself.
    ///
    /// # Returns
    /// * `Ok(rows)` - `min(k, movies - 1)` rows, most similar first
    /// * `Err(UnknownMovie)` - `movie_id` is not in the movie table
    fn recommend_similar_movies(&self, movie_id: &str, k: usize)
    -> Result<Vec<MovieRecommendation>>;

    /// Embedding rows for `movie_ids`, in input order.
    ///
    /// # Returns
    /// * `Err(UnknownMovie)` - listing every id that is not embedded
    fn get_movies_embeddings(&self, movie_ids: &[MovieId]) -> Result<Vec<EmbeddingRow>>;
}
