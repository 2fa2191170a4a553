//! Highly rated pool - fallback candidates for users without favorites
//!
//! A movie is highly rated when its average rating is at or above the mean
//! of all ratings and it has enough ratings to trust that average.

use catalog::{DataIndex, MovieId};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Selects the highly rated subset of the movie table
#[derive(Debug, Clone)]
pub struct HighlyRatedPool {
    /// Shared reference to the data index (read-only, so no Mutex needed)
    data_index: Arc<DataIndex>,

    /// Minimum rating count for a movie to qualify
    min_rating_count: u32,
}

impl HighlyRatedPool {
    pub fn new(data_index: Arc<DataIndex>) -> Self {
        Self {
            data_index,
            min_rating_count: 1,
        }
    }

    /// Configure minimum rating count threshold (default: 1)
    pub fn with_min_rating_count(mut self, count: u32) -> Self {
        self.min_rating_count = count;
        self
    }

    /// The rating a movie's average must reach, `None` without ratings
    pub fn threshold(&self) -> Option<f32> {
        self.data_index.global_mean_rating()
    }

    /// Highly rated movies, in table order
    #[instrument(skip(self), fields(min_rating_count = self.min_rating_count))]
    pub fn movies(&self) -> Vec<MovieId> {
        let Some(threshold) = self.threshold() else {
            return Vec::new();
        };

        let pool: Vec<MovieId> = self
            .data_index
            .movie_ids()
            .par_iter()
            .filter(|movie_id| {
                self.data_index
                    .get_movie_stats(movie_id)
                    .is_some_and(|stats| {
                        stats.avg_rating >= threshold && stats.rating_count >= self.min_rating_count
                    })
            })
            .cloned()
            .collect();

        debug!("{} highly rated movies (threshold {:.2})", pool.len(), threshold);
        pool
    }
}
