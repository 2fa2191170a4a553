//! Collaborative signal from co-rating patterns.
//!
//! ## Algorithm
//! 1. Mean-center every user's ratings (so "liked" is relative to the user)
//! 2. Hash every user to one of `dimensions` buckets with a +/-1 sign
//! 3. A movie's row is the sum of its raters' signed, centered ratings
//!
//! Movies liked by the same users end up pointing in the same direction.
//! The hashing is a fixed function of the user id, so rows are deterministic.

use crate::traits::Signal;
use catalog::{DataIndex, Result, UserId};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Feature-hashed item vectors built from the ratings table.
#[derive(Debug, Clone)]
pub struct CollaborativeSignal {
    dimensions: usize,
}

impl CollaborativeSignal {
    pub fn new() -> Self {
        Self { dimensions: 64 }
    }

    /// Configure the row width (default: 64)
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions.max(1);
        self
    }

    /// Bucket and sign assigned to a user
    fn bucket(&self, user_id: UserId) -> (usize, f32) {
        let hash = splitmix64(user_id as u64);
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
        (bucket, sign)
    }
}

impl Default for CollaborativeSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl Signal for CollaborativeSignal {
    fn name(&self) -> &str {
        "collaborative"
    }

    #[instrument(skip_all, fields(movies = data_index.len(), dimensions = self.dimensions))]
    fn compute(&self, data_index: &DataIndex) -> Result<Vec<Vec<f32>>> {
        let user_means: HashMap<UserId, f32> = data_index
            .user_ids()
            .map(|user_id| {
                let ratings = data_index.get_user_ratings(user_id);
                let total: f32 = ratings.iter().map(|r| r.rating).sum();
                (user_id, total / ratings.len().max(1) as f32)
            })
            .collect();
        debug!("Centering ratings for {} users", user_means.len());

        let rows = data_index
            .movie_ids()
            .par_iter()
            .map(|movie_id| {
                let mut row = vec![0.0f32; self.dimensions];
                for rating in data_index.get_movie_ratings(movie_id) {
                    let mean = user_means.get(&rating.user_id).copied().unwrap_or(0.0);
                    let (bucket, sign) = self.bucket(rating.user_id);
                    row[bucket] += sign * (rating.rating - mean);
                }
                row
            })
            .collect();

        Ok(rows)
    }
}

/// SplitMix64 finalizer, a fixed and well-mixed 64-bit hash
fn splitmix64(value: u64) -> u64 {
    let mut z = value.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
