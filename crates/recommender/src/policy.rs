//! # Recommendation Policy
//!
//! Turns a user's favorites into recommendations. The branch taken depends
//! on how many favorites `m` the user has compared to the request size `k`:
//!
//! - `m == 0`: sample `k` movies from the highly rated pool
//! - `k <= m`: sample `k` favorites, one nearest neighbour each
//! - `k > m`: spread `k` over all favorites with [`allocate`]
//!
//! Recommendations never repeat and never include a movie the user already
//! rated, liked or not. A shortfall left by deduplication is backfilled from
//! the highly rated pool.
//!
//! All randomness comes from the caller's generator, so a seeded generator
//! reproduces the exact same list.

use crate::types::RecommendationSource;
use catalog::{MovieId, RecommenderError, Result};
use embeddings::SimilarityIndex;
use rand::Rng;
use rand::seq::index::sample;
use sources::UserContext;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// Split `k` recommendations across `m` favorites.
///
/// Every favorite gets `k / m`; the last `k % m` favorites get one more.
/// `allocate(10, 3)` is `[3, 3, 4]`.
pub fn allocate(k: usize, m: usize) -> Vec<usize> {
    if m == 0 {
        return Vec::new();
    }

    let base = k / m;
    let remainder = k % m;
    (0..m)
        .map(|i| if i < m - remainder { base } else { base + 1 })
        .collect()
}

/// A recommended movie id, before it is joined with the movie table
#[derive(Debug, Clone, PartialEq)]
pub struct Pick {
    pub movie_id: MovieId,
    pub score: Option<f32>,
    pub source: RecommendationSource,
}

/// Borrowed view of the read-only state the policy needs
#[derive(Debug, Clone, Copy)]
pub struct RecommendationPolicy<'a> {
    similarity: &'a SimilarityIndex,
    highly_rated: &'a [MovieId],
}

impl<'a> RecommendationPolicy<'a> {
    pub fn new(similarity: &'a SimilarityIndex, highly_rated: &'a [MovieId]) -> Self {
        Self {
            similarity,
            highly_rated,
        }
    }

    /// Pick up to `k` movies the user has not rated yet.
    ///
    /// Favorites are iterated in ascending id order, which fixes which
    /// favorites receive the extra recommendations in the `k > m` case.
    #[instrument(
        skip(self, context, rng),
        fields(user_id = context.user_id, favorites = context.favorites.len())
    )]
    pub fn recommend<R: Rng + ?Sized>(
        &self,
        context: &UserContext,
        k: usize,
        rng: &mut R,
    ) -> Result<Vec<Pick>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut exclude: HashSet<MovieId> = context
            .watched_movies
            .iter()
            .chain(&context.favorites)
            .cloned()
            .collect();
        if context.favorites.is_empty() {
            return self.from_highly_rated(k, &exclude, rng);
        }

        let ordered: Vec<&MovieId> = context.favorites.iter().collect();
        let mut picks = Vec::with_capacity(k);

        if k <= ordered.len() {
            // Sampled favorites are processed in draw order
            for position in sample(rng, ordered.len(), k).into_iter() {
                self.push_similar(ordered[position], 1, &mut exclude, &mut picks)?;
            }
        } else {
            for (favorite, count) in ordered.iter().zip(allocate(k, ordered.len())) {
                self.push_similar(favorite, count, &mut exclude, &mut picks)?;
            }
        }

        if picks.len() < k {
            let shortfall = k - picks.len();
            debug!(shortfall, "Backfilling from the highly rated pool");
            picks.extend(self.sample_highly_rated(shortfall, &exclude, rng));
        }

        Ok(picks)
    }

    fn from_highly_rated<R: Rng + ?Sized>(
        &self,
        k: usize,
        exclude: &HashSet<MovieId>,
        rng: &mut R,
    ) -> Result<Vec<Pick>> {
        let picks = self.sample_highly_rated(k, exclude, rng);
        if picks.is_empty() {
            return Err(RecommenderError::InsufficientData(
                "user has no favorites and no unwatched highly rated movie".to_string(),
            ));
        }
        Ok(picks)
    }

    /// Append the `count` nearest neighbours of `favorite` not yet excluded
    fn push_similar(
        &self,
        favorite: &str,
        count: usize,
        exclude: &mut HashSet<MovieId>,
        picks: &mut Vec<Pick>,
    ) -> Result<()> {
        for similar in self.similarity.query_excluding(favorite, count, exclude)? {
            exclude.insert(similar.movie_id.clone());
            picks.push(Pick {
                movie_id: similar.movie_id,
                score: Some(similar.score),
                source: RecommendationSource::SimilarTo(favorite.to_string()),
            });
        }
        Ok(())
    }

    /// Uniform sample without replacement, fewer when the pool runs out
    fn sample_highly_rated<R: Rng + ?Sized>(
        &self,
        count: usize,
        exclude: &HashSet<MovieId>,
        rng: &mut R,
    ) -> Vec<Pick> {
        let candidates: Vec<&MovieId> = self
            .highly_rated
            .iter()
            .filter(|movie_id| !exclude.contains(*movie_id))
            .collect();
        let amount = count.min(candidates.len());

        sample(rng, candidates.len(), amount)
            .into_iter()
            .map(|position| Pick {
                movie_id: candidates[position].clone(),
                score: None,
                source: RecommendationSource::HighlyRated,
            })
            .collect()
    }
}
