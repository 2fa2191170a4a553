//! # Hybrid Recommender
//!
//! Wires every component together:
//! 1. Merge the raw tables into a DataIndex
//! 2. Embed every movie with content + collaborative signals
//! 3. Index the embeddings for similarity search
//! 4. Precompute the highly rated pool
//!
//! Everything except the random generator is read-only after construction.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, instrument};

use catalog::{
    DataIndex, MovieCredits, MovieId, MovieKeywords, MovieMetadata, Rating, RecommenderError,
    Result, UserId,
};
use embeddings::{
    CollaborativeSignal, ContentSignal, EmbeddingBuilder, EmbeddingRow, SimilarityIndex, export,
};
use sources::{HighlyRatedPool, build_user_context};

use crate::config::RecommenderConfig;
use crate::policy::{Pick, RecommendationPolicy};
use crate::traits::RecommenderSystem;
use crate::types::{MovieRecommendation, RecommendationSource};

/// Content + collaborative recommender over an in-memory movie table
#[derive(Debug)]
pub struct HybridRecommenderSystem {
    config: RecommenderConfig,
    data_index: Arc<DataIndex>,
    similarity: SimilarityIndex,
    highly_rated: Vec<MovieId>,
    /// Shared by concurrent callers; seeded from the OS unless injected
    rng: Mutex<StdRng>,
}

impl HybridRecommenderSystem {
    /// Build a recommender with the default configuration
    pub fn new(
        ratings: &[Rating],
        metadata: &[MovieMetadata],
        keywords: &[MovieKeywords],
        credits: &[MovieCredits],
    ) -> Result<Self> {
        Self::with_config(ratings, metadata, keywords, credits, RecommenderConfig::default())
    }

    /// Build a recommender from the raw tables
    ///
    /// # Errors
    /// * `DataIntegrity` - a metadata row or rating is malformed (strict policy)
    /// * `InsufficientData` - the merged movie table is empty
    #[instrument(skip_all, fields(movies = metadata.len(), ratings = ratings.len()))]
    pub fn with_config(
        ratings: &[Rating],
        metadata: &[MovieMetadata],
        keywords: &[MovieKeywords],
        credits: &[MovieCredits],
        config: RecommenderConfig,
    ) -> Result<Self> {
        let data_index = DataIndex::build(ratings, metadata, keywords, credits, &config.catalog)?;
        Self::from_index(Arc::new(data_index), config)
    }

    /// Build a recommender over an already merged DataIndex
    pub fn from_index(data_index: Arc<DataIndex>, config: RecommenderConfig) -> Result<Self> {
        let start = Instant::now();

        let table = EmbeddingBuilder::new()
            .add_signal(ContentSignal::new(), config.content_weight)
            .add_signal(CollaborativeSignal::new(), config.collaborative_weight)
            .build(&data_index)?;
        let similarity = SimilarityIndex::new(Arc::new(table));

        let highly_rated = HighlyRatedPool::new(data_index.clone())
            .with_min_rating_count(config.min_rating_count)
            .movies();

        info!(
            "Recommender ready: {} movies, {} dimensions, {} highly rated in {:.2?}",
            data_index.len(),
            similarity.table().dimensions(),
            highly_rated.len(),
            start.elapsed()
        );

        Ok(Self {
            config,
            data_index,
            similarity,
            highly_rated,
            rng: Mutex::new(StdRng::from_os_rng()),
        })
    }

    /// Replace the random generator, e.g. with a seeded one in tests
    pub fn with_rng(self, rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            ..self
        }
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// The merged movie table
    pub fn data_index(&self) -> &DataIndex {
        &self.data_index
    }

    /// Movies eligible for fallback recommendations, in table order
    pub fn highly_rated(&self) -> &[MovieId] {
        &self.highly_rated
    }

    /// Join picks with the movie table
    fn to_rows(&self, picks: Vec<Pick>) -> Result<Vec<MovieRecommendation>> {
        picks
            .into_iter()
            .map(|pick| -> Result<MovieRecommendation> {
                let movie = self
                    .data_index
                    .get_movie(&pick.movie_id)
                    .ok_or_else(|| RecommenderError::unknown_movie(pick.movie_id.as_str()))?;
                Ok(MovieRecommendation {
                    movie: movie.clone(),
                    score: pick.score,
                    source: pick.source,
                })
            })
            .collect()
    }
}

impl RecommenderSystem for HybridRecommenderSystem {
    fn name(&self) -> &str {
        "HybridRecommenderSystem"
    }

    #[instrument(skip(self))]
    fn recommend_movies_to_user(
        &self,
        user_id: UserId,
        k: usize,
    ) -> Result<Vec<MovieRecommendation>> {
        let context = build_user_context(&self.data_index, user_id, self.config.like_threshold);
        debug!(
            "User {} watched {} movies, {} favorites, avg rating {:.2}",
            user_id,
            context.watched_movies.len(),
            context.favorites.len(),
            context.avg_rating
        );

        let policy = RecommendationPolicy::new(&self.similarity, &self.highly_rated);
        let picks = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            policy.recommend(&context, k, &mut *rng)?
        };

        let recommendations = self.to_rows(picks)?;
        info!(
            "Selected {} of {} requested recommendations for user {}",
            recommendations.len(),
            k,
            user_id
        );
        Ok(recommendations)
    }

    #[instrument(skip(self))]
    fn recommend_similar_movies(
        &self,
        movie_id: &str,
        k: usize,
    ) -> Result<Vec<MovieRecommendation>> {
        let picks = self
            .similarity
            .query(movie_id, k)?
            .into_iter()
            .map(|similar| Pick {
                movie_id: similar.movie_id,
                score: Some(similar.score),
                source: RecommendationSource::SimilarTo(movie_id.to_string()),
            })
            .collect();
        self.to_rows(picks)
    }

    fn get_movies_embeddings(&self, movie_ids: &[MovieId]) -> Result<Vec<EmbeddingRow>> {
        export::get(self.similarity.table(), movie_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn metadata(id: u32, title: &str, genres: &[&str]) -> MovieMetadata {
        MovieMetadata::new(id, title, title, "en", "2001-06-01").with_genres(genres.iter().copied())
    }

    fn rating(user_id: UserId, source_id: u32, value: f32) -> Rating {
        Rating {
            user_id,
            source_id,
            rating: value,
            timestamp: Some(1_000_000),
        }
    }

    fn create_test_system() -> HybridRecommenderSystem {
        let metadata = vec![
            metadata(1, "Space One", &["Science Fiction"]),
            metadata(2, "Space Two", &["Science Fiction"]),
            metadata(3, "Space Three", &["Science Fiction", "Action"]),
            metadata(4, "Love One", &["Romance"]),
            metadata(5, "Love Two", &["Romance", "Drama"]),
            metadata(6, "Laugh One", &["Comedy"]),
        ];
        let ratings = vec![
            rating(1, 1, 5.0),
            rating(1, 4, 2.0),
            rating(2, 2, 4.0),
            rating(2, 6, 4.5),
            rating(3, 5, 1.0),
        ];

        HybridRecommenderSystem::new(&ratings, &metadata, &[], &[])
            .unwrap()
            .with_rng(StdRng::seed_from_u64(42))
    }

    #[test]
    fn test_construction() {
        let system = create_test_system();
        assert_eq!(system.name(), "HybridRecommenderSystem");
        assert_eq!(system.data_index().len(), 6);
        // Mean is 3.3: only movies 1, 2 and 6 reach it
        assert_eq!(system.highly_rated().len(), 3);
    }

    #[test]
    fn test_empty_catalog_is_insufficient() {
        let err = HybridRecommenderSystem::new(&[], &[], &[], &[]).unwrap_err();
        assert!(matches!(err, RecommenderError::InsufficientData(_)));
    }

    #[test]
    fn test_recommendations_are_full_rows() -> anyhow::Result<()> {
        let system = create_test_system();
        let recommendations = system.recommend_movies_to_user(1, 3)?;

        assert_eq!(recommendations.len(), 3);
        let ids: HashSet<&str> = recommendations.iter().map(|r| r.movie_id()).collect();
        assert_eq!(ids.len(), 3);
        // User 1's favorite and the disliked Love One are never recommended back
        assert!(!ids.contains("space_one-space_one-en-2001"));
        assert!(!ids.contains("love_one-love_one-en-2001"));
        for recommendation in &recommendations {
            assert!(!recommendation.movie.title.is_empty());
        }
        Ok(())
    }

    #[test]
    fn test_similar_movies_share_genre() -> anyhow::Result<()> {
        let system = create_test_system();
        let similar = system.recommend_similar_movies("space_one-space_one-en-2001", 2)?;

        let ids: Vec<&str> = similar.iter().map(|r| r.movie_id()).collect();
        assert!(ids.contains(&"space_two-space_two-en-2001"));
        assert!(ids.contains(&"space_three-space_three-en-2001"));
        assert!(similar.iter().all(|r| r.score.is_some()));
        Ok(())
    }

    #[test]
    fn test_unknown_movie() {
        let system = create_test_system();
        let err = system.recommend_similar_movies("nope-nope-en-2001", 2).unwrap_err();
        assert_eq!(err, RecommenderError::unknown_movie("nope-nope-en-2001"));
    }

    #[test]
    fn test_zero_k() -> anyhow::Result<()> {
        let system = create_test_system();
        assert!(system.recommend_movies_to_user(1, 0)?.is_empty());
        assert!(system.recommend_movies_to_user(99, 0)?.is_empty());
        assert!(system.recommend_similar_movies("love_one-love_one-en-2001", 0)?.is_empty());
        Ok(())
    }
}
