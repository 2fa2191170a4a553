//! Configuration of the hybrid recommender.

use catalog::CatalogConfig;
use sources::DEFAULT_LIKE_THRESHOLD;

/// Knobs of `HybridRecommenderSystem`, fixed at construction
#[derive(Debug, Clone, PartialEq)]
pub struct RecommenderConfig {
    /// Rating at or above which a movie is a favorite
    pub like_threshold: f32,
    /// Minimum ratings for a movie to enter the highly rated pool
    pub min_rating_count: u32,
    /// Weight of the content signal in the embedding
    pub content_weight: f32,
    /// Weight of the collaborative signal, 0.0 disables it
    pub collaborative_weight: f32,
    /// How the raw tables are merged
    pub catalog: CatalogConfig,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            like_threshold: DEFAULT_LIKE_THRESHOLD,
            min_rating_count: 1,
            content_weight: 1.0,
            collaborative_weight: 0.5,
            catalog: CatalogConfig::default(),
        }
    }
}

impl RecommenderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_like_threshold(mut self, threshold: f32) -> Self {
        self.like_threshold = threshold;
        self
    }

    pub fn with_min_rating_count(mut self, count: u32) -> Self {
        self.min_rating_count = count;
        self
    }

    pub fn with_content_weight(mut self, weight: f32) -> Self {
        self.content_weight = weight;
        self
    }

    pub fn with_collaborative_weight(mut self, weight: f32) -> Self {
        self.collaborative_weight = weight;
        self
    }

    pub fn with_catalog(mut self, catalog: CatalogConfig) -> Self {
        self.catalog = catalog;
        self
    }
}
