use catalog::{Movie, MovieId};
use serde::{Deserialize, Serialize};

/// Why a movie was recommended
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendationSource {
    /// Nearest neighbour of this movie in embedding space
    SimilarTo(MovieId),
    /// Sampled from the highly rated pool
    HighlyRated,
}

/// Final recommendation returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecommendation {
    pub movie: Movie,
    /// Cosine similarity to the source movie, `None` for highly rated picks
    pub score: Option<f32>,
    pub source: RecommendationSource,
}

impl MovieRecommendation {
    pub fn movie_id(&self) -> &str {
        &self.movie.movie_id
    }
}
