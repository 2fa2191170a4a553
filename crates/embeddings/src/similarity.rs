//! Nearest-neighbour search over an embedding table.
//!
//! Brute-force cosine similarity with precomputed norms. Results are ordered
//! by score descending, ties broken by ascending movie id, so the same query
//! always returns the same list.

use crate::builder::EmbeddingTable;
use catalog::{MovieId, RecommenderError, Result};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A similar movie and its cosine similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarMovie {
    pub movie_id: MovieId,
    pub score: f32,
}

/// k-nearest-neighbour index over a shared embedding table
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    table: Arc<EmbeddingTable>,
    norms: Vec<f32>,
}

impl SimilarityIndex {
    pub fn new(table: Arc<EmbeddingTable>) -> Self {
        let norms = table
            .iter()
            .map(|(_, vector)| vector.iter().map(|x| x * x).sum::<f32>().sqrt())
            .collect();
        Self { table, norms }
    }

    /// The table this index searches
    pub fn table(&self) -> &EmbeddingTable {
        &self.table
    }

    /// The `k` movies most similar to `movie_id`, excluding itself.
    ///
    /// Returns fewer than `k` results only when the table has fewer than
    /// `k + 1` movies.
    pub fn query(&self, movie_id: &str, k: usize) -> Result<Vec<SimilarMovie>> {
        self.query_excluding(movie_id, k, &HashSet::new())
    }

    /// Like [`query`](Self::query), additionally skipping every id in `exclude`.
    #[instrument(skip(self, exclude), fields(excluded = exclude.len()))]
    pub fn query_excluding(
        &self,
        movie_id: &str,
        k: usize,
        exclude: &HashSet<MovieId>,
    ) -> Result<Vec<SimilarMovie>> {
        let query_position = self
            .table
            .position(movie_id)
            .ok_or_else(|| RecommenderError::unknown_movie(movie_id))?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let query = self.table.vector(query_position);
        let query_norm = self.norms[query_position];

        let mut scored: Vec<(usize, f32)> = self
            .table
            .movie_ids()
            .par_iter()
            .enumerate()
            .filter(|(position, id)| *position != query_position && !exclude.contains(*id))
            .map(|(position, _)| {
                let vector = self.table.vector(position);
                let score = cosine(query, query_norm, vector, self.norms[position]);
                (position, score)
            })
            .collect();

        let ids = self.table.movie_ids();
        let by_rank = |a: &(usize, f32), b: &(usize, f32)| -> Ordering {
            b.1.total_cmp(&a.1).then_with(|| ids[a.0].cmp(&ids[b.0]))
        };
        if scored.len() > k {
            scored.select_nth_unstable_by(k - 1, by_rank);
            scored.truncate(k);
        }
        scored.sort_by(by_rank);

        debug!("Found {} neighbours for {}", scored.len(), movie_id);
        Ok(scored
            .into_iter()
            .map(|(position, score)| SimilarMovie {
                movie_id: ids[position].clone(),
                score,
            })
            .collect())
    }
}

/// Cosine similarity with precomputed norms; 0 when either vector is zero
fn cosine(a: &[f32], norm_a: f32, b: &[f32], norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (norm_a * norm_b)
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    cosine(a, norm_a, b, norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_index() -> SimilarityIndex {
        let ids = ["a", "b", "c", "d", "e"].map(String::from).to_vec();
        let vectors = vec![
            vec![1.0, 0.0], // a
            vec![0.9, 0.1], // b
            vec![0.0, 1.0], // c
            vec![0.9, 0.1], // d, same as b
            vec![0.0, 0.0], // e, zero vector
        ];
        SimilarityIndex::new(Arc::new(EmbeddingTable::new(ids, vectors, 2)))
    }

    fn ids(results: &[SimilarMovie]) -> Vec<&str> {
        results.iter().map(|r| r.movie_id.as_str()).collect()
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_query_orders_by_score_then_id() {
        let index = create_test_index();
        let results = index.query("a", 3).unwrap();

        // b and d tie; b wins on id
        assert_eq!(ids(&results), vec!["b", "d", "c"]);
        assert!(results[0].score >= results[1].score);
        assert!(results[1].score >= results[2].score);
    }

    #[test]
    fn test_query_excludes_itself() {
        let index = create_test_index();
        let results = index.query("b", 10).unwrap();
        assert!(!ids(&results).contains(&"b"));
    }

    #[test]
    fn test_query_shrinks_to_table_size() {
        let index = create_test_index();
        assert_eq!(index.query("a", 4).unwrap().len(), 4);
        assert_eq!(index.query("a", 100).unwrap().len(), 4);
        assert!(index.query("a", 0).unwrap().is_empty());
    }

    #[test]
    fn test_query_excluding() {
        let index = create_test_index();
        let exclude: HashSet<MovieId> = ["b".to_string()].into_iter().collect();
        let results = index.query_excluding("a", 1, &exclude).unwrap();
        assert_eq!(ids(&results), vec!["d"]);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let index = create_test_index();
        let results = index.query("e", 4).unwrap();
        assert!(results.iter().all(|r| r.score == 0.0));
        // All tied, so plain id order
        assert_eq!(ids(&results), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_unknown_movie() {
        let index = create_test_index();
        let err = index.query("missing", 3).unwrap_err();
        assert_eq!(
            err,
            RecommenderError::UnknownMovie {
                ids: vec!["missing".to_string()]
            }
        );
    }
}
