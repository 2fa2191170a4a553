//! The EmbeddingBuilder combines multiple signals into one embedding table.
//!
//! This module provides the EmbeddingBuilder struct that chains
//! signals together using the builder pattern, and the EmbeddingTable it
//! produces.

use crate::traits::Signal;
use catalog::{DataIndex, MovieId, RecommenderError, Result};
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Fixed-length vectors for every movie of a DataIndex.
///
/// Rows are stored in table order (ascending movie id). Built once and
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingTable {
    dimensions: usize,
    movie_ids: Vec<MovieId>,
    vectors: Vec<Vec<f32>>,
    positions: HashMap<MovieId, usize>,
}

impl EmbeddingTable {
    /// Create a table from parallel id/vector lists.
    ///
    /// Every vector must have length `dimensions`.
    pub fn new(movie_ids: Vec<MovieId>, vectors: Vec<Vec<f32>>, dimensions: usize) -> Self {
        debug_assert_eq!(movie_ids.len(), vectors.len());
        debug_assert!(vectors.iter().all(|v| v.len() == dimensions));

        let positions = movie_ids
            .iter()
            .enumerate()
            .map(|(position, id)| (id.clone(), position))
            .collect();
        Self {
            dimensions,
            movie_ids,
            vectors,
            positions,
        }
    }

    /// Width of every vector
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.movie_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movie_ids.is_empty()
    }

    /// All movie ids, in table order
    pub fn movie_ids(&self) -> &[MovieId] {
        &self.movie_ids
    }

    pub fn contains(&self, movie_id: &str) -> bool {
        self.positions.contains_key(movie_id)
    }

    /// Row position of a movie
    pub fn position(&self, movie_id: &str) -> Option<usize> {
        self.positions.get(movie_id).copied()
    }

    /// Vector at a row position
    ///
    /// Panics if `position >= self.len()`.
    pub fn vector(&self, position: usize) -> &[f32] {
        &self.vectors[position]
    }

    /// Vector of a movie
    pub fn get(&self, movie_id: &str) -> Option<&[f32]> {
        self.position(movie_id).map(|p| self.vectors[p].as_slice())
    }

    /// Iterate `(movie_id, vector)` in table order
    pub fn iter(&self) -> impl Iterator<Item = (&MovieId, &[f32])> {
        self.movie_ids
            .iter()
            .zip(self.vectors.iter().map(|v| v.as_slice()))
    }
}

/// Chains multiple weighted signals into one embedding.
///
/// ## Usage
/// ```ignore
/// let table = EmbeddingBuilder::new()
///     .add_signal(ContentSignal::new(), 1.0)
///     .add_signal(CollaborativeSignal::new(), 0.5)
///     .build(&data_index)?;
/// ```
pub struct EmbeddingBuilder {
    signals: Vec<(Box<dyn Signal>, f32)>,
}

impl EmbeddingBuilder {
    /// Create a new builder without signals.
    pub fn new() -> Self {
        Self {
            signals: Vec::new(),
        }
    }

    /// Add a signal with its weight (builder pattern).
    ///
    /// Signals with a non-positive weight are skipped at build time.
    pub fn add_signal(mut self, signal: impl Signal + 'static, weight: f32) -> Self {
        self.signals.push((Box::new(signal), weight));
        self
    }

    /// Compute every signal and concatenate them.
    ///
    /// ## Algorithm
    /// 1. For each signal with a positive weight:
    ///    a. Compute its rows
    ///    b. L2-normalize every row (zero rows stay zero)
    ///    c. Scale by the signal weight
    /// 2. Concatenate the blocks per movie, in the order signals were added
    ///
    /// # Returns
    /// * `Ok(EmbeddingTable)` - one vector per movie, none omitted
    /// * `Err(InsufficientData)` - if the movie table is empty
    #[instrument(skip_all, fields(movies = data_index.len(), signals = self.signals.len()))]
    pub fn build(&self, data_index: &DataIndex) -> Result<EmbeddingTable> {
        if data_index.is_empty() {
            return Err(RecommenderError::InsufficientData(
                "cannot build embeddings for an empty movie table".to_string(),
            ));
        }

        let movie_count = data_index.len();
        let mut vectors: Vec<Vec<f32>> = vec![Vec::new(); movie_count];
        let mut dimensions = 0;

        for (signal, weight) in &self.signals {
            if *weight <= 0.0 {
                debug!("Skipping signal {} (weight {})", signal.name(), weight);
                continue;
            }

            let rows = signal.compute(data_index)?;
            if rows.len() != movie_count {
                return Err(RecommenderError::InsufficientData(format!(
                    "signal {} produced {} rows for {} movies",
                    signal.name(),
                    rows.len(),
                    movie_count
                )));
            }
            let width = rows.first().map_or(0, |row| row.len());
            debug!("Signal {} contributes {} dimensions", signal.name(), width);

            vectors
                .par_iter_mut()
                .zip(rows.into_par_iter())
                .for_each(|(vector, mut row)| {
                    row.resize(width, 0.0);
                    normalize(&mut row);
                    vector.extend(row.into_iter().map(|value| value * weight));
                });
            dimensions += width;
        }

        info!(
            "Built embeddings for {} movies with {} dimensions",
            movie_count, dimensions
        );
        Ok(EmbeddingTable::new(
            data_index.movie_ids().to_vec(),
            vectors,
            dimensions,
        ))
    }
}

impl Default for EmbeddingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Scale a vector to unit length in place; zero vectors are left untouched
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}
