//! Core traits for the embedding builder.
//!
//! This module defines the Signal trait that allows composable,
//! extensible per-movie feature sources to be combined into one embedding.

use catalog::{DataIndex, Result};

/// A source of per-movie feature vectors.
///
/// All signals must implement this trait to be used in the EmbeddingBuilder.
///
/// ## Design Note
/// - `Send + Sync` allows signals to be used in concurrent contexts
/// - Output must be deterministic for a fixed DataIndex
pub trait Signal: Send + Sync {
    /// Returns the name of this signal (for logging/debugging)
    fn name(&self) -> &str;

    /// Compute one row per movie, in `data_index.movie_ids()` order.
    ///
    /// # Returns
    /// * `Ok(rows)` - rows of identical width; a movie without any signal
    ///   gets a zero row, never a missing one
    /// * `Err` - if the signal cannot be computed
    fn compute(&self, data_index: &DataIndex) -> Result<Vec<Vec<f32>>>;
}
