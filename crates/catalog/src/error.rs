//! Error types shared by every crate in the recommender workspace.
//!
//! The taxonomy is intentionally small:
//! - integrity failures while merging the raw tables
//! - references to movies that are not in the table
//! - operations that cannot run on empty inputs
//!
//! Every failure aborts the whole call. Nothing here is retried, since all
//! computations are deterministic and in-memory.

use crate::types::{MovieId, SourceId, UserId};
use thiserror::Error;

/// Errors that can occur while building or querying the recommender.
///
/// The `#[derive(Error)]` macro from thiserror implements `std::error::Error`
/// and `Display` from the `#[error(...)]` attributes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecommenderError {
    /// A metadata row is malformed or misses a field needed for its identity
    #[error("Data integrity error for movie {source_id}: {reason}")]
    DataIntegrity { source_id: SourceId, reason: String },

    /// A rating value is outside the accepted scale
    #[error("Invalid rating {value} by user {user_id} for movie {source_id}")]
    InvalidRating {
        user_id: UserId,
        source_id: SourceId,
        value: f32,
    },

    /// One or more movie ids are absent from the movie/embedding table
    ///
    /// All offending ids are listed, in the order they were requested.
    #[error("Unknown movie id(s): {}", ids.join(", "))]
    UnknownMovie { ids: Vec<MovieId> },

    /// The operation is impossible given empty inputs
    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

impl RecommenderError {
    /// Shorthand for a single unknown id
    pub fn unknown_movie(id: impl Into<MovieId>) -> Self {
        Self::UnknownMovie {
            ids: vec![id.into()],
        }
    }

    pub(crate) fn integrity(source_id: SourceId, reason: impl Into<String>) -> Self {
        Self::DataIntegrity {
            source_id,
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for Results across the workspace
///
/// Instead of writing `Result<T, RecommenderError>` everywhere,
/// we can write `Result<T>`
pub type Result<T> = std::result::Result<T, RecommenderError>;
