//! # Catalog Crate
//!
//! This crate merges the raw movie tables into one indexed movie table.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Movie, Rating, raw rows, DataIndex)
//! - **identity**: Canonical, human-readable movie ids
//! - **index**: Merge the tables and build the indices
//! - **config**: Language and integrity policies
//! - **error**: The error taxonomy shared by the whole workspace
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::{CatalogConfig, DataIndex};
//!
//! // Merge the tables supplied by the data-loading collaborator
//! let index = DataIndex::build(&ratings, &metadata, &keywords, &credits, &CatalogConfig::default())?;
//!
//! // Query data
//! let movie = index.get_movie("the_promise-das_versprechen-en-1995").unwrap();
//! let ratings = index.get_user_ratings(25);
//!
//! println!("{} ({}) has {} ratings", movie.title, movie.release_year, ratings.len());
//! ```

// Public modules
pub mod config;
pub mod error;
pub mod identity;
pub mod index;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{CatalogConfig, IntegrityPolicy, LanguagePolicy};
pub use error::{RecommenderError, Result};
pub use types::{
    // Type aliases
    MovieId,
    SourceId,
    UserId,
    // Raw rows
    CastMember,
    CrewMember,
    MovieCredits,
    MovieKeywords,
    MovieMetadata,
    Rating,
    // Merged table
    DataIndex,
    Movie,
    MovieStats,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_build() {
        let index = DataIndex::build(&[], &[], &[], &[], &CatalogConfig::default()).unwrap();
        let (users, movies, ratings) = index.counts();

        assert_eq!(users, 0);
        assert_eq!(movies, 0);
        assert_eq!(ratings, 0);
        assert!(index.is_empty());
        assert!(index.global_mean_rating().is_none());
    }

    #[test]
    fn test_empty_queries() -> anyhow::Result<()> {
        let metadata = vec![MovieMetadata::new(1, "Heat", "Heat", "en", "1995-12-15")];
        let index = DataIndex::build(&[], &metadata, &[], &[], &CatalogConfig::default())?;

        // Querying non-existent data should return None or empty slices
        assert!(index.get_movie("missing-missing-en-2000").is_none());
        assert!(index.resolve_source(999).is_none());
        assert!(index.get_user_ratings(999).is_empty());
        assert!(index.get_movie_ratings("heat-heat-en-1995").is_empty());
        assert!(index.get_movie_stats("heat-heat-en-1995").is_none());
        Ok(())
    }
}
