//! Core domain types for the movie catalog.
//!
//! This module defines the raw input rows handed to us by the data-loading
//! collaborator, and the merged, indexed form we build from them:
//! - Type aliases for domain clarity (UserId, SourceId, MovieId)
//! - Raw rows: MovieMetadata, MovieKeywords, MovieCredits, Rating
//! - The merged Movie record and its rating statistics
//! - DataIndex, the immutable in-memory table every other crate reads

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and prevent mixing up the numeric source id
// with the canonical, human-readable movie id

/// Unique identifier for a user in the ratings table
pub type UserId = u32;

/// Numeric movie id used by the raw tables to join with each other
pub type SourceId = u32;

/// Canonical slug-based movie id, e.g. `the_promise-das_versprechen-en-1995`
pub type MovieId = String;

// =============================================================================
// Raw input rows
// =============================================================================

/// One row of the movies metadata table.
///
/// Metadata is authoritative for existence: a movie exists in the merged
/// table if and only if it has a metadata row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieMetadata {
    pub id: SourceId,
    pub title: String,
    pub original_title: String,
    pub original_language: String,
    /// Release date as found in the source, usually `YYYY-MM-DD`
    pub release_date: Option<String>,
    pub overview: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub vote_average: Option<f32>,
    pub vote_count: Option<u32>,
}

impl MovieMetadata {
    /// Create a metadata row with the fields needed to derive an identity
    pub fn new(
        id: SourceId,
        title: impl Into<String>,
        original_title: impl Into<String>,
        original_language: impl Into<String>,
        release_date: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            original_title: original_title.into(),
            original_language: original_language.into(),
            release_date: Some(release_date.into()),
            overview: None,
            genres: Vec::new(),
            vote_average: None,
            vote_count: None,
        }
    }

    pub fn with_overview(mut self, overview: impl Into<String>) -> Self {
        self.overview = Some(overview.into());
        self
    }

    pub fn with_genres<S: Into<String>>(mut self, genres: impl IntoIterator<Item = S>) -> Self {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }
}

/// Keywords attached to a movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieKeywords {
    pub id: SourceId,
    pub keywords: Vec<String>,
}

/// A credited actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    pub character: Option<String>,
    /// Billing order, 0 is the top-billed actor
    pub order: u32,
}

/// A credited crew member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewMember {
    pub name: String,
    pub job: String,
    pub department: String,
}

/// Cast and crew of a movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieCredits {
    pub id: SourceId,
    pub cast: Vec<CastMember>,
    pub crew: Vec<CrewMember>,
}

/// A single rating from a user for a movie.
///
/// Ratings reference movies by their numeric source id; the DataIndex
/// resolves them to canonical ids.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub source_id: SourceId,
    /// Rating value from 0.0 to 5.0
    pub rating: f32,
    /// Unix timestamp when the rating was made, if known
    pub timestamp: Option<i64>,
}

// =============================================================================
// Merged movie record
// =============================================================================

/// A movie after metadata, keywords and credits have been merged.
///
/// Immutable once it has been inserted into a DataIndex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub movie_id: MovieId,
    pub source_id: SourceId,
    pub title: String,
    pub original_title: String,
    /// Normalized two-letter code of `original_language`
    pub original_language: String,
    pub release_date: Option<NaiveDate>,
    pub release_year: u16,
    pub overview: Option<String>,
    pub genres: Vec<String>,
    pub keywords: Vec<String>,
    pub cast: Vec<CastMember>,
    pub crew: Vec<CrewMember>,
    pub vote_average: Option<f32>,
    pub vote_count: Option<u32>,
}

impl Movie {
    /// Names of crew members with the given job (e.g. "Director")
    pub fn crew_with_job<'a>(&'a self, job: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.crew
            .iter()
            .filter(move |member| member.job == job)
            .map(|member| member.name.as_str())
    }
}

// =============================================================================
// Statistics Types
// =============================================================================

/// Precomputed statistics for a movie
///
/// These are computed once when the index is built for fast lookups later
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovieStats {
    pub avg_rating: f32,
    pub rating_count: u32,
    /// Popularity score derived from rating count and average
    pub popularity_score: f32,
}

// =============================================================================
// DataIndex - the merged movie table
// =============================================================================

/// The unified movie table plus rating indices.
///
/// Built once by [`DataIndex::build`] and read-only afterwards, so it can be
/// shared across threads behind an `Arc` without any locking.
#[derive(Debug)]
pub struct DataIndex {
    // Primary data stores
    pub(crate) movies: HashMap<MovieId, Movie>,
    /// Canonical ids in ascending order; this is the table order
    pub(crate) movie_ids: Vec<MovieId>,
    /// Numeric source id -> canonical id
    pub(crate) source_index: HashMap<SourceId, MovieId>,

    // Rating indices for fast lookups
    /// All ratings made by each user
    pub(crate) user_ratings: HashMap<UserId, Vec<Rating>>,
    /// All ratings received by each movie
    pub(crate) movie_ratings: HashMap<MovieId, Vec<Rating>>,

    // Precomputed statistics
    pub(crate) movie_stats: HashMap<MovieId, MovieStats>,
    pub(crate) global_mean_rating: Option<f32>,
}

impl DataIndex {
    pub(crate) fn empty() -> Self {
        Self {
            movies: HashMap::new(),
            movie_ids: Vec::new(),
            source_index: HashMap::new(),
            user_ratings: HashMap::new(),
            movie_ratings: HashMap::new(),
            movie_stats: HashMap::new(),
            global_mean_rating: None,
        }
    }

    /// Get a movie by its canonical id
    pub fn get_movie(&self, movie_id: &str) -> Option<&Movie> {
        self.movies.get(movie_id)
    }

    /// Whether the table holds a movie with this id
    pub fn contains(&self, movie_id: &str) -> bool {
        self.movies.contains_key(movie_id)
    }

    /// Canonical id of the movie with the given numeric source id
    pub fn resolve_source(&self, source_id: SourceId) -> Option<&MovieId> {
        self.source_index.get(&source_id)
    }

    /// All canonical ids, in ascending order
    pub fn movie_ids(&self) -> &[MovieId] {
        &self.movie_ids
    }

    /// All movies, in table order
    pub fn movies(&self) -> impl Iterator<Item = &Movie> {
        self.movie_ids.iter().filter_map(|id| self.movies.get(id))
    }

    /// Get all ratings made by a user
    ///
    /// Returns an empty slice if the user has no ratings
    pub fn get_user_ratings(&self, user_id: UserId) -> &[Rating] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all ratings for a movie
    pub fn get_movie_ratings(&self, movie_id: &str) -> &[Rating] {
        self.movie_ratings
            .get(movie_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Ids of every user with at least one rating
    pub fn user_ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.user_ratings.keys().copied()
    }

    /// Get precomputed statistics for a movie
    pub fn get_movie_stats(&self, movie_id: &str) -> Option<&MovieStats> {
        self.movie_stats.get(movie_id)
    }

    /// Mean of every accepted rating, `None` when there are no ratings
    pub fn global_mean_rating(&self) -> Option<f32> {
        self.global_mean_rating
    }

    /// Number of movies in the table
    pub fn len(&self) -> usize {
        self.movie_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movie_ids.is_empty()
    }

    /// Get counts for debugging/validation: (users, movies, ratings)
    pub fn counts(&self) -> (usize, usize, usize) {
        let total_ratings = self.user_ratings.values().map(|v| v.len()).sum();
        (self.user_ratings.len(), self.movies.len(), total_ratings)
    }

    // Mutators are crate-private: the table is only populated by `build`

    pub(crate) fn insert_movie(&mut self, movie: Movie) {
        self.source_index
            .insert(movie.source_id, movie.movie_id.clone());
        self.movie_ids.push(movie.movie_id.clone());
        self.movies.insert(movie.movie_id.clone(), movie);
    }

    /// Insert a rating already resolved to `movie_id` and update indices
    pub(crate) fn insert_rating(&mut self, movie_id: &str, rating: Rating) {
        self.user_ratings
            .entry(rating.user_id)
            .or_default()
            .push(rating);

        self.movie_ratings
            .entry(movie_id.to_string())
            .or_default()
            .push(rating);
    }
}
