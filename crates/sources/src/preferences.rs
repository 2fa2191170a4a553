//! Helper functions to derive user preferences from the ratings table
//!
//! This module aggregates a user's ratings into a UserContext: the movies
//! they watched, the ones they liked (favorites) and their average rating.
//! Nothing is cached; contexts are recomputed on demand.

use catalog::{DataIndex, MovieId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Default rating at or above which a movie counts as liked
pub const DEFAULT_LIKE_THRESHOLD: f32 = 4.0;

/// Everything the recommendation policy needs to know about a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: UserId,
    /// Every movie the user rated
    pub watched_movies: HashSet<MovieId>,
    /// Movies rated at or above the like threshold, in ascending id order
    pub favorites: BTreeSet<MovieId>,
    /// Average of the user's (latest) ratings, 0.0 without ratings
    pub avg_rating: f32,
}

impl UserContext {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }
}

/// The user's rating for every movie they rated.
///
/// When a movie was rated more than once, the latest rating wins (by
/// timestamp, then by position in the ratings table).
pub fn latest_ratings(data_index: &DataIndex, user_id: UserId) -> BTreeMap<MovieId, f32> {
    let mut latest: BTreeMap<MovieId, (i64, f32)> = BTreeMap::new();

    for rating in data_index.get_user_ratings(user_id) {
        let Some(movie_id) = data_index.resolve_source(rating.source_id) else {
            continue;
        };
        let timestamp = rating.timestamp.unwrap_or(i64::MIN);
        latest
            .entry(movie_id.clone())
            .and_modify(|current| {
                if timestamp >= current.0 {
                    *current = (timestamp, rating.rating);
                }
            })
            .or_insert((timestamp, rating.rating));
    }

    latest
        .into_iter()
        .map(|(movie_id, (_, value))| (movie_id, value))
        .collect()
}

/// Movies the user rated at or above `like_threshold`.
///
/// Returns an empty set for users without ratings, or without any rating
/// meeting the threshold. That is a normal state, not an error.
pub fn favorites(data_index: &DataIndex, user_id: UserId, like_threshold: f32) -> BTreeSet<MovieId> {
    latest_ratings(data_index, user_id)
        .into_iter()
        .filter(|(_, value)| *value >= like_threshold)
        .map(|(movie_id, _)| movie_id)
        .collect()
}

/// Build a UserContext for a given user
///
/// Unknown users get an empty context.
pub fn build_user_context(
    data_index: &DataIndex,
    user_id: UserId,
    like_threshold: f32,
) -> UserContext {
    let mut context = UserContext::new(user_id);

    let ratings = latest_ratings(data_index, user_id);
    if ratings.is_empty() {
        // Return early for users with no ratings
        return context;
    }

    let total: f32 = ratings.values().sum();
    context.avg_rating = total / ratings.len() as f32;

    for (movie_id, value) in ratings {
        if value >= like_threshold {
            context.favorites.insert(movie_id.clone());
        }
        context.watched_movies.insert(movie_id);
    }

    context
}
