//! DataIndex building and indexing logic.
//!
//! This module merges the raw tables into one indexed movie table:
//! - Left join metadata with keywords and credits on the numeric id
//! - Resolve a canonical, unique `movie_id` per movie
//! - Resolve ratings to canonical ids and index them per user and per movie
//! - Compute aggregate statistics (movie stats, global mean)

use crate::config::{CatalogConfig, IntegrityPolicy};
use crate::error::{RecommenderError, Result};
use crate::identity::resolve_identity;
use crate::types::*;
use rayon::prelude::*;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

/// Lowest and highest accepted rating values
pub const RATING_RANGE: (f32, f32) = (0.0, 5.0);

impl DataIndex {
    /// Build the movie table from the raw tables.
    ///
    /// This is the main entry point of the crate. Inputs are borrowed and
    /// never mutated.
    ///
    /// Steps:
    /// 1. Deduplicate every table on its numeric id (first row wins)
    /// 2. Merge keywords and credits into metadata (left join)
    /// 3. Resolve a unique canonical id per movie, in ascending numeric id order
    /// 4. Resolve and index ratings
    /// 5. Compute movie statistics
    #[instrument(skip_all, fields(movies = metadata.len(), ratings = ratings.len()))]
    pub fn build(
        ratings: &[Rating],
        metadata: &[MovieMetadata],
        keywords: &[MovieKeywords],
        credits: &[MovieCredits],
        config: &CatalogConfig,
    ) -> Result<Self> {
        let mut index = DataIndex::empty();

        // 1. Deduplicate on the numeric id
        let metadata = first_by_id(metadata, |row| row.id, "metadata");
        let keywords: HashMap<SourceId, &MovieKeywords> =
            first_by_id(keywords, |row| row.id, "keywords")
                .into_iter()
                .map(|row| (row.id, row))
                .collect();
        let credits: HashMap<SourceId, &MovieCredits> =
            first_by_id(credits, |row| row.id, "credits")
                .into_iter()
                .map(|row| (row.id, row))
                .collect();

        // 2-3. Merge and resolve ids. Processing in ascending numeric id makes
        // the collision tie-break independent of input order.
        let mut rows = metadata;
        rows.sort_by_key(|row| row.id);

        let mut taken: HashSet<MovieId> = HashSet::with_capacity(rows.len());
        let mut movies = Vec::with_capacity(rows.len());
        for row in rows {
            let identity = match resolve_identity(row, &config.language_policy) {
                Ok(identity) => identity,
                Err(err) => match config.integrity_policy {
                    IntegrityPolicy::Strict => return Err(err),
                    IntegrityPolicy::SkipInvalid => {
                        warn!("Skipping metadata row: {}", err);
                        continue;
                    }
                },
            };

            let movie_id = if taken.contains(&identity.movie_id) {
                let disambiguated = format!("{}-{}", identity.movie_id, row.id);
                warn!(
                    "Duplicate movie id {}, using {}",
                    identity.movie_id, disambiguated
                );
                disambiguated
            } else {
                identity.movie_id
            };
            taken.insert(movie_id.clone());

            let (cast, crew) = match credits.get(&row.id) {
                Some(credits) => {
                    let mut cast = credits.cast.clone();
                    cast.sort_by_key(|member| member.order);
                    (cast, credits.crew.clone())
                }
                None => (Vec::new(), Vec::new()),
            };

            movies.push(Movie {
                movie_id,
                source_id: row.id,
                title: row.title.trim().to_string(),
                original_title: row.original_title.trim().to_string(),
                original_language: identity.original_language,
                release_date: identity.release_date,
                release_year: identity.release_year,
                overview: row.overview.clone().filter(|text| !text.trim().is_empty()),
                genres: row.genres.clone(),
                keywords: keywords
                    .get(&row.id)
                    .map(|k| k.keywords.clone())
                    .unwrap_or_default(),
                cast,
                crew,
                vote_average: row.vote_average,
                vote_count: row.vote_count,
            });
        }

        // Table order is ascending canonical id
        movies.sort_by(|a, b| a.movie_id.cmp(&b.movie_id));
        for movie in movies {
            index.insert_movie(movie);
        }

        // 4. Ratings
        index.index_ratings(ratings, config.integrity_policy)?;

        // 5. Statistics
        index.compute_movie_stats();

        let (users, movies, ratings) = index.counts();
        info!(
            "Built movie table: {} movies, {} users, {} ratings",
            movies, users, ratings
        );
        Ok(index)
    }

    /// Validate ratings, resolve them to canonical ids and index them
    ///
    /// A user keeps one rating per movie: the latest by timestamp, ties going
    /// to the later row.
    fn index_ratings(&mut self, ratings: &[Rating], policy: IntegrityPolicy) -> Result<()> {
        let mut unknown = 0usize;
        let mut invalid = 0usize;
        let mut superseded = 0usize;
        let mut latest: HashMap<(UserId, MovieId), (usize, Rating)> = HashMap::new();

        for (position, rating) in ratings.iter().enumerate() {
            if !is_valid_rating(rating.rating) {
                let err = RecommenderError::InvalidRating {
                    user_id: rating.user_id,
                    source_id: rating.source_id,
                    value: rating.rating,
                };
                match policy {
                    IntegrityPolicy::Strict => return Err(err),
                    IntegrityPolicy::SkipInvalid => {
                        invalid += 1;
                        continue;
                    }
                }
            }

            let Some(movie_id) = self.source_index.get(&rating.source_id).cloned() else {
                unknown += 1;
                continue;
            };
            match latest.entry((rating.user_id, movie_id)) {
                Entry::Occupied(mut entry) => {
                    superseded += 1;
                    if rating_time(rating) >= rating_time(&entry.get().1) {
                        entry.insert((position, *rating));
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert((position, *rating));
                }
            }
        }

        // Index in input order so per-user and per-movie lists are stable
        let mut kept: Vec<_> = latest.into_iter().collect();
        kept.sort_by_key(|(_, (position, _))| *position);
        for ((_, movie_id), (_, rating)) in kept {
            self.insert_rating(&movie_id, rating);
        }

        if unknown > 0 {
            warn!("Dropped {} ratings referencing unknown movies", unknown);
        }
        if invalid > 0 {
            warn!("Dropped {} ratings with invalid values", invalid);
        }
        if superseded > 0 {
            debug!("Replaced {} repeated ratings by the latest one", superseded);
        }
        Ok(())
    }

    /// Compute aggregate statistics for all rated movies
    ///
    /// For each movie: average rating, rating count, and a popularity score.
    /// Also computes the mean of all ratings.
    pub(crate) fn compute_movie_stats(&mut self) {
        let movie_stats = self
            .movie_ratings
            .par_iter()
            .map(|(movie_id, ratings)| {
                let rating_count = ratings.len() as u32;
                let avg_rating = if rating_count > 0 {
                    let total: f32 = ratings.iter().map(|r| r.rating).sum();
                    total / rating_count as f32
                } else {
                    0.0
                };
                let popularity_score = compute_popularity_score(avg_rating, rating_count);

                (
                    movie_id.clone(),
                    MovieStats {
                        avg_rating,
                        rating_count,
                        popularity_score,
                    },
                )
            })
            .collect();
        self.movie_stats = movie_stats;

        let (total, count) = self
            .user_ratings
            .values()
            .flatten()
            .fold((0.0f64, 0usize), |(total, count), r| {
                (total + r.rating as f64, count + 1)
            });
        self.global_mean_rating = (count > 0).then(|| (total / count as f64) as f32);
    }
}

/// Keep the first row for every id, logging the dropped duplicates
fn first_by_id<'a, T>(
    rows: &'a [T],
    id: impl Fn(&T) -> SourceId,
    table: &str,
) -> Vec<&'a T> {
    let mut seen = HashSet::with_capacity(rows.len());
    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        if seen.insert(id(row)) {
            kept.push(row);
        } else {
            warn!("Dropping duplicate {} row for id {}", table, id(row));
        }
    }
    kept
}

/// Ordering key for repeated ratings, undated ones first
fn rating_time(rating: &Rating) -> i64 {
    rating.timestamp.unwrap_or(i64::MIN)
}

fn is_valid_rating(value: f32) -> bool {
    value.is_finite() && value >= RATING_RANGE.0 && value <= RATING_RANGE.1
}

/// Popularity score: avg_rating * ln(rating_count + 1)
///
/// This rewards both high ratings and many ratings
fn compute_popularity_score(avg_rating: f32, rating_count: u32) -> f32 {
    avg_rating * (rating_count as f32 + 1.0).ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LanguagePolicy;

    fn rating(user_id: UserId, source_id: SourceId, value: f32) -> Rating {
        Rating {
            user_id,
            source_id,
            rating: value,
            timestamp: Some(1_000_000),
        }
    }

    fn create_test_metadata() -> Vec<MovieMetadata> {
        vec![
            MovieMetadata::new(3, "Toy Story", "Toy Story", "en", "1995-10-30")
                .with_genres(["Animation", "Comedy"]),
            MovieMetadata::new(1, "The Promise", "Das Versprechen", "de", "1995-02-16")
                .with_overview("A couple separated by the Berlin Wall."),
            MovieMetadata::new(2, "Heat", "Heat", "en", "1995-12-15"),
        ]
    }

    #[test]
    fn test_build_merges_tables() {
        let keywords = vec![MovieKeywords {
            id: 3,
            keywords: vec!["toy".to_string(), "friendship".to_string()],
        }];
        let credits = vec![MovieCredits {
            id: 3,
            cast: vec![
                CastMember {
                    name: "Tim Allen".to_string(),
                    character: Some("Buzz".to_string()),
                    order: 1,
                },
                CastMember {
                    name: "Tom Hanks".to_string(),
                    character: Some("Woody".to_string()),
                    order: 0,
                },
            ],
            crew: vec![CrewMember {
                name: "John Lasseter".to_string(),
                job: "Director".to_string(),
                department: "Directing".to_string(),
            }],
        }];

        let index = DataIndex::build(
            &[],
            &create_test_metadata(),
            &keywords,
            &credits,
            &CatalogConfig::default(),
        )
        .unwrap();

        assert_eq!(index.len(), 3);
        let toy_story = index.get_movie("toy_story-toy_story-en-1995").unwrap();
        assert_eq!(toy_story.keywords, vec!["toy", "friendship"]);
        assert_eq!(toy_story.cast[0].name, "Tom Hanks");
        assert_eq!(toy_story.crew_with_job("Director").collect::<Vec<_>>(), vec!["John Lasseter"]);

        let promise = index.get_movie("the_promise-das_versprechen-en-1995").unwrap();
        assert!(promise.keywords.is_empty());
        assert!(promise.cast.is_empty());
        assert_eq!(promise.original_language, "de");
    }

    #[test]
    fn test_movie_ids_are_sorted() {
        let index = DataIndex::build(
            &[],
            &create_test_metadata(),
            &[],
            &[],
            &CatalogConfig::default(),
        )
        .unwrap();

        let ids = index.movie_ids().to_vec();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert_eq!(index.movies().count(), 3);
    }

    #[test]
    fn test_colliding_ids_are_disambiguated() {
        // Same title, language and year: the lowest numeric id keeps the bare slug
        let metadata = vec![
            MovieMetadata::new(20, "Hamlet", "Hamlet", "en", "1990-12-19"),
            MovieMetadata::new(10, "Hamlet", "Hamlet", "en", "1990-01-01"),
        ];

        let index =
            DataIndex::build(&[], &metadata, &[], &[], &CatalogConfig::default()).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.resolve_source(10).unwrap(), "hamlet-hamlet-en-1990");
        assert_eq!(index.resolve_source(20).unwrap(), "hamlet-hamlet-en-1990-20");
    }

    #[test]
    fn test_duplicate_source_rows_keep_first() {
        let metadata = vec![
            MovieMetadata::new(1, "Heat", "Heat", "en", "1995-12-15"),
            MovieMetadata::new(1, "Heat (dup)", "Heat", "en", "1995-12-15"),
        ];

        let index =
            DataIndex::build(&[], &metadata, &[], &[], &CatalogConfig::default()).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get_movie("heat-heat-en-1995").unwrap().title, "Heat");
    }

    #[test]
    fn test_invalid_row_strict_and_lenient() {
        let mut metadata = create_test_metadata();
        metadata.push(MovieMetadata {
            release_date: None,
            ..MovieMetadata::new(9, "Undated", "Undated", "en", "")
        });

        let err = DataIndex::build(&[], &metadata, &[], &[], &CatalogConfig::default())
            .unwrap_err();
        assert!(matches!(err, RecommenderError::DataIntegrity { source_id: 9, .. }));

        let lenient = CatalogConfig::default().with_integrity_policy(IntegrityPolicy::SkipInvalid);
        let index = DataIndex::build(&[], &metadata, &[], &[], &lenient).unwrap();
        assert_eq!(index.len(), 3);
        assert!(index.resolve_source(9).is_none());
    }

    #[test]
    fn test_language_policy_is_applied() {
        let config = CatalogConfig::default().with_language_policy(LanguagePolicy::Original);
        let index = DataIndex::build(&[], &create_test_metadata(), &[], &[], &config).unwrap();
        assert!(index.contains("the_promise-das_versprechen-de-1995"));
    }

    #[test]
    fn test_ratings_are_resolved_and_indexed() {
        let ratings = vec![
            rating(1, 3, 5.0),
            rating(1, 2, 3.0),
            rating(2, 3, 4.0),
            rating(2, 999, 4.0), // unknown movie, dropped
        ];

        let index = DataIndex::build(
            &ratings,
            &create_test_metadata(),
            &[],
            &[],
            &CatalogConfig::default(),
        )
        .unwrap();

        let (users, movies, total) = index.counts();
        assert_eq!((users, movies, total), (2, 3, 3));
        assert_eq!(index.get_user_ratings(1).len(), 2);
        assert_eq!(index.get_movie_ratings("toy_story-toy_story-en-1995").len(), 2);
        assert!(index.get_user_ratings(42).is_empty());

        let stats = index.get_movie_stats("toy_story-toy_story-en-1995").unwrap();
        assert_eq!(stats.rating_count, 2);
        assert!((stats.avg_rating - 4.5).abs() < 1e-6);

        let mean = index.global_mean_rating().unwrap();
        assert!((mean - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_rating_value() {
        let ratings = vec![rating(1, 3, 7.5)];
        let err = DataIndex::build(
            &ratings,
            &create_test_metadata(),
            &[],
            &[],
            &CatalogConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RecommenderError::InvalidRating { user_id: 1, .. }));
    }

    #[test]
    fn test_invalid_rating_value_skipped() {
        let ratings = vec![
            rating(1, 3, 7.5),
            rating(1, 2, f32::NAN),
            rating(2, 2, -1.0),
            rating(2, 3, 4.0),
        ];
        let lenient = CatalogConfig::default().with_integrity_policy(IntegrityPolicy::SkipInvalid);
        let index = DataIndex::build(&ratings, &create_test_metadata(), &[], &[], &lenient).unwrap();

        assert_eq!(index.counts(), (1, 3, 1));
        assert!(index.get_user_ratings(1).is_empty());
        assert_eq!(index.get_user_ratings(2)[0].rating, 4.0);
        assert_eq!(index.global_mean_rating(), Some(4.0));
    }

    #[test]
    fn test_orphan_keywords_and_credits_are_ignored() {
        let keywords = vec![MovieKeywords {
            id: 99,
            keywords: vec!["orphan".to_string()],
        }];
        let credits = vec![MovieCredits {
            id: 98,
            cast: vec![CastMember {
                name: "Nobody".to_string(),
                character: None,
                order: 0,
            }],
            crew: Vec::new(),
        }];

        let index = DataIndex::build(
            &[],
            &create_test_metadata(),
            &keywords,
            &credits,
            &CatalogConfig::default(),
        )
        .unwrap();

        assert_eq!(index.len(), 3);
        assert!(index.resolve_source(98).is_none());
        assert!(index.resolve_source(99).is_none());
        assert!(index.movies().all(|m| m.keywords.is_empty() && m.cast.is_empty()));
    }

    #[test]
    fn test_repeated_ratings_keep_latest() {
        let ratings = vec![
            Rating {
                timestamp: Some(200),
                ..rating(1, 3, 2.0)
            },
            // Older, so it does not replace the rating above
            Rating {
                timestamp: Some(100),
                ..rating(1, 3, 5.0)
            },
            rating(2, 2, 3.0),
            // Same timestamp: the later row wins
            rating(2, 2, 4.0),
            rating(2, 3, 4.0),
        ];

        let index = DataIndex::build(
            &ratings,
            &create_test_metadata(),
            &[],
            &[],
            &CatalogConfig::default(),
        )
        .unwrap();

        assert_eq!(index.counts(), (2, 3, 3));
        assert_eq!(index.get_user_ratings(1).len(), 1);
        assert_eq!(index.get_user_ratings(1)[0].rating, 2.0);
        assert_eq!(index.get_movie_ratings("heat-heat-en-1995")[0].rating, 4.0);

        let stats = index.get_movie_stats("toy_story-toy_story-en-1995").unwrap();
        assert_eq!(stats.rating_count, 2);
        assert!((stats.avg_rating - 3.0).abs() < 1e-6);

        // (2.0 + 4.0 + 4.0) / 3
        let mean = index.global_mean_rating().unwrap();
        assert!((mean - 10.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_popularity_score() {
        let score1 = compute_popularity_score(4.5, 10);
        let score2 = compute_popularity_score(3.5, 1000);
        assert!(score1 > 0.0);
        assert!(score2 > score1);
        assert_eq!(compute_popularity_score(4.0, 0), 0.0);
    }
}
