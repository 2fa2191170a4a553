//! Configuration for building the movie table.

use serde::{Deserialize, Serialize};

/// How the language segment of a `movie_id` is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguagePolicy {
    /// Encode the language of the display title.
    ///
    /// When `title` differs from `original_title`, the title is the dataset's
    /// translation into `locale` and the segment is `locale`. Otherwise the
    /// title is the original one and the segment is `original_language`.
    DisplayLocale(String),
    /// Encode `original_language` as-is (after normalization).
    Original,
}

impl Default for LanguagePolicy {
    fn default() -> Self {
        LanguagePolicy::DisplayLocale("en".to_string())
    }
}

/// What to do with rows that fail validation while merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntegrityPolicy {
    /// The first invalid row aborts the build
    #[default]
    Strict,
    /// Invalid rows are dropped and logged
    SkipInvalid,
}

/// Settings used by [`DataIndex::build`](crate::DataIndex::build).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub language_policy: LanguagePolicy,
    pub integrity_policy: IntegrityPolicy,
}

impl CatalogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure how the language segment of ids is derived (default: display locale "en")
    pub fn with_language_policy(mut self, policy: LanguagePolicy) -> Self {
        self.language_policy = policy;
        self
    }

    /// Configure how invalid rows are handled (default: strict)
    pub fn with_integrity_policy(mut self, policy: IntegrityPolicy) -> Self {
        self.integrity_policy = policy;
        self
    }
}
