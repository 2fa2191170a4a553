//! Canonical movie identifiers.
//!
//! `title` and `original_title` both contain duplicates in the source data,
//! and the numeric id is not user friendly, so every movie gets an id of the
//! form:
//!
//! ```text
//! slug(title)-slug(original_title)-language-release_year
//! ```
//!
//! e.g. `The Promise` / `Das Versprechen` / `de` / `1995-02-16` becomes
//! `the_promise-das_versprechen-en-1995` under the default language policy.

use crate::config::LanguagePolicy;
use crate::error::{RecommenderError, Result};
use crate::types::{MovieId, MovieMetadata};
use chrono::{Datelike, NaiveDate};

/// Language code used when the source has none
pub const UNKNOWN_LANGUAGE: &str = "xx";

/// Identity fields derived from one metadata row
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIdentity {
    pub movie_id: MovieId,
    /// Normalized `original_language`, independent of the id's language segment
    pub original_language: String,
    pub release_date: Option<NaiveDate>,
    pub release_year: u16,
}

/// Turn a title into an id segment.
///
/// Lowercases, drops everything that is neither alphanumeric nor whitespace
/// (including `-` and `_`), then joins the remaining words with `_`.
///
/// Example: "Mission: Impossible" -> "mission_impossible"
pub fn slugify(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Normalize a language field to a lowercase two-letter code.
///
/// Empty or non-alphabetic input becomes [`UNKNOWN_LANGUAGE`].
pub fn normalize_language(language: &str) -> String {
    let code: String = language
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(2)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if code.len() == 2 {
        code
    } else {
        UNKNOWN_LANGUAGE.to_string()
    }
}

/// Parse a release date into `(date, year)`.
///
/// Accepts `YYYY-MM-DD`, or a bare four-digit year (date is then `None`).
pub fn parse_release_date(raw: &str) -> Option<(Option<NaiveDate>, u16)> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let year = u16::try_from(date.year()).ok()?;
        return Some((Some(date), year));
    }

    if raw.len() == 4 && raw.chars().all(|c| c.is_ascii_digit()) {
        return raw.parse::<u16>().ok().map(|year| (None, year));
    }

    None
}

/// Language segment of the id for this row under `policy`
pub fn display_language(policy: &LanguagePolicy, metadata: &MovieMetadata) -> String {
    match policy {
        LanguagePolicy::Original => normalize_language(&metadata.original_language),
        LanguagePolicy::DisplayLocale(locale) => {
            if metadata.title.trim() == metadata.original_title.trim() {
                normalize_language(&metadata.original_language)
            } else {
                normalize_language(locale)
            }
        }
    }
}

/// Compute the canonical identity of a metadata row.
///
/// Fails with `DataIntegrity` when a title field is empty (or slugifies to
/// nothing) or when the release date is missing or unparseable.
pub fn resolve_identity(
    metadata: &MovieMetadata,
    policy: &LanguagePolicy,
) -> Result<ResolvedIdentity> {
    let title = slugify(&metadata.title);
    if title.is_empty() {
        return Err(RecommenderError::integrity(
            metadata.id,
            format!("title {:?} yields an empty identifier", metadata.title),
        ));
    }

    let original_title = slugify(&metadata.original_title);
    if original_title.is_empty() {
        return Err(RecommenderError::integrity(
            metadata.id,
            format!(
                "original title {:?} yields an empty identifier",
                metadata.original_title
            ),
        ));
    }

    let raw_date = metadata
        .release_date
        .as_deref()
        .ok_or_else(|| RecommenderError::integrity(metadata.id, "missing release date"))?;
    let (release_date, release_year) = parse_release_date(raw_date).ok_or_else(|| {
        RecommenderError::integrity(metadata.id, format!("unparseable release date {raw_date:?}"))
    })?;

    let language = display_language(policy, metadata);

    Ok(ResolvedIdentity {
        movie_id: format!("{title}-{original_title}-{language}-{release_year}"),
        original_language: normalize_language(&metadata.original_language),
        release_date,
        release_year,
    })
}
