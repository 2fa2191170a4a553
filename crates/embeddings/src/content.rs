//! Content signal: TF-IDF over movie text and metadata.
//!
//! Every movie becomes a bag of prefixed tokens:
//! - `kw:` keywords, `genre:` genres
//! - `cast:` top-billed actors, `director:` and `writer:` crew
//! - `lang:` original language and `decade:` release decade
//! - `ovw:` words from the overview, down-weighted
//!
//! `lang:` and `decade:` exist for every movie, so movies without keywords,
//! credits or overview still get a non-zero row.

use crate::traits::Signal;
use catalog::identity::slugify;
use catalog::{DataIndex, Movie, Result};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "his", "her", "their", "they", "this", "that", "from", "into",
    "who", "when", "after", "are", "was", "has", "have", "but", "not", "its", "one", "out",
    "all", "she", "him", "them", "about", "what", "will", "while", "where", "which", "over",
];

const WRITER_JOBS: &[&str] = &["Screenplay", "Writer", "Novel"];

/// Builds TF-IDF vectors over a fixed vocabulary.
#[derive(Debug, Clone)]
pub struct ContentSignal {
    /// Upper bound on the vocabulary size, i.e. the row width
    max_features: usize,
    /// Number of top-billed actors to keep per movie
    top_cast: usize,
    /// Term-frequency multiplier for overview words
    overview_weight: f32,
    /// Tokens seen in fewer movies than this are dropped
    min_document_frequency: usize,
}

impl ContentSignal {
    pub fn new() -> Self {
        Self {
            max_features: 512,
            top_cast: 5,
            overview_weight: 0.5,
            min_document_frequency: 1,
        }
    }

    /// Configure the maximum vocabulary size (default: 512)
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    /// Configure how many top-billed actors are used (default: 5)
    pub fn with_top_cast(mut self, top_cast: usize) -> Self {
        self.top_cast = top_cast;
        self
    }

    /// Configure the weight of overview words (default: 0.5)
    pub fn with_overview_weight(mut self, weight: f32) -> Self {
        self.overview_weight = weight;
        self
    }

    /// Configure the minimum document frequency of a token (default: 1)
    pub fn with_min_document_frequency(mut self, min: usize) -> Self {
        self.min_document_frequency = min;
        self
    }

    /// Weighted token counts for one movie
    pub fn tokens(&self, movie: &Movie) -> BTreeMap<String, f32> {
        let mut counts: BTreeMap<String, f32> = BTreeMap::new();
        let mut add = |token: String, weight: f32| {
            *counts.entry(token).or_insert(0.0) += weight;
        };

        for keyword in &movie.keywords {
            let slug = slugify(keyword);
            if !slug.is_empty() {
                add(format!("kw:{slug}"), 1.0);
            }
        }
        for genre in &movie.genres {
            let slug = slugify(genre);
            if !slug.is_empty() {
                add(format!("genre:{slug}"), 1.0);
            }
        }
        for member in movie.cast.iter().take(self.top_cast) {
            add(format!("cast:{}", slugify(&member.name)), 1.0);
        }
        for name in movie.crew_with_job("Director") {
            add(format!("director:{}", slugify(name)), 1.0);
        }
        for member in movie.crew.iter().filter(|m| WRITER_JOBS.contains(&m.job.as_str())) {
            add(format!("writer:{}", slugify(&member.name)), 1.0);
        }

        add(format!("lang:{}", movie.original_language), 1.0);
        add(format!("decade:{}", movie.release_year / 10 * 10), 1.0);

        if let Some(overview) = &movie.overview {
            for word in overview_words(overview) {
                add(format!("ovw:{word}"), self.overview_weight);
            }
        }

        counts
    }

    /// Select the vocabulary from per-movie token bags.
    ///
    /// Tokens are ranked by document frequency (descending, ties by token),
    /// truncated to `max_features`, then ordered by token.
    fn vocabulary(&self, documents: &[BTreeMap<String, f32>]) -> Vec<(String, usize)> {
        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for document in documents {
            for token in document.keys() {
                *document_frequency.entry(token.as_str()).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> = document_frequency
            .into_iter()
            .filter(|(_, df)| *df >= self.min_document_frequency)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);
        ranked.sort_by(|a, b| a.0.cmp(b.0));

        ranked
            .into_iter()
            .map(|(token, df)| (token.to_string(), df))
            .collect()
    }
}

impl Default for ContentSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl Signal for ContentSignal {
    fn name(&self) -> &str {
        "content"
    }

    #[instrument(skip_all, fields(movies = data_index.len()))]
    fn compute(&self, data_index: &DataIndex) -> Result<Vec<Vec<f32>>> {
        let movies: Vec<&Movie> = data_index.movies().collect();
        let documents: Vec<BTreeMap<String, f32>> =
            movies.par_iter().map(|movie| self.tokens(movie)).collect();

        let vocabulary = self.vocabulary(&documents);
        let total = documents.len() as f32;
        let columns: HashMap<&str, (usize, f32)> = vocabulary
            .iter()
            .enumerate()
            .map(|(column, (token, df))| {
                // Smoothed inverse document frequency
                let idf = ((1.0 + total) / (1.0 + *df as f32)).ln() + 1.0;
                (token.as_str(), (column, idf))
            })
            .collect();
        debug!("Content vocabulary has {} tokens", columns.len());

        let width = vocabulary.len();
        let rows = documents
            .par_iter()
            .map(|document| {
                let mut row = vec![0.0f32; width];
                for (token, tf) in document {
                    if let Some(&(column, idf)) = columns.get(token.as_str()) {
                        row[column] = tf * idf;
                    }
                }
                row
            })
            .collect();

        Ok(rows)
    }
}

/// Lowercased alphanumeric words of at least three characters, minus stop words
fn overview_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= 3)
        .map(str::to_lowercase)
        .filter(|word| !STOP_WORDS.contains(&word.as_str()))
}
