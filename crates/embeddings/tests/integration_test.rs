//! Integration tests for the embedding pipeline.
//!
//! These tests verify that signals, the builder, the similarity index and
//! the exporter work together on a realistic catalog.

use catalog::{
    CastMember, CatalogConfig, CrewMember, DataIndex, MovieCredits, MovieKeywords, MovieMetadata,
    Rating, RecommenderError,
};
use embeddings::{export, CollaborativeSignal, ContentSignal, EmbeddingBuilder, SimilarityIndex};
use std::collections::HashSet;
use std::sync::Arc;

fn keywords(id: u32, words: &[&str]) -> MovieKeywords {
    MovieKeywords {
        id,
        keywords: words.iter().map(|w| w.to_string()).collect(),
    }
}

fn directed_by(id: u32, director: &str, actors: &[&str]) -> MovieCredits {
    MovieCredits {
        id,
        cast: actors
            .iter()
            .enumerate()
            .map(|(order, name)| CastMember {
                name: name.to_string(),
                character: None,
                order: order as u32,
            })
            .collect(),
        crew: vec![CrewMember {
            name: director.to_string(),
            job: "Director".to_string(),
            department: "Directing".to_string(),
        }],
    }
}

fn create_test_setup() -> DataIndex {
    let metadata = vec![
        MovieMetadata::new(1, "Alien", "Alien", "en", "1979-05-25")
            .with_genres(["Horror", "Science Fiction"])
            .with_overview("The crew of a commercial spacecraft meets a deadly alien."),
        MovieMetadata::new(2, "Aliens", "Aliens", "en", "1986-07-18")
            .with_genres(["Horror", "Science Fiction", "Action"])
            .with_overview("Marines return to the planet where the alien was found."),
        MovieMetadata::new(3, "Toy Story", "Toy Story", "en", "1995-10-30")
            .with_genres(["Animation", "Comedy", "Family"])
            .with_overview("Toys come to life when their owner leaves the room."),
        MovieMetadata::new(4, "Toy Story 2", "Toy Story 2", "en", "1999-10-30")
            .with_genres(["Animation", "Comedy", "Family"])
            .with_overview("Woody is stolen by a toy collector."),
        MovieMetadata::new(5, "The Promise", "Das Versprechen", "de", "1995-02-16")
            .with_genres(["Drama", "Romance"]),
    ];
    let keywords = vec![
        keywords(1, &["space", "alien", "xenomorph"]),
        keywords(2, &["space", "alien", "xenomorph", "marine"]),
        keywords(3, &["toy", "friendship"]),
        keywords(4, &["toy", "friendship", "collector"]),
    ];
    let credits = vec![
        directed_by(1, "Ridley Scott", &["Sigourney Weaver"]),
        directed_by(2, "James Cameron", &["Sigourney Weaver"]),
        directed_by(3, "John Lasseter", &["Tom Hanks", "Tim Allen"]),
        directed_by(4, "John Lasseter", &["Tom Hanks", "Tim Allen"]),
    ];

    let mut ratings = Vec::new();
    for user_id in 1..=6 {
        for (source_id, value) in [(1, 5.0), (2, 4.5), (3, 2.0), (4, 2.0), (5, 3.0)] {
            ratings.push(Rating {
                user_id,
                source_id,
                rating: value,
                timestamp: Some(1_000_000),
            });
        }
    }

    DataIndex::build(&ratings, &metadata, &keywords, &credits, &CatalogConfig::default())
        .unwrap()
}

fn build_index(data_index: &DataIndex) -> SimilarityIndex {
    let table = EmbeddingBuilder::new()
        .add_signal(ContentSignal::new(), 1.0)
        .add_signal(CollaborativeSignal::new(), 0.5)
        .build(data_index)
        .unwrap();
    SimilarityIndex::new(Arc::new(table))
}

#[test]
fn test_sequels_are_nearest_neighbours() {
    let data_index = create_test_setup();
    let index = build_index(&data_index);

    let alien = index.query("alien-alien-en-1979", 1).unwrap();
    assert_eq!(alien[0].movie_id, "aliens-aliens-en-1986");

    let toy_story = index.query("toy_story-toy_story-en-1995", 1).unwrap();
    assert_eq!(toy_story[0].movie_id, "toy_story_2-toy_story_2-en-1999");
}

#[test]
fn test_every_movie_is_embedded() {
    let data_index = create_test_setup();
    let index = build_index(&data_index);
    let table = index.table();

    assert_eq!(table.len(), data_index.len());
    for movie_id in data_index.movie_ids() {
        let vector = table.get(movie_id).unwrap();
        assert_eq!(vector.len(), table.dimensions());
        // Content always contributes at least language and decade
        assert!(vector.iter().any(|&x| x != 0.0));
    }
}

#[test]
fn test_similar_result_sizes() {
    let data_index = create_test_setup();
    let index = build_index(&data_index);

    for movie_id in data_index.movie_ids() {
        for k in 1..=6 {
            let results = index.query(movie_id, k).unwrap();
            assert_eq!(results.len(), k.min(data_index.len() - 1));
            assert!(results.iter().all(|r| &r.movie_id != movie_id));

            let unique: HashSet<_> = results.iter().map(|r| &r.movie_id).collect();
            assert_eq!(unique.len(), results.len());
        }
    }
}

#[test]
fn test_embeddings_are_deterministic() {
    let data_index = create_test_setup();
    let first = build_index(&data_index);
    let second = build_index(&data_index);
    assert_eq!(first.table(), second.table());
}

#[test]
fn test_export_all_ids() -> anyhow::Result<()> {
    let data_index = create_test_setup();
    let index = build_index(&data_index);

    let all_ids = data_index.movie_ids().to_vec();
    let rows = export::get(index.table(), &all_ids)?;

    assert_eq!(rows.len(), all_ids.len());
    let returned: Vec<_> = rows.iter().map(|r| r.movie_id.clone()).collect();
    assert_eq!(returned, all_ids);

    let points = export::project_2d(&rows);
    assert_eq!(points.len(), rows.len());
    assert!(points.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    Ok(())
}

#[test]
fn test_unknown_movie_query() {
    let data_index = create_test_setup();
    let index = build_index(&data_index);
    let err = index.query("jaws-jaws-en-1975", 3).unwrap_err();
    assert!(matches!(err, RecommenderError::UnknownMovie { .. }));
}
