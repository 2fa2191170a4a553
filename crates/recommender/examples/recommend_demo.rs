//! Example: Recommend movies on a tiny catalog
//!
//! Run with: cargo run --package recommender --example recommend_demo
//!
//! This example shows how to:
//! 1. Build the recommender from raw tables
//! 2. Recommend movies to users with and without favorites
//! 3. Find similar movies
//! 4. Export embeddings and their 2-D projection

use catalog::{CastMember, CrewMember, MovieCredits, MovieKeywords, MovieMetadata, Rating};
use embeddings::export;
use recommender::{HybridRecommenderSystem, RecommendationSource, RecommenderSystem};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn credits(id: u32, director: &str, cast: &[&str]) -> MovieCredits {
    MovieCredits {
        id,
        cast: cast
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

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Hybrid Recommender Example ===\n");

    let metadata = vec![
        MovieMetadata::new(862, "Toy Story", "Toy Story", "en", "1995-10-30")
            .with_genres(["Animation", "Comedy", "Family"])
            .with_overview("Woody the cowboy doll feels threatened by a new spaceman toy."),
        MovieMetadata::new(863, "Toy Story 2", "Toy Story 2", "en", "1999-10-30")
            .with_genres(["Animation", "Comedy", "Family"])
            .with_overview("Woody is stolen by a toy collector and his friends set out to save him."),
        MovieMetadata::new(348, "Alien", "Alien", "en", "1979-05-25")
            .with_genres(["Horror", "Science Fiction"])
            .with_overview("The crew of a commercial spacecraft encounters a deadly lifeform."),
        MovieMetadata::new(679, "Aliens", "Aliens", "en", "1986-07-18")
            .with_genres(["Horror", "Action", "Science Fiction"])
            .with_overview("Ripley returns to the planet where her crew found the alien."),
        MovieMetadata::new(949, "Heat", "Heat", "en", "1995-12-15")
            .with_genres(["Action", "Crime", "Drama"])
            .with_overview("A group of professional bank robbers is hunted by a detective."),
        MovieMetadata::new(18, "The Promise", "Das Versprechen", "de", "1995-02-16")
            .with_genres(["Drama", "Romance"])
            .with_overview("Two lovers are separated by the Berlin wall."),
    ];
    let keywords = vec![
        MovieKeywords { id: 862, keywords: vec!["toy".into(), "friendship".into()] },
        MovieKeywords { id: 863, keywords: vec!["toy".into(), "collector".into()] },
        MovieKeywords { id: 348, keywords: vec!["space".into(), "alien".into()] },
        MovieKeywords { id: 679, keywords: vec!["space".into(), "alien".into(), "marine".into()] },
        MovieKeywords { id: 949, keywords: vec!["heist".into(), "los angeles".into()] },
        MovieKeywords { id: 18, keywords: vec!["berlin wall".into(), "love".into()] },
    ];
    let credits = vec![
        credits(862, "John Lasseter", &["Tom Hanks", "Tim Allen"]),
        credits(863, "John Lasseter", &["Tom Hanks", "Tim Allen"]),
        credits(348, "Ridley Scott", &["Sigourney Weaver"]),
        credits(679, "James Cameron", &["Sigourney Weaver"]),
        credits(949, "Michael Mann", &["Al Pacino", "Robert De Niro"]),
        credits(18, "Margarethe von Trotta", &["Meret Becker"]),
    ];
    let ratings: Vec<Rating> = [
        (1, 862, 5.0),
        (1, 348, 4.5),
        (1, 949, 2.0),
        (2, 679, 4.0),
        (2, 18, 5.0),
        (2, 863, 3.0),
        (3, 949, 4.5),
        (3, 348, 4.0),
    ]
    .into_iter()
    .map(|(user_id, source_id, rating)| Rating {
        user_id,
        source_id,
        rating,
        timestamp: None,
    })
    .collect();

    // Build the recommender
    println!("Building recommender...");
    let start = Instant::now();
    let system = HybridRecommenderSystem::new(&ratings, &metadata, &keywords, &credits)?;
    println!("Built {} in {:?}\n", system.name(), start.elapsed());

    for movie_id in system.data_index().movie_ids() {
        println!("  {movie_id}");
    }
    println!();

    // User 1 has two favorites, user 42 has none
    for user_id in [1, 42] {
        println!("Top 3 for user {user_id}:");
        for recommendation in system.recommend_movies_to_user(user_id, 3)? {
            let reason = match &recommendation.source {
                RecommendationSource::SimilarTo(movie_id) => format!("similar to {movie_id}"),
                RecommendationSource::HighlyRated => "highly rated".to_string(),
            };
            println!(
                "  {} ({}) - {}",
                recommendation.movie.title, recommendation.movie.release_year, reason
            );
        }
        println!();
    }

    let query = "alien-alien-en-1979";
    println!("Similar to {query}:");
    for similar in system.recommend_similar_movies(query, 3)? {
        println!(
            "  {:.3}  {}",
            similar.score.unwrap_or_default(),
            similar.movie.movie_id
        );
    }
    println!();

    // Embeddings for an external plotting tool
    let all_ids = system.data_index().movie_ids().to_vec();
    let rows = system.get_movies_embeddings(&all_ids)?;
    println!("2-D projection of {} embeddings:", rows.len());
    for point in export::project_2d(&rows) {
        println!("  ({:>7.3}, {:>7.3})  {}", point.x, point.y, point.movie_id);
    }

    Ok(())
}
