//! Embedding export for external consumers such as a visualization tool.
//!
//! - `get` projects the table onto a list of ids
//! - `to_json` serializes rows
//! - `project_2d` reduces rows to two principal components for plotting

use crate::builder::EmbeddingTable;
use catalog::{MovieId, RecommenderError, Result};
use serde::{Deserialize, Serialize};

const POWER_ITERATIONS: usize = 100;

/// One movie and its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRow {
    pub movie_id: MovieId,
    pub vector: Vec<f32>,
}

/// A movie placed on a plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub movie_id: MovieId,
    pub x: f32,
    pub y: f32,
}

/// Rows for `movie_ids`, in the same order.
///
/// Fails with `UnknownMovie` listing every absent id; no rows are returned
/// in that case.
pub fn get(table: &EmbeddingTable, movie_ids: &[MovieId]) -> Result<Vec<EmbeddingRow>> {
    let missing: Vec<MovieId> = movie_ids
        .iter()
        .filter(|id| !table.contains(id))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(RecommenderError::UnknownMovie { ids: missing });
    }

    Ok(movie_ids
        .iter()
        .filter_map(|id| {
            table.get(id).map(|vector| EmbeddingRow {
                movie_id: id.clone(),
                vector: vector.to_vec(),
            })
        })
        .collect())
}

/// Serialize rows as a JSON array
pub fn to_json(rows: &[EmbeddingRow]) -> serde_json::Result<String> {
    serde_json::to_string(rows)
}

/// Project rows onto their first two principal components.
///
/// ## Algorithm
/// 1. Mean-center the rows
/// 2. Find the top eigenvector of the covariance by power iteration
/// 3. Repeat for the second, keeping it orthogonal to the first
/// 4. Each point's coordinates are its dot products with the two components
///
/// The start vector is fixed, so the projection is deterministic.
pub fn project_2d(rows: &[EmbeddingRow]) -> Vec<ProjectedPoint> {
    let dimensions = rows.first().map_or(0, |row| row.vector.len());
    if rows.is_empty() || dimensions == 0 {
        return rows
            .iter()
            .map(|row| ProjectedPoint {
                movie_id: row.movie_id.clone(),
                x: 0.0,
                y: 0.0,
            })
            .collect();
    }

    let mut mean = vec![0.0f64; dimensions];
    for row in rows {
        for (m, &value) in mean.iter_mut().zip(&row.vector) {
            *m += value as f64;
        }
    }
    mean.iter_mut().for_each(|m| *m /= rows.len() as f64);

    let centered: Vec<Vec<f64>> = rows
        .iter()
        .map(|row| {
            row.vector
                .iter()
                .zip(&mean)
                .map(|(&value, m)| value as f64 - m)
                .collect()
        })
        .collect();

    let first = principal_component(&centered, dimensions, None);
    let second = principal_component(&centered, dimensions, Some(first.as_slice()));

    rows.iter()
        .zip(&centered)
        .map(|(row, point)| ProjectedPoint {
            movie_id: row.movie_id.clone(),
            x: dot(point, &first) as f32,
            y: dot(point, &second) as f32,
        })
        .collect()
}

/// Top eigenvector of `X^T X`, optionally orthogonal to `orthogonal_to`
fn principal_component(
    centered: &[Vec<f64>],
    dimensions: usize,
    orthogonal_to: Option<&[f64]>,
) -> Vec<f64> {
    let mut component: Vec<f64> = (0..dimensions).map(|i| 1.0 + (i % 7) as f64).collect();
    let orthogonalize = |vector: &mut Vec<f64>| {
        if let Some(other) = orthogonal_to {
            let projection = dot(vector, other);
            vector
                .iter_mut()
                .zip(other)
                .for_each(|(v, o)| *v -= projection * o);
        }
    };
    orthogonalize(&mut component);
    if !unit(&mut component) {
        return vec![0.0; dimensions];
    }

    for _ in 0..POWER_ITERATIONS {
        // next = X^T (X component)
        let mut next = vec![0.0f64; dimensions];
        for point in centered {
            let weight = dot(point, &component);
            next.iter_mut()
                .zip(point)
                .for_each(|(n, p)| *n += weight * p);
        }
        orthogonalize(&mut next);
        if !unit(&mut next) {
            // No variance left in this direction
            return vec![0.0; dimensions];
        }
        component = next;
    }
    component
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Normalize in place; false when the vector is (numerically) zero
fn unit(vector: &mut [f64]) -> bool {
    let norm = dot(vector, vector).sqrt();
    if norm < 1e-12 {
        return false;
    }
    vector.iter_mut().for_each(|v| *v /= norm);
    true
}
