//! Density-based clustering.
//!
//! Rows in dense regions form clusters; rows reachable from no core point
//! are noise and get flagged. Wide matrices are projected onto their
//! leading principal components first so Euclidean distances stay
//! meaningful.

use std::collections::VecDeque;

use rayon::prelude::*;
use tracing::{debug, warn};

use super::features::FeatureMatrix;
use super::models::{DbscanDetails, DetectorDetails, DetectorKind, DetectorResult, FitError};
use super::pca;
use crate::config::DbscanConfig;

/// Clusters the matrix and flags the noise rows.
///
/// A matrix that cannot be fitted yields an all-clear degraded result.
pub fn fit_detect(matrix: &FeatureMatrix, config: &DbscanConfig) -> DetectorResult {
    match fit(matrix, config) {
        Ok((flags, details)) => {
            debug!(
                "DBSCAN found {} clusters and {} noise points",
                details.n_clusters, details.noise_points
            );
            DetectorResult::fitted(DetectorKind::Dbscan, flags, DetectorDetails::Dbscan(details))
        }
        Err(e) => {
            warn!("DBSCAN could not be fitted: {}", e);
            DetectorResult::degraded(DetectorKind::Dbscan, matrix.n_rows(), e.to_string())
        }
    }
}

fn fit(matrix: &FeatureMatrix, config: &DbscanConfig) -> Result<(Vec<bool>, DbscanDetails), FitError> {
    let scaled = matrix.standardized()?;

    let (points, components, explained_variance_ratio) =
        if matrix.n_features() > config.max_components {
            let projection = pca::project(&scaled, config.max_components)?;
            (
                projection.data,
                projection.components,
                Some(projection.explained_variance_ratio),
            )
        } else {
            (scaled, matrix.n_features(), None)
        };

    let labels = cluster(&points, config.eps, config.min_samples);

    let n_clusters = labels.iter().flatten().max().map_or(0, |&max| max + 1);
    let mut cluster_sizes = vec![0; n_clusters];
    for &label in labels.iter().flatten() {
        cluster_sizes[label] += 1;
    }
    let flags: Vec<bool> = labels.iter().map(Option::is_none).collect();
    let noise_points = flags.iter().filter(|&&f| f).count();

    Ok((
        flags,
        DbscanDetails {
            eps: config.eps,
            min_samples: config.min_samples,
            n_clusters,
            cluster_sizes,
            noise_points,
            pca_components: components,
            explained_variance_ratio,
        },
    ))
}

/// Assigns each point a cluster id, or `None` for noise.
///
/// Neighbourhoods are closed balls of radius `eps` and include the point
/// itself. Border points join the first cluster that reaches them.
pub fn cluster(points: &[Vec<f64>], eps: f64, min_samples: usize) -> Vec<Option<usize>> {
    let eps_squared = eps * eps;
    let neighbourhoods: Vec<Vec<usize>> = points
        .par_iter()
        .map(|p| {
            points
                .iter()
                .enumerate()
                .filter(|(_, q)| squared_distance(p, q) <= eps_squared)
                .map(|(j, _)| j)
                .collect()
        })
        .collect();
    let is_core: Vec<bool> = neighbourhoods
        .iter()
        .map(|n| n.len() >= min_samples)
        .collect();

    let mut labels: Vec<Option<usize>> = vec![None; points.len()];
    let mut next_cluster = 0;
    let mut queue = VecDeque::new();

    for seed in 0..points.len() {
        if labels[seed].is_some() || !is_core[seed] {
            continue;
        }
        labels[seed] = Some(next_cluster);
        queue.push_back(seed);

        while let Some(point) = queue.pop_front() {
            for &neighbour in &neighbourhoods[point] {
                if labels[neighbour].is_none() {
                    labels[neighbour] = Some(next_cluster);
                    if is_core[neighbour] {
                        queue.push_back(neighbour);
                    }
                }
            }
        }
        next_cluster += 1;
    }

    labels
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}
