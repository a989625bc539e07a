//! Isolation forest.
//!
//! Anomalies are isolated by fewer random splits than normal points. Each
//! tree is grown on a random subsample; a row's score is derived from its
//! average path length across the ensemble, normalised by the expected path
//! length of an unsuccessful binary search tree lookup.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, warn};

use super::features::FeatureMatrix;
use super::models::{
    DetectorDetails, DetectorKind, DetectorResult, FitError, IsolationForestDetails,
};
use crate::config::IsolationForestConfig;
use crate::stats;

const EULER_GAMMA: f64 = 0.577_215_664_9;

/// Fits a fresh forest on the matrix and flags its most isolated rows.
///
/// Roughly `contamination` of the rows are flagged. A matrix that cannot be
/// fitted yields an all-clear degraded result.
pub fn fit_detect(matrix: &FeatureMatrix, config: &IsolationForestConfig) -> DetectorResult {
    match fit(matrix, config) {
        Ok((flags, details)) => {
            let result = DetectorResult::fitted(
                DetectorKind::IsolationForest,
                flags,
                DetectorDetails::IsolationForest(details),
            );
            debug!(
                "Isolation forest flagged {} of {} rows",
                result.anomaly_count,
                matrix.n_rows()
            );
            result
        }
        Err(e) => {
            warn!("Isolation forest could not be fitted: {}", e);
            DetectorResult::degraded(DetectorKind::IsolationForest, matrix.n_rows(), e.to_string())
        }
    }
}

fn fit(
    matrix: &FeatureMatrix,
    config: &IsolationForestConfig,
) -> Result<(Vec<bool>, IsolationForestDetails), FitError> {
    let data = matrix.standardized()?;
    let subsample = config.max_samples.min(data.len());
    let height_limit = (subsample.max(2) as f64).log2().ceil() as usize;

    let trees: Vec<IsolationTree> = tree_seeds(config.random_state, config.n_estimators)
        .into_par_iter()
        .map(|seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            IsolationTree::grow(&data, subsample, height_limit, &mut rng)
        })
        .collect();

    let normaliser = average_path_length(subsample);
    let scores: Vec<f64> = data
        .par_iter()
        .map(|point| {
            let mean_path =
                trees.iter().map(|t| t.path_length(point)).sum::<f64>() / trees.len() as f64;
            // Higher is more normal; -1 is maximally anomalous
            let ratio = if normaliser > 0.0 {
                mean_path / normaliser
            } else {
                0.0
            };
            -(2f64.powf(-ratio))
        })
        .collect();

    let offset = stats::percentile(&scores, config.contamination * 100.0)
        .ok_or(FitError::EmptyMatrix)?;
    let decision: Vec<f64> = scores.iter().map(|s| s - offset).collect();
    let flags: Vec<bool> = decision.iter().map(|&d| d < 0.0).collect();

    let (mean, std) = stats::mean_and_population_std(&decision).ok_or(FitError::EmptyMatrix)?;
    let threshold = stats::percentile(&decision, config.contamination * 100.0)
        .ok_or(FitError::EmptyMatrix)?;

    Ok((
        flags,
        IsolationForestDetails {
            contamination: config.contamination,
            n_estimators: trees.len(),
            max_samples: subsample,
            anomaly_scores_mean: mean,
            anomaly_scores_std: std,
            threshold,
        },
    ))
}

/// One seed per tree, drawn from a master generator seeded with `random_state`.
fn tree_seeds(random_state: u64, n_estimators: usize) -> Vec<u64> {
    let mut master = StdRng::seed_from_u64(random_state);
    (0..n_estimators).map(|_| master.random()).collect()
}

/// Expected path length of an unsuccessful search in a binary search tree
/// of `n` nodes.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

/// One randomly grown partitioning tree, stored as a node arena.
#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow(data: &[Vec<f64>], subsample: usize, height_limit: usize, rng: &mut StdRng) -> Self {
        let mut indices = rand::seq::index::sample(rng, data.len(), subsample).into_vec();
        let mut tree = Self { nodes: Vec::new() };
        tree.grow_node(data, &mut indices, 0, height_limit, rng);
        tree
    }

    fn grow_node(
        &mut self,
        data: &[Vec<f64>],
        indices: &mut [usize],
        depth: usize,
        height_limit: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            size: indices.len(),
        });
        if depth >= height_limit || indices.len() <= 1 {
            return id;
        }

        // Only features that still vary within this node can split it
        let n_features = data[indices[0]].len();
        let candidates: Vec<(usize, f64, f64)> = (0..n_features)
            .filter_map(|feature| {
                let (min, max) = indices.iter().map(|&i| data[i][feature]).fold(
                    (f64::INFINITY, f64::NEG_INFINITY),
                    |(lo, hi), v| (lo.min(v), hi.max(v)),
                );
                (max > min).then_some((feature, min, max))
            })
            .collect();
        if candidates.is_empty() {
            return id;
        }

        let (feature, min, max) = candidates[rng.random_range(0..candidates.len())];
        let threshold = rng.random_range(min..max);

        let mut split = 0;
        for k in 0..indices.len() {
            if data[indices[k]][feature] <= threshold {
                indices.swap(split, k);
                split += 1;
            }
        }

        let (left_indices, right_indices) = indices.split_at_mut(split);
        let left = self.grow_node(data, left_indices, depth + 1, height_limit, rng);
        let right = self.grow_node(data, right_indices, depth + 1, height_limit, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    fn path_length(&self, point: &[f64]) -> f64 {
        let mut node = 0;
        let mut depth = 0.0;
        loop {
            match self.nodes[node] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if point[feature] <= threshold { left } else { right };
                    depth += 1.0;
                }
                Node::Leaf { size } => return depth + average_path_length(size),
            }
        }
    }
}
