//! Principal component projection.
//!
//! Eigen-decomposes the covariance matrix with cyclic Jacobi rotations,
//! which is exact enough for the small symmetric matrices seen here (one
//! row and column per numeric feature).

use super::models::FitError;

const MAX_SWEEPS: usize = 100;
const TOLERANCE: f64 = 1e-12;

/// Data expressed in its leading principal components.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Number of components kept
    pub components: usize,
    /// Share of total variance carried by each kept component
    pub explained_variance_ratio: Vec<f64>,
    /// Projected rows, one value per component
    pub data: Vec<Vec<f64>>,
}

/// Projects `data` onto its `max_components` leading principal components.
///
/// Fewer components are kept when the data has fewer features. Needs at
/// least as many rows as components.
pub fn project(data: &[Vec<f64>], max_components: usize) -> Result<Projection, FitError> {
    let n_rows = data.len();
    let n_features = data.first().map_or(0, Vec::len);
    if n_rows == 0 {
        return Err(FitError::EmptyMatrix);
    }
    if n_features == 0 {
        return Err(FitError::NoFeatures);
    }
    let components = max_components.min(n_features);
    if n_rows < components {
        return Err(FitError::InsufficientRows {
            rows: n_rows,
            components,
        });
    }

    let means: Vec<f64> = (0..n_features)
        .map(|j| data.iter().map(|row| row[j]).sum::<f64>() / n_rows as f64)
        .collect();
    let centered: Vec<Vec<f64>> = data
        .iter()
        .map(|row| row.iter().zip(&means).map(|(v, m)| v - m).collect())
        .collect();

    let denominator = n_rows.saturating_sub(1).max(1) as f64;
    let mut covariance = vec![vec![0.0; n_features]; n_features];
    for i in 0..n_features {
        for j in i..n_features {
            let value = centered.iter().map(|row| row[i] * row[j]).sum::<f64>() / denominator;
            covariance[i][j] = value;
            covariance[j][i] = value;
        }
    }

    let (eigenvalues, eigenvectors) = jacobi_eigen(covariance);

    let mut order: Vec<usize> = (0..n_features).collect();
    order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]));
    order.truncate(components);

    let total_variance: f64 = eigenvalues.iter().map(|v| v.max(0.0)).sum();
    let explained_variance_ratio = order
        .iter()
        .map(|&k| {
            if total_variance > 0.0 {
                eigenvalues[k].max(0.0) / total_variance
            } else {
                0.0
            }
        })
        .collect();

    let projected = centered
        .iter()
        .map(|row| {
            order
                .iter()
                .map(|&k| {
                    row.iter()
                        .enumerate()
                        .map(|(j, v)| v * eigenvectors[j][k])
                        .sum()
                })
                .collect()
        })
        .collect();

    Ok(Projection {
        components,
        explained_variance_ratio,
        data: projected,
    })
}

/// Eigenvalues and eigenvectors (as columns) of a symmetric matrix.
fn jacobi_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = a.len();
    let mut v: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for _ in 0..MAX_SWEEPS {
        let off_diagonal: f64 = (0..n)
            .flat_map(|i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
            .map(|(i, j)| a[i][j] * a[i][j])
            .sum();
        if off_diagonal < TOLERANCE {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q].abs() < f64::MIN_POSITIVE {
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let (akp, akq) = (a[k][p], a[k][q]);
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[p][k], a[q][k]);
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for row in &mut v {
                    let (vkp, vkq) = (row[p], row[q]);
                    row[p] = c * vkp - s * vkq;
                    row[q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let eigenvalues = (0..n).map(|i| a[i][i]).collect();
    (eigenvalues, v)
}
