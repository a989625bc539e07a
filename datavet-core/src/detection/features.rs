//! Numeric feature extraction.
//!
//! Turns a dataset into a dense, finite matrix for the detectors: numeric
//! columns only, missing cells imputed with the column median, zero-variance
//! columns dropped. Matrix rows carry the index of the source row they came
//! from so detector flags can be mapped back.

use thiserror::Error;
use tracing::debug;

use super::models::FitError;
use crate::dataset::Dataset;
use crate::stats;

/// Malformed matrix dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureMatrixError {
    #[error("matrix has {row_ids} row ids but {rows} rows")]
    RowIdCount { row_ids: usize, rows: usize },
    #[error("row {row} has {found} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Dense row-major matrix of numeric features.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    row_ids: Vec<usize>,
    values: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Creates a matrix, checking that every row matches the column count.
    pub fn new(
        columns: Vec<String>,
        row_ids: Vec<usize>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self, FeatureMatrixError> {
        if row_ids.len() != values.len() {
            return Err(FeatureMatrixError::RowIdCount {
                row_ids: row_ids.len(),
                rows: values.len(),
            });
        }
        if let Some((row, found)) = values
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, len)| len != columns.len())
        {
            return Err(FeatureMatrixError::RowWidth {
                row,
                expected: columns.len(),
                found,
            });
        }
        Ok(Self {
            columns,
            row_ids,
            values,
        })
    }

    /// Feature names, in dataset column order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Source row index of each matrix row.
    pub fn row_ids(&self) -> &[usize] {
        &self.row_ids
    }

    /// Raw feature values, one vector per row.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Number of matrix rows.
    pub fn n_rows(&self) -> usize {
        self.values.len()
    }

    /// Number of feature columns.
    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    /// True when there is nothing to fit a model on.
    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0 || self.n_features() == 0
    }

    /// Checks that the matrix can be fitted: non-empty and all finite.
    pub fn check_fittable(&self) -> Result<(), FitError> {
        if self.n_rows() == 0 {
            return Err(FitError::EmptyMatrix);
        }
        if self.n_features() == 0 {
            return Err(FitError::NoFeatures);
        }
        for (row, values) in self.values.iter().enumerate() {
            if let Some(feature) = values.iter().position(|v| !v.is_finite()) {
                return Err(FitError::NonFiniteValue { row, feature });
            }
        }
        Ok(())
    }

    /// Scales every feature to zero mean and unit population variance.
    ///
    /// A constant feature keeps a scale of 1 and becomes all zeros. Values
    /// large enough to overflow the column statistics are rejected.
    pub fn standardized(&self) -> Result<Vec<Vec<f64>>, FitError> {
        self.check_fittable()?;

        let scales: Vec<(f64, f64)> = (0..self.n_features())
            .map(|j| {
                let column: Vec<f64> = self.values.iter().map(|row| row[j]).collect();
                let (mean, std) = stats::mean_and_population_std(&column).unwrap_or((0.0, 1.0));
                (mean, if std > 0.0 { std } else { 1.0 })
            })
            .collect();

        let scaled: Vec<Vec<f64>> = self
            .values
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&scales)
                    .map(|(value, (mean, std))| (value - mean) / std)
                    .collect()
            })
            .collect();

        for (row, values) in scaled.iter().enumerate() {
            if let Some(feature) = values.iter().position(|v| !v.is_finite()) {
                return Err(FitError::NonFiniteValue { row, feature });
            }
        }
        Ok(scaled)
    }
}

/// Builds the feature matrix for a dataset.
///
/// Columns whose sample variance is zero or undefined carry no signal and
/// are dropped, which drops every column of a single-row dataset.
pub fn prepare(dataset: &Dataset) -> Result<FeatureMatrix, FeatureMatrixError> {
    let mut columns = Vec::new();
    let mut features: Vec<Vec<f64>> = Vec::new();

    for (index, column) in dataset.numeric_columns() {
        let observed: Vec<f64> = dataset
            .column_values(index)
            .filter_map(|cell| cell.as_number())
            .collect();

        let Some(fill) = stats::median(&observed) else {
            continue;
        };

        let imputed: Vec<f64> = dataset
            .column_values(index)
            .map(|cell| cell.as_number().unwrap_or(fill))
            .collect();

        match stats::mean_and_sample_std(&imputed) {
            Some((_, std)) if std > 0.0 => {
                columns.push(column.name.clone());
                features.push(imputed);
            }
            _ => debug!("Dropping feature '{}': no variance", column.name),
        }
    }

    if features.is_empty() {
        debug!("No usable numeric features");
        return FeatureMatrix::new(Vec::new(), Vec::new(), Vec::new());
    }

    let row_ids: Vec<usize> = (0..dataset.row_count()).collect();
    let values = row_ids
        .iter()
        .map(|&row| features.iter().map(|feature| feature[row]).collect())
        .collect();

    debug!(
        "Prepared {} x {} feature matrix",
        row_ids.len(),
        columns.len()
    );

    FeatureMatrix::new(columns, row_ids, values)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_dataset(rows: Vec<serde_json::Value>) -> Dataset {
        Dataset::from_json_records(&rows).unwrap()
    }

    #[test]
    fn test_prepare_keeps_numeric_columns() {
        let dataset = create_dataset(vec![
            json!({"id": 1, "name": "a", "score": 10.0}),
            json!({"id": 2, "name": "b", "score": 12.0}),
            json!({"id": 3, "name": "c", "score": 11.0}),
        ]);

        let matrix = prepare(&dataset).unwrap();

        assert_eq!(matrix.columns(), ["id", "score"]);
        assert_eq!(matrix.row_ids(), [0, 1, 2]);
        assert_eq!(matrix.rows()[1], vec![2.0, 12.0]);
    }

    #[test]
    fn test_prepare_imputes_median() {
        let dataset = create_dataset(vec![
            json!({"x": 1.0}),
            json!({"x": null}),
            json!({"x": 3.0}),
            json!({"x": 10.0}),
        ]);

        let matrix = prepare(&dataset).unwrap();

        assert_eq!(matrix.rows()[1], vec![3.0]);
    }

    #[test]
    fn test_prepare_drops_constant_columns() {
        let dataset = create_dataset(vec![
            json!({"flat": 5, "x": 1}),
            json!({"flat": 5, "x": 2}),
            json!({"flat": null, "x": 3}),
        ]);

        let matrix = prepare(&dataset).unwrap();

        assert_eq!(matrix.columns(), ["x"]);
    }

    #[test]
    fn test_prepare_single_row_has_no_features() {
        let dataset = create_dataset(vec![json!({"x": 1.0, "y": 2.0})]);

        let matrix = prepare(&dataset).unwrap();

        assert!(matrix.is_empty());
        assert_eq!(matrix.n_features(), 0);
    }

    #[test]
    fn test_prepare_without_numeric_columns() {
        let dataset = create_dataset(vec![json!({"name": "a"}), json!({"name": "b"})]);

        let matrix = prepare(&dataset).unwrap();

        assert!(matrix.is_empty());
        assert!(matrix.row_ids().is_empty());
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let err = FeatureMatrix::new(
            vec!["a".into(), "b".into()],
            vec![0, 1],
            vec![vec![1.0, 2.0], vec![3.0]],
        )
        .unwrap_err();

        assert_eq!(
            err,
            FeatureMatrixError::RowWidth {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_standardized_zero_mean_unit_variance() {
        let matrix = FeatureMatrix::new(
            vec!["a".into()],
            vec![0, 1, 2, 3],
            vec![vec![2.0], vec![4.0], vec![6.0], vec![8.0]],
        )
        .unwrap();

        let scaled = matrix.standardized().unwrap();
        let column: Vec<f64> = scaled.iter().map(|r| r[0]).collect();
        let (mean, std) = stats::mean_and_population_std(&column).unwrap();

        assert!(mean.abs() < 1e-12);
        assert!((std - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_standardized_rejects_non_finite() {
        let matrix =
            FeatureMatrix::new(vec!["a".into()], vec![0, 1], vec![vec![1.0], vec![f64::NAN]])
                .unwrap();

        assert_eq!(
            matrix.standardized().unwrap_err(),
            FitError::NonFiniteValue { row: 1, feature: 0 }
        );
    }

    #[test]
    fn test_standardized_rejects_overflowing_column() {
        let values: Vec<Vec<f64>> = (0..12).map(|i| vec![1e308 + f64::from(i) * 1e306]).collect();
        let matrix = FeatureMatrix::new(vec!["x".into()], (0..12).collect(), values).unwrap();

        assert!(matrix.check_fittable().is_ok());
        assert_eq!(
            matrix.standardized().unwrap_err(),
            FitError::NonFiniteValue { row: 0, feature: 0 }
        );
    }
}
