//! Tabular dataset model.
//!
//! A [`Dataset`] is an ordered sequence of rows over a fixed, ordered set
//! of columns. Each column carries a dtype classification that is inferred
//! once at construction and never changes. The validation engine only ever
//! borrows a dataset; every derived structure is built alongside it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Missing value
    Null,
    /// Boolean value
    Boolean(bool),
    /// Numeric value
    Number(f64),
    /// Free text value
    Text(String),
}

impl CellValue {
    /// Returns true for missing values.
    ///
    /// Non-finite numbers are treated as missing so they never reach
    /// statistical calculations.
    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Number(v) => !v.is_finite(),
            _ => false,
        }
    }

    /// Returns the finite numeric value of a `Number` cell.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    /// Returns the text of a `Text` cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a JSON value into a cell.
    ///
    /// Nested arrays and objects are kept as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Null,
            serde_json::Value::Bool(b) => CellValue::Boolean(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(CellValue::Null, CellValue::Number),
            serde_json::Value::String(s) => CellValue::Text(s.clone()),
            nested => CellValue::Text(nested.to_string()),
        }
    }

    /// Converts the cell back into a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Null => serde_json::Value::Null,
            CellValue::Boolean(b) => serde_json::Value::Bool(*b),
            CellValue::Number(v) => serde_json::Number::from_f64(*v)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            CellValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}

/// Column dtype classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// At least one value, and every non-missing value is a number
    Numeric,
    /// Anything else: text, booleans, mixed or entirely missing
    Categorical,
}

/// A named, classified column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// Errors raised while building a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
    #[error("record {row} is not a JSON object")]
    NotAnObject { row: usize },
    #[error("expected a JSON array of records, a {{\"data\": [...]}} object or a single record")]
    UnsupportedDocument,
}

/// An ordered, column-classified table of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Builds a dataset from column names and positional rows.
    ///
    /// Column kinds are inferred from the values. Every row must have
    /// exactly one cell per column.
    pub fn new(
        column_names: Vec<String>,
        rows: Vec<Vec<CellValue>>,
    ) -> Result<Self, DatasetError> {
        let mut seen = std::collections::HashSet::new();
        for name in &column_names {
            if !seen.insert(name.as_str()) {
                return Err(DatasetError::DuplicateColumn(name.clone()));
            }
        }

        let expected = column_names.len();
        if let Some((row, found)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != expected)
            .map(|(i, r)| (i, r.len()))
        {
            return Err(DatasetError::RowWidth {
                row,
                expected,
                found,
            });
        }

        let columns = column_names
            .into_iter()
            .enumerate()
            .map(|(index, name)| Column {
                kind: infer_kind(rows.iter().map(|r| &r[index])),
                name,
            })
            .collect();

        Ok(Self { columns, rows })
    }

    /// Builds a dataset from JSON object records.
    ///
    /// Columns are the union of object keys in first-seen order; a key
    /// absent from a record is a missing value for that row.
    pub fn from_json_records(records: &[serde_json::Value]) -> Result<Self, DatasetError> {
        let mut column_names: Vec<String> = Vec::new();
        let mut index_of: std::collections::HashMap<String, usize> =
            std::collections::HashMap::new();

        for (row, record) in records.iter().enumerate() {
            let obj = record
                .as_object()
                .ok_or(DatasetError::NotAnObject { row })?;
            for key in obj.keys() {
                if !index_of.contains_key(key) {
                    index_of.insert(key.clone(), column_names.len());
                    column_names.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .filter_map(serde_json::Value::as_object)
            .map(|obj| {
                column_names
                    .iter()
                    .map(|name| obj.get(name).map_or(CellValue::Null, CellValue::from_json))
                    .collect()
            })
            .collect();

        Self::new(column_names, rows)
    }

    /// Builds a dataset from a JSON document.
    ///
    /// Accepts an array of records, an object whose `data` key holds such an
    /// array, or a single record object (one row).
    pub fn from_json_value(value: &serde_json::Value) -> Result<Self, DatasetError> {
        match value {
            serde_json::Value::Array(records) => Self::from_json_records(records),
            serde_json::Value::Object(obj) => match obj.get("data") {
                Some(serde_json::Value::Array(records)) => Self::from_json_records(records),
                _ => Self::from_json_records(std::slice::from_ref(value)),
            },
            _ => Err(DatasetError::UnsupportedDocument),
        }
    }

    /// Returns an empty dataset with no columns and no rows.
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Columns in declared order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Rows in source order.
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Iterates over the cells of one column in row order.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Iterates over numeric columns with their positions.
    pub fn numeric_columns(&self) -> impl Iterator<Item = (usize, &Column)> + '_ {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind == ColumnKind::Numeric)
    }

    /// Converts the dataset back into JSON object records.
    pub fn to_json_records(&self) -> Vec<serde_json::Value> {
        self.rows
            .iter()
            .map(|row| {
                let obj: serde_json::Map<String, serde_json::Value> = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(column, cell)| (column.name.clone(), cell.to_json()))
                    .collect();
                serde_json::Value::Object(obj)
            })
            .collect()
    }
}

/// Classifies a column from its values.
fn infer_kind<'a>(values: impl Iterator<Item = &'a CellValue>) -> ColumnKind {
    let mut saw_number = false;
    for value in values {
        match value {
            CellValue::Null => {}
            CellValue::Number(_) => saw_number = true,
            _ => return ColumnKind::Categorical,
        }
    }
    if saw_number {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}
