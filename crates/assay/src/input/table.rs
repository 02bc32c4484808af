//! Row and table representations.

use std::io::Read;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{AssayError, Result};

use super::value::Value;

/// An ordered mapping of column name to cell value.
pub type Row = IndexMap<String, Value>;

/// Build a [`Row`] from `(name, value)` pairs.
pub fn row<K, V, I>(cells: I) -> Row
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    cells
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Represents a rectangular table of typed cells.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataTable {
    /// Column headers.
    pub headers: Vec<String>,
    /// Rows in source order.
    pub rows: Vec<Row>,
}

impl DataTable {
    /// Create a table from already typed rows.
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    /// Create a table from raw text records.
    ///
    /// Short records are padded with `Missing`; extra cells are ignored.
    pub fn from_records(headers: Vec<String>, records: Vec<Vec<String>>) -> Self {
        let rows = records
            .iter()
            .map(|record| {
                headers
                    .iter()
                    .enumerate()
                    .map(|(i, h)| {
                        let value = record.get(i).map(|s| Value::parse(s)).unwrap_or_default();
                        (h.clone(), value)
                    })
                    .collect()
            })
            .collect();
        Self { headers, rows }
    }

    /// Read a comma-separated table with a header row.
    ///
    /// Ragged records are accepted and padded as in [`DataTable::from_records`].
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(AssayError::InsufficientData("No columns found".to_string()));
        }

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record?;
            records.push(record.iter().map(|s| s.to_string()).collect());
        }
        Ok(Self::from_records(headers, records))
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get all values for a column by name; absent cells read as `Missing`.
    pub fn column_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        static MISSING: Value = Value::Missing;
        self.rows
            .iter()
            .map(move |row| row.get(name).unwrap_or(&MISSING))
    }

    /// Check whether a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }
}

/// Finite numeric values of a column, skipping anything non-numeric.
pub fn finite_values(rows: &[Row], column: &str) -> Vec<f64> {
    rows.iter()
        .filter_map(|row| row.get(column).and_then(Value::as_f64))
        .collect()
}

/// Finite values of two columns taken from the rows where both are numeric.
pub fn paired_values(rows: &[Row], a: &str, b: &str) -> (Vec<f64>, Vec<f64>) {
    rows.iter()
        .filter_map(|row| Some((row.get(a)?.as_f64()?, row.get(b)?.as_f64()?)))
        .unzip()
}
