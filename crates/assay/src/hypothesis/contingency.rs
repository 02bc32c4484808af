//! Contingency tables and the chi-square test of independence.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{AssayError, Result};
use crate::input::{Row, Value};
use crate::math::chi_square_p_value;

/// Expected cell count below which the chi-square approximation is doubtful.
pub const MIN_EXPECTED_COUNT: f64 = 5.0;

/// Cross-tabulated counts of two categorical variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContingencyTable {
    /// Row levels, in first-appearance order.
    pub levels_a: Vec<String>,
    /// Column levels, in first-appearance order.
    pub levels_b: Vec<String>,
    /// `table[i][j]` counts rows with level `levels_a[i]` and `levels_b[j]`.
    pub table: Vec<Vec<u64>>,
}

impl ContingencyTable {
    /// Cross-tabulate two columns. Missing cells count as the `NA` level.
    pub fn from_rows(rows: &[Row], var_a: &str, var_b: &str) -> Self {
        let label = |row: &Row, name: &str| {
            row.get(name).map_or_else(|| Value::Missing.label(), Value::label)
        };
        let levels_a: IndexSet<String> = rows.iter().map(|r| label(r, var_a)).collect();
        let levels_b: IndexSet<String> = rows.iter().map(|r| label(r, var_b)).collect();

        let mut table = vec![vec![0u64; levels_b.len()]; levels_a.len()];
        for row in rows {
            if let (Some(i), Some(j)) = (
                levels_a.get_index_of(&label(row, var_a)),
                levels_b.get_index_of(&label(row, var_b)),
            ) {
                table[i][j] += 1;
            }
        }

        Self {
            levels_a: levels_a.into_iter().collect(),
            levels_b: levels_b.into_iter().collect(),
            table,
        }
    }
}

/// Result of a chi-square test of independence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareResult {
    pub chi2: f64,
    pub df: usize,
    pub p: f64,
    pub cramers_v: f64,
    /// Some expected count is below 5.
    pub low_expected: bool,
}

/// Chi-square test of independence on an `r × c` table of counts.
///
/// Cells with an expected count of zero contribute nothing to the
/// statistic but still set `low_expected`.
pub fn chi_square_test(table: &[Vec<u64>]) -> Result<ChiSquareResult> {
    let rows = table.len();
    let cols = table.first().map_or(0, Vec::len);
    if rows < 2 || cols < 2 {
        return Err(AssayError::InsufficientData(format!(
            "chi-square test needs at least a 2x2 table (got {}x{})",
            rows, cols
        )));
    }
    if table.iter().any(|row| row.len() != cols) {
        return Err(AssayError::InsufficientData(
            "contingency table rows have different lengths".to_string(),
        ));
    }

    let row_totals: Vec<f64> = table
        .iter()
        .map(|row| row.iter().sum::<u64>() as f64)
        .collect();
    let col_totals: Vec<f64> = (0..cols)
        .map(|j| table.iter().map(|row| row[j]).sum::<u64>() as f64)
        .collect();
    let total: f64 = row_totals.iter().sum();
    if total == 0.0 {
        return Err(AssayError::InsufficientData(
            "contingency table is empty".to_string(),
        ));
    }

    let mut chi2 = 0.0;
    let mut low_expected = false;
    for (i, row) in table.iter().enumerate() {
        for (j, &observed) in row.iter().enumerate() {
            let expected = row_totals[i] * col_totals[j] / total;
            if expected < MIN_EXPECTED_COUNT {
                low_expected = true;
            }
            if expected > 0.0 {
                chi2 += (observed as f64 - expected).powi(2) / expected;
            }
        }
    }

    let df = (rows - 1) * (cols - 1);
    let min_dim = (rows - 1).min(cols - 1) as f64;

    Ok(ChiSquareResult {
        chi2,
        df,
        p: chi_square_p_value(chi2, df as f64),
        cramers_v: (chi2 / (total * min_dim)).sqrt(),
        low_expected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::row;

    #[test]
    fn test_observed_equals_expected() {
        let result = chi_square_test(&[vec![10, 10], vec![10, 10]]).unwrap();
        assert_eq!(result.chi2, 0.0);
        assert!((result.p - 1.0).abs() < 1e-12);
        assert!(!result.low_expected);
        assert_eq!(result.cramers_v, 0.0);
    }

    #[test]
    fn test_strong_association() {
        let result = chi_square_test(&[vec![30, 5], vec![5, 30]]).unwrap();
        // expected 17.5 everywhere
        assert!((result.chi2 - 4.0 * 12.5f64.powi(2) / 17.5).abs() < 1e-9);
        assert_eq!(result.df, 1);
        assert!(result.p < 1e-6);
        assert!(result.cramers_v > 0.6);
    }

    #[test]
    fn test_low_expected_is_flagged() {
        let result = chi_square_test(&[vec![1, 2], vec![3, 1]]).unwrap();
        assert!(result.low_expected);
    }

    #[test]
    fn test_degenerate_tables() {
        assert!(chi_square_test(&[vec![1, 2, 3]]).is_err());
        assert!(chi_square_test(&[vec![0, 0], vec![0, 0]]).is_err());
        assert!(chi_square_test(&[vec![1, 2], vec![3]]).is_err());
    }

    #[test]
    fn test_table_from_rows() {
        let rows = vec![
            row([("a", "x"), ("b", "p")]),
            row([("a", "y"), ("b", "q")]),
            row([("a", "x"), ("b", "q")]),
            row([("a", "x"), ("b", "q")]),
        ];
        let table = ContingencyTable::from_rows(&rows, "a", "b");
        assert_eq!(table.levels_a, vec!["x", "y"]);
        assert_eq!(table.levels_b, vec!["p", "q"]);
        assert_eq!(table.table, vec![vec![1, 2], vec![0, 1]]);
    }
}
