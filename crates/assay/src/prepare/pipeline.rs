//! The deterministic preparation pipeline.
//!
//! Every build starts from the raw rows and runs the same linear sequence:
//! exclude columns, handle missing values, drop high-missing columns, drop
//! duplicates, exclude outliers, transform the outcome. Nothing is patched
//! incrementally.

use std::collections::HashSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::Result;
use crate::input::{finite_values, Row, Value};
use crate::math::{iqr_bounds, mean, median};
use crate::schema::ColumnInfo;

use super::decisions::{
    Adjustments, MissingStrategy, OutlierMode, PrepDecisions, Transform, OUTLIER_IQR_MULTIPLIER,
};

/// Suffix of the shadow column holding pre-transform outcome values.
pub const ORIGINAL_SUFFIX: &str = "_original";

/// Counts and settings describing how a final dataset was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    /// Rows before preparation.
    pub n_original: usize,
    /// Rows after preparation.
    pub n_final: usize,
    /// Rows dropped for missing values.
    pub removed_missing_rows_count: usize,
    /// Rows dropped as duplicates.
    pub removed_duplicates_count: usize,
    /// Rows dropped as outcome outliers.
    pub removed_outliers_count: usize,
    /// Cells filled by imputation.
    #[serde(default)]
    pub imputed_cells_count: usize,
    /// Columns dropped for exceeding the missing threshold.
    #[serde(default)]
    pub dropped_columns: Vec<String>,
    /// Outcome transform actually applied.
    pub transform_applied: Transform,
    /// Justification recorded for the transform.
    #[serde(default)]
    pub transform_justification: String,
    /// Justification recorded for outlier exclusion.
    #[serde(default)]
    pub outlier_justification: String,
    /// Columns present in the final rows.
    pub columns_used: Vec<String>,
    /// Content hash of the final rows (`sha256:<hex>`).
    pub fingerprint: String,
}

/// An analysis-ready dataset together with its preparation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalDataset {
    /// Prepared rows.
    pub rows: Vec<Row>,
    /// Preparation record.
    pub meta: DatasetMeta,
}

impl FinalDataset {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if no rows survived preparation.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Finite values of a column.
    pub fn numeric_column(&self, name: &str) -> Vec<f64> {
        finite_values(&self.rows, name)
    }
}

/// Build the final dataset from raw rows.
///
/// `outcome` names the column used for outlier exclusion and the outcome
/// transform; both are skipped when it is `None`. An illegal transform
/// fails the whole build.
pub fn build_final_dataset(
    raw: &[Row],
    columns: &[ColumnInfo],
    decisions: &PrepDecisions,
    adjustments: &Adjustments,
    outcome: Option<&str>,
) -> Result<FinalDataset> {
    let n_original = raw.len();

    // 1. Identifier and excluded columns never reach the working table.
    let mut excluded: IndexSet<String> = decisions
        .excluded_columns
        .iter()
        .chain(&decisions.identifier_columns)
        .cloned()
        .chain(
            columns
                .iter()
                .filter(|c| c.role.is_dropped())
                .map(|c| c.name.clone()),
        )
        .collect();
    let mut data: Vec<Row> = raw
        .iter()
        .map(|row| without_columns(row, &excluded))
        .collect();
    debug!(excluded = excluded.len(), "Removed excluded columns");

    // 2. Missing values.
    let mut removed_missing_rows_count = 0;
    let mut imputed_cells_count = 0;
    match decisions.missing_strategy {
        MissingStrategy::DropRows => {
            let before = data.len();
            data.retain(|row| row.values().all(|v| !v.is_missing()));
            removed_missing_rows_count = before - data.len();
            debug!(removed = removed_missing_rows_count, "Dropped rows with missing values");
        }
        MissingStrategy::ImputeMean | MissingStrategy::ImputeMedian => {
            for column in columns
                .iter()
                .filter(|c| c.is_numeric() && !excluded.contains(&c.name))
            {
                let present = finite_values(&data, &column.name);
                if present.is_empty() {
                    continue;
                }
                let fill = if decisions.missing_strategy == MissingStrategy::ImputeMean {
                    mean(&present)
                } else {
                    median(&present)
                };
                for row in &mut data {
                    if let Some(cell) = row.get_mut(&column.name) {
                        if cell.is_missing() {
                            *cell = Value::Numeric(fill);
                            imputed_cells_count += 1;
                        }
                    }
                }
            }
            debug!(
                strategy = decisions.missing_strategy.label(),
                imputed = imputed_cells_count,
                "Imputed missing numeric cells"
            );
        }
        MissingStrategy::None => {}
    }

    // 3. High-missing columns, judged on the original metadata.
    let mut dropped_columns = Vec::new();
    if let Some(threshold) = decisions.missing_threshold() {
        dropped_columns = columns
            .iter()
            .filter(|c| c.missing_pct >= threshold && !excluded.contains(&c.name))
            .map(|c| c.name.clone())
            .collect();
        if !dropped_columns.is_empty() {
            let dropped: IndexSet<String> = dropped_columns.iter().cloned().collect();
            data = data.iter().map(|row| without_columns(row, &dropped)).collect();
            excluded.extend(dropped);
        }
        debug!(dropped = ?dropped_columns, threshold, "Dropped high-missing columns");
    }

    // 4. Exact duplicates.
    let mut removed_duplicates_count = 0;
    if decisions.duplicates_removed {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(data.len());
        for row in data {
            if seen.insert(serde_json::to_string(&row)?) {
                kept.push(row);
            } else {
                removed_duplicates_count += 1;
            }
        }
        data = kept;
        debug!(removed = removed_duplicates_count, "Dropped duplicate rows");
    }

    // 5. Outcome outliers.
    let mut removed_outliers_count = 0;
    if let (OutlierMode::Exclude, Some(outcome)) = (adjustments.outlier_mode, outcome) {
        let (lower, upper) = iqr_bounds(&finite_values(&data, outcome), OUTLIER_IQR_MULTIPLIER);
        let before = data.len();
        data.retain(|row| {
            row.get(outcome)
                .and_then(Value::as_f64)
                .is_some_and(|v| v >= lower && v <= upper)
        });
        removed_outliers_count = before - data.len();
        debug!(removed = removed_outliers_count, lower, upper, "Excluded outcome outliers");
    }

    // 6. Outcome transform, always after outlier exclusion.
    let mut transform_applied = Transform::None;
    if let (true, Some(outcome)) = (adjustments.transform_outcome.is_active(), outcome) {
        let transform = adjustments.transform_outcome;
        let minimum = finite_values(&data, outcome)
            .into_iter()
            .fold(f64::INFINITY, f64::min);
        if let Err(e) = transform.check_domain(minimum) {
            warn!(transform = transform.label(), minimum, "Rejected outcome transform");
            return Err(e);
        }
        let shadow = format!("{}{}", outcome, ORIGINAL_SUFFIX);
        for row in &mut data {
            if let Some(v) = row.get(outcome).and_then(Value::as_f64) {
                row.insert(outcome.to_string(), Value::numeric(transform.apply(v)));
                row.insert(shadow.clone(), Value::Numeric(v));
            }
        }
        transform_applied = transform;
        debug!(transform = transform.label(), "Transformed outcome");
    }

    let columns_used: IndexSet<&String> = data
        .iter()
        .flat_map(|row| row.keys())
        .filter(|k| !excluded.contains(*k))
        .collect();
    let columns_used = columns_used.into_iter().cloned().collect();
    let fingerprint = fingerprint(&data)?;

    Ok(FinalDataset {
        meta: DatasetMeta {
            n_original,
            n_final: data.len(),
            removed_missing_rows_count,
            removed_duplicates_count,
            removed_outliers_count,
            imputed_cells_count,
            dropped_columns,
            transform_applied,
            transform_justification: adjustments.justification.transform.clone(),
            outlier_justification: adjustments.justification.outliers.clone(),
            columns_used,
            fingerprint,
        },
        rows: data,
    })
}

/// Content hash of a set of rows.
pub fn fingerprint(rows: &[Row]) -> Result<String> {
    let mut hasher = Sha256::new();
    for row in rows {
        hasher.update(serde_json::to_vec(row)?);
        hasher.update(b"\n");
    }
    Ok(format!("sha256:{:x}", hasher.finalize()))
}

fn without_columns(row: &Row, drop: &IndexSet<String>) -> Row {
    row.iter()
        .filter(|(k, _)| !drop.contains(*k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
