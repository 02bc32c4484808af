//! Column metadata supplied with a dataset.

use serde::{Deserialize, Serialize};

use super::types::{ColumnRole, DetectedType};

/// Metadata for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Detected data type.
    pub detected_type: DetectedType,
    /// Role in the analysis.
    #[serde(default)]
    pub role: ColumnRole,
    /// Unique non-missing values divided by row count.
    #[serde(default)]
    pub unique_ratio: f64,
    /// Share of missing cells, in percent of the original rows.
    #[serde(default)]
    pub missing_pct: f64,
    /// Number of distinct levels (categorical columns).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels_count: Option<usize>,
}

impl ColumnInfo {
    /// Create metadata with a type and the default predictor role.
    pub fn new(name: impl Into<String>, detected_type: DetectedType) -> Self {
        Self {
            name: name.into(),
            detected_type,
            role: ColumnRole::Predictor,
            unique_ratio: 0.0,
            missing_pct: 0.0,
            levels_count: None,
        }
    }

    /// Shorthand for a numeric column.
    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, DetectedType::Numeric)
    }

    /// Shorthand for a categorical column.
    pub fn categorical(name: impl Into<String>) -> Self {
        Self::new(name, DetectedType::Categorical)
    }

    /// Set the role.
    pub fn with_role(mut self, role: ColumnRole) -> Self {
        self.role = role;
        self
    }

    /// Set the missing percentage.
    pub fn with_missing_pct(mut self, pct: f64) -> Self {
        self.missing_pct = pct;
        self
    }

    /// Returns true if encoding treats the column as numeric.
    pub fn is_numeric(&self) -> bool {
        self.detected_type.is_numeric()
    }
}

/// Find column metadata by name.
pub fn find_column<'a>(columns: &'a [ColumnInfo], name: &str) -> Option<&'a ColumnInfo> {
    columns.iter().find(|c| c.name == name)
}
