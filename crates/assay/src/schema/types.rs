//! Core type definitions for column metadata.

use serde::{Deserialize, Serialize};

/// Detected data type of a column.
///
/// Encoding decisions are made strictly from this type, never from the
/// values themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectedType {
    /// Numbers, used as-is in a design matrix.
    Numeric,
    /// Discrete labels, dummy-encoded.
    #[default]
    Categorical,
    /// Free text with high cardinality.
    Text,
}

impl DetectedType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DetectedType::Numeric)
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            DetectedType::Numeric => "Numeric",
            DetectedType::Categorical => "Categorical",
            DetectedType::Text => "Text",
        }
    }
}

/// Role a column plays in the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Unique row identifier; always removed before analysis.
    Identifier,
    /// Explanatory variable.
    #[default]
    Predictor,
    /// Response variable.
    Outcome,
    /// Explicitly excluded by the user.
    Excluded,
}

impl ColumnRole {
    /// Returns true if the column never reaches the working table.
    pub fn is_dropped(&self) -> bool {
        matches!(self, ColumnRole::Identifier | ColumnRole::Excluded)
    }
}
