//! Error types for the Assay library.

use thiserror::Error;

use crate::prepare::Transform;

/// Main error type for Assay operations.
///
/// Every variant describes a caller-recoverable failure: the inputs are left
/// untouched and the caller changes parameters and recomputes.
#[derive(Debug, Error)]
pub enum AssayError {
    /// A regression was requested without any predictor.
    #[error("No predictors selected. Choose at least one predictor.")]
    EmptyPredictors,

    /// A named column is not present in the dataset or metadata.
    #[error("Unknown column: '{0}'")]
    UnknownColumn(String),

    /// `XᵗX` could not be inverted, even with the ridge fallback.
    #[error("Model matrix is singular. Remove collinear predictors.")]
    SingularMatrix,

    /// The design matrix would exceed the configured width.
    #[error("Design matrix has {columns} columns, exceeding the limit of {limit}")]
    DesignTooWide { columns: usize, limit: usize },

    /// A categorical predictor has more levels than allowed.
    #[error("Column '{column}' has {levels} levels, exceeding the limit of {limit}")]
    TooManyLevels {
        column: String,
        levels: usize,
        limit: usize,
    },

    /// Not enough observations for the requested computation.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// The final dataset is too small to analyze.
    #[error("Too few rows after preparation to produce reliable results ({rows} < {minimum}).")]
    TooFewRows { rows: usize, minimum: usize },

    /// The outcome transform is illegal for the observed values.
    #[error("{}", transform_domain_message(.transform, .minimum))]
    TransformDomain { transform: Transform, minimum: f64 },

    /// An adjustment was applied without choosing a transform.
    #[error("Select a transform before applying.")]
    TransformNotSelected,

    /// An adjustment was applied without justification text.
    #[error("Please provide a short justification to apply this adjustment.")]
    MissingJustification,

    /// Outlier exclusion was applied without explicit confirmation.
    #[error("Please confirm you understand this changes the analysis.")]
    OutlierExclusionUnconfirmed,

    /// The diagnostics do not unlock the requested adjustment.
    #[error("Adjustment locked: {0}")]
    AdjustmentLocked(String),

    /// The declared analysis intent does not fit the columns.
    #[error("Invalid analysis intent: {0}")]
    InvalidIntent(String),

    /// An analysis was requested before an intent was declared.
    #[error("No analysis intent has been declared")]
    NoIntent,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A loaded audit log is out of order or has gaps.
    #[error("Invalid audit log: {0}")]
    InvalidAuditLog(String),

    /// Failure while rendering an export.
    #[error("Export error: {0}")]
    Export(String),
}

fn transform_domain_message(transform: &Transform, minimum: &f64) -> String {
    match transform {
        Transform::Sqrt => format!(
            "Square-root transform requires all values >= 0. Found minimum = {}.",
            minimum
        ),
        _ => format!(
            "Log transform requires all values > 0. Found minimum = {}.",
            minimum
        ),
    }
}

/// Result type alias for Assay operations.
pub type Result<T> = std::result::Result<T, AssayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singular_message_is_stable() {
        assert_eq!(
            AssayError::SingularMatrix.to_string(),
            "Model matrix is singular. Remove collinear predictors."
        );
    }

    #[test]
    fn test_transform_domain_messages() {
        let log = AssayError::TransformDomain {
            transform: Transform::Log,
            minimum: 0.0,
        };
        assert_eq!(
            log.to_string(),
            "Log transform requires all values > 0. Found minimum = 0."
        );

        let sqrt = AssayError::TransformDomain {
            transform: Transform::Sqrt,
            minimum: -2.5,
        };
        assert!(sqrt.to_string().contains(">= 0"));
        assert!(sqrt.to_string().contains("-2.5"));
    }
}
