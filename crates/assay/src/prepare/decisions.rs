//! Preparation decisions and outcome adjustments chosen by the user.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::{AssayError, Result};
use crate::validity::validate_justification;

/// The only outlier rule supported: values beyond three interquartile ranges.
pub const OUTLIER_RULE: &str = "3xIQR";

/// IQR multiplier behind [`OUTLIER_RULE`].
pub const OUTLIER_IQR_MULTIPLIER: f64 = 3.0;

/// How missing cells are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingStrategy {
    /// Leave missing cells in place.
    #[default]
    None,
    /// Drop any row with a missing cell in a remaining column.
    DropRows,
    /// Fill numeric columns with the mean of present values.
    ImputeMean,
    /// Fill numeric columns with the median of present values.
    ImputeMedian,
}

impl MissingStrategy {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            MissingStrategy::None => "none",
            MissingStrategy::DropRows => "drop_rows",
            MissingStrategy::ImputeMean => "impute_mean",
            MissingStrategy::ImputeMedian => "impute_median",
        }
    }

    /// Returns true for the imputation strategies.
    pub fn imputes(&self) -> bool {
        matches!(self, MissingStrategy::ImputeMean | MissingStrategy::ImputeMedian)
    }
}

/// Cleaning decisions applied before any analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepDecisions {
    /// Missing-value handling.
    pub missing_strategy: MissingStrategy,
    /// Drop columns whose original missing percentage is at or above this.
    pub drop_columns_above_pct: Option<f64>,
    /// Remove exact duplicate rows.
    pub duplicates_removed: bool,
    /// Columns excluded by the user.
    pub excluded_columns: IndexSet<String>,
    /// Columns marked as row identifiers.
    pub identifier_columns: IndexSet<String>,
}

impl PrepDecisions {
    /// Create an empty decision set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the missing-value strategy.
    pub fn with_missing_strategy(mut self, strategy: MissingStrategy) -> Self {
        self.missing_strategy = strategy;
        self
    }

    /// Drop columns at or above `pct` percent missing.
    pub fn drop_columns_above(mut self, pct: f64) -> Self {
        self.drop_columns_above_pct = Some(pct);
        self
    }

    /// Remove duplicate rows.
    pub fn remove_duplicates(mut self) -> Self {
        self.duplicates_removed = true;
        self
    }

    /// Exclude a column.
    pub fn exclude(mut self, column: impl Into<String>) -> Self {
        self.excluded_columns.insert(column.into());
        self
    }

    /// Mark a column as an identifier.
    pub fn identifier(mut self, column: impl Into<String>) -> Self {
        self.identifier_columns.insert(column.into());
        self
    }

    /// Active high-missing threshold; zero or negative disables the step.
    pub fn missing_threshold(&self) -> Option<f64> {
        self.drop_columns_above_pct.filter(|pct| *pct > 0.0)
    }
}

/// Variance-stabilizing transform applied to the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    /// No transform.
    #[default]
    None,
    /// Natural logarithm; requires strictly positive values.
    Log,
    /// Square root; requires non-negative values.
    Sqrt,
}

impl Transform {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Transform::None => "none",
            Transform::Log => "log",
            Transform::Sqrt => "sqrt",
        }
    }

    /// Returns true unless this is [`Transform::None`].
    pub fn is_active(&self) -> bool {
        !matches!(self, Transform::None)
    }

    /// Check that every value is inside the transform's domain, given
    /// the smallest value.
    pub fn check_domain(&self, minimum: f64) -> Result<()> {
        let legal = match self {
            Transform::None => true,
            Transform::Log => minimum > 0.0,
            Transform::Sqrt => minimum >= 0.0,
        };
        if legal {
            Ok(())
        } else {
            Err(AssayError::TransformDomain {
                transform: *self,
                minimum,
            })
        }
    }

    /// Apply the transform to a single value.
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Transform::None => value,
            Transform::Log => value.ln(),
            Transform::Sqrt => value.sqrt(),
        }
    }
}

/// Outlier handling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMode {
    /// Report outliers but keep them.
    #[default]
    Flag,
    /// Remove outlier rows from the final dataset.
    Exclude,
}

/// User justifications recorded with each adjustment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Justification {
    /// Why the outcome transform was applied.
    pub transform: String,
    /// Why outliers were excluded.
    pub outliers: String,
}

/// Advanced adjustments to the outcome variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Adjustments {
    /// Transform applied to the outcome after outlier handling.
    pub transform_outcome: Transform,
    /// Whether outliers are only flagged or excluded.
    pub outlier_mode: OutlierMode,
    /// Fixed outlier rule label.
    pub outlier_rule: String,
    /// Justification text per adjustment.
    pub justification: Justification,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            transform_outcome: Transform::None,
            outlier_mode: OutlierMode::Flag,
            outlier_rule: OUTLIER_RULE.to_string(),
            justification: Justification::default(),
        }
    }
}

impl Adjustments {
    /// Create adjustments that change nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the outcome transform and its justification.
    pub fn with_transform(mut self, transform: Transform, justification: impl Into<String>) -> Self {
        self.transform_outcome = transform;
        self.justification.transform = justification.into();
        self
    }

    /// Exclude outliers with a justification.
    pub fn excluding_outliers(mut self, justification: impl Into<String>) -> Self {
        self.outlier_mode = OutlierMode::Exclude;
        self.justification.outliers = justification.into();
        self
    }

    /// Whether a transform or an exclusion would change the outcome.
    pub fn is_active(&self) -> bool {
        self.transform_outcome.is_active() || self.outlier_mode == OutlierMode::Exclude
    }

    /// Require a justification for every active adjustment.
    pub fn validate_justifications(&self) -> Result<()> {
        if self.transform_outcome.is_active() {
            validate_justification(&self.justification.transform)?;
        }
        if self.outlier_mode == OutlierMode::Exclude {
            validate_justification(&self.justification.outliers)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_domains() {
        assert!(Transform::Log.check_domain(0.1).is_ok());
        assert!(Transform::Log.check_domain(0.0).is_err());
        assert!(Transform::Sqrt.check_domain(0.0).is_ok());
        assert!(Transform::Sqrt.check_domain(-1.0).is_err());
        assert!(Transform::None.check_domain(-100.0).is_ok());
    }

    #[test]
    fn test_active_adjustments_need_justification() {
        assert!(Adjustments::new().validate_justifications().is_ok());
        assert!(!Adjustments::new().is_active());

        let unjustified: Adjustments =
            serde_json::from_str(r#"{"transform_outcome": "log", "outlier_mode": "exclude"}"#).unwrap();
        assert!(unjustified.is_active());
        assert!(matches!(
            unjustified.validate_justifications(),
            Err(AssayError::MissingJustification)
        ));

        let half = Adjustments::new()
            .with_transform(Transform::Sqrt, "right skew")
            .excluding_outliers("  ");
        assert!(matches!(half.validate_justifications(), Err(AssayError::MissingJustification)));

        let justified = Adjustments::new()
            .with_transform(Transform::Log, "right skew")
            .excluding_outliers("entry errors");
        assert!(justified.validate_justifications().is_ok());
    }

    #[test]
    fn test_transform_apply() {
        assert_eq!(Transform::Sqrt.apply(9.0), 3.0);
        assert!((Transform::Log.apply(std::f64::consts::E) - 1.0).abs() < 1e-12);
        assert_eq!(Transform::None.apply(-4.0), -4.0);
    }

    #[test]
    fn test_decision_serde_names() {
        let decisions = PrepDecisions::new()
            .with_missing_strategy(MissingStrategy::ImputeMedian)
            .exclude("notes");
        let json = serde_json::to_value(&decisions).unwrap();
        assert_eq!(json["missing_strategy"], "impute_median");
        assert_eq!(json["excluded_columns"][0], "notes");

        let adjustments: Adjustments =
            serde_json::from_str(r#"{"transform_outcome": "log"}"#).unwrap();
        assert_eq!(adjustments.transform_outcome, Transform::Log);
        assert_eq!(adjustments.outlier_rule, OUTLIER_RULE);
        assert_eq!(adjustments.outlier_mode, OutlierMode::Flag);
    }

    #[test]
    fn test_missing_threshold_requires_positive() {
        assert_eq!(PrepDecisions::new().drop_columns_above(0.0).missing_threshold(), None);
        assert_eq!(PrepDecisions::new().drop_columns_above(40.0).missing_threshold(), Some(40.0));
    }
}
