//! Diagnostics-driven validity tiers and the adjustment gate.
//!
//! Diagnostic flags are produced outside this crate. Everything here is a
//! pure function of those flags, so a tier is always re-derived and never
//! edited directly.

use serde::{Deserialize, Serialize};

use crate::error::{AssayError, Result};
use crate::prepare::Transform;

/// Named boolean diagnostics of a fitted model or test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticFlags {
    pub normality_poor: bool,
    pub heteroskedastic: bool,
    pub influential_points: bool,
    pub multicollinearity: bool,
    pub right_skewed: bool,
    pub group_imbalance: bool,
    pub low_expected_counts: bool,
    /// Too few rows for the number of predictors.
    pub np_warning: bool,
    pub outlier_flagged: bool,
}

/// Validity classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidityTier {
    Green,
    #[default]
    Yellow,
    Red,
}

impl ValidityTier {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ValidityTier::Green => "OK",
            ValidityTier::Yellow => "Caution",
            ValidityTier::Red => "Not reliable",
        }
    }

    /// Lowercase name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidityTier::Green => "green",
            ValidityTier::Yellow => "yellow",
            ValidityTier::Red => "red",
        }
    }
}

/// A tier plus the ordered reasons behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityAssessment {
    pub validity: ValidityTier,
    pub reasons: Vec<String>,
}

/// Which adjustments the current diagnostics unlock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentUnlock {
    /// Outcome transform (log / sqrt).
    pub transform: bool,
    /// Outlier exclusion.
    pub outliers: bool,
    pub any: bool,
}

/// Flags plus free-form key metrics, as recorded in the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsSummary {
    pub flags: DiagnosticFlags,
    #[serde(default)]
    pub key_metrics: serde_json::Value,
}

impl DiagnosticsSummary {
    /// Summary without metrics.
    pub fn from_flags(flags: DiagnosticFlags) -> Self {
        Self {
            flags,
            key_metrics: serde_json::Value::Object(Default::default()),
        }
    }
}

/// Map diagnostic flags to a validity tier.
///
/// `red` when a severe combination is present (severe reasons first, then
/// the warnings), `yellow` when any warning exists, otherwise `green`.
pub fn derive_validity(flags: &DiagnosticFlags) -> ValidityAssessment {
    let warnings: Vec<&str> = [
        (flags.normality_poor, "Residuals look non-normal."),
        (flags.heteroskedastic, "Variance looks uneven across predictions."),
        (flags.influential_points, "Some points have unusually large influence."),
        (flags.multicollinearity, "Predictors may overlap heavily."),
        (flags.right_skewed, "Outcome is strongly right-skewed."),
        (flags.group_imbalance, "Groups are uneven or very small."),
        (flags.low_expected_counts, "Some category combinations are very rare."),
        (flags.np_warning, "There may be too few rows for the number of predictors."),
    ]
    .into_iter()
    .filter_map(|(on, reason)| on.then_some(reason))
    .collect();

    let severe: Vec<&str> = [
        (
            flags.normality_poor && flags.heteroskedastic,
            "Multiple assumption checks are failing.",
        ),
        (
            flags.low_expected_counts,
            "Very sparse category combinations reduce reliability.",
        ),
        (
            flags.group_imbalance && flags.normality_poor,
            "Small groups make results unreliable.",
        ),
    ]
    .into_iter()
    .filter_map(|(on, reason)| on.then_some(reason))
    .collect();

    let (validity, reasons): (ValidityTier, Vec<&str>) = if !severe.is_empty() {
        (ValidityTier::Red, severe.into_iter().chain(warnings).collect())
    } else if !warnings.is_empty() {
        (ValidityTier::Yellow, warnings)
    } else {
        (ValidityTier::Green, vec!["No major issues detected."])
    };

    ValidityAssessment {
        validity,
        reasons: reasons.into_iter().map(String::from).collect(),
    }
}

/// Decide which adjustments the flags unlock.
pub fn should_unlock_adjustments(flags: &DiagnosticFlags) -> AdjustmentUnlock {
    let transform = flags.right_skewed || flags.normality_poor || flags.heteroskedastic;
    let outliers = flags.influential_points || flags.outlier_flagged;
    AdjustmentUnlock {
        transform,
        outliers,
        any: transform || outliers,
    }
}

/// Reject a transform whose domain excludes the smallest outcome value.
pub fn validate_transform_choice(outcome_min: f64, transform: Transform) -> Result<()> {
    transform.check_domain(outcome_min)
}

/// Reject empty or whitespace-only justification text.
pub fn validate_justification(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        Err(AssayError::MissingJustification)
    } else {
        Ok(())
    }
}

/// Human-readable improvements between two diagnostics runs.
pub fn diagnostic_improvements(before: &DiagnosticFlags, after: &DiagnosticFlags) -> Vec<String> {
    [
        (before.normality_poor && !after.normality_poor, "Normality improved."),
        (before.heteroskedastic && !after.heteroskedastic, "Variance stability improved."),
        (before.right_skewed && !after.right_skewed, "Skew improved."),
        (before.influential_points && !after.influential_points, "Influence risk reduced."),
        (before.outlier_flagged && !after.outlier_flagged, "Outlier impact reduced."),
    ]
    .into_iter()
    .filter_map(|(improved, message)| improved.then(|| message.to_string()))
    .collect()
}
