//! Pearson correlation with a t-test of significance.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AssayError, Result};
use crate::math::{mean, student_t_two_sided};

/// Result of a Pearson correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub r: f64,
    pub p: f64,
    /// Pairs actually used.
    pub n: usize,
    /// The longer series was cut to the length of the shorter one.
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Pearson's r between `x` and `y`, paired by position.
///
/// Series of different lengths are truncated to the shorter one and the
/// result says so in `truncated` and `warnings`.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Result<CorrelationResult> {
    let n = x.len().min(y.len());
    if n < 3 {
        return Err(AssayError::InsufficientData(format!(
            "correlation needs at least 3 pairs (got {})",
            n
        )));
    }

    let mut warnings = Vec::new();
    let truncated = x.len() != y.len();
    if truncated {
        warn!(x = x.len(), y = y.len(), used = n, "Truncating correlation input");
        warnings.push(format!(
            "Series lengths differ ({} vs {}); only the first {} pairs were used.",
            x.len(),
            y.len(),
            n
        ));
    }

    let (xs, ys) = (&x[..n], &y[..n]);
    let (mx, my) = (mean(xs), mean(ys));
    let cov: f64 = xs.iter().zip(ys).map(|(a, b)| (a - mx) * (b - my)).sum();
    let sxx: f64 = xs.iter().map(|a| (a - mx).powi(2)).sum();
    let syy: f64 = ys.iter().map(|b| (b - my).powi(2)).sum();
    let denom = (sxx * syy).sqrt();
    let r = if denom == 0.0 { 0.0 } else { cov / denom };

    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r).max(1e-8)).sqrt();

    Ok(CorrelationResult {
        r,
        p: student_t_two_sided(t, df),
        n,
        truncated,
        warnings,
    })
}
