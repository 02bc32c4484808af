//! Ordinary least squares via the normal equations.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assay::AssayConfig;
use crate::error::{AssayError, Result};
use crate::input::{Row, Value};
use crate::math::{
    f_dist_p_value, invert_matrix, mean, multiply, multiply_vec, normal_inv,
    regularized_inverse_with, sorted, student_t_inv, student_t_two_sided, transpose,
};
use crate::schema::{find_column, ColumnInfo};

use super::design::{encode_predictors, INTERCEPT};

/// Warning attached when the ridge fallback was needed.
pub const REGULARIZED_WARNING: &str = "Matrix was singular; used a regularized inverse.";

/// One row of the coefficient table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

/// Model-level fit statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    /// Observations used.
    pub n: usize,
    /// Predictor terms, excluding the intercept.
    pub p: usize,
    pub r2: f64,
    pub adj_r2: f64,
    /// `sqrt(SSE / n)`.
    pub rmse: f64,
    /// Residual standard error, `sqrt(SSE / df)`.
    pub rse: f64,
    pub f_stat: f64,
    pub f_p: f64,
    pub df1: usize,
    pub df2: usize,
}

/// A point of the residual normal QQ plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QqPoint {
    pub theoretical: f64,
    pub sample: f64,
}

/// Output of [`ols_regression`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub coef_table: Vec<Coefficient>,
    pub model_stats: ModelStats,
    pub residuals: Vec<f64>,
    pub fitted: Vec<f64>,
    pub qq: Vec<QqPoint>,
    /// Degraded-but-defined conditions met during the fit.
    pub warnings: Vec<String>,
}

impl RegressionResult {
    /// Look up a coefficient by term name.
    pub fn coefficient(&self, term: &str) -> Option<&Coefficient> {
        self.coef_table.iter().find(|c| c.term == term)
    }

    /// The intercept row.
    pub fn intercept(&self) -> Option<&Coefficient> {
        self.coefficient(INTERCEPT)
    }

    /// Non-intercept terms ordered by descending `|t|`.
    pub fn strongest_terms(&self, limit: usize) -> Vec<&Coefficient> {
        let mut terms: Vec<&Coefficient> =
            self.coef_table.iter().filter(|c| c.term != INTERCEPT).collect();
        terms.sort_by(|a, b| b.t_value.abs().total_cmp(&a.t_value.abs()));
        terms.truncate(limit);
        terms
    }
}

/// Fit `outcome ~ predictors` by ordinary least squares.
///
/// Rows with a non-finite outcome, or a non-finite value in a numeric
/// predictor, are left out. If `XᵗX` cannot be inverted the ridge
/// fallback is used and reported in `warnings`; if that fails too the fit
/// fails with [`AssayError::SingularMatrix`].
pub fn ols_regression(
    data: &[Row],
    outcome: &str,
    predictors: &[String],
    columns: &[ColumnInfo],
    config: &AssayConfig,
) -> Result<RegressionResult> {
    if predictors.is_empty() {
        return Err(AssayError::EmptyPredictors);
    }
    let mut warnings = Vec::new();

    let with_outcome: Vec<&Row> = data
        .iter()
        .filter(|row| row.get(outcome).and_then(Value::as_f64).is_some())
        .collect();
    let numeric_predictors: Vec<&String> = predictors
        .iter()
        .filter(|name| find_column(columns, name).map_or(true, ColumnInfo::is_numeric))
        .collect();
    let clean: Vec<Row> = with_outcome
        .iter()
        .filter(|row| {
            numeric_predictors
                .iter()
                .all(|name| row.get(name.as_str()).and_then(Value::as_f64).is_some())
        })
        .map(|row| (*row).clone())
        .collect();
    let skipped = with_outcome.len() - clean.len();
    if skipped > 0 {
        warnings.push(format!(
            "Dropped {} rows with non-numeric predictor values.",
            skipped
        ));
    }

    let encoded = encode_predictors(&clean, predictors, columns, config)?;
    let x = encoded.design;
    let y: Vec<f64> = encoded
        .rows
        .iter()
        .filter_map(|&i| clean[i].get(outcome).and_then(Value::as_f64))
        .collect();
    if y.is_empty() {
        return Err(AssayError::InsufficientData(format!(
            "No rows with a finite '{}' and complete predictors",
            outcome
        )));
    }

    let xt = transpose(&x);
    let xtx = multiply(&xt, &x);
    let xtx_inv = match invert_matrix(&xtx) {
        Some(inv) => inv,
        None => {
            warn!(ridge = config.ridge, "Normal equations singular, using regularized inverse");
            let inv = regularized_inverse_with(&xtx, config.ridge)
                .ok_or(AssayError::SingularMatrix)?;
            warnings.push(REGULARIZED_WARNING.to_string());
            inv
        }
    };

    let beta = multiply_vec(&xtx_inv, &multiply_vec(&xt, &y));
    let fitted = multiply_vec(&x, &beta);
    let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(obs, fit)| obs - fit).collect();

    let n = y.len();
    let p = encoded.terms.len() - 1;
    let df = n.saturating_sub(p + 1).max(1);
    let dff = df as f64;
    if n <= p + 1 {
        warnings.push(format!(
            "Only {} rows for {} predictor terms; degrees of freedom floored at 1.",
            n, p
        ));
    }

    let sse: f64 = residuals.iter().map(|r| r * r).sum();
    let y_mean = mean(&y);
    let sst: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    if sst == 0.0 {
        warnings.push(format!("Outcome '{}' has zero variance; R^2 reported as 0.", outcome));
    }
    let r2 = if sst == 0.0 { 0.0 } else { 1.0 - sse / sst };
    let adj_r2 = 1.0 - (1.0 - r2) * (n as f64 - 1.0) / dff;
    let rmse = (sse / n as f64).sqrt();
    let mse = sse / dff;
    let rse = mse.sqrt();

    let t_crit = student_t_inv(1.0 - (1.0 - config.confidence_level) / 2.0, dff);
    let coef_table = encoded
        .terms
        .iter()
        .enumerate()
        .map(|(i, term)| {
            let estimate = beta[i];
            let std_error = (xtx_inv[i][i] * mse).abs().sqrt();
            let t_value = if std_error > 0.0 {
                estimate / std_error
            } else if estimate == 0.0 {
                0.0
            } else {
                estimate.signum() * f64::INFINITY
            };
            Coefficient {
                term: term.clone(),
                estimate,
                std_error,
                t_value,
                p_value: student_t_two_sided(t_value, dff),
                ci_low: estimate - t_crit * std_error,
                ci_high: estimate + t_crit * std_error,
            }
        })
        .collect();

    let ssr = sst - sse;
    let f_stat = if mse == 0.0 { 0.0 } else { (ssr / p.max(1) as f64) / mse };
    let f_p = f_dist_p_value(f_stat, p as f64, dff);

    let qq = sorted(&residuals)
        .into_iter()
        .enumerate()
        .map(|(i, sample)| QqPoint {
            theoretical: normal_inv((i as f64 + 0.5) / n as f64),
            sample,
        })
        .collect();

    debug!(n, p, r2, warnings = warnings.len(), "Fitted OLS model");

    Ok(RegressionResult {
        coef_table,
        model_stats: ModelStats {
            n,
            p,
            r2,
            adj_r2,
            rmse,
            rse,
            f_stat,
            f_p,
            df1: p,
            df2: df,
        },
        residuals,
        fitted,
        qq,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::row;

    fn approx(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    fn linear(intercept: f64, slope: f64) -> Vec<Row> {
        (1..=6)
            .map(|i| {
                let x = i as f64;
                row([("x", x), ("y", intercept + slope * x)])
            })
            .collect()
    }

    #[test]
    fn test_perfect_line() {
        let result = ols_regression(
            &linear(2.0, 3.0),
            "y",
            &["x".to_string()],
            &[ColumnInfo::numeric("x"), ColumnInfo::numeric("y")],
            &AssayConfig::default(),
        )
        .unwrap();

        assert!(approx(result.intercept().unwrap().estimate, 2.0, 1e-8));
        assert!(approx(result.coefficient("x").unwrap().estimate, 3.0, 1e-8));
        assert!(approx(result.model_stats.r2, 1.0, 1e-10));
        assert!(result.coefficient("x").unwrap().p_value < 1e-6);
        assert_eq!(result.model_stats.df2, 4);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_noisy_fit_statistics() {
        let ys = [3.1, 4.9, 7.2, 8.8, 11.1, 13.0, 14.8, 17.2];
        let data: Vec<Row> = ys
            .iter()
            .enumerate()
            .map(|(i, y)| row([("x", i as f64), ("y", *y)]))
            .collect();
        let result = ols_regression(
            &data,
            "y",
            &["x".to_string()],
            &[ColumnInfo::numeric("x")],
            &AssayConfig::default(),
        )
        .unwrap();

        let slope = result.coefficient("x").unwrap();
        assert!(approx(slope.estimate, 2.0, 0.1));
        assert!(slope.ci_low < slope.estimate && slope.estimate < slope.ci_high);
        assert!(result.model_stats.r2 > 0.99);
        assert!(result.model_stats.f_p < 1e-4);
        assert_eq!(result.residuals.len(), 8);
        assert_eq!(result.qq.len(), 8);
        assert!(result.qq.windows(2).all(|w| w[0].sample <= w[1].sample));
        assert!(result.qq[0].theoretical < 0.0);
    }

    #[test]
    fn test_categorical_predictor() {
        let data: Vec<Row> = [("a", 1.0), ("a", 1.2), ("b", 3.0), ("b", 3.2), ("c", 5.1), ("c", 4.9)]
            .iter()
            .map(|(g, y)| row([("g", Value::from(*g)), ("y", Value::from(*y))]))
            .collect();
        let result = ols_regression(
            &data,
            "y",
            &["g".to_string()],
            &[ColumnInfo::categorical("g")],
            &AssayConfig::default(),
        )
        .unwrap();

        assert!(approx(result.intercept().unwrap().estimate, 1.1, 1e-9));
        assert!(approx(result.coefficient("g[b]").unwrap().estimate, 2.0, 1e-9));
        assert!(approx(result.coefficient("g[c]").unwrap().estimate, 3.9, 1e-9));
        assert_eq!(result.model_stats.p, 2);
    }

    #[test]
    fn test_collinear_predictors_use_ridge() {
        let data: Vec<Row> = (1..=6)
            .map(|i| {
                let x = i as f64;
                row([("x", x), ("x2", 2.0 * x), ("y", 1.0 + x + (i % 2) as f64)])
            })
            .collect();
        let result = ols_regression(
            &data,
            "y",
            &["x".to_string(), "x2".to_string()],
            &[],
            &AssayConfig::default(),
        )
        .unwrap();
        assert!(result.warnings.iter().any(|w| w == REGULARIZED_WARNING));
    }

    #[test]
    fn test_singular_without_fallback() {
        let data: Vec<Row> = (1..=6).map(|i| row([("x", 0.0), ("y", i as f64)])).collect();
        let config = AssayConfig::builder().ridge(0.0).build();
        let err = ols_regression(&data, "y", &["x".to_string()], &[], &config).unwrap_err();
        assert!(matches!(err, AssayError::SingularMatrix));
    }

    #[test]
    fn test_rows_with_bad_values_are_skipped() {
        let mut data = linear(0.0, 2.0);
        data.push(row([("x", Value::from("n/a")), ("y", Value::from(1.0))]));
        data.push(row([("x", Value::from(9.0)), ("y", Value::Missing)]));
        let result = ols_regression(
            &data,
            "y",
            &["x".to_string()],
            &[ColumnInfo::numeric("x")],
            &AssayConfig::default(),
        )
        .unwrap();
        assert_eq!(result.model_stats.n, 6);
        assert!(result.warnings[0].contains("Dropped 1 rows"));
    }

    #[test]
    fn test_empty_predictors() {
        let err = ols_regression(&linear(0.0, 1.0), "y", &[], &[], &AssayConfig::default())
            .unwrap_err();
        assert!(matches!(err, AssayError::EmptyPredictors));
    }

    #[test]
    fn test_low_df_is_degraded_not_fatal() {
        let data = vec![row([("x", 1.0), ("y", 1.0)]), row([("x", 2.0), ("y", 3.0)])];
        let result = ols_regression(&data, "y", &["x".to_string()], &[], &AssayConfig::default())
            .unwrap();
        assert_eq!(result.model_stats.df2, 1);
        assert!(result.warnings.iter().any(|w| w.contains("floored at 1")));
    }
}
