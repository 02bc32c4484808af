//! Descriptive statistics over plain slices.

use std::cmp::Ordering;

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance (n - 1 denominator); `0.0` below two values.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Sample standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Sum of squared deviations from the mean.
pub fn sum_of_squares(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum()
}

/// Sorted copy of `values` (total order, NaN last).
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    out
}

/// Linear-interpolated quantile of an already sorted slice.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = (sorted.len() - 1) as f64 * q;
    let base = pos.floor() as usize;
    let rest = pos - base as f64;
    match sorted.get(base + 1) {
        Some(next) => sorted[base] + rest * (next - sorted[base]),
        None => sorted[base],
    }
}

/// Median of unsorted values.
pub fn median(values: &[f64]) -> f64 {
    quantile(&sorted(values), 0.5)
}

/// Inclusive bounds `[Q1 - k·IQR, Q3 + k·IQR]`.
pub fn iqr_bounds(values: &[f64], multiplier: f64) -> (f64, f64) {
    let sorted = sorted(values);
    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    (q1 - multiplier * iqr, q3 + multiplier * iqr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_variance() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(mean(&v), 3.0);
        assert_eq!(variance(&v), 2.5);
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(variance(&[7.0]), 0.0);
    }

    #[test]
    fn test_quantile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&v, 0.5), 2.5);
        assert_eq!(quantile(&v, 0.0), 1.0);
        assert_eq!(quantile(&v, 1.0), 4.0);
        assert_eq!(quantile(&v, 0.25), 1.75);
        assert_eq!(quantile(&[], 0.5), 0.0);
    }

    #[test]
    fn test_median_unsorted() {
        assert_eq!(median(&[5.0, 1.0, 3.0]), 3.0);
    }

    #[test]
    fn test_iqr_bounds() {
        let (lo, hi) = iqr_bounds(&[1.0, 2.0, 3.0, 4.0, 5.0], 3.0);
        // Q1 = 2, Q3 = 4, IQR = 2
        assert_eq!(lo, -4.0);
        assert_eq!(hi, 10.0);
    }
}
