//! Tests on group means: Welch's t-test and one-way ANOVA.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{AssayError, Result};
use crate::input::{Row, Value};
use crate::math::{f_dist_p_value, mean, std_dev, student_t_two_sided, sum_of_squares, variance};

/// Result of a two-sample t-test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    pub t: f64,
    /// Satterthwaite degrees of freedom.
    pub df: f64,
    pub p: f64,
    /// `mean(a) - mean(b)`.
    pub mean_diff: f64,
}

/// Result of a one-way ANOVA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaResult {
    pub f: f64,
    pub p: f64,
    pub df_between: usize,
    pub df_within: usize,
    /// Effect size `SSB / (SSB + SSW)`.
    pub eta_sq: f64,
}

/// Per-group descriptive summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub group: String,
    pub n: usize,
    pub mean: f64,
    pub std: f64,
}

/// Welch's unequal-variance two-sample t-test.
///
/// Both samples need at least two values. When both variances are zero the
/// Satterthwaite formula is undefined and the pooled `n1 + n2 - 2` is used.
pub fn t_test_2_sample(a: &[f64], b: &[f64]) -> Result<TTestResult> {
    if a.len() < 2 || b.len() < 2 {
        return Err(AssayError::InsufficientData(format!(
            "t-test needs at least 2 values per group (got {} and {})",
            a.len(),
            b.len()
        )));
    }

    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let mean_diff = mean(a) - mean(b);
    let (s1, s2) = (variance(a) / n1, variance(b) / n2);
    let se = (s1 + s2).sqrt();

    let t = if se > 0.0 {
        mean_diff / se
    } else if mean_diff == 0.0 {
        0.0
    } else {
        mean_diff.signum() * f64::INFINITY
    };

    let denom = s1 * s1 / (n1 - 1.0) + s2 * s2 / (n2 - 1.0);
    let df = if denom > 0.0 {
        (s1 + s2).powi(2) / denom
    } else {
        n1 + n2 - 2.0
    };

    Ok(TTestResult {
        t,
        df,
        p: student_t_two_sided(t, df),
        mean_diff,
    })
}

/// One-way analysis of variance across groups.
///
/// Empty groups are ignored; at least two non-empty groups are required.
pub fn one_way_anova(groups: &[Vec<f64>]) -> Result<AnovaResult> {
    let groups: Vec<&Vec<f64>> = groups.iter().filter(|g| !g.is_empty()).collect();
    if groups.len() < 2 {
        return Err(AssayError::InsufficientData(
            "ANOVA needs at least 2 non-empty groups".to_string(),
        ));
    }

    let all: Vec<f64> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    let grand_mean = mean(&all);
    let ss_between: f64 = groups
        .iter()
        .map(|g| g.len() as f64 * (mean(g) - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = groups.iter().map(|g| sum_of_squares(g)).sum();

    let df_between = groups.len() - 1;
    let df_within = all.len() - groups.len();
    let ms_between = ss_between / df_between.max(1) as f64;
    let ms_within = ss_within / df_within.max(1) as f64;
    let f = if ms_within == 0.0 { 0.0 } else { ms_between / ms_within };
    let total = ss_between + ss_within;

    Ok(AnovaResult {
        f,
        p: f_dist_p_value(f, df_between as f64, df_within.max(1) as f64),
        df_between,
        df_within,
        eta_sq: if total > 0.0 { ss_between / total } else { 0.0 },
    })
}

/// Group finite `value` cells by the label of `group`, in first-appearance
/// order.
pub fn group_values(rows: &[Row], value: &str, group: &str) -> IndexMap<String, Vec<f64>> {
    let mut groups: IndexMap<String, Vec<f64>> = IndexMap::new();
    for row in rows {
        let Some(v) = row.get(value).and_then(Value::as_f64) else {
            continue;
        };
        let label = row.get(group).map_or_else(|| Value::Missing.label(), Value::label);
        groups.entry(label).or_default().push(v);
    }
    groups
}

/// Describe each group.
pub fn summarize_groups(groups: &IndexMap<String, Vec<f64>>) -> Vec<GroupSummary> {
    groups
        .iter()
        .map(|(group, values)| GroupSummary {
            group: group.clone(),
            n: values.len(),
            mean: mean(values),
            std: std_dev(values),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::row;

    #[test]
    fn test_welch_separated_groups() {
        let result =
            t_test_2_sample(&[1.0, 2.0, 3.0, 4.0, 5.0], &[10.0, 11.0, 12.0, 13.0, 14.0]).unwrap();
        assert!((result.t + 9.0).abs() < 1e-12);
        assert!((result.df - 8.0).abs() < 1e-12);
        assert_eq!(result.mean_diff, -9.0);
        assert!(result.p < 0.001);
    }

    #[test]
    fn test_welch_identical_groups() {
        let result = t_test_2_sample(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(result.t, 0.0);
        assert!((result.p - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_welch_constant_groups() {
        let result = t_test_2_sample(&[2.0, 2.0], &[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(result.df, 3.0);
        assert_eq!(result.p, 0.0);
    }

    #[test]
    fn test_welch_needs_two_values() {
        assert!(t_test_2_sample(&[1.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_anova_three_groups() {
        let groups = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0], vec![7.0, 8.0, 9.0]];
        let result = one_way_anova(&groups).unwrap();
        // SSB = 54, SSW = 6
        assert!((result.f - 27.0).abs() < 1e-10);
        assert_eq!(result.df_between, 2);
        assert_eq!(result.df_within, 6);
        assert!((result.eta_sq - 0.9).abs() < 1e-12);
        assert!(result.p < 0.01);
    }

    #[test]
    fn test_anova_ignores_empty_groups() {
        assert!(one_way_anova(&[vec![1.0, 2.0], vec![]]).is_err());
    }

    #[test]
    fn test_group_values_first_appearance() {
        let rows = vec![
            row([("g", Value::from("b")), ("y", Value::from(1.0))]),
            row([("g", Value::from("a")), ("y", Value::from(2.0))]),
            row([("g", Value::from("b")), ("y", Value::Missing)]),
            row([("g", Value::from("b")), ("y", Value::from(3.0))]),
        ];
        let groups = group_values(&rows, "y", "g");
        let names: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["b", "a"]);

        let summary = summarize_groups(&groups);
        assert_eq!(summary[0].n, 2);
        assert_eq!(summary[0].mean, 2.0);
        assert_eq!(summary[1].std, 0.0);
    }
}
