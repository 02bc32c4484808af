//! Analysis intents and the dispatch from an intent to an engine.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assay::AssayConfig;
use crate::error::{AssayError, Result};
use crate::hypothesis::{
    chi_square_test, group_values, one_way_anova, pearson_correlation, summarize_groups,
    t_test_2_sample, AnovaResult, ChiSquareResult, ContingencyTable, CorrelationResult,
    GroupSummary, TTestResult,
};
use crate::input::{paired_values, Row};
use crate::prepare::FinalDataset;
use crate::regression::{ols_regression, RegressionResult};
use crate::schema::{find_column, ColumnInfo, DetectedType};

/// Categorical predictors with more levels than this draw a warning.
const MANY_LEVELS_PREDICTOR: usize = 50;

/// Grouping variables with more levels than this draw a warning.
const MANY_LEVELS_GROUP: usize = 20;

/// Number of terms named in the regression summary.
const SUMMARY_TERMS: usize = 3;

/// The question the user wants answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisIntent {
    /// Explain a numeric outcome from predictors (OLS).
    Predict {
        outcome: String,
        predictors: Vec<String>,
    },
    /// Compare a numeric outcome across groups.
    CompareMeans { outcome: String, group: String },
    /// Test whether two variables are associated.
    Association { var_a: String, var_b: String },
}

impl AnalysisIntent {
    /// Snake-case name of the intent type.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisIntent::Predict { .. } => "predict",
            AnalysisIntent::CompareMeans { .. } => "compare_means",
            AnalysisIntent::Association { .. } => "association",
        }
    }

    /// The outcome column, used for outlier exclusion and transforms.
    pub fn outcome(&self) -> Option<&str> {
        match self {
            AnalysisIntent::Predict { outcome, .. } | AnalysisIntent::CompareMeans { outcome, .. } => {
                Some(outcome)
            }
            AnalysisIntent::Association { .. } => None,
        }
    }

    /// Check the intent against column metadata.
    pub fn validate(&self, columns: &[ColumnInfo]) -> IntentCheck {
        let mut check = IntentCheck::default();
        let type_of = |name: &str| find_column(columns, name).map(|c| c.detected_type);

        match self {
            AnalysisIntent::Predict {
                outcome,
                predictors,
            } => {
                check.require_numeric_outcome(outcome, type_of(outcome));
                if predictors.is_empty() {
                    check.errors.push("Select at least one predictor.".to_string());
                }
                if predictors.contains(outcome) {
                    check
                        .errors
                        .push("Predictors cannot include the outcome.".to_string());
                }
                for name in predictors {
                    match find_column(columns, name) {
                        None => check.errors.push(format!("Unknown predictor '{}'.", name)),
                        Some(col)
                            if !col.is_numeric()
                                && col.levels_count.unwrap_or(0) > MANY_LEVELS_PREDICTOR =>
                        {
                            check.warnings.push(format!(
                                "\"{}\" has many categories; results may be hard to interpret.",
                                name
                            ));
                        }
                        Some(_) => {}
                    }
                }
            }
            AnalysisIntent::CompareMeans { outcome, group } => {
                check.require_numeric_outcome(outcome, type_of(outcome));
                match find_column(columns, group) {
                    None => check.errors.push("Select a grouping variable.".to_string()),
                    Some(col) if col.detected_type != DetectedType::Categorical => check
                        .errors
                        .push("Grouping variable must be categorical.".to_string()),
                    Some(col) => match col.levels_count {
                        Some(levels) if levels < 2 => check
                            .errors
                            .push("Grouping variable needs at least two groups.".to_string()),
                        Some(levels) if levels > MANY_LEVELS_GROUP => check
                            .warnings
                            .push("Many groups may make results hard to interpret.".to_string()),
                        _ => {}
                    },
                }
            }
            AnalysisIntent::Association { var_a, var_b } => {
                if var_a == var_b {
                    check.errors.push("Choose two different variables.".to_string());
                }
                match (type_of(var_a), type_of(var_b)) {
                    (None, _) => check.errors.push(format!("Unknown variable '{}'.", var_a)),
                    (_, None) => check.errors.push(format!("Unknown variable '{}'.", var_b)),
                    (Some(a), Some(b)) => {
                        check.note = Some(
                            match (a.is_numeric(), b.is_numeric()) {
                                (false, false) => "Association between two categorical variables.",
                                (true, true) => "Association between two numeric variables.",
                                _ => "Association between a numeric and a categorical variable.",
                            }
                            .to_string(),
                        );
                    }
                }
            }
        }
        check
    }
}

/// Outcome of [`AnalysisIntent::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentCheck {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl IntentCheck {
    /// Returns true if there are no errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn require_numeric_outcome(&mut self, outcome: &str, detected: Option<DetectedType>) {
        if outcome.is_empty() {
            self.errors.push("Select a numeric outcome.".to_string());
        } else if detected != Some(DetectedType::Numeric) {
            self.errors.push("Outcome must be numeric.".to_string());
        }
    }
}

/// The test run for a group comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "test", rename_all = "snake_case")]
pub enum MeansTest {
    /// Two groups: Welch's t-test.
    TTest(TTestResult),
    /// Three or more groups: one-way ANOVA.
    Anova(AnovaResult),
}

impl MeansTest {
    /// p-value of the test.
    pub fn p_value(&self) -> f64 {
        match self {
            MeansTest::TTest(t) => t.p,
            MeansTest::Anova(a) => a.p,
        }
    }
}

/// Engine-specific result tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisDetail {
    Regression(RegressionResult),
    GroupComparison {
        groups: Vec<GroupSummary>,
        test: MeansTest,
    },
    Contingency {
        table: ContingencyTable,
        test: ChiSquareResult,
    },
    Correlation(CorrelationResult),
}

/// Results of running an intent against a final dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResults {
    pub intent_type: String,
    pub summary_text: String,
    pub detail: AnalysisDetail,
    pub warnings: Vec<String>,
}

/// Run the engine matching `intent` on the final dataset.
pub fn run_analysis(
    dataset: &FinalDataset,
    intent: &AnalysisIntent,
    columns: &[ColumnInfo],
    config: &AssayConfig,
) -> Result<AnalysisResults> {
    if dataset.len() < config.min_analysis_rows {
        return Err(AssayError::TooFewRows {
            rows: dataset.len(),
            minimum: config.min_analysis_rows,
        });
    }
    let data = &dataset.rows;

    let results = match intent {
        AnalysisIntent::Predict {
            outcome,
            predictors,
        } => {
            let regression = ols_regression(data, outcome, predictors, columns, config)?;
            let summary_text = predict_summary(outcome, predictors, &regression);
            AnalysisResults {
                intent_type: intent.kind().to_string(),
                summary_text,
                warnings: regression.warnings.clone(),
                detail: AnalysisDetail::Regression(regression),
            }
        }
        AnalysisIntent::CompareMeans { outcome, group } => {
            let (groups, test) = compare_groups(data, outcome, group)?;
            AnalysisResults {
                intent_type: intent.kind().to_string(),
                summary_text: format!(
                    "Compared {} across {} groups of {}.",
                    outcome,
                    groups.len(),
                    group
                ),
                warnings: Vec::new(),
                detail: AnalysisDetail::GroupComparison { groups, test },
            }
        }
        AnalysisIntent::Association { var_a, var_b } => {
            association(data, var_a, var_b, columns, intent.kind())?
        }
    };

    info!(
        intent = results.intent_type.as_str(),
        rows = dataset.len(),
        warnings = results.warnings.len(),
        "Analysis complete"
    );
    Ok(results)
}

fn predict_summary(outcome: &str, predictors: &[String], regression: &RegressionResult) -> String {
    let stats = &regression.model_stats;
    let top = regression.strongest_terms(SUMMARY_TERMS);
    let influential = if top.is_empty() {
        "No strong predictors detected.".to_string()
    } else {
        let terms: Vec<String> = top
            .iter()
            .map(|c| format!("{} ({:.3})", c.term, c.estimate))
            .collect();
        format!("Most influential predictors: {}.", terms.join(", "))
    };
    format!(
        "Outcome: {}. Predictors: {}. Model explains {:.1}% of variance (Adj R^2 = {:.1}%). {}",
        outcome,
        predictors.join(", "),
        stats.r2 * 100.0,
        stats.adj_r2 * 100.0,
        influential
    )
}

fn compare_groups(data: &[Row], value: &str, group: &str) -> Result<(Vec<GroupSummary>, MeansTest)> {
    let groups = group_values(data, value, group);
    let summaries = summarize_groups(&groups);
    let samples: Vec<Vec<f64>> = groups.into_values().collect();
    let test = if samples.len() == 2 {
        MeansTest::TTest(t_test_2_sample(&samples[0], &samples[1])?)
    } else {
        MeansTest::Anova(one_way_anova(&samples)?)
    };
    Ok((summaries, test))
}

fn association(
    data: &[Row],
    var_a: &str,
    var_b: &str,
    columns: &[ColumnInfo],
    kind: &str,
) -> Result<AnalysisResults> {
    let numeric = |name: &str| {
        find_column(columns, name)
            .map(ColumnInfo::is_numeric)
            .ok_or_else(|| AssayError::UnknownColumn(name.to_string()))
    };

    let (summary_text, detail, warnings) = match (numeric(var_a)?, numeric(var_b)?) {
        (false, false) => {
            let table = ContingencyTable::from_rows(data, var_a, var_b);
            let test = chi_square_test(&table.table)?;
            let warnings = if test.low_expected {
                vec!["Some expected counts are below 5.".to_string()]
            } else {
                Vec::new()
            };
            (
                format!("Tested whether {} is associated with {}.", var_a, var_b),
                AnalysisDetail::Contingency { table, test },
                warnings,
            )
        }
        (true, true) => {
            let (a, b) = paired_values(data, var_a, var_b);
            let correlation = pearson_correlation(&a, &b)?;
            let mut warnings = correlation.warnings.clone();
            let dropped = data.len() - a.len();
            if dropped > 0 {
                warnings.push(format!(
                    "{} rows without numeric values for both {} and {} were skipped.",
                    dropped, var_a, var_b
                ));
            }
            (
                format!("Association between {} and {}.", var_a, var_b),
                AnalysisDetail::Correlation(correlation),
                warnings,
            )
        }
        (a_numeric, _) => {
            let (value, group) = if a_numeric { (var_a, var_b) } else { (var_b, var_a) };
            let (groups, test) = compare_groups(data, value, group)?;
            (
                format!("Compared numeric {} across groups of {}.", value, group),
                AnalysisDetail::GroupComparison { groups, test },
                Vec::new(),
            )
        }
    };

    Ok(AnalysisResults {
        intent_type: kind.to_string(),
        summary_text,
        detail,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{row, Value};
    use crate::prepare::{build_final_dataset, Adjustments, PrepDecisions};

    fn dataset(rows: Vec<Row>) -> FinalDataset {
        build_final_dataset(&rows, &[], &PrepDecisions::new(), &Adjustments::new(), None).unwrap()
    }

    #[test]
    fn test_predict_summary_text() {
        let rows: Vec<Row> = (1..=5).map(|i| row([("x", i as f64), ("y", 2.0 * i as f64)])).collect();
        let intent = AnalysisIntent::Predict {
            outcome: "y".to_string(),
            predictors: vec!["x".to_string()],
        };
        let results = run_analysis(
            &dataset(rows),
            &intent,
            &[ColumnInfo::numeric("x"), ColumnInfo::numeric("y")],
            &AssayConfig::default(),
        )
        .unwrap();

        assert_eq!(results.intent_type, "predict");
        assert!(results
            .summary_text
            .starts_with("Outcome: y. Predictors: x. Model explains 100.0% of variance"));
        assert!(results.summary_text.contains("Most influential predictors: x (2.000)."));
    }

    #[test]
    fn test_too_few_rows() {
        let rows: Vec<Row> = (1..=4).map(|i| row([("x", i as f64), ("y", i as f64)])).collect();
        let intent = AnalysisIntent::Predict {
            outcome: "y".to_string(),
            predictors: vec!["x".to_string()],
        };
        let err = run_analysis(&dataset(rows), &intent, &[], &AssayConfig::default()).unwrap_err();
        assert!(matches!(err, AssayError::TooFewRows { rows: 4, minimum: 5 }));
    }

    #[test]
    fn test_compare_means_uses_t_test_for_two_groups() {
        let rows: Vec<Row> = [("a", 1.0), ("b", 10.0), ("a", 2.0), ("b", 11.0), ("a", 3.0), ("b", 12.0)]
            .iter()
            .map(|(g, y)| row([("g", Value::from(*g)), ("y", Value::from(*y))]))
            .collect();
        let intent = AnalysisIntent::CompareMeans {
            outcome: "y".to_string(),
            group: "g".to_string(),
        };
        let results = run_analysis(&dataset(rows), &intent, &[], &AssayConfig::default()).unwrap();
        assert_eq!(results.summary_text, "Compared y across 2 groups of g.");
        match results.detail {
            AnalysisDetail::GroupComparison { groups, test } => {
                assert_eq!(groups[0].group, "a");
                assert!(matches!(test, MeansTest::TTest(_)));
                assert!(test.p_value() < 0.01);
            }
            other => panic!("unexpected detail: {:?}", other),
        }
    }

    #[test]
    fn test_association_dispatch_by_type() {
        let rows: Vec<Row> = (0..12)
            .map(|i| {
                row([
                    ("c1", Value::from(if i % 2 == 0 { "x" } else { "y" })),
                    ("c2", Value::from(if i % 3 == 0 { "p" } else { "q" })),
                    ("n1", Value::from(i as f64)),
                    ("n2", Value::from((i * i) as f64)),
                ])
            })
            .collect();
        let columns = vec![
            ColumnInfo::categorical("c1"),
            ColumnInfo::categorical("c2"),
            ColumnInfo::numeric("n1"),
            ColumnInfo::numeric("n2"),
        ];
        let data = dataset(rows);
        let config = AssayConfig::default();
        let run = |a: &str, b: &str| {
            run_analysis(
                &data,
                &AnalysisIntent::Association {
                    var_a: a.to_string(),
                    var_b: b.to_string(),
                },
                &columns,
                &config,
            )
            .unwrap()
        };

        let chi = run("c1", "c2");
        assert!(matches!(chi.detail, AnalysisDetail::Contingency { .. }));
        assert_eq!(chi.warnings, vec!["Some expected counts are below 5."]);

        let corr = run("n1", "n2");
        assert!(matches!(corr.detail, AnalysisDetail::Correlation(ref c) if c.r > 0.9));

        let mixed = run("c1", "n1");
        assert_eq!(mixed.summary_text, "Compared numeric n1 across groups of c1.");
    }

    #[test]
    fn test_correlation_pairs_complete_rows() {
        let cells = [
            (None, Some(9.0)),
            (Some(5.0), Some(5.0)),
            (Some(1.0), Some(1.0)),
            (Some(4.0), Some(4.0)),
            (Some(2.0), Some(2.0)),
            (Some(3.0), None),
        ];
        let rows: Vec<Row> = cells
            .iter()
            .map(|(x, y)| row([("x", Value::from(*x)), ("y", Value::from(*y))]))
            .collect();
        let intent = AnalysisIntent::Association {
            var_a: "x".to_string(),
            var_b: "y".to_string(),
        };
        let results = run_analysis(
            &dataset(rows),
            &intent,
            &[ColumnInfo::numeric("x"), ColumnInfo::numeric("y")],
            &AssayConfig::default(),
        )
        .unwrap();

        match results.detail {
            AnalysisDetail::Correlation(c) => {
                assert!((c.r - 1.0).abs() < 1e-12);
                assert_eq!(c.n, 4);
                assert!(!c.truncated);
            }
            other => panic!("unexpected detail: {:?}", other),
        }
        assert_eq!(
            results.warnings,
            vec!["2 rows without numeric values for both x and y were skipped."]
        );
    }

    #[test]
    fn test_intent_validation() {
        let columns = vec![
            ColumnInfo::numeric("y"),
            ColumnInfo::categorical("g"),
            ColumnInfo::new("notes", DetectedType::Text),
        ];

        let bad = AnalysisIntent::Predict {
            outcome: "g".to_string(),
            predictors: vec!["g".to_string()],
        };
        let check = bad.validate(&columns);
        assert!(!check.is_valid());
        assert!(check.errors.contains(&"Outcome must be numeric.".to_string()));
        assert!(check.errors.contains(&"Predictors cannot include the outcome.".to_string()));

        let group_text = AnalysisIntent::CompareMeans {
            outcome: "y".to_string(),
            group: "notes".to_string(),
        };
        assert_eq!(
            group_text.validate(&columns).errors,
            vec!["Grouping variable must be categorical."]
        );

        let assoc = AnalysisIntent::Association {
            var_a: "y".to_string(),
            var_b: "g".to_string(),
        };
        let check = assoc.validate(&columns);
        assert!(check.is_valid());
        assert!(check.note.is_some());
    }

    #[test]
    fn test_intent_serde_tag() {
        let intent: AnalysisIntent = serde_json::from_str(
            r#"{"type": "compare_means", "outcome": "score", "group": "method"}"#,
        )
        .unwrap();
        assert_eq!(intent.outcome(), Some("score"));
        assert_eq!(intent.kind(), "compare_means");
    }
}
