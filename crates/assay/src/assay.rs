//! Main Assay struct and public API.

use serde::{Deserialize, Serialize};

use crate::analysis::{run_analysis, AnalysisIntent, AnalysisResults};
use crate::error::{AssayError, Result};
use crate::input::DataTable;
use crate::prepare::{build_final_dataset, Adjustments, FinalDataset, PrepDecisions};
use crate::schema::{profile_columns, ColumnInfo};
use crate::session::AnalysisSession;

/// Numerical and safety limits for the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssayConfig {
    /// Diagonal term added when the normal equations are singular.
    pub ridge: f64,
    /// Maximum width of a design matrix, intercept included.
    pub max_design_columns: usize,
    /// Minimum rows in the final dataset before an analysis runs.
    pub min_analysis_rows: usize,
    /// Coverage of coefficient confidence intervals.
    pub confidence_level: f64,
    /// Maximum levels of a single categorical predictor.
    pub max_levels_per_factor: usize,
}

impl Default for AssayConfig {
    fn default() -> Self {
        Self {
            ridge: 1e-8,
            max_design_columns: 500,
            min_analysis_rows: 5,
            confidence_level: 0.95,
            max_levels_per_factor: 100,
        }
    }
}

impl AssayConfig {
    pub fn builder() -> AssayConfigBuilder {
        AssayConfigBuilder::default()
    }

    /// Check that every limit is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.ridge.is_finite() || self.ridge < 0.0 {
            return Err(AssayError::Config(format!(
                "ridge must be a finite non-negative number, got {}",
                self.ridge
            )));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(AssayError::Config(format!(
                "confidence_level must be between 0 and 1, got {}",
                self.confidence_level
            )));
        }
        for (name, value) in [
            ("max_design_columns", self.max_design_columns),
            ("min_analysis_rows", self.min_analysis_rows),
            ("max_levels_per_factor", self.max_levels_per_factor),
        ] {
            if value == 0 {
                return Err(AssayError::Config(format!("{} must be positive", name)));
            }
        }
        Ok(())
    }
}

/// Builder for [`AssayConfig`].
#[derive(Debug, Clone, Default)]
pub struct AssayConfigBuilder {
    config: AssayConfig,
}

impl AssayConfigBuilder {
    pub fn ridge(mut self, ridge: f64) -> Self {
        self.config.ridge = ridge;
        self
    }

    pub fn max_design_columns(mut self, columns: usize) -> Self {
        self.config.max_design_columns = columns;
        self
    }

    pub fn min_analysis_rows(mut self, rows: usize) -> Self {
        self.config.min_analysis_rows = rows;
        self
    }

    pub fn confidence_level(mut self, level: f64) -> Self {
        self.config.confidence_level = level;
        self
    }

    pub fn max_levels_per_factor(mut self, levels: usize) -> Self {
        self.config.max_levels_per_factor = levels;
        self
    }

    pub fn build(self) -> AssayConfig {
        self.config
    }
}

/// The main Assay engine.
///
/// Stateless apart from its configuration; use [`Assay::session`] for the
/// audited, step-by-step workflow.
#[derive(Debug, Clone, Default)]
pub struct Assay {
    config: AssayConfig,
}

impl Assay {
    /// Create a new Assay instance with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an Assay instance with custom configuration.
    pub fn with_config(config: AssayConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AssayConfig {
        &self.config
    }

    /// Infer column metadata for a table.
    pub fn profile(&self, table: &DataTable) -> Vec<ColumnInfo> {
        profile_columns(table)
    }

    /// Build a final dataset in one step. Active adjustments must carry a justification.
    pub fn prepare(
        &self,
        table: &DataTable,
        columns: &[ColumnInfo],
        decisions: &PrepDecisions,
        adjustments: &Adjustments,
        intent: Option<&AnalysisIntent>,
    ) -> Result<FinalDataset> {
        adjustments.validate_justifications()?;
        build_final_dataset(
            &table.rows,
            columns,
            decisions,
            adjustments,
            intent.and_then(AnalysisIntent::outcome),
        )
    }

    /// Run an intent against a prepared dataset.
    pub fn analyze(
        &self,
        dataset: &FinalDataset,
        intent: &AnalysisIntent,
        columns: &[ColumnInfo],
    ) -> Result<AnalysisResults> {
        run_analysis(dataset, intent, columns, &self.config)
    }

    /// Start an audited session over a table.
    pub fn session(&self, dataset_id: impl Into<String>, table: &DataTable) -> AnalysisSession {
        AnalysisSession::from_table(dataset_id, table, self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepare::Transform;

    #[test]
    fn test_defaults_are_valid() {
        let config = AssayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ridge, 1e-8);
        assert_eq!(config.min_analysis_rows, 5);
    }

    #[test]
    fn test_validate_rejects_bad_limits() {
        let bad = [
            AssayConfig::builder().ridge(-1.0).build(),
            AssayConfig::builder().ridge(f64::NAN).build(),
            AssayConfig::builder().confidence_level(1.0).build(),
            AssayConfig::builder().max_design_columns(0).build(),
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(AssayError::Config(_))));
        }
        assert!(Assay::with_config(AssayConfig::builder().min_analysis_rows(0).build()).is_err());
    }

    #[test]
    fn test_prepare_requires_justified_adjustments() {
        let table = DataTable::from_records(
            vec!["x".into(), "y".into()],
            (1..=6).map(|i| vec![i.to_string(), (i * 2).to_string()]).collect(),
        );
        let assay = Assay::new();
        let columns = assay.profile(&table);
        let intent = AnalysisIntent::Predict {
            outcome: "y".to_string(),
            predictors: vec!["x".to_string()],
        };

        let unjustified: Adjustments =
            serde_json::from_str(r#"{"transform_outcome": "log", "outlier_mode": "exclude"}"#).unwrap();
        let err = assay
            .prepare(&table, &columns, &PrepDecisions::new(), &unjustified, Some(&intent))
            .unwrap_err();
        assert!(matches!(err, AssayError::MissingJustification));

        let justified = Adjustments::new().with_transform(Transform::Log, "right skew");
        let dataset = assay
            .prepare(&table, &columns, &PrepDecisions::new(), &justified, Some(&intent))
            .unwrap();
        assert_eq!(dataset.meta.transform_applied, Transform::Log);
        assert!(dataset.rows[0].contains_key("y_original"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AssayConfig = serde_json::from_str(r#"{"ridge": 0.001}"#).unwrap();
        assert_eq!(config.ridge, 0.001);
        assert_eq!(config.max_design_columns, 500);
    }
}
