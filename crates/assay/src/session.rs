//! Analysis session: the evolving preparation and adjustment choices for
//! one dataset, with every change recorded in the audit log.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::analysis::{run_analysis, AnalysisIntent, AnalysisResults, IntentCheck};
use crate::assay::AssayConfig;
use crate::audit::{build_report_markdown, AuditAction, AuditEntry, AuditLog, ReportInputs};
use crate::error::{AssayError, Result};
use crate::input::{finite_values, DataTable, Row};
use crate::prepare::{
    build_final_dataset, Adjustments, FinalDataset, OutlierMode, PrepDecisions, Transform,
    OUTLIER_RULE,
};
use crate::schema::{find_column, profile_columns, ColumnInfo, ColumnRole};
use crate::validity::{
    derive_validity, diagnostic_improvements, should_unlock_adjustments, validate_justification,
    validate_transform_choice, AdjustmentUnlock, DiagnosticsSummary, ValidityAssessment,
};

/// What a diagnostics run changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    pub assessment: ValidityAssessment,
    pub unlock: AdjustmentUnlock,
    /// Improvements relative to the previous run, if any.
    pub improvements: Vec<String>,
}

/// Explicit context object for one dataset's analysis.
///
/// Raw rows are never modified. Preparation choices, the intent and the
/// adjustments evolve through the methods below, each of which appends to
/// the audit log.
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    dataset_id: String,
    columns: Vec<ColumnInfo>,
    raw: Vec<Row>,
    decisions: PrepDecisions,
    intent: Option<AnalysisIntent>,
    adjustments: Adjustments,
    diagnostics: Option<DiagnosticsSummary>,
    config: AssayConfig,
    log: AuditLog,
}

impl AnalysisSession {
    /// Start a session over raw rows with known column metadata.
    pub fn new(
        dataset_id: impl Into<String>,
        raw: Vec<Row>,
        columns: Vec<ColumnInfo>,
        config: AssayConfig,
    ) -> Self {
        let dataset_id = dataset_id.into();
        info!(dataset = dataset_id.as_str(), rows = raw.len(), "Session started");
        Self {
            dataset_id,
            columns,
            raw,
            decisions: PrepDecisions::default(),
            intent: None,
            adjustments: Adjustments::default(),
            diagnostics: None,
            config,
            log: AuditLog::new(),
        }
    }

    /// Start a session from a table, profiling its columns.
    pub fn from_table(dataset_id: impl Into<String>, table: &DataTable, config: AssayConfig) -> Self {
        let columns = profile_columns(table);
        Self::new(dataset_id, table.rows.clone(), columns, config)
    }

    pub fn dataset_id(&self) -> &str {
        &self.dataset_id
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn decisions(&self) -> &PrepDecisions {
        &self.decisions
    }

    pub fn intent(&self) -> Option<&AnalysisIntent> {
        self.intent.as_ref()
    }

    pub fn adjustments(&self) -> &Adjustments {
        &self.adjustments
    }

    /// Diagnostics from the most recent run.
    pub fn diagnostics(&self) -> Option<&DiagnosticsSummary> {
        self.diagnostics.as_ref()
    }

    pub fn config(&self) -> &AssayConfig {
        &self.config
    }

    pub fn log(&self) -> &AuditLog {
        &self.log
    }

    /// Replace the cleaning decisions.
    pub fn set_prep_decisions(&mut self, decisions: PrepDecisions) -> Result<()> {
        for name in decisions
            .excluded_columns
            .iter()
            .chain(&decisions.identifier_columns)
        {
            if find_column(&self.columns, name).is_none() {
                return Err(AssayError::UnknownColumn(name.clone()));
            }
        }
        let parameters = serde_json::to_value(&decisions)?;
        self.decisions = decisions;
        self.record(AuditEntry::new(
            AuditAction::SetPrepDecisions,
            &self.dataset_id,
            parameters,
        ));
        Ok(())
    }

    /// Change a column's role, keeping the exclusion sets in step.
    pub fn set_column_role(&mut self, column: &str, role: ColumnRole) -> Result<()> {
        let info = self
            .columns
            .iter_mut()
            .find(|c| c.name == column)
            .ok_or_else(|| AssayError::UnknownColumn(column.to_string()))?;
        info.role = role;

        self.decisions.excluded_columns.shift_remove(column);
        self.decisions.identifier_columns.shift_remove(column);
        match role {
            ColumnRole::Excluded => {
                self.decisions.excluded_columns.insert(column.to_string());
            }
            ColumnRole::Identifier => {
                self.decisions.identifier_columns.insert(column.to_string());
            }
            ColumnRole::Predictor | ColumnRole::Outcome => {}
        }

        self.record(AuditEntry::new(
            AuditAction::ColumnExclusion,
            &self.dataset_id,
            json!({ "column": column, "role": role }),
        ));
        Ok(())
    }

    /// Declare the analysis intent.
    ///
    /// An intent with errors is rejected and leaves the session unchanged;
    /// warnings are returned with the check. Changing the outcome drops any
    /// committed transform or outlier exclusion, and the entry records what
    /// was dropped under `adjustments_reset`.
    pub fn set_intent(&mut self, intent: AnalysisIntent) -> Result<IntentCheck> {
        let check = intent.validate(&self.columns);
        if !check.is_valid() {
            return Err(AssayError::InvalidIntent(check.errors.join(" ")));
        }
        let mut parameters = serde_json::to_value(&intent)?;
        let previous_outcome = self.intent.as_ref().and_then(AnalysisIntent::outcome);
        if previous_outcome != intent.outcome() && self.adjustments.is_active() {
            let reset = std::mem::take(&mut self.adjustments);
            info!(
                transform = reset.transform_outcome.label(),
                outlier_mode = ?reset.outlier_mode,
                "Outcome changed, adjustments reset"
            );
            if let Some(map) = parameters.as_object_mut() {
                map.insert("adjustments_reset".to_string(), serde_json::to_value(&reset)?);
            }
        }
        info!(intent = intent.kind(), "Intent declared");
        self.intent = Some(intent);
        self.record(AuditEntry::new(
            AuditAction::SetIntent,
            &self.dataset_id,
            parameters,
        ));
        Ok(check)
    }

    /// Build the final dataset from the committed choices.
    pub fn prepare(&self) -> Result<FinalDataset> {
        self.build(&self.adjustments)
    }

    /// Build a dataset with arbitrary adjustments. Nothing is logged or
    /// committed.
    pub fn preview(&self, adjustments: &Adjustments) -> Result<FinalDataset> {
        self.build(adjustments)
    }

    fn build(&self, adjustments: &Adjustments) -> Result<FinalDataset> {
        build_final_dataset(
            &self.raw,
            &self.columns,
            &self.decisions,
            adjustments,
            self.intent.as_ref().and_then(AnalysisIntent::outcome),
        )
    }

    /// Record externally computed diagnostics.
    pub fn record_diagnostics(&mut self, summary: DiagnosticsSummary) -> DiagnosticsReport {
        let assessment = derive_validity(&summary.flags);
        let unlock = should_unlock_adjustments(&summary.flags);
        let improvements = self
            .diagnostics
            .as_ref()
            .map(|before| diagnostic_improvements(&before.flags, &summary.flags))
            .unwrap_or_default();

        info!(
            validity = assessment.validity.as_str(),
            unlock_transform = unlock.transform,
            unlock_outliers = unlock.outliers,
            "Diagnostics recorded"
        );

        let entry = AuditEntry::new(
            AuditAction::RunDiagnostics,
            &self.dataset_id,
            json!({ "validity": assessment.validity, "improvements": improvements }),
        )
        .with_diagnostics_before(self.diagnostics.take())
        .with_diagnostics_after(Some(summary.clone()));
        self.diagnostics = Some(summary);
        self.record(entry);

        DiagnosticsReport {
            assessment,
            unlock,
            improvements,
        }
    }

    /// Validity derived from the latest diagnostics.
    pub fn validity(&self) -> Option<ValidityAssessment> {
        self.diagnostics.as_ref().map(|d| derive_validity(&d.flags))
    }

    /// Adjustments unlocked by the latest diagnostics.
    pub fn unlocked(&self) -> AdjustmentUnlock {
        self.diagnostics
            .as_ref()
            .map(|d| should_unlock_adjustments(&d.flags))
            .unwrap_or_default()
    }

    /// Commit an outcome transform and return the rebuilt dataset.
    pub fn apply_transform(
        &mut self,
        transform: Transform,
        justification: &str,
    ) -> Result<FinalDataset> {
        if !transform.is_active() {
            return Err(AssayError::TransformNotSelected);
        }
        if !self.unlocked().transform {
            return Err(AssayError::AdjustmentLocked(
                "current diagnostics do not call for an outcome transform".to_string(),
            ));
        }
        validate_justification(justification)?;
        let outcome = self.adjustable_outcome()?;

        let untransformed = self.build(&Adjustments {
            transform_outcome: Transform::None,
            ..self.adjustments.clone()
        })?;
        let minimum = finite_values(&untransformed.rows, &outcome)
            .into_iter()
            .fold(f64::INFINITY, f64::min);
        validate_transform_choice(minimum, transform)?;

        let mut adjustments = self.adjustments.clone();
        adjustments.transform_outcome = transform;
        adjustments.justification.transform = justification.trim().to_string();
        let dataset = self.build(&adjustments)?;
        self.adjustments = adjustments;

        info!(transform = transform.label(), outcome = outcome.as_str(), "Outcome transform applied");
        self.record(
            AuditEntry::new(
                AuditAction::ApplyOutcomeTransform,
                &self.dataset_id,
                json!({
                    "outcome": outcome,
                    "transform": transform,
                    "fingerprint": dataset.meta.fingerprint,
                }),
            )
            .with_justification(justification.trim())
            .with_diagnostics_before(self.diagnostics.clone()),
        );
        Ok(dataset)
    }

    /// Commit outlier exclusion on the outcome and return the rebuilt
    /// dataset.
    pub fn apply_outlier_exclusion(
        &mut self,
        justification: &str,
        confirmed: bool,
    ) -> Result<FinalDataset> {
        if !self.unlocked().outliers {
            return Err(AssayError::AdjustmentLocked(
                "current diagnostics do not flag influential points or outliers".to_string(),
            ));
        }
        if !confirmed {
            return Err(AssayError::OutlierExclusionUnconfirmed);
        }
        validate_justification(justification)?;
        let outcome = self.adjustable_outcome()?;

        let mut adjustments = self.adjustments.clone();
        adjustments.outlier_mode = OutlierMode::Exclude;
        adjustments.outlier_rule = OUTLIER_RULE.to_string();
        adjustments.justification.outliers = justification.trim().to_string();
        let dataset = self.build(&adjustments)?;
        self.adjustments = adjustments;

        info!(
            removed = dataset.meta.removed_outliers_count,
            outcome = outcome.as_str(),
            "Outlier exclusion applied"
        );
        self.record(
            AuditEntry::new(
                AuditAction::ApplyOutlierExclusion,
                &self.dataset_id,
                json!({
                    "outcome": outcome,
                    "rule": OUTLIER_RULE,
                    "removed": dataset.meta.removed_outliers_count,
                    "fingerprint": dataset.meta.fingerprint,
                }),
            )
            .with_justification(justification.trim())
            .with_diagnostics_before(self.diagnostics.clone()),
        );
        Ok(dataset)
    }

    fn adjustable_outcome(&self) -> Result<String> {
        let intent = self.intent.as_ref().ok_or(AssayError::NoIntent)?;
        intent.outcome().map(str::to_string).ok_or_else(|| {
            AssayError::InvalidIntent(format!(
                "a '{}' intent has no outcome to adjust",
                intent.kind()
            ))
        })
    }

    /// Run the declared intent against the prepared dataset.
    pub fn run_analysis(&mut self) -> Result<AnalysisResults> {
        let intent = self.intent.clone().ok_or(AssayError::NoIntent)?;
        let dataset = self.prepare()?;
        let results = run_analysis(&dataset, &intent, &self.columns, &self.config)?;

        self.record(AuditEntry::new(
            AuditAction::RunAnalysis,
            &self.dataset_id,
            json!({
                "intent": intent,
                "n_final": dataset.meta.n_final,
                "fingerprint": dataset.meta.fingerprint,
                "warnings": results.warnings,
            }),
        ));
        Ok(results)
    }

    /// Markdown report of the current state.
    pub fn report_markdown(&self, results: Option<&AnalysisResults>) -> Result<String> {
        let dataset = self.prepare()?;
        let validity = self.validity();
        build_report_markdown(&ReportInputs {
            meta: &dataset.meta,
            intent: self.intent.as_ref(),
            validity: validity.as_ref(),
            results,
            log: &self.log,
        })
    }

    fn record(&mut self, entry: AuditEntry) {
        let action = entry.action;
        let sequence = self.log.append(entry).sequence;
        debug!(action = action.as_str(), sequence, "Audit entry appended");
    }
}
