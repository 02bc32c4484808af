//! Analysis plans: the JSON file that scripts a whole session.

use std::fs::{self, File};
use std::path::Path;

use assay::{
    AnalysisIntent, AnalysisResults, AnalysisSession, Assay, AssayConfig, ColumnRole, DataTable,
    DiagnosticsSummary, PrepDecisions, Transform,
};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Every step a session goes through, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisPlan {
    /// Dataset identifier for the audit log (default: file stem).
    #[serde(default)]
    pub dataset_id: Option<String>,

    #[serde(default)]
    pub decisions: PrepDecisions,

    /// Role overrides applied after the decisions.
    #[serde(default)]
    pub roles: Vec<RoleOverride>,

    pub intent: AnalysisIntent,

    /// Externally computed diagnostics; required before any adjustment.
    #[serde(default)]
    pub diagnostics: Option<DiagnosticsSummary>,

    #[serde(default)]
    pub adjustments: PlannedAdjustments,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleOverride {
    pub column: String,
    pub role: ColumnRole,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannedAdjustments {
    #[serde(default)]
    pub transform: Option<PlannedTransform>,
    #[serde(default)]
    pub outliers: Option<PlannedOutlierExclusion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedTransform {
    pub transform: Transform,
    pub justification: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedOutlierExclusion {
    pub justification: String,
    #[serde(default)]
    pub confirmed: bool,
}

impl AnalysisPlan {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read plan '{}': {}", path.display(), e))?;
        let plan = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse plan '{}': {}", path.display(), e))?;
        Ok(plan)
    }
}

/// Load an engine configuration, or the defaults.
pub fn load_config(path: Option<&Path>) -> Result<AssayConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(AssayConfig::default());
    };
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config '{}': {}", path.display(), e))?;
    let config: AssayConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load a CSV data file.
pub fn load_table(path: &Path) -> Result<DataTable, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Data file not found: {}", path.display()).into());
    }
    let table = DataTable::from_csv_reader(File::open(path)?)?;
    debug!(rows = table.row_count(), columns = table.column_count(), "Loaded data file");
    Ok(table)
}

/// Run a plan end to end and return the session with its results.
///
/// Intent warnings are printed to stderr unless `quiet` is set.
pub fn execute(
    file: &Path,
    plan_path: &Path,
    config: Option<&Path>,
    quiet: bool,
) -> Result<(AnalysisSession, AnalysisResults), Box<dyn std::error::Error>> {
    let plan = AnalysisPlan::load(plan_path)?;
    let config = load_config(config)?;
    let table = load_table(file)?;

    let dataset_id = plan.dataset_id.clone().unwrap_or_else(|| {
        file.file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned()
    });
    let mut session = Assay::with_config(config)?.session(dataset_id, &table);

    session.set_prep_decisions(plan.decisions)?;
    for role in &plan.roles {
        session.set_column_role(&role.column, role.role)?;
    }

    let check = session.set_intent(plan.intent)?;
    if !quiet {
        for warning in &check.warnings {
            eprintln!("{} {}", "Warning:".yellow().bold(), warning);
        }
    }

    if let Some(diagnostics) = plan.diagnostics {
        session.record_diagnostics(diagnostics);
    }
    if let Some(outliers) = &plan.adjustments.outliers {
        session.apply_outlier_exclusion(&outliers.justification, outliers.confirmed)?;
    }
    if let Some(transform) = &plan.adjustments.transform {
        session.apply_transform(transform.transform, &transform.justification)?;
    }

    let results = session.run_analysis()?;
    Ok((session, results))
}
