//! Markdown analysis report.

use std::fmt::Write as _;

use crate::analysis::{AnalysisIntent, AnalysisResults};
use crate::error::Result;
use crate::prepare::DatasetMeta;
use crate::validity::ValidityAssessment;

use super::log::AuditLog;

/// Everything a report is assembled from.
#[derive(Debug, Clone, Copy)]
pub struct ReportInputs<'a> {
    pub meta: &'a DatasetMeta,
    pub intent: Option<&'a AnalysisIntent>,
    pub validity: Option<&'a ValidityAssessment>,
    pub results: Option<&'a AnalysisResults>,
    pub log: &'a AuditLog,
}

/// Render the full report: dataset summary, intent, validity, results,
/// adjustments, limitations and the audit log as an appendix.
pub fn build_report_markdown(inputs: &ReportInputs<'_>) -> Result<String> {
    let meta = inputs.meta;
    let mut out = String::from("# Statistical Analysis Report\n\n");

    out.push_str("## Dataset Summary\n");
    let _ = writeln!(out, "- Rows before preparation: {}", meta.n_original);
    let _ = writeln!(out, "- Rows after preparation: {}", meta.n_final);
    let _ = writeln!(out, "- Columns used: {}", meta.columns_used.join(", "));
    let _ = writeln!(out, "- Fingerprint: {}", meta.fingerprint);

    out.push_str("\n## Intent\n");
    match inputs.intent {
        Some(intent) => {
            let _ = writeln!(out, "- Type: {}", intent.kind());
            let _ = writeln!(out, "- Variables: {}", serde_json::to_string(intent)?);
        }
        None => out.push_str("- No intent declared.\n"),
    }

    out.push_str("\n## Validity Status\n");
    match inputs.validity {
        Some(assessment) => {
            let _ = writeln!(
                out,
                "- Status: {} ({})",
                assessment.validity.label(),
                assessment.validity.as_str()
            );
            for reason in &assessment.reasons {
                let _ = writeln!(out, "- {}", reason);
            }
        }
        None => out.push_str("- Status: not assessed\n"),
    }

    out.push_str("\n## Results\n");
    match inputs.results {
        Some(results) => {
            let _ = writeln!(out, "{}", results.summary_text);
            for warning in &results.warnings {
                let _ = writeln!(out, "- Warning: {}", warning);
            }
        }
        None => out.push_str("Summary not available.\n"),
    }

    out.push_str("\n## Adjustments\n");
    let _ = writeln!(out, "- Transform: {}", meta.transform_applied.label());
    let _ = writeln!(
        out,
        "- Transform justification: {}",
        or_none(&meta.transform_justification)
    );
    let _ = writeln!(out, "- Outliers excluded: {}", meta.removed_outliers_count);
    let _ = writeln!(
        out,
        "- Outlier justification: {}",
        or_none(&meta.outlier_justification)
    );

    out.push_str("\n## Limitations\n");
    let limitations: Vec<&String> = inputs
        .validity
        .filter(|a| a.validity != crate::validity::ValidityTier::Green)
        .map(|a| a.reasons.iter().collect())
        .unwrap_or_default();
    if limitations.is_empty() {
        out.push_str("- None noted.\n");
    }
    for reason in limitations {
        let _ = writeln!(out, "- {}", reason);
    }

    out.push_str("\n## Appendix: Audit Logs\n```json\n");
    out.push_str(&inputs.log.to_json()?);
    out.push_str("\n```\n");
    Ok(out)
}

fn or_none(text: &str) -> &str {
    if text.trim().is_empty() {
        "none"
    } else {
        text
    }
}
