//! Exports of the audit log and of prepared rows.

use chrono::SecondsFormat;
use indexmap::IndexSet;

use crate::error::{AssayError, Result};
use crate::input::Row;
use crate::validity::DiagnosticsSummary;

use super::log::{AuditEntry, AuditLog};

const AUDIT_COLUMNS: [&str; 8] = [
    "sequence",
    "action",
    "timestamp",
    "dataset_id",
    "parameters",
    "justification",
    "diagnostics_summary_before",
    "diagnostics_summary_after",
];

impl AuditLog {
    /// Pretty-printed JSON array of entries.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One CSV row per entry; JSON-valued fields are embedded as compact JSON.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(AUDIT_COLUMNS)?;
        for entry in self {
            writer.write_record(entry_fields(entry)?)?;
        }
        finish_csv(writer)
    }

    /// Markdown table with one row per entry.
    pub fn to_markdown(&self) -> Result<String> {
        let mut out = String::new();
        out.push_str(&format!("| {} |\n", AUDIT_COLUMNS.join(" | ")));
        out.push_str(&format!("|{}\n", "---|".repeat(AUDIT_COLUMNS.len())));
        for entry in self {
            let cells: Vec<String> = entry_fields(entry)?
                .iter()
                .map(|cell| escape_markdown_cell(cell))
                .collect();
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
        Ok(out)
    }
}

fn entry_fields(entry: &AuditEntry) -> Result<Vec<String>> {
    Ok(vec![
        entry.sequence.to_string(),
        entry.action.as_str().to_string(),
        entry.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        entry.dataset_id.clone(),
        serde_json::to_string(&entry.parameters)?,
        entry.justification.clone().unwrap_or_default(),
        summary_json(entry.diagnostics_summary_before.as_ref())?,
        summary_json(entry.diagnostics_summary_after.as_ref())?,
    ])
}

fn summary_json(summary: Option<&DiagnosticsSummary>) -> Result<String> {
    match summary {
        Some(summary) => Ok(serde_json::to_string(summary)?),
        None => Ok(String::new()),
    }
}

fn escape_markdown_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace(['\n', '\r'], "<br>")
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| AssayError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AssayError::Export(e.to_string()))
}

/// Write rows as CSV.
///
/// The header is the union of row keys in first-appearance order; absent
/// and missing cells are written empty.
pub fn rows_to_csv(rows: &[Row]) -> Result<String> {
    let headers: IndexSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    if headers.is_empty() {
        return finish_csv(writer);
    }
    writer.write_record(&headers)?;
    for row in rows {
        writer.write_record(
            headers
                .iter()
                .map(|h| row.get(*h).map(ToString::to_string).unwrap_or_default()),
        )?;
    }
    finish_csv(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditAction;
    use crate::input::{row, Value};
    use chrono::{DateTime, Utc};
    use serde_json::json;

    fn sample_log() -> AuditLog {
        let mut log = AuditLog::new();
        log.append(AuditEntry::new(
            AuditAction::SetPrepDecisions,
            "survey",
            json!({"missing_strategy": "drop_rows"}),
        ));
        log.append(
            AuditEntry::new(AuditAction::ApplyOutcomeTransform, "survey", json!({"transform": "log"}))
                .with_justification("right | skewed"),
        );
        log
    }

    #[test]
    fn test_csv_export() {
        let csv = sample_log().to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("sequence,action,timestamp"));
        assert!(lines[1].starts_with("1,set_prep_decisions,"));
        assert!(lines[1].contains(r#""{""missing_strategy"":""drop_rows""}""#));
        assert!(lines[2].contains("right | skewed"));
    }

    #[test]
    fn test_markdown_escapes_pipes() {
        let md = sample_log().to_markdown().unwrap();
        assert!(md.starts_with("| sequence | action |"));
        assert!(md.contains("right \\| skewed"));
        assert_eq!(md.lines().count(), 4);
    }

    #[test]
    fn test_exports_keep_full_timestamps() {
        let log = sample_log();
        let csv = log.to_csv().unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        let parsed = DateTime::parse_from_rfc3339(&record[2]).unwrap().with_timezone(&Utc);
        assert_eq!(parsed, log.entries()[0].timestamp);

        let md = log.to_markdown().unwrap();
        assert!(md.contains(&log.entries()[1].timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)));
    }

    #[test]
    fn test_markdown_keeps_line_breaks() {
        let mut log = AuditLog::new();
        log.append(
            AuditEntry::new(AuditAction::ApplyOutlierExclusion, "survey", json!({}))
                .with_justification("line one\nline two\r\nline three"),
        );
        let md = log.to_markdown().unwrap();
        assert!(md.contains("line one<br>line two<br>line three"));
        assert_eq!(md.lines().count(), 3);
    }

    #[test]
    fn test_json_export_is_array() {
        let json: serde_json::Value = serde_json::from_str(&sample_log().to_json().unwrap()).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(2));
        assert_eq!(json[1]["action"], "apply_outcome_transform");
    }

    #[test]
    fn test_rows_to_csv() {
        let rows = vec![
            row([("y", Value::from(1.5)), ("g", Value::from("a"))]),
            row([("y", Value::Missing), ("g", Value::from("b")), ("y_original", Value::from(4.0))]),
        ];
        let csv = rows_to_csv(&rows).unwrap();
        assert_eq!(csv, "y,g,y_original\n1.5,a,\n,b,4\n");
    }

    #[test]
    fn test_rows_to_csv_empty() {
        assert_eq!(rows_to_csv(&[]).unwrap(), "");
    }
}
