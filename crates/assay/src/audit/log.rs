//! Append-only audit log of preparation and adjustment decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AssayError;
use crate::validity::DiagnosticsSummary;

/// Kind of action recorded in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    SetPrepDecisions,
    ColumnExclusion,
    SetIntent,
    RunDiagnostics,
    ApplyOutcomeTransform,
    ApplyOutlierExclusion,
    RunAnalysis,
}

impl AuditAction {
    /// Snake-case name used in exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::SetPrepDecisions => "set_prep_decisions",
            AuditAction::ColumnExclusion => "column_exclusion",
            AuditAction::SetIntent => "set_intent",
            AuditAction::RunDiagnostics => "run_diagnostics",
            AuditAction::ApplyOutcomeTransform => "apply_outcome_transform",
            AuditAction::ApplyOutlierExclusion => "apply_outlier_exclusion",
            AuditAction::RunAnalysis => "run_analysis",
        }
    }
}

/// A single timestamped record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// 1-based position in the log, assigned on append.
    pub sequence: u64,

    pub action: AuditAction,

    pub timestamp: DateTime<Utc>,

    /// Dataset the action applies to.
    pub dataset_id: String,

    /// Action parameters as recorded at the time.
    pub parameters: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics_summary_before: Option<DiagnosticsSummary>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics_summary_after: Option<DiagnosticsSummary>,
}

impl AuditEntry {
    /// Create an entry stamped with the current time.
    ///
    /// The sequence number is assigned by [`AuditLog::append`].
    pub fn new(action: AuditAction, dataset_id: impl Into<String>, parameters: Value) -> Self {
        Self {
            sequence: 0,
            action,
            timestamp: Utc::now(),
            dataset_id: dataset_id.into(),
            parameters,
            justification: None,
            diagnostics_summary_before: None,
            diagnostics_summary_after: None,
        }
    }

    /// Attach the user's justification.
    pub fn with_justification(mut self, justification: impl Into<String>) -> Self {
        self.justification = Some(justification.into());
        self
    }

    /// Attach the diagnostics in force before the action.
    pub fn with_diagnostics_before(mut self, summary: Option<DiagnosticsSummary>) -> Self {
        self.diagnostics_summary_before = summary;
        self
    }

    /// Attach the diagnostics observed after the action.
    pub fn with_diagnostics_after(mut self, summary: Option<DiagnosticsSummary>) -> Self {
        self.diagnostics_summary_after = summary;
        self
    }
}

/// Ordered, append-only sequence of [`AuditEntry`] records.
///
/// Entries can be added but never edited, removed or reordered. A log
/// deserialized from disk must carry sequence numbers `1..=n` in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<AuditEntry>", into = "Vec<AuditEntry>")]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from previously recorded entries.
    pub fn from_entries(entries: Vec<AuditEntry>) -> Result<Self, AssayError> {
        for (index, entry) in entries.iter().enumerate() {
            let expected = index as u64 + 1;
            if entry.sequence != expected {
                return Err(AssayError::InvalidAuditLog(format!(
                    "entry {} has sequence {}, expected {}",
                    index + 1,
                    entry.sequence,
                    expected
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Append an entry, assigning the next sequence number.
    pub fn append(&mut self, mut entry: AuditEntry) -> &AuditEntry {
        entry.sequence = self.entries.len() as u64 + 1;
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AuditEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry.
    pub fn last(&self) -> Option<&AuditEntry> {
        self.entries.last()
    }
}

impl TryFrom<Vec<AuditEntry>> for AuditLog {
    type Error = AssayError;

    fn try_from(entries: Vec<AuditEntry>) -> Result<Self, Self::Error> {
        Self::from_entries(entries)
    }
}

impl From<AuditLog> for Vec<AuditEntry> {
    fn from(log: AuditLog) -> Self {
        log.entries
    }
}

impl<'a> IntoIterator for &'a AuditLog {
    type Item = &'a AuditEntry;
    type IntoIter = std::slice::Iter<'a, AuditEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_append_assigns_sequence() {
        let mut log = AuditLog::new();
        log.append(AuditEntry::new(AuditAction::SetIntent, "ds", json!({})));
        let second = log.append(
            AuditEntry::new(AuditAction::ApplyOutcomeTransform, "ds", json!({"transform": "log"}))
                .with_justification("skewed"),
        );
        assert_eq!(second.sequence, 2);
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].sequence, 1);
        assert_eq!(log.last().unwrap().justification.as_deref(), Some("skewed"));
    }

    #[test]
    fn test_roundtrip_preserves_order() {
        let mut log = AuditLog::new();
        for action in [AuditAction::SetPrepDecisions, AuditAction::RunAnalysis] {
            log.append(AuditEntry::new(action, "ds", json!(null)));
        }
        let json = serde_json::to_string(&log).unwrap();
        assert!(json.starts_with('['));
        let restored: AuditLog = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, log);
    }

    #[test]
    fn test_rejects_reordered_entries() {
        let mut log = AuditLog::new();
        log.append(AuditEntry::new(AuditAction::SetIntent, "ds", json!({})));
        log.append(AuditEntry::new(AuditAction::RunAnalysis, "ds", json!({})));
        let mut entries: Vec<AuditEntry> = log.into();
        entries.swap(0, 1);

        let json = serde_json::to_string(&entries).unwrap();
        let err = serde_json::from_str::<AuditLog>(&json).unwrap_err();
        assert!(err.to_string().contains("expected 1"));
        assert!(matches!(
            AuditLog::from_entries(entries),
            Err(AssayError::InvalidAuditLog(_))
        ));
    }

    #[test]
    fn test_action_names_match_serde() {
        let json = serde_json::to_string(&AuditAction::ApplyOutlierExclusion).unwrap();
        assert_eq!(json, format!("\"{}\"", AuditAction::ApplyOutlierExclusion.as_str()));
    }
}
