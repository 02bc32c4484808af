//! Audit trail: the append-only decision log, its exports and the
//! Markdown report built on top of it.

mod export;
mod log;
mod report;

pub use export::rows_to_csv;
pub use log::{AuditAction, AuditEntry, AuditLog};
pub use report::{build_report_markdown, ReportInputs};
