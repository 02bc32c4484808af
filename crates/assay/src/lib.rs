//! Assay: statistical computation engine for prepared tabular datasets.
//!
//! Assay turns a raw table plus user-declared column roles and cleaning
//! choices into an analysis-ready dataset, then fits models and computes
//! test statistics from scratch (no external statistics library).
//!
//! # Core Principles
//!
//! - **Reproducible**: preparation is deterministic and fingerprinted
//! - **Non-destructive**: raw rows are never modified
//! - **Audited**: every decision lands in an append-only log
//!
//! # Example
//!
//! ```
//! use assay::{row, Assay, AnalysisIntent, DataTable, Row};
//!
//! let rows: Vec<Row> = (1..=10)
//!     .map(|i| row([("x", i as f64), ("y", 2.0 * i as f64 + 1.0)]))
//!     .collect();
//! let table = DataTable::new(vec!["x".into(), "y".into()], rows);
//!
//! let mut session = Assay::new().session("demo", &table);
//! session
//!     .set_intent(AnalysisIntent::Predict {
//!         outcome: "y".into(),
//!         predictors: vec!["x".into()],
//!     })
//!     .unwrap();
//! let results = session.run_analysis().unwrap();
//! println!("{}", results.summary_text);
//! ```

pub mod analysis;
pub mod audit;
pub mod error;
pub mod hypothesis;
pub mod input;
pub mod math;
pub mod prepare;
pub mod regression;
pub mod schema;
pub mod session;
pub mod validity;

mod assay;

pub use crate::assay::{Assay, AssayConfig, AssayConfigBuilder};
pub use analysis::{run_analysis, AnalysisDetail, AnalysisIntent, AnalysisResults, IntentCheck, MeansTest};
pub use audit::{AuditAction, AuditEntry, AuditLog};
pub use error::{AssayError, Result};
pub use input::{row, DataTable, Row, Value};
pub use prepare::{Adjustments, DatasetMeta, FinalDataset, PrepDecisions, Transform};
pub use regression::{ols_regression, RegressionResult};
pub use schema::{ColumnInfo, ColumnRole, DetectedType};
pub use session::{AnalysisSession, DiagnosticsReport};
pub use validity::{DiagnosticFlags, DiagnosticsSummary, ValidityAssessment, ValidityTier};
