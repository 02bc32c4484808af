//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Assay: audited statistical analysis of tabular data
#[derive(Parser)]
#[command(name = "assay")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Prepare a dataset and run the analysis described by a plan
    Run {
        /// Path to the data file (CSV)
        #[arg(value_name = "DATA")]
        file: PathBuf,

        /// Analysis plan (JSON): decisions, intent, diagnostics, adjustments
        #[arg(short, long, value_name = "PLAN")]
        plan: PathBuf,

        /// Engine configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the audit log (JSON) here
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Write the results (JSON) here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the final dataset (CSV) here
        #[arg(long)]
        export_data: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify diagnostic flags into a validity tier
    Validity {
        /// Path to diagnostic flags (JSON)
        #[arg(value_name = "FLAGS")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export a saved audit log
    Log {
        /// Path to the audit log (JSON)
        #[arg(value_name = "AUDIT")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "markdown")]
        format: LogFormat,
    },

    /// Run a plan and write the Markdown report
    Report {
        /// Path to the data file (CSV)
        #[arg(value_name = "DATA")]
        file: PathBuf,

        /// Analysis plan (JSON)
        #[arg(short, long, value_name = "PLAN")]
        plan: PathBuf,

        /// Engine configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output path for the report (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Csv,
    #[default]
    Markdown,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "csv" => Ok(LogFormat::Csv),
            "markdown" | "md" => Ok(LogFormat::Markdown),
            _ => Err(format!("Unknown format: {}. Use json, csv, or markdown.", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Json => write!(f, "json"),
            LogFormat::Csv => write!(f, "csv"),
            LogFormat::Markdown => write!(f, "markdown"),
        }
    }
}
