//! Log command - export a saved audit log.

use std::fs;
use std::path::{Path, PathBuf};

use assay::AuditLog;

use crate::cli::LogFormat;

pub fn run(file: PathBuf, format: LogFormat) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", render(&file, &format)?);
    Ok(())
}

fn render(file: &Path, format: &LogFormat) -> Result<String, Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("Audit log not found: {}", file.display()).into());
    }
    let log: AuditLog = serde_json::from_str(&fs::read_to_string(file)?)?;

    let mut out = match format {
        LogFormat::Json => log.to_json()?,
        LogFormat::Csv => log.to_csv()?,
        LogFormat::Markdown => log.to_markdown()?,
    };
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}
