//! Validity command - classify diagnostic flags.

use std::fs;
use std::path::{Path, PathBuf};

use assay::validity::{derive_validity, should_unlock_adjustments};
use assay::{DiagnosticFlags, DiagnosticsSummary, ValidityTier};
use colored::Colorize;

pub fn run(file: PathBuf, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let flags = load_flags(&file)?;
    let assessment = derive_validity(&flags);
    let unlock = should_unlock_adjustments(&flags);

    if json_output {
        let document = serde_json::json!({
            "validity": assessment.validity,
            "reasons": assessment.reasons,
            "unlock": unlock,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    let label = match assessment.validity {
        ValidityTier::Green => assessment.validity.label().green(),
        ValidityTier::Yellow => assessment.validity.label().yellow(),
        ValidityTier::Red => assessment.validity.label().red(),
    };
    println!("{} {}", "Validity:".cyan().bold(), label.bold());
    for reason in &assessment.reasons {
        println!("  - {}", reason);
    }
    println!();
    println!("{}", "Adjustments:".yellow().bold());
    println!("  Outcome transform: {}", lock_label(unlock.transform));
    println!("  Outlier exclusion: {}", lock_label(unlock.outliers));
    Ok(())
}

fn lock_label(unlocked: bool) -> colored::ColoredString {
    if unlocked {
        "unlocked".green()
    } else {
        "locked".normal()
    }
}

/// Accept either bare flags or a diagnostics summary with a `flags` field.
fn load_flags(path: &Path) -> Result<DiagnosticFlags, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read flags '{}': {}", path.display(), e))?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    if value.get("flags").is_some() {
        let summary: DiagnosticsSummary = serde_json::from_value(value)?;
        Ok(summary.flags)
    } else {
        Ok(serde_json::from_value(value)?)
    }
}
