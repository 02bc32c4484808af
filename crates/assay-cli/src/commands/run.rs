//! Run command - prepare a dataset and run the planned analysis.

use std::fs;
use std::path::PathBuf;

use assay::audit::rows_to_csv;
use assay::{AnalysisDetail, AnalysisResults, MeansTest, ValidityTier};
use colored::Colorize;

use super::plan::execute;

pub fn run(
    file: PathBuf,
    plan: PathBuf,
    config: Option<PathBuf>,
    log: Option<PathBuf>,
    output: Option<PathBuf>,
    export_data: Option<PathBuf>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (session, results) = execute(&file, &plan, config.as_deref(), json_output)?;
    let dataset = session.prepare()?;
    let validity = session.validity();

    if let Some(path) = &log {
        fs::write(path, session.log().to_json()?)?;
    }
    if let Some(path) = &export_data {
        fs::write(path, rows_to_csv(&dataset.rows)?)?;
    }

    let document = serde_json::json!({
        "dataset": dataset.meta,
        "validity": validity,
        "results": results,
    });
    if let Some(path) = &output {
        fs::write(path, serde_json::to_string_pretty(&document)?)?;
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Analysis of".cyan().bold(),
        file.display().to_string().white()
    );
    println!(
        "Rows: {} -> {}  (missing: {}, duplicates: {}, outliers: {})",
        dataset.meta.n_original,
        dataset.meta.n_final.to_string().white().bold(),
        dataset.meta.removed_missing_rows_count,
        dataset.meta.removed_duplicates_count,
        dataset.meta.removed_outliers_count
    );
    if dataset.meta.transform_applied.is_active() {
        println!(
            "Outcome transform: {}",
            dataset.meta.transform_applied.label().magenta()
        );
    }
    println!();

    println!("{}", results.summary_text);
    print_detail(&results);
    for warning in &results.warnings {
        println!("{} {}", "Warning:".yellow().bold(), warning);
    }
    println!();

    if let Some(assessment) = validity {
        let label = match assessment.validity {
            ValidityTier::Green => assessment.validity.label().green(),
            ValidityTier::Yellow => assessment.validity.label().yellow(),
            ValidityTier::Red => assessment.validity.label().red(),
        };
        println!("{} {}", "Validity:".yellow().bold(), label.bold());
        for reason in &assessment.reasons {
            println!("  - {}", reason);
        }
    }

    if let Some(path) = &log {
        println!(
            "Audit log ({} entries) saved to {}",
            session.log().len(),
            path.display().to_string().cyan()
        );
    }
    Ok(())
}

fn print_detail(results: &AnalysisResults) {
    match &results.detail {
        AnalysisDetail::Regression(regression) => {
            println!();
            println!(
                "  {:<24} {:>12} {:>10} {:>9} {:>10}",
                "term", "estimate", "std.err", "t", "p"
            );
            for c in &regression.coef_table {
                let p = format!("{:.4}", c.p_value);
                let p = if c.p_value < 0.05 { p.green() } else { p.normal() };
                println!(
                    "  {:<24} {:>12.4} {:>10.4} {:>9.3} {:>10}",
                    c.term, c.estimate, c.std_error, c.t_value, p
                );
            }
            let stats = &regression.model_stats;
            println!(
                "  R^2 = {:.4}, adj R^2 = {:.4}, F({}, {}) = {:.3}, p = {:.4}",
                stats.r2, stats.adj_r2, stats.df1, stats.df2, stats.f_stat, stats.f_p
            );
        }
        AnalysisDetail::GroupComparison { groups, test } => {
            for g in groups {
                println!("  {:<20} n={:<6} mean={:.4} sd={:.4}", g.group, g.n, g.mean, g.std);
            }
            match test {
                MeansTest::TTest(t) => println!(
                    "  Welch t = {:.4}, df = {:.2}, p = {:.4}",
                    t.t, t.df, t.p
                ),
                MeansTest::Anova(a) => println!(
                    "  ANOVA F = {:.4}, df = ({}, {}), p = {:.4}, eta^2 = {:.3}",
                    a.f, a.df_between, a.df_within, a.p, a.eta_sq
                ),
            }
        }
        AnalysisDetail::Contingency { test, .. } => println!(
            "  chi^2 = {:.4}, df = {}, p = {:.4}, Cramer's V = {:.3}",
            test.chi2, test.df, test.p, test.cramers_v
        ),
        AnalysisDetail::Correlation(c) => {
            println!("  r = {:.4}, n = {}, p = {:.4}", c.r, c.n, c.p)
        }
    }
}
