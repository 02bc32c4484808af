//! Report command - run a plan and write the Markdown report.

use std::fs;
use std::path::PathBuf;

use colored::Colorize;

use super::plan::execute;

pub fn run(
    file: PathBuf,
    plan: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (session, results) = execute(&file, &plan, config.as_deref(), false)?;
    let report = session.report_markdown(Some(&results))?;

    match output {
        Some(path) => {
            fs::write(&path, &report)?;
            println!(
                "{} {}",
                "Report saved to".green().bold(),
                path.display().to_string().cyan()
            );
        }
        None => print!("{}", report),
    }
    Ok(())
}
