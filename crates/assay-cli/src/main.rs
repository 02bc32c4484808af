//! Assay CLI - audited statistical analysis of tabular data.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            file,
            plan,
            config,
            log,
            output,
            export_data,
            json,
        } => commands::run::run(file, plan, config, log, output, export_data, json),

        Commands::Validity { file, json } => commands::validity::run(file, json),

        Commands::Log { file, format } => commands::log::run(file, format),

        Commands::Report {
            file,
            plan,
            config,
            output,
        } => commands::report::run(file, plan, config, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr so JSON on stdout stays parseable. `RUST_LOG` wins over
/// `--verbose`.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
