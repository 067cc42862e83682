//! `rewrite-imports` command line: rewrites matching files in place.

use std::{path::Path, process::ExitCode};

use clap::Parser;
use rewrite_imports::{
    driver::{self, Options},
    logging,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "rewrite-imports")]
#[command(about = "Rewrite @aws-cdk/* imports to their monocdk equivalents", long_about = None)]
struct Cli {
    /// Report what would change without writing any file
    #[arg(long)]
    dry_run: bool,

    /// Print one JSON report per processed file on stdout
    #[arg(long)]
    json: bool,

    /// File patterns to process, e.g. '**/*.ts'
    #[arg(value_name = "PATTERN", required = true)]
    patterns: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = logging::init() {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }

    let options = Options { dry_run: cli.dry_run };
    let result = driver::run(Path::new("."), &cli.patterns, &options, |report| {
        if !cli.json {
            return;
        }
        match serde_json::to_string(report) {
            Ok(line) => println!("{line}"),
            Err(err) => warn!(file = %report.path, error = %err, "failed to serialize report"),
        }
    });

    match result {
        Ok(summary) => {
            info!(files = summary.files, changed = summary.changed, "done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
