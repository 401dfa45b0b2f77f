use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use dispensary_cli::{Fixture, Report};
use dispensary_dispensing::DispenseConfig;

/// Dispense one request against a dispensary seeded from a JSON fixture
#[derive(Parser)]
#[command(name = "dispensary")]
#[command(version, about, long_about = None)]
struct Args {
    /// Report whether the request's visit could be dispensed, without changing anything
    #[arg(long)]
    preview: bool,
    /// Fixture with the hospital id, medicine stock and open visits
    fixture: PathBuf,
    /// Dispense request document
    request: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();
    dispensary_observability::init();

    match run(&args) {
        Ok(report) => {
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(err) => {
                    tracing::error!(error = %err, "failed to encode report");
                    return ExitCode::from(2);
                }
            }
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> anyhow::Result<Report> {
    let fixture_text = std::fs::read_to_string(&args.fixture)
        .with_context(|| format!("reading fixture {}", args.fixture.display()))?;
    let request_text = std::fs::read_to_string(&args.request)
        .with_context(|| format!("reading request {}", args.request.display()))?;

    let fixture = Fixture::from_json(&fixture_text)?;
    let config = DispenseConfig::from_env();
    tracing::info!(
        compensation_attempts = config.compensation_attempts,
        publish_low_stock = config.publish_low_stock,
        preview = args.preview,
        "dispensary starting"
    );

    if args.preview {
        dispensary_cli::preview(&fixture, &request_text, config)
    } else {
        dispensary_cli::dispense(&fixture, &request_text, config)
    }
}
