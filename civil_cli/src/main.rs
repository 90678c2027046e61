//! # Groundwork CLI
//!
//! Runs calculators and estimating tools from the shell. Results print to
//! stdout as JSON; errors print to stderr as JSON.
//!
//! ```text
//! civil tools
//! civil rates utah
//! civil run pipe_flow_full '{"diameter_in": 12, "slope": 0.005}'
//! echo '{"depth_ft": 8, "soil_type": "C"}' | civil run trench_safety
//! ```
//!
//! Exit codes: 0 success, 2 bad request, 1 anything else.

use std::process::ExitCode;

use clap::Parser;
use serde_json::json;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Failure};

fn main() -> ExitCode {
    // Logs go to stderr so stdout stays JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.execute() {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!(%err, "failed to serialize result");
                ExitCode::from(1)
            }
        },
        Err(Failure::Client(err)) => {
            eprintln!("{}", json!({"error": err.to_string(), "details": err}));
            ExitCode::from(2)
        }
        Err(Failure::Calc(err)) => {
            eprintln!("{}", json!({"error": err.to_string(), "details": err}));
            ExitCode::from(1)
        }
        Err(Failure::Other(err)) => {
            eprintln!("{}", json!({"error": format!("{:#}", err)}));
            ExitCode::from(1)
        }
    }
}
