use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use civil_core::rates::{RateCatalog, RegionRateTable};
use civil_core::tools::{all_tools, to_json, Toolbox};
use civil_core::{CalcError, EstimatorSettings};

#[derive(Parser)]
#[command(name = "civil")]
#[command(about = "Heavy civil estimating and field calculations")]
#[command(version)]
pub struct Cli {
    /// JSON settings file (default region, markup, concrete psi)
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    /// JSON file of region rate tables to add or replace, keyed by slug
    #[arg(short, long, global = true)]
    pub rates: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print every tool schema in function-calling format
    Tools,

    /// List rate regions
    Regions,

    /// Print the rate table for a region (unknown regions show national)
    Rates {
        /// Region slug
        region: String,
    },

    /// Run a tool with JSON arguments
    Run {
        /// Tool name, e.g. pipe_flow_full
        tool: String,

        /// JSON arguments; `-` or omitted reads stdin
        args: Option<String>,
    },
}

/// How a command failed, for the exit code.
pub enum Failure {
    /// Bad request: unknown tool, malformed or invalid arguments
    Client(CalcError),
    /// Calculation error not caused by the request
    Calc(CalcError),
    /// I/O or configuration problem
    Other(anyhow::Error),
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Failure::Other(err)
    }
}

impl From<CalcError> for Failure {
    fn from(err: CalcError) -> Self {
        if err.is_client_error() {
            Failure::Client(err)
        } else {
            Failure::Calc(err)
        }
    }
}

impl Cli {
    pub fn execute(self) -> std::result::Result<Value, Failure> {
        let settings = match &self.settings {
            Some(path) => EstimatorSettings::load(path)?,
            None => EstimatorSettings::default(),
        };

        let catalog = match &self.rates {
            Some(path) => {
                let mut catalog = RateCatalog::global().clone();
                catalog.apply_overrides(load_overrides(path)?);
                catalog
            }
            None => RateCatalog::global().clone(),
        };

        match self.command {
            Commands::Tools => Ok(Value::Array(all_tools())),
            Commands::Regions => Ok(to_json(&catalog.get_regions())?),
            Commands::Rates { region } => Ok(to_json(catalog.get_rates(&region))?),
            Commands::Run { tool, args } => {
                let arguments = read_arguments(args.as_deref())?;
                let toolbox = Toolbox::new(&catalog, settings);
                Ok(toolbox.execute(&tool, arguments)?)
            }
        }
    }
}

fn load_overrides(path: &Path) -> Result<BTreeMap<String, RegionRateTable>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading rate overrides {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("parsing rate overrides {}", path.display()))
}

fn read_arguments(args: Option<&str>) -> std::result::Result<Value, Failure> {
    let text = match args {
        Some(text) if text != "-" => text.to_string(),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading arguments from stdin")?;
            buf
        }
    };

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| {
        Failure::Client(CalcError::invalid_input("arguments", text.trim(), e.to_string()))
    })
}
