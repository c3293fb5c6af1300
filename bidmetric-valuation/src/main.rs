//! BidMetric Valuation - command line front end of the valuation engine.
//!
//! Reads valuation requests as JSON, loads reference data from the data
//! directory and prints wire-format responses on stdout. Logs go to stderr.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use bidmetric_common::config::Config;
use bidmetric_common::logging::init_from_config;
use bidmetric_common::util::{format_inr, format_signed_pct};
use bidmetric_common::{Error, Validate};
use bidmetric_valuation::loader::load_snapshot;
use bidmetric_valuation::{ValuationEngine, ValuationRequest, ValuationResponse};

/// Property valuation and price forecast.
#[derive(Parser, Debug)]
#[command(name = "bidmetric-valuation")]
#[command(version)]
#[command(about = "Value a property and forecast its price", long_about = None)]
struct Cli {
    /// Reference data directory (overrides config and BIDMETRIC_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Value a single request
    Value {
        /// Request JSON file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        request: String,

        /// Pretty-print the response
        #[arg(long)]
        pretty: bool,
    },

    /// Value a JSON array of requests in parallel
    Batch {
        /// File containing an array of requests, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        requests: String,

        #[arg(long)]
        pretty: bool,
    },

    /// List the locality profiles in the reference data
    Profiles,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = Config::load_with_env()?;
    if let Err(e) = config.validate() {
        let err = Error::Config(e.to_string());
        eprintln!("{err}");
        return Ok(exit_code(Some(&err)));
    }

    init_from_config(&config.observability);

    let data_dir = cli.data_dir.clone().unwrap_or_else(|| config.data_dir());
    let snapshot = match load_snapshot(&data_dir, 1) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            report(&err);
            return Ok(exit_code(Some(&err)));
        }
    };
    let engine = ValuationEngine::from_settings(&config.valuation);

    match cli.command {
        Commands::Value { request, pretty } => {
            let (response, failure) =
                match serde_json::from_str::<ValuationRequest>(&read_input(&request)?) {
                    Ok(request) => {
                        let result = engine.evaluate(&request, &snapshot);
                        let failure = result.error().cloned().map(Error::from);
                        (ValuationResponse::from(&result), failure)
                    }
                    Err(e) => {
                        let err = Error::from(e);
                        report(&err);
                        (ValuationResponse::error(err.to_string()), Some(err))
                    }
                };

            print_json(&response, pretty)?;
            Ok(exit_code(failure.as_ref()))
        }

        Commands::Batch { requests, pretty } => {
            let requests: Vec<ValuationRequest> = serde_json::from_str(&read_input(&requests)?)
                .context("Failed to parse batch requests")?;

            let results = engine.evaluate_batch(&requests, &snapshot);
            let responses: Vec<ValuationResponse> =
                results.iter().map(ValuationResponse::from).collect();
            let failure = results
                .iter()
                .find_map(|r| r.error())
                .cloned()
                .map(Error::from);

            print_json(&responses, pretty)?;
            Ok(exit_code(failure.as_ref()))
        }

        Commands::Profiles => {
            let store = &snapshot.profiles;
            println!(
                "{:<20} {:>14} {:>8}  {:<10} aliases",
                "locality", "base rate", "growth", "volatility"
            );
            for profile in store.profiles() {
                println!(
                    "{:<20} {:>14} {:>8}  {:<10} {}",
                    profile.locality_id,
                    format!("{}/sqft", format_inr(profile.base_rate_per_sqft)),
                    format_signed_pct(profile.baseline_growth_rate * 100.0),
                    profile.volatility_class.to_string(),
                    profile.aliases.join(", ")
                );
            }
            let fallback = store.default_profile();
            println!(
                "\nUnknown localities use {}/sqft at {} ({} profiles)",
                format_inr(fallback.base_rate_per_sqft),
                format_signed_pct(fallback.baseline_growth_rate * 100.0),
                store.len()
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read request from stdin")?;
        Ok(buffer)
    } else {
        let path = Path::new(source);
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}

/// Log a failure, at error level unless the caller was at fault.
fn report(err: &Error) {
    if err.is_client_error() {
        tracing::info!(error = %err, "Rejected input");
    } else {
        tracing::error!(error = %err, cause = %err.root(), "Run failed");
    }
}

/// Success, or the exit code of the first failure.
fn exit_code(failure: Option<&Error>) -> ExitCode {
    failure.map_or(ExitCode::SUCCESS, |err| ExitCode::from(err.exit_code()))
}
