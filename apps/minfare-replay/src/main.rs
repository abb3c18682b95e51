//! Minimum Fare Replay
//!
//! Runs the minimum fare checks over a priced fare path stored as a JSON
//! scenario and prints the plus-ups that were posted.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use core_config::minfare::MinFareConfig;
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{Environment, FromEnv};
use domain_minfare::{MinFareSummary, MinimumFareService, PlusUpInfo};
use eyre::{Result, WrapErr};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde::Serialize;
use tracing::info;

mod scenario;

use scenario::Scenario;

#[derive(Parser)]
#[command(name = "minfare-replay")]
#[command(about = "Replay a fare path through the minimum fare checks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every check and print the summary and posted plus-ups
    Run {
        /// Scenario file
        scenario: PathBuf,

        /// Diagnostic to collect (702, 709, 718, 719, 760, 765); overrides MINFARE_DIAGNOSTIC
        #[arg(short, long)]
        diagnostic: Option<u16>,

        /// Print the recorded metrics in Prometheus format after the run
        #[arg(short, long)]
        metrics: bool,
    },

    /// Parse a scenario without running any check
    Validate {
        /// Scenario file
        scenario: PathBuf,
    },
}

#[derive(Serialize)]
struct RunOutput<'a> {
    summary: &'a MinFareSummary,
    plus_ups: &'a [PlusUpInfo],
}

fn main() -> Result<()> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let cli = Cli::parse();
    let mut config = MinFareConfig::from_env()?;

    match cli.command {
        Commands::Run {
            scenario,
            diagnostic,
            metrics,
        } => {
            let handle = if metrics {
                Some(
                    PrometheusBuilder::new()
                        .install_recorder()
                        .wrap_err("Failed to install Prometheus recorder")?,
                )
            } else {
                None
            };
            if let Some(diagnostic) = diagnostic {
                config = config.with_diagnostic(diagnostic);
            }

            let (trx, mut fare_path) = Scenario::load(&scenario)?.into_trx(config);
            info!(trx_id = %trx.id, scenario = %scenario.display(), "Replaying fare path");

            let summary = MinimumFareService::new(&trx)
                .process(&mut fare_path)
                .wrap_err("Minimum fare checks failed")?;

            let output = RunOutput {
                summary: &summary,
                plus_ups: &fare_path.plus_up_info_list,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);

            if let Some(handle) = handle {
                eprintln!("{}", handle.render());
            }
        }

        Commands::Validate { scenario } => {
            let loaded = Scenario::load(&scenario)?;
            info!(
                segments = loaded.request.travel_segs.len(),
                pricing_units = loaded.fare_path.pricing_units.len(),
                "Scenario is valid"
            );
        }
    }

    Ok(())
}
