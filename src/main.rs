//! CLI entry point for the AEMO price-and-demand report tool.
//!
//! With no subcommand it downloads the current month's CSV for one region and
//! turns it into an Excel workbook. `from-csv` builds the workbook from a file
//! that was downloaded by hand, and `guide` prints how to do that.

use aemo_report::fetch::{Fetcher, ResourceId, manual_download_guide};
use aemo_report::logging::{LoggingConfig, init_logging};
use aemo_report::pipeline::{Pipeline, RunConfig, report_failure, report_from_csv};
use aemo_report::report::print_json;
use anyhow::Result;
use chrono::{Datelike, Local};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "aemo_report")]
#[command(
    about = "Download AEMO price and demand data and build an Excel report",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    target: Target,

    /// Directory the CSV and workbook are written to
    #[arg(short, long, default_value = ".", global = true)]
    output_dir: PathBuf,

    /// Workbook name prefix (default: <region>_electricity_data)
    #[arg(long, global = true)]
    label: Option<String>,

    /// Also print the summary statistics as JSON
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Lower bound of the random pause before the first request, in seconds
    #[arg(long, default_value_t = 1.0)]
    min_delay: f64,

    /// Upper bound of the random pause before the first request, in seconds
    #[arg(long, default_value_t = 3.0)]
    max_delay: f64,
}

#[derive(Args)]
struct Target {
    /// Year of the data file (default: current year)
    #[arg(long, global = true)]
    year: Option<i32>,

    /// Month of the data file, 1-12 (default: current month)
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,

    /// NEM region code
    #[arg(short, long, default_value = "QLD1", global = true)]
    region: String,
}

impl Target {
    fn resource(&self) -> ResourceId {
        let today = Local::now().date_naive();
        ResourceId::new(
            self.year.unwrap_or(today.year()),
            self.month.unwrap_or(today.month()),
            self.region.clone(),
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the workbook from a CSV that is already on disk
    FromCsv {
        /// Path to the price and demand CSV
        #[arg(value_name = "CSV")]
        source: PathBuf,

        /// Workbook path (default: derived from region, year and month)
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print the manual download procedure
    Guide,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok(); // Load .env file

    let _log_guard = init_logging(&LoggingConfig::from_env())?;

    let cli = Cli::parse();
    let resource = cli.target.resource();
    let mut config = RunConfig::new(resource.clone(), &cli.output_dir);
    if let Some(label) = &cli.label {
        config = config.with_label(label.clone());
    }

    match cli.command {
        None => {
            info!(resource = %resource, "Starting AEMO price and demand download");
            let fetcher = Fetcher::browser()?.with_delay(cli.min_delay..=cli.max_delay)?;
            let mut pipeline = Pipeline::new(fetcher, config);

            match pipeline.execute().await {
                Some(outcome) => {
                    info!(path = %outcome.report_path.display(), "Report created");
                    if cli.json {
                        print_json(&outcome.report.summary)?;
                    }
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    error!("Could not fetch the data; `aemo_report guide` shows the manual route");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Some(Commands::FromCsv { source, report }) => {
            let report_path = report.unwrap_or_else(|| config.report_path());
            match report_from_csv(&source, &report_path) {
                Ok(outcome) => {
                    info!(path = %outcome.report_path.display(), "Report created");
                    if cli.json {
                        print_json(&outcome.report.summary)?;
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    report_failure(&e, &resource);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Some(Commands::Guide) => {
            println!("Manual download guide:");
            for line in manual_download_guide(&resource) {
                println!("{}", line);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
