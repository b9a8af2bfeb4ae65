//! Command-line entry point: one-shot `.ics` export or the web server.

use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use chrono::{Local, Months, NaiveDate};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tide_planner_lib::config::Config;
use tide_planner_lib::server::{self, AppState};
use tide_planner_lib::{calendar, filter, ics, noaa};

#[derive(Parser)]
#[command(
    name = "tide-planner",
    version,
    about = "Plan around daylight low tides from NOAA predictions"
)]
struct Cli {
    /// Path to a TOML config file (defaults to tide-planner.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write qualifying low tides to an .ics calendar file
    Export {
        /// First day of the range, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        begin: Option<NaiveDate>,
        /// Last day of the range, YYYY-MM-DD (defaults to a year after begin)
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Output file (defaults to low_tides_<begin>-<end>.ics)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Serve the web calendar
    Serve {
        /// Interface to bind (overrides the config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides the config)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };

    match cli.command {
        Commands::Export { begin, end, out } => export(config, begin, end, out).await,
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let state = AppState::new(config)?;
            server::serve(state, &host, port).await
        }
    }
}

async fn export(
    config: Config,
    begin: Option<NaiveDate>,
    end: Option<NaiveDate>,
    out: Option<PathBuf>,
) -> Result<()> {
    let time_zone = config.time_zone()?;
    let criteria = config.filter_criteria()?;

    let begin = begin.unwrap_or_else(|| Local::now().date_naive());
    let end = match end {
        Some(end) => end,
        None => begin
            .checked_add_months(Months::new(12))
            .context("date range end out of bounds")?,
    };
    ensure!(begin <= end, "end date {end} is before begin date {begin}");

    let client = noaa::client()?;
    println!(
        "Requesting NOAA predictions for station {} ({})",
        config.station.id, config.station.name
    );
    let records = noaa::fetch_predictions(&client, &config.station.id, begin, end).await?;
    let events = filter::filter_low_tides(&records, &criteria);

    if events.is_empty() {
        println!("No matching low tides found in the range.");
        return Ok(());
    }
    for event in &events {
        println!(
            "{}  {:>5.2} ft",
            event.time.format("%Y-%m-%d %H:%M %Z"),
            event.height
        );
    }

    let out = out.unwrap_or_else(|| default_out_path(begin, end));
    let entries = calendar::build_entries(&events, &config.station, None);
    ics::write_calendar(&out, &entries, time_zone)
        .with_context(|| format!("could not write {}", out.display()))?;
    println!("Wrote {} events to {}", entries.len(), out.display());
    Ok(())
}

fn default_out_path(begin: NaiveDate, end: NaiveDate) -> PathBuf {
    PathBuf::from(format!(
        "low_tides_{}-{}.ics",
        begin.format("%Y%m%d"),
        end.format("%Y%m%d")
    ))
}
