//! Park Visitor History Update
//!
//! Appends yesterday's S-DoT park visitor counts to the park history CSV:
//! 1. Page through the IoT visitor feed (newest first) until it reaches
//!    rows older than yesterday
//! 2. Keep park sensors, map districts and neighbourhoods to park names
//! 3. Merge into the existing CSV, dropping duplicate (time, park) rows
//!
//! Usage:
//!   cargo run --bin update_park
//!
//! Environment:
//!   SDOT_API_KEY  - open data API key for the S-DoT dataset
//!   PARK_CSV_PATH - history file (default: dataset/park_data.csv)

use chrono::{Days, Local};
use citydata_service::config::ParkConfig;
use citydata_service::ingest::iot_visitors::VisitorClient;
use citydata_service::park::{self, ParkError};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match ParkConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("park update failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &ParkConfig) -> Result<(), ParkError> {
    let today = Local::now().date_naive();
    let target = today.checked_sub_days(Days::new(1)).unwrap_or(today);
    tracing::info!(day = %target, path = %config.csv_path.display(), "updating park visitor history");

    let client = VisitorClient::new(config.feed.clone(), &config.api_key)?;
    let readings = client.collect_day(target)?;

    let stats = park::update_csv(&config.csv_path, &readings)?;
    tracing::info!(
        existing = stats.existing,
        fetched = stats.fetched,
        duplicates = stats.duplicates,
        written = stats.written,
        "park history updated"
    );
    Ok(())
}
