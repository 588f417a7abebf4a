//! Seoul City Data Service - collection run
//!
//! Run-to-completion job, usually scheduled every few minutes:
//! 1. Loads configuration (.env, citydata.toml, environment)
//! 2. Connects to PostgreSQL and checks the schema
//! 3. Reads the area registry
//! 4. Fetches, decodes and upserts the live snapshot of every area
//! 5. Logs a run summary and optionally writes it as JSON
//!
//! Usage:
//!   cargo run --release
//!
//! Environment:
//!   SEOUL_API_KEY - open data API key
//!   DATABASE_URL  - PostgreSQL connection string (or DB_HOST/DB_USER/DB_PASSWORD/DB_NAME)
//!   RUST_LOG      - log filter (default: info)

use citydata_service::config::IngestConfig;
use citydata_service::db;
use citydata_service::ingest::citydata::CityDataClient;
use citydata_service::pipeline::{Pipeline, RunError, RunOptions, RunSummary};
use citydata_service::registry::{AreaRegistry, PgAreaRegistry, StaticAreaRegistry};
use citydata_service::store::PgCityDataStore;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Seoul city data service");

    let config = match IngestConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let pool = match db::connect_and_verify(&config) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("database setup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let fetcher = match CityDataClient::new(config.feed.clone(), &config.api_key) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let registry: Arc<dyn AreaRegistry> = match &config.areas {
        Some(areas) => {
            tracing::info!(areas = areas.len(), "using static area list from config file");
            Arc::new(StaticAreaRegistry::new(areas.iter().cloned()))
        }
        None => Arc::new(PgAreaRegistry::new(pool.clone())),
    };

    let pipeline = Pipeline::new(
        registry,
        Arc::new(fetcher),
        Arc::new(PgCityDataStore::new(pool)),
    )
    .with_options(RunOptions::from(&config));

    match pipeline.run() {
        Ok(summary) => {
            write_report(config.report_path.as_deref(), &summary);
            for (area, e) in summary.failures() {
                tracing::error!(area = %area, kind = e.kind(), "failed: {}", e);
            }
            if summary.has_failures() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(RunError::Aborted {
            area,
            source,
            summary,
            not_reached,
        }) => {
            write_report(config.report_path.as_deref(), &summary);
            tracing::error!(
                area = %area,
                kind = source.kind(),
                not_reached,
                "run aborted: {}",
                source
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn write_report(path: Option<&Path>, summary: &RunSummary) {
    if let Some(path) = path {
        match summary.write_json(path) {
            Ok(()) => tracing::info!(path = %path.display(), "run report written"),
            Err(e) => tracing::warn!(path = %path.display(), "could not write run report: {}", e),
        }
    }
}
