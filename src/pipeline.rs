/// Run-to-completion orchestrator.
///
/// For every area in the registry:
///
///   fetch → parse → (no data | store live, forecasts, industries)
///
/// Each area ends in exactly one `AreaOutcome`. Under the default
/// `isolate` policy a failed area is recorded and the run moves on; under
/// `fail-fast` the first failure aborts the run. Rows committed before an
/// abort stay committed.

use crate::config::{FailurePolicy, IngestConfig};
use crate::error::IngestError;
use crate::ingest::citydata::{FeedFetcher, parse_citydata};
use crate::model::WriteCounts;
use crate::registry::AreaRegistry;
use crate::store::CityDataStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, mpsc};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of processing one area.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AreaOutcome {
    Stored(WriteCounts),
    /// The feed published nothing usable for the area. Nothing written.
    NoData,
    Failed(IngestError),
}

#[derive(Debug, Clone, Serialize)]
pub struct AreaReport {
    /// Name as listed in the registry.
    pub area: String,
    /// Code from the feed, known once a payload has been decoded.
    pub area_code: Option<String>,
    #[serde(flatten)]
    pub outcome: AreaOutcome,
}

/// Aggregate of one run, logged at the end and optionally written as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub policy: FailurePolicy,
    pub stored: usize,
    pub no_data: usize,
    pub failed: usize,
    pub rows: WriteCounts,
    pub areas: Vec<AreaReport>,
}

impl RunSummary {
    pub fn new(
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        policy: FailurePolicy,
        areas: Vec<AreaReport>,
    ) -> Self {
        let mut summary = RunSummary {
            started_at,
            finished_at,
            policy,
            stored: 0,
            no_data: 0,
            failed: 0,
            rows: WriteCounts::default(),
            areas,
        };

        for report in &summary.areas {
            match &report.outcome {
                AreaOutcome::Stored(counts) => {
                    summary.stored += 1;
                    summary.rows.live_rows += counts.live_rows;
                    summary.rows.forecast_slots += counts.forecast_slots;
                    summary.rows.industry_segments += counts.industry_segments;
                }
                AreaOutcome::NoData => summary.no_data += 1,
                AreaOutcome::Failed(_) => summary.failed += 1,
            }
        }

        summary
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &IngestError)> {
        self.areas.iter().filter_map(|r| match &r.outcome {
            AreaOutcome::Failed(e) => Some((r.area.as_str(), e)),
            _ => None,
        })
    }

    /// Writes the summary as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    /// The area list could not be read. Nothing was fetched.
    #[error("area registry unavailable: {0}")]
    Registry(#[source] IngestError),

    /// `fail-fast` policy stopped at the first failed area.
    #[error("run aborted at area '{area}': {source} ({not_reached} area(s) not reached)")]
    Aborted {
        area: String,
        source: IngestError,
        /// Areas processed up to and including the failing one.
        summary: RunSummary,
        not_reached: usize,
    },
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub workers: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            failure_policy: FailurePolicy::Isolate,
        }
    }
}

impl From<&IngestConfig> for RunOptions {
    fn from(config: &IngestConfig) -> Self {
        Self {
            workers: config.workers,
            failure_policy: config.failure_policy,
        }
    }
}

pub struct Pipeline {
    registry: Arc<dyn AreaRegistry>,
    fetcher: Arc<dyn FeedFetcher>,
    store: Arc<dyn CityDataStore>,
    options: RunOptions,
}

impl Pipeline {
    pub fn new(
        registry: Arc<dyn AreaRegistry>,
        fetcher: Arc<dyn FeedFetcher>,
        store: Arc<dyn CityDataStore>,
    ) -> Self {
        Self {
            registry,
            fetcher,
            store,
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Processes every registered area once.
    ///
    /// # Errors
    /// `RunError::Registry` if the area list cannot be read;
    /// `RunError::Aborted` on the first failure under `fail-fast`.
    /// Per-area failures under `isolate` are reported in the summary, not
    /// as an error.
    pub fn run(&self) -> Result<RunSummary, RunError> {
        let started_at = Utc::now();
        let areas = self.registry.area_names().map_err(RunError::Registry)?;

        tracing::info!(
            areas = areas.len(),
            workers = self.options.workers,
            policy = self.options.failure_policy.as_str(),
            "starting city data run"
        );

        let reports = match self.options.failure_policy {
            FailurePolicy::FailFast => self.run_fail_fast(&areas, started_at)?,
            FailurePolicy::Isolate if self.options.workers > 1 && areas.len() > 1 => {
                self.run_pooled(&areas)
            }
            FailurePolicy::Isolate => areas
                .iter()
                .map(|area| process_area(self.fetcher.as_ref(), self.store.as_ref(), area))
                .collect(),
        };

        let summary = RunSummary::new(
            started_at,
            Utc::now(),
            self.options.failure_policy,
            reports,
        );
        tracing::info!(
            stored = summary.stored,
            no_data = summary.no_data,
            failed = summary.failed,
            rows = summary.rows.total(),
            live_rows = summary.rows.live_rows,
            forecast_slots = summary.rows.forecast_slots,
            industry_segments = summary.rows.industry_segments,
            "city data run complete"
        );
        Ok(summary)
    }

    fn run_fail_fast(
        &self,
        areas: &[String],
        started_at: DateTime<Utc>,
    ) -> Result<Vec<AreaReport>, RunError> {
        let mut reports = Vec::with_capacity(areas.len());

        for (idx, area) in areas.iter().enumerate() {
            let report = process_area(self.fetcher.as_ref(), self.store.as_ref(), area);

            if let AreaOutcome::Failed(e) = &report.outcome {
                let source = e.clone();
                let not_reached = areas.len() - idx - 1;
                reports.push(report);
                let summary = RunSummary::new(
                    started_at,
                    Utc::now(),
                    FailurePolicy::FailFast,
                    reports,
                );
                return Err(RunError::Aborted {
                    area: area.clone(),
                    source,
                    summary,
                    not_reached,
                });
            }

            reports.push(report);
        }

        Ok(reports)
    }

    /// Fans areas out over a bounded worker pool. Reports come back in
    /// registry order regardless of completion order.
    fn run_pooled(&self, areas: &[String]) -> Vec<AreaReport> {
        let workers = self.options.workers.min(areas.len());
        let pool = threadpool::ThreadPool::with_name("citydata-worker".to_string(), workers);
        let (tx, rx) = mpsc::channel();

        for (idx, area) in areas.iter().enumerate() {
            let tx = tx.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let store = Arc::clone(&self.store);
            let area = area.clone();
            pool.execute(move || {
                let report = process_area(fetcher.as_ref(), store.as_ref(), &area);
                // Receiver outlives the pool; a send error cannot happen.
                let _ = tx.send((idx, report));
            });
        }
        drop(tx);

        let mut slots: Vec<Option<AreaReport>> = vec![None; areas.len()];
        for (idx, report) in rx.iter() {
            slots[idx] = Some(report);
        }
        pool.join();

        slots
            .into_iter()
            .zip(areas)
            .map(|(slot, area)| {
                slot.unwrap_or_else(|| {
                    tracing::error!(area = %area, "worker exited without reporting");
                    AreaReport {
                        area: area.clone(),
                        area_code: None,
                        outcome: AreaOutcome::Failed(IngestError::Store(
                            "worker exited without reporting".to_string(),
                        )),
                    }
                })
            })
            .collect()
    }
}

/// Fetch, parse and store one area. Never panics on feed content; every
/// failure becomes `AreaOutcome::Failed`.
pub fn process_area(
    fetcher: &dyn FeedFetcher,
    store: &dyn CityDataStore,
    area: &str,
) -> AreaReport {
    tracing::info!(area = %area, "collecting");

    match ingest_area(fetcher, store, area) {
        Ok(Some((area_code, counts))) => {
            tracing::info!(
                area = %area,
                area_code = %area_code,
                slots = counts.forecast_slots,
                segments = counts.industry_segments,
                "stored"
            );
            AreaReport {
                area: area.to_string(),
                area_code: Some(area_code),
                outcome: AreaOutcome::Stored(counts),
            }
        }
        Ok(None) => {
            tracing::info!(area = %area, "no data published, skipping");
            AreaReport {
                area: area.to_string(),
                area_code: None,
                outcome: AreaOutcome::NoData,
            }
        }
        Err(e) => {
            tracing::warn!(area = %area, kind = e.kind(), error = %e, "area failed");
            AreaReport {
                area: area.to_string(),
                area_code: None,
                outcome: AreaOutcome::Failed(e),
            }
        }
    }
}

fn ingest_area(
    fetcher: &dyn FeedFetcher,
    store: &dyn CityDataStore,
    area: &str,
) -> Result<Option<(String, WriteCounts)>, IngestError> {
    let payload = fetcher.fetch(area)?;

    let batch = match parse_citydata(&payload, Utc::now())? {
        Some(batch) => batch,
        None => return Ok(None),
    };

    let mut counts = WriteCounts {
        live_rows: store.upsert_live_state(&batch.live)?,
        ..WriteCounts::default()
    };
    if !batch.forecasts.is_empty() {
        counts.forecast_slots = store.upsert_forecast_slots(&batch.forecasts)?;
    }
    if !batch.industries.is_empty() {
        counts.industry_segments = store.upsert_industry_segments(&batch.industries)?;
    }

    Ok(Some((batch.live.area_code, counts)))
}
