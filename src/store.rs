/// Last-write-wins persistence for the three record families.
///
/// Every operation merges on the table's natural key: insert when the key
/// is new, otherwise overwrite every non-key column (including
/// `created_at`) with the new values. A new NULL replaces an old value.
/// Each record is its own autocommit statement; there is no transaction
/// spanning a batch.

use crate::db::PgPool;
use crate::error::IngestError;
use crate::model::{AreaLiveState, ForecastSlot, IndustrySegment};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Persistence seam used by the orchestrator. Each method returns the
/// number of rows merged.
pub trait CityDataStore: Send + Sync {
    fn upsert_live_state(&self, record: &AreaLiveState) -> Result<usize, IngestError>;
    fn upsert_forecast_slots(&self, records: &[ForecastSlot]) -> Result<usize, IngestError>;
    fn upsert_industry_segments(&self, records: &[IndustrySegment]) -> Result<usize, IngestError>;
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

const UPSERT_LIVE_SQL: &str = "
    INSERT INTO area_data_live (
        area_cd, ppltn_time, area_congest_lvl, area_congest_msg,
        area_ppltn_min, area_ppltn_max, area_cmrcl_lvl, area_sh_payment_cnt,
        area_sh_payment_amt_min, area_sh_payment_amt_max, created_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
    ON CONFLICT (area_cd) DO UPDATE SET
        ppltn_time = EXCLUDED.ppltn_time,
        area_congest_lvl = EXCLUDED.area_congest_lvl,
        area_congest_msg = EXCLUDED.area_congest_msg,
        area_ppltn_min = EXCLUDED.area_ppltn_min,
        area_ppltn_max = EXCLUDED.area_ppltn_max,
        area_cmrcl_lvl = EXCLUDED.area_cmrcl_lvl,
        area_sh_payment_cnt = EXCLUDED.area_sh_payment_cnt,
        area_sh_payment_amt_min = EXCLUDED.area_sh_payment_amt_min,
        area_sh_payment_amt_max = EXCLUDED.area_sh_payment_amt_max,
        created_at = EXCLUDED.created_at
";

const UPSERT_FORECAST_SQL: &str = "
    INSERT INTO area_data_fcst (
        area_cd, slot, fcst_time, fcst_congest_lvl,
        fcst_ppltn_min, fcst_ppltn_max, created_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    ON CONFLICT (area_cd, slot) DO UPDATE SET
        fcst_time = EXCLUDED.fcst_time,
        fcst_congest_lvl = EXCLUDED.fcst_congest_lvl,
        fcst_ppltn_min = EXCLUDED.fcst_ppltn_min,
        fcst_ppltn_max = EXCLUDED.fcst_ppltn_max,
        created_at = EXCLUDED.created_at
";

const UPSERT_INDUSTRY_SQL: &str = "
    INSERT INTO area_industry_live (
        area_cd, rsb_lrg_ctgr, rsb_mid_ctgr, rsb_payment_lvl,
        rsb_sh_payment_cnt, rsb_sh_payment_amt_min, rsb_sh_payment_amt_max, created_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    ON CONFLICT (area_cd, rsb_lrg_ctgr, rsb_mid_ctgr) DO UPDATE SET
        rsb_payment_lvl = EXCLUDED.rsb_payment_lvl,
        rsb_sh_payment_cnt = EXCLUDED.rsb_sh_payment_cnt,
        rsb_sh_payment_amt_min = EXCLUDED.rsb_sh_payment_amt_min,
        rsb_sh_payment_amt_max = EXCLUDED.rsb_sh_payment_amt_max,
        created_at = EXCLUDED.created_at
";

/// Store backed by the shared connection pool. Each call checks out one
/// connection and returns it when the call ends, on success or error.
#[derive(Clone)]
pub struct PgCityDataStore {
    pool: PgPool,
}

impl PgCityDataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CityDataStore for PgCityDataStore {
    fn upsert_live_state(&self, r: &AreaLiveState) -> Result<usize, IngestError> {
        let mut conn = self.pool.get()?;
        conn.execute(
            UPSERT_LIVE_SQL,
            &[
                &r.area_code,
                &r.observed_at,
                &r.congestion_level,
                &r.congestion_message,
                &r.population_min,
                &r.population_max,
                &r.commercial_level,
                &r.payment_count,
                &r.payment_amount_min,
                &r.payment_amount_max,
                &r.ingested_at,
            ],
        )?;
        Ok(1)
    }

    fn upsert_forecast_slots(&self, records: &[ForecastSlot]) -> Result<usize, IngestError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut conn = self.pool.get()?;
        let stmt = conn.prepare(UPSERT_FORECAST_SQL)?;
        for r in records {
            let slot = i16::from(r.slot);
            conn.execute(
                &stmt,
                &[
                    &r.area_code,
                    &slot,
                    &r.forecast_at,
                    &r.congestion_level,
                    &r.population_min,
                    &r.population_max,
                    &r.ingested_at,
                ],
            )?;
        }
        Ok(records.len())
    }

    fn upsert_industry_segments(&self, records: &[IndustrySegment]) -> Result<usize, IngestError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut conn = self.pool.get()?;
        let stmt = conn.prepare(UPSERT_INDUSTRY_SQL)?;
        for r in records {
            conn.execute(
                &stmt,
                &[
                    &r.area_code,
                    &r.large_category,
                    &r.mid_category,
                    &r.payment_level,
                    &r.payment_count,
                    &r.payment_amount_min,
                    &r.payment_amount_max,
                    &r.ingested_at,
                ],
            )?;
        }
        Ok(records.len())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

type ForecastKey = (String, u8);
type IndustryKey = (String, String, String);

#[derive(Debug, Default)]
struct Tables {
    live: BTreeMap<String, AreaLiveState>,
    forecasts: BTreeMap<ForecastKey, ForecastSlot>,
    industries: BTreeMap<IndustryKey, IndustrySegment>,
    rejected_areas: Vec<String>,
}

/// Store over ordered maps keyed exactly like the tables. Same merge
/// semantics as `PgCityDataStore`; used by the test suite.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write for `area_code` fail with a store error.
    pub fn reject_area(&self, area_code: &str) {
        self.with_tables(|t| t.rejected_areas.push(area_code.to_string()));
    }

    pub fn live_state(&self, area_code: &str) -> Option<AreaLiveState> {
        self.with_tables(|t| t.live.get(area_code).cloned())
    }

    /// Forecast rows for one area, ordered by slot.
    pub fn forecast_slots(&self, area_code: &str) -> Vec<ForecastSlot> {
        self.with_tables(|t| {
            t.forecasts
                .values()
                .filter(|f| f.area_code == area_code)
                .cloned()
                .collect()
        })
    }

    /// Industry rows for one area, ordered by (large, mid) category.
    pub fn industry_segments(&self, area_code: &str) -> Vec<IndustrySegment> {
        self.with_tables(|t| {
            t.industries
                .values()
                .filter(|i| i.area_code == area_code)
                .cloned()
                .collect()
        })
    }

    /// Row counts per table: (live, forecast, industry).
    pub fn row_counts(&self) -> (usize, usize, usize) {
        self.with_tables(|t| (t.live.len(), t.forecasts.len(), t.industries.len()))
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        // A panic while holding the lock leaves the maps consistent: every
        // mutation is a single insert.
        let mut guard = self.tables.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    fn check_writable(tables: &Tables, area_code: &str) -> Result<(), IngestError> {
        if tables.rejected_areas.iter().any(|a| a == area_code) {
            return Err(IngestError::Store(format!(
                "write rejected for area '{}'",
                area_code
            )));
        }
        Ok(())
    }
}

impl CityDataStore for MemoryStore {
    fn upsert_live_state(&self, record: &AreaLiveState) -> Result<usize, IngestError> {
        self.with_tables(|t| {
            Self::check_writable(t, &record.area_code)?;
            t.live.insert(record.area_code.clone(), record.clone());
            Ok(1)
        })
    }

    fn upsert_forecast_slots(&self, records: &[ForecastSlot]) -> Result<usize, IngestError> {
        self.with_tables(|t| {
            for r in records {
                Self::check_writable(t, &r.area_code)?;
                t.forecasts.insert((r.area_code.clone(), r.slot), r.clone());
            }
            Ok(records.len())
        })
    }

    fn upsert_industry_segments(&self, records: &[IndustrySegment]) -> Result<usize, IngestError> {
        self.with_tables(|t| {
            for r in records {
                Self::check_writable(t, &r.area_code)?;
                let key = (
                    r.area_code.clone(),
                    r.large_category.clone(),
                    r.mid_category.clone(),
                );
                t.industries.insert(key, r.clone());
            }
            Ok(records.len())
        })
    }
}
