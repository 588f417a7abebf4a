/// Shared record types for the city-data pipeline.
///
/// The feed publishes one snapshot per area. Each snapshot is normalized
/// into three record families that map one-to-one onto database tables:
///
///   AreaLiveState    → area_data_live      key: area_cd
///   ForecastSlot     → area_data_fcst      key: (area_cd, slot)
///   IndustrySegment  → area_industry_live  key: (area_cd, rsb_lrg_ctgr, rsb_mid_ctgr)
///
/// Every record produced from a single fetch carries the same
/// `ingested_at` value.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// Forecast entries beyond this many are discarded.
pub const MAX_FORECAST_SLOTS: usize = 12;

// ---------------------------------------------------------------------------
// Record families
// ---------------------------------------------------------------------------

/// Current-snapshot row for one area. Overwritten on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AreaLiveState {
    pub area_code: String,
    /// Observation time as published by the feed (local wall clock).
    pub observed_at: NaiveDateTime,
    pub congestion_level: Option<String>,
    pub congestion_message: Option<String>,
    pub population_min: Option<i64>,
    pub population_max: Option<i64>,
    /// Commercial fields stay `None` when the feed has no commercial block.
    /// They are never defaulted to zero.
    pub commercial_level: Option<String>,
    pub payment_count: Option<i64>,
    pub payment_amount_min: Option<i64>,
    pub payment_amount_max: Option<i64>,
    pub ingested_at: DateTime<Utc>,
}

/// One of up to twelve forecast buckets emitted alongside a live snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastSlot {
    pub area_code: String,
    /// 1-based position in document order.
    pub slot: u8,
    pub forecast_at: Option<NaiveDateTime>,
    pub congestion_level: Option<String>,
    pub population_min: Option<i64>,
    pub population_max: Option<i64>,
    pub ingested_at: DateTime<Utc>,
}

/// Per-category breakdown of card payment activity within an area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndustrySegment {
    pub area_code: String,
    pub large_category: String,
    pub mid_category: String,
    pub payment_level: Option<String>,
    pub payment_count: Option<i64>,
    pub payment_amount_min: Option<i64>,
    pub payment_amount_max: Option<i64>,
    pub ingested_at: DateTime<Utc>,
}

/// Everything decoded from one area's payload.
///
/// A batch only exists when the feed actually published data for the area;
/// the "no data" case is represented by the parser returning `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityDataBatch {
    pub live: AreaLiveState,
    pub forecasts: Vec<ForecastSlot>,
    pub industries: Vec<IndustrySegment>,
}

/// Row counts written for one area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteCounts {
    pub live_rows: usize,
    pub forecast_slots: usize,
    pub industry_segments: usize,
}

impl WriteCounts {
    pub fn total(&self) -> usize {
        self.live_rows + self.forecast_slots + self.industry_segments
    }
}
