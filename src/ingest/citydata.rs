/// Seoul real-time city data API client.
///
/// One request per area:
///   {base_url}/{api_key}/xml/citydata/1/5/{area name}
///
/// The response is XML. Only three parts of it are used:
///
///   CITYDATA
///     AREA_CD
///     LIVE_PPLTN_STTS/LIVE_PPLTN_STTS      — first entry only
///       AREA_CONGEST_LVL, AREA_CONGEST_MSG, AREA_PPLTN_MIN/MAX, PPLTN_TIME
///       FCST_PPLTN/FCST_PPLTN[]            — up to 12 kept
///     LIVE_CMRCL_STTS                      — optional
///       AREA_CMRCL_LVL, AREA_SH_PAYMENT_CNT, AREA_SH_PAYMENT_AMT_MIN/MAX
///       CMRCL_RSB/CMRCL_RSB[]              — all kept
///
/// Everything else in the document (road traffic, weather, transit, …) is
/// ignored. See `fixtures.rs` for annotated payloads.

use crate::config::FeedSettings;
use crate::error::IngestError;
use crate::ingest::{parse_count, present};
use crate::model::{
    AreaLiveState, CityDataBatch, ForecastSlot, IndustrySegment, MAX_FORECAST_SLOTS,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Serde structures for the XML document
// ---------------------------------------------------------------------------
//
// Every leaf is Option<String>. Whether a field is required, and how it is
// typed, is decided in `parse_citydata`, not here.

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "RESULT")]
    result: Option<ApiResult>,
    // Error responses put CODE/MESSAGE directly under the root element.
    #[serde(rename = "CODE")]
    code: Option<String>,
    #[serde(rename = "MESSAGE")]
    message: Option<String>,
    #[serde(rename = "CITYDATA")]
    city_data: Option<CityData>,
}

#[derive(Debug, Deserialize)]
struct ApiResult {
    #[serde(rename = "RESULT.CODE", alias = "CODE")]
    code: Option<String>,
    #[serde(rename = "RESULT.MESSAGE", alias = "MESSAGE")]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct CityData {
    area_cd: Option<String>,
    live_ppltn_stts: Option<LiveStatusList>,
    live_cmrcl_stts: Option<CommercialStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
struct LiveStatusList {
    live_ppltn_stts: Vec<LiveStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct LiveStatus {
    area_congest_lvl: Option<String>,
    area_congest_msg: Option<String>,
    area_ppltn_min: Option<String>,
    area_ppltn_max: Option<String>,
    ppltn_time: Option<String>,
    fcst_ppltn: Option<ForecastList>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
struct ForecastList {
    fcst_ppltn: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct ForecastEntry {
    fcst_time: Option<String>,
    fcst_congest_lvl: Option<String>,
    fcst_ppltn_min: Option<String>,
    fcst_ppltn_max: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct CommercialStatus {
    area_cmrcl_lvl: Option<String>,
    area_sh_payment_cnt: Option<String>,
    area_sh_payment_amt_min: Option<String>,
    area_sh_payment_amt_max: Option<String>,
    cmrcl_rsb: Option<IndustryList>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
struct IndustryList {
    cmrcl_rsb: Vec<IndustryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct IndustryEntry {
    rsb_lrg_ctgr: Option<String>,
    rsb_mid_ctgr: Option<String>,
    rsb_payment_lvl: Option<String>,
    rsb_sh_payment_cnt: Option<String>,
    rsb_sh_payment_amt_min: Option<String>,
    rsb_sh_payment_amt_max: Option<String>,
}

// ---------------------------------------------------------------------------
// URL construction and fetching
// ---------------------------------------------------------------------------

/// Builds the request URL for one area. The area name is percent-encoded
/// because most names are Korean and some contain spaces or `·`.
///
/// # Example
/// ```
/// use citydata_service::config::FeedSettings;
/// use citydata_service::ingest::citydata::build_area_url;
///
/// let feed = FeedSettings {
///     base_url: "http://openapi.seoul.go.kr:8088".to_string(),
///     resource_path: "xml/citydata/1/5".to_string(),
///     timeout: None,
/// };
/// let url = build_area_url(&feed, "KEY", "POI001");
/// assert_eq!(url, "http://openapi.seoul.go.kr:8088/KEY/xml/citydata/1/5/POI001");
/// ```
pub fn build_area_url(feed: &FeedSettings, api_key: &str, area: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        feed.base_url,
        api_key,
        feed.resource_path,
        urlencoding::encode(area)
    )
}

/// Retrieves the raw payload for one area.
pub trait FeedFetcher: Send + Sync {
    fn fetch(&self, area: &str) -> Result<Vec<u8>, IngestError>;
}

/// Blocking HTTP client for the city-data endpoint. Built once per run and
/// shared by every worker.
pub struct CityDataClient {
    http: reqwest::blocking::Client,
    feed: FeedSettings,
    api_key: SecretString,
}

impl CityDataClient {
    pub fn new(feed: FeedSettings, api_key: &SecretString) -> Result<Self, IngestError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(feed.timeout)
            .user_agent(concat!("citydata_service/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IngestError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            feed,
            api_key: SecretString::from(api_key.expose_secret().to_owned()),
        })
    }

    /// URL with the credential masked, safe for logs.
    pub fn redacted_url(&self, area: &str) -> String {
        build_area_url(&self.feed, "***", area)
    }
}

impl FeedFetcher for CityDataClient {
    /// Exactly one request, no retry.
    fn fetch(&self, area: &str) -> Result<Vec<u8>, IngestError> {
        let url = build_area_url(&self.feed, self.api_key.expose_secret(), area);
        tracing::debug!(url = %self.redacted_url(area), "fetching city data");

        let response = self.http.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Network(format!(
                "city data API returned HTTP {} for '{}'",
                status, area
            )));
        }

        let body = response.bytes()?;
        Ok(body.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Decodes one city-data payload.
///
/// Returns:
/// - `Ok(Some(batch))` — live state plus 0..=12 forecast slots and any
///   industry segments, all stamped with `ingested_at`.
/// - `Ok(None)` — the document is well formed but the feed published no
///   data for the area (live-status entry, `AREA_CD` or `PPLTN_TIME`
///   missing). Nothing should be written.
///
/// # Errors
/// `IngestError::Parse` when the payload is not XML, has no `CITYDATA`
/// container, or carries an integer/timestamp that cannot be decoded.
pub fn parse_citydata(
    payload: &[u8],
    ingested_at: DateTime<Utc>,
) -> Result<Option<CityDataBatch>, IngestError> {
    let text = std::str::from_utf8(payload)
        .map_err(|e| IngestError::Parse(format!("payload is not valid UTF-8: {}", e)))?;

    let envelope: Envelope = quick_xml::de::from_str(text)
        .map_err(|e| IngestError::Parse(format!("XML deserialization failed: {}", e)))?;

    let city = match envelope.city_data {
        Some(city) => city,
        None => {
            return Err(IngestError::Parse(describe_missing_container(
                envelope.result,
                envelope.code,
                envelope.message,
            )));
        }
    };

    let live = match city
        .live_ppltn_stts
        .and_then(|list| list.live_ppltn_stts.into_iter().next())
    {
        Some(live) => live,
        None => return Ok(None),
    };

    let area_code = match present(city.area_cd) {
        Some(code) => code,
        None => return Ok(None),
    };

    let observed_at = match present(live.ppltn_time) {
        Some(raw) => parse_feed_time("PPLTN_TIME", &raw)?,
        None => return Ok(None),
    };

    let mut state = AreaLiveState {
        area_code: area_code.clone(),
        observed_at,
        congestion_level: present(live.area_congest_lvl),
        congestion_message: present(live.area_congest_msg),
        population_min: parse_count("AREA_PPLTN_MIN", live.area_ppltn_min)?,
        population_max: parse_count("AREA_PPLTN_MAX", live.area_ppltn_max)?,
        commercial_level: None,
        payment_count: None,
        payment_amount_min: None,
        payment_amount_max: None,
        ingested_at,
    };

    let forecast_entries = live.fcst_ppltn.map(|l| l.fcst_ppltn).unwrap_or_default();
    let mut forecasts = Vec::with_capacity(forecast_entries.len().min(MAX_FORECAST_SLOTS));
    for (idx, entry) in forecast_entries.into_iter().take(MAX_FORECAST_SLOTS).enumerate() {
        forecasts.push(ForecastSlot {
            area_code: area_code.clone(),
            slot: (idx + 1) as u8,
            forecast_at: present(entry.fcst_time)
                .map(|raw| parse_feed_time("FCST_TIME", &raw))
                .transpose()?,
            congestion_level: present(entry.fcst_congest_lvl),
            population_min: parse_count("FCST_PPLTN_MIN", entry.fcst_ppltn_min)?,
            population_max: parse_count("FCST_PPLTN_MAX", entry.fcst_ppltn_max)?,
            ingested_at,
        });
    }

    let mut industries = Vec::new();
    if let Some(commercial) = city.live_cmrcl_stts {
        state.commercial_level = present(commercial.area_cmrcl_lvl);
        state.payment_count = parse_count("AREA_SH_PAYMENT_CNT", commercial.area_sh_payment_cnt)?;
        state.payment_amount_min =
            parse_count("AREA_SH_PAYMENT_AMT_MIN", commercial.area_sh_payment_amt_min)?;
        state.payment_amount_max =
            parse_count("AREA_SH_PAYMENT_AMT_MAX", commercial.area_sh_payment_amt_max)?;

        let entries = commercial.cmrcl_rsb.map(|l| l.cmrcl_rsb).unwrap_or_default();
        for entry in entries {
            let (large, mid) = match (present(entry.rsb_lrg_ctgr), present(entry.rsb_mid_ctgr)) {
                (Some(large), Some(mid)) => (large, mid),
                (large, mid) => {
                    // No natural key: the row could never be merged.
                    tracing::warn!(
                        area = %area_code,
                        large_category = ?large,
                        mid_category = ?mid,
                        "skipping industry entry without both categories"
                    );
                    continue;
                }
            };

            industries.push(IndustrySegment {
                area_code: area_code.clone(),
                large_category: large,
                mid_category: mid,
                payment_level: present(entry.rsb_payment_lvl),
                payment_count: parse_count("RSB_SH_PAYMENT_CNT", entry.rsb_sh_payment_cnt)?,
                payment_amount_min: parse_count(
                    "RSB_SH_PAYMENT_AMT_MIN",
                    entry.rsb_sh_payment_amt_min,
                )?,
                payment_amount_max: parse_count(
                    "RSB_SH_PAYMENT_AMT_MAX",
                    entry.rsb_sh_payment_amt_max,
                )?,
                ingested_at,
            });
        }
    }

    Ok(Some(CityDataBatch {
        live: state,
        forecasts,
        industries,
    }))
}

/// Parses a feed timestamp. The API publishes minutes (`2024-01-01 10:00`);
/// some responses include seconds.
pub fn parse_feed_time(field: &'static str, raw: &str) -> Result<NaiveDateTime, IngestError> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .map_err(|_| IngestError::Parse(format!("{} is not a timestamp: '{}'", field, raw)))
}

fn describe_missing_container(
    result: Option<ApiResult>,
    code: Option<String>,
    message: Option<String>,
) -> String {
    let (code, message) = match result {
        Some(r) => (present(r.code).or(present(code)), present(r.message).or(present(message))),
        None => (present(code), present(message)),
    };

    match (code, message) {
        (Some(code), Some(message)) => {
            format!("CITYDATA container missing (API result {}: {})", code, message)
        }
        (Some(code), None) => format!("CITYDATA container missing (API result {})", code),
        _ => "CITYDATA container missing".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
