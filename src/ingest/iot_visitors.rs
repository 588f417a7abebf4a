/// S-DoT IoT visitor-count feed (dataset IotVdata018).
///
/// Paged by row range, 100 rows per page, newest rows first:
///   {base_url}/{api_key}/xml/IotVdata018/{start}/{end}
///
/// Each `<row>` carries:
///   SENSING_TIME            — `YYYY-MM-DD_HH:MM:SS`
///   REGION                  — `parks`, `public_facilities`, …
///   AUTONOMOUS_DISTRICT     — English district name (`Seongdong-gu`)
///   ADMINISTRATIVE_DISTRICT — romanized neighbourhood (`Seongsu1ga1-dong`)
///   VISITOR_COUNT
///   REG_DTTM                — registration time, unused
///
/// Only one calendar day is collected per run. Because rows are ordered
/// newest first, paging stops as soon as the feed reaches rows older than
/// that day.

use crate::config::FeedSettings;
use crate::error::IngestError;
use crate::ingest::{parse_count, present};
use chrono::{NaiveDate, NaiveDateTime};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

pub const VISITOR_RESOURCE_PATH: &str = "xml/IotVdata018";
pub const PAGE_SIZE: u32 = 100;
pub const MAX_PAGES: u32 = 999;

const SENSING_TIME_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

#[derive(Debug, Deserialize)]
struct VisitorPage {
    #[serde(rename = "row", default)]
    rows: Vec<RawVisitorRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
struct RawVisitorRow {
    sensing_time: Option<String>,
    region: Option<String>,
    autonomous_district: Option<String>,
    administrative_district: Option<String>,
    visitor_count: Option<String>,
}

/// One sensor reading that passed the park filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorReading {
    pub measured_at: NaiveDateTime,
    /// English district name as published (`Gangbuk-gu`).
    pub district: String,
    pub neighbourhood: String,
    pub visitor_count: i64,
}

/// Whether a page scan should request the next page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageControl {
    Continue,
    Stop,
}

/// Sensors that sit inside a city park. Seoul Grand Park is excluded; the
/// Seodaemun independence park sensor is registered as a public facility.
pub fn is_park_sensor(region: &str, district: &str) -> bool {
    (region == "parks" && district != "Seoul_Grand_Park")
        || (region == "public_facilities" && district == "Seodaemun-gu")
}

/// Row range for a 1-based page number.
pub fn page_range(page: u32) -> (u32, u32) {
    ((page - 1) * PAGE_SIZE + 1, page * PAGE_SIZE)
}

pub fn build_page_url(feed: &FeedSettings, api_key: &str, page: u32) -> String {
    let (start, end) = page_range(page);
    format!(
        "{}/{}/{}/{}/{}",
        feed.base_url, api_key, feed.resource_path, start, end
    )
}

/// Blocking client for the visitor feed.
pub struct VisitorClient {
    http: reqwest::blocking::Client,
    feed: FeedSettings,
    api_key: SecretString,
}

impl VisitorClient {
    pub fn new(feed: FeedSettings, api_key: &SecretString) -> Result<Self, IngestError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(feed.timeout)
            .build()
            .map_err(|e| IngestError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            feed,
            api_key: SecretString::from(api_key.expose_secret().to_owned()),
        })
    }

    pub fn fetch_page(&self, page: u32) -> Result<Vec<u8>, IngestError> {
        let url = build_page_url(&self.feed, self.api_key.expose_secret(), page);
        tracing::debug!(url = %build_page_url(&self.feed, "***", page), "fetching visitor page");

        let response = self.http.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Network(format!(
                "visitor API returned HTTP {} for page {}",
                status, page
            )));
        }
        Ok(response.bytes()?.to_vec())
    }

    /// Collects every park reading for `day`.
    pub fn collect_day(&self, day: NaiveDate) -> Result<Vec<VisitorReading>, IngestError> {
        collect_day_with(day, |page| self.fetch_page(page))
    }
}

/// Pages through the feed with `fetch_page` until the stop rule fires or
/// `MAX_PAGES` is reached.
pub fn collect_day_with<F>(day: NaiveDate, mut fetch_page: F) -> Result<Vec<VisitorReading>, IngestError>
where
    F: FnMut(u32) -> Result<Vec<u8>, IngestError>,
{
    let mut readings = Vec::new();

    for page in 1..=MAX_PAGES {
        let payload = fetch_page(page)?;
        let before = readings.len();
        let control = scan_page(&payload, day, &mut readings)?;
        tracing::debug!(page, kept = readings.len() - before, "scanned visitor page");

        if control == PageControl::Stop {
            break;
        }
    }

    tracing::info!(day = %day, readings = readings.len(), "collected park visitor readings");
    Ok(readings)
}

/// Scans one page, appending readings from `day` that pass the park filter.
///
/// Stop rules (rows are newest first):
/// - an empty page ends paging;
/// - rows after `day` are skipped;
/// - the first row before `day` ends the scan of this page;
/// - if the page's last row is before `day`, paging ends.
pub fn scan_page(
    payload: &[u8],
    day: NaiveDate,
    out: &mut Vec<VisitorReading>,
) -> Result<PageControl, IngestError> {
    let text = std::str::from_utf8(payload)
        .map_err(|e| IngestError::Parse(format!("visitor page is not valid UTF-8: {}", e)))?;
    let page: VisitorPage = quick_xml::de::from_str(text)
        .map_err(|e| IngestError::Parse(format!("visitor page XML: {}", e)))?;

    if page.rows.is_empty() {
        return Ok(PageControl::Stop);
    }

    let mut times = Vec::with_capacity(page.rows.len());
    for row in &page.rows {
        times.push(sensing_time(row.sensing_time.clone())?);
    }

    for (row, measured_at) in page.rows.into_iter().zip(times.iter().copied()) {
        let row_day = measured_at.date();
        if row_day > day {
            continue;
        }
        if row_day < day {
            break;
        }

        let region = present(row.region).unwrap_or_default();
        let district = present(row.autonomous_district).unwrap_or_default();
        if !is_park_sensor(&region, &district) {
            continue;
        }

        let visitor_count = parse_count("VISITOR_COUNT", row.visitor_count)?.ok_or_else(|| {
            IngestError::Parse(format!("VISITOR_COUNT missing for reading at {}", measured_at))
        })?;

        out.push(VisitorReading {
            measured_at,
            district,
            neighbourhood: present(row.administrative_district).unwrap_or_default(),
            visitor_count,
        });
    }

    match times.last() {
        Some(last) if last.date() < day => Ok(PageControl::Stop),
        _ => Ok(PageControl::Continue),
    }
}

fn sensing_time(raw: Option<String>) -> Result<NaiveDateTime, IngestError> {
    let raw = present(raw)
        .ok_or_else(|| IngestError::Parse("visitor row without SENSING_TIME".to_string()))?;
    NaiveDateTime::parse_from_str(&raw, SENSING_TIME_FORMAT)
        .map_err(|_| IngestError::Parse(format!("SENSING_TIME is not a timestamp: '{}'", raw)))
}
