/// Park visitor history, kept as a CSV file.
///
/// Each run appends one day of S-DoT readings to the file:
///
///   1. map each reading to a Korean district and a park name,
///   2. read the existing rows (first),
///   3. append the new rows, drop later duplicates of (time, park),
///   4. stable-sort by measurement time and rewrite the file.
///
/// File layout, UTF-8 with BOM:
///
///   측정시간,행정동,방문자수,구,공원명
///   2024-05-01 14:00:00,Seongsu1ga1-dong,120,성동구,서울숲공원

use crate::error::IngestError;
use crate::ingest::iot_visitors::VisitorReading;
use chrono::NaiveDateTime;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CSV_HEADER: [&str; 5] = ["측정시간", "행정동", "방문자수", "구", "공원명"];
pub const OTHER_PARK: &str = "기타공원";

const UTF8_BOM: &str = "\u{feff}";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum ParkError {
    #[error("visitor feed: {0}")]
    Feed(#[from] IngestError),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} line {line}: {reason}")]
    Csv {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// One CSV row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParkVisit {
    pub measured_at: NaiveDateTime,
    pub neighbourhood: String,
    pub visitors: i64,
    /// Korean district name; empty when the feed used an unknown district.
    pub district: String,
    pub park: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub existing: usize,
    pub fetched: usize,
    pub duplicates: usize,
    pub written: usize,
}

// ---------------------------------------------------------------------------
// Name mapping
// ---------------------------------------------------------------------------

const DISTRICTS: &[(&str, &str)] = &[
    ("Jongno-gu", "종로구"),
    ("Jung-gu", "중구"),
    ("Yongsan-gu", "용산구"),
    ("Seongdong-gu", "성동구"),
    ("Gwangjin-gu", "광진구"),
    ("Dongdaemun-gu", "동대문구"),
    ("Jungnang-gu", "중랑구"),
    ("Seongbuk-gu", "성북구"),
    ("Gangbuk-gu", "강북구"),
    ("Dobong-gu", "도봉구"),
    ("Nowon-gu", "노원구"),
    ("Eunpyeong-gu", "은평구"),
    ("Seodaemun-gu", "서대문구"),
    ("Mapo-gu", "마포구"),
    ("Yangcheon-gu", "양천구"),
    ("Gangseo-gu", "강서구"),
    ("Guro-gu", "구로구"),
    ("Geumcheon-gu", "금천구"),
    ("Yeongdeungpo-gu", "영등포구"),
    ("Dongjak-gu", "동작구"),
    ("Gwanak-gu", "관악구"),
    ("Seocho-gu", "서초구"),
    ("Gangnam-gu", "강남구"),
    ("Songpa-gu", "송파구"),
    ("Gangdong-gu", "강동구"),
];

/// (Korean district, romanized neighbourhood) → park. Sensor metadata
/// spells some neighbourhoods two ways, so both are listed.
const PARKS: &[(&str, &str, &str)] = &[
    ("성동구", "Seongsu1ga1(il)-dong", "서울숲공원"),
    ("성동구", "Seongsu1ga1-dong", "서울숲공원"),
    ("서대문구", "Cheonyeon-dong", "서대문독립공원"),
    ("강북구", "Beon3-dong", "북서울꿈의숲"),
    ("강북구", "Beon3(sam)-dong", "북서울꿈의숲"),
    ("송파구", "Jamsil6(yuk)-dong", "송파나루공원"),
    ("송파구", "Jamsil6-dong", "송파나루공원"),
    ("은평구", "Nokbeon-dong", "은평평화공원"),
    ("강동구", "Amsa3(sam)-dong", "암사생태공원"),
    ("강동구", "Amsa3-dong", "암사생태공원"),
];

pub fn district_korean(english: &str) -> Option<&'static str> {
    DISTRICTS
        .iter()
        .find(|(en, _)| *en == english)
        .map(|(_, ko)| *ko)
}

pub fn park_name(district: &str, neighbourhood: &str) -> &'static str {
    PARKS
        .iter()
        .find(|(gu, dong, _)| *gu == district && *dong == neighbourhood)
        .map(|(_, _, park)| *park)
        .unwrap_or(OTHER_PARK)
}

impl From<&VisitorReading> for ParkVisit {
    fn from(r: &VisitorReading) -> Self {
        let district = district_korean(&r.district).unwrap_or_default();
        ParkVisit {
            measured_at: r.measured_at,
            neighbourhood: r.neighbourhood.clone(),
            visitors: r.visitor_count,
            district: district.to_string(),
            park: park_name(district, &r.neighbourhood).to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Existing rows first, then new ones; the first row for each
/// (time, park) wins. Stable sort by time keeps file order among equals.
pub fn merge(existing: Vec<ParkVisit>, fetched: Vec<ParkVisit>) -> (Vec<ParkVisit>, usize) {
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(existing.len() + fetched.len());
    let mut duplicates = 0;

    for visit in existing.into_iter().chain(fetched) {
        if seen.insert((visit.measured_at, visit.park.clone())) {
            merged.push(visit);
        } else {
            duplicates += 1;
        }
    }

    merged.sort_by_key(|v| v.measured_at);
    (merged, duplicates)
}

/// Merges `readings` into the CSV at `path`. A missing file is treated as
/// empty history.
pub fn update_csv(path: &Path, readings: &[VisitorReading]) -> Result<MergeStats, ParkError> {
    let existing = match fs::read_to_string(path) {
        Ok(text) => parse_csv(&text, path)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "no existing park history, starting a new file");
            Vec::new()
        }
        Err(source) => {
            return Err(ParkError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let fetched: Vec<ParkVisit> = readings.iter().map(ParkVisit::from).collect();
    let mut stats = MergeStats {
        existing: existing.len(),
        fetched: fetched.len(),
        ..MergeStats::default()
    };

    let (merged, duplicates) = merge(existing, fetched);
    stats.duplicates = duplicates;
    stats.written = merged.len();

    write_atomically(path, &render_csv(&merged))?;
    Ok(stats)
}

fn write_atomically(path: &Path, contents: &str) -> Result<(), ParkError> {
    let io_err = |source| ParkError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    let tmp = path.with_extension("csv.tmp");
    fs::write(&tmp, contents).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

pub fn render_csv(visits: &[ParkVisit]) -> String {
    let mut out = String::from(UTF8_BOM);
    out.push_str(&CSV_HEADER.join(","));
    out.push('\n');

    for v in visits {
        let fields = [
            v.measured_at.format(TIME_FORMAT).to_string(),
            quote(&v.neighbourhood),
            v.visitors.to_string(),
            quote(&v.district),
            quote(&v.park),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Parses a park history file. Columns are located by header name, so
/// column order in older files does not matter.
pub fn parse_csv(text: &str, path: &Path) -> Result<Vec<ParkVisit>, ParkError> {
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);
    let mut lines = text.lines().enumerate();

    let csv_err = |line: usize, reason: String| ParkError::Csv {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let header = match lines.next() {
        Some((_, h)) => split_line(h),
        None => return Ok(Vec::new()),
    };
    let mut col_map: HashMap<&str, usize> = HashMap::new();
    for (idx, name) in header.iter().enumerate() {
        col_map.insert(name.trim(), idx);
    }
    let mut cols = [0usize; 5];
    for (slot, name) in cols.iter_mut().zip(CSV_HEADER) {
        *slot = *col_map
            .get(name)
            .ok_or_else(|| csv_err(1, format!("missing column {}", name)))?;
    }
    let [time_col, dong_col, count_col, gu_col, park_col] = cols;

    let mut visits = Vec::new();
    for (idx, line) in lines {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields = split_line(line);
        let field = |col: usize| fields.get(col).map(|s| s.trim()).unwrap_or("");

        let measured_at = parse_time(field(time_col))
            .ok_or_else(|| csv_err(line_no, format!("bad time '{}'", field(time_col))))?;
        let visitors = parse_visitors(field(count_col))
            .ok_or_else(|| csv_err(line_no, format!("bad visitor count '{}'", field(count_col))))?;

        visits.push(ParkVisit {
            measured_at,
            neighbourhood: field(dong_col).to_string(),
            visitors,
            district: field(gu_col).to_string(),
            park: field(park_col).to_string(),
        });
    }

    Ok(visits)
}

fn parse_time(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M"))
        .ok()
}

// Older exports wrote counts as floats ("12.0").
fn parse_visitors(s: &str) -> Option<i64> {
    s.parse::<i64>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|f| f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
