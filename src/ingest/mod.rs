/// Clients for the Seoul open data API.
///
/// Each data source gets its own file: URL construction, the HTTP call and
/// response decoding live together.
///
/// - `citydata`     — real-time city data (population, forecasts, commerce)
/// - `iot_visitors` — S-DoT IoT visitor counts used for park history
/// - `fixtures`     — representative XML payloads (test only)

pub mod citydata;
pub mod iot_visitors;

#[cfg(test)]
pub(crate) mod fixtures;

/// Returns the trimmed text of a feed field, treating blank as absent.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses an integer field. Thousands separators are tolerated.
pub(crate) fn parse_count(
    field: &'static str,
    value: Option<String>,
) -> Result<Option<i64>, crate::error::IngestError> {
    match present(value) {
        None => Ok(None),
        Some(raw) => raw
            .replace(',', "")
            .parse::<i64>()
            .map(Some)
            .map_err(|_| {
                crate::error::IngestError::Parse(format!("{} is not an integer: '{}'", field, raw))
            }),
    }
}
