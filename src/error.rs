/// Error taxonomy for a pipeline run.
///
/// "No data published for this area" is not an error and does not appear
/// here; the parser reports it as `Ok(None)`.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum IngestError {
    /// Transport failure, timeout, or non-success HTTP status.
    #[error("network error: {0}")]
    Network(String),

    /// Payload is not well-formed XML, lacks the CITYDATA container, or
    /// carries a value that cannot be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// Database unreachable or a statement was rejected.
    #[error("store error: {0}")]
    Store(String),
}

impl IngestError {
    /// Short label used in logs and the run report.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Network(_) => "network",
            IngestError::Parse(_) => "parse",
            IngestError::Store(_) => "store",
        }
    }
}

/// Serialized as `{ "kind": ..., "message": ... }` in the run report.
impl Serialize for IngestError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("IngestError", 2)?;
        s.serialize_field("kind", self.kind())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

impl From<postgres::Error> for IngestError {
    fn from(e: postgres::Error) -> Self {
        IngestError::Store(e.to_string())
    }
}

impl From<r2d2::Error> for IngestError {
    fn from(e: r2d2::Error) -> Self {
        IngestError::Store(format!("connection pool: {}", e))
    }
}

impl From<reqwest::Error> for IngestError {
    fn from(e: reqwest::Error) -> Self {
        // The request URL embeds the API key.
        let e = e.without_url();
        if e.is_timeout() {
            IngestError::Network(format!("request timed out: {}", e))
        } else {
            IngestError::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(IngestError::Network("x".into()).kind(), "network");
        assert_eq!(IngestError::Parse("x".into()).kind(), "parse");
        assert_eq!(IngestError::Store("x".into()).kind(), "store");
    }

    #[test]
    fn test_display_includes_cause() {
        let e = IngestError::Parse("CITYDATA container missing".into());
        assert_eq!(e.to_string(), "parse error: CITYDATA container missing");
    }

    #[test]
    fn test_serializes_kind_and_message() {
        let json = serde_json::to_value(IngestError::Network("HTTP 503".into())).unwrap();
        assert_eq!(json["kind"], "network");
        assert_eq!(json["message"], "network error: HTTP 503");
    }
}
