/// citydata_service: Seoul real-time city data collection.
///
/// # Module structure
///
/// ```text
/// citydata_service
/// ├── model       — shared record types (AreaLiveState, ForecastSlot, IndustrySegment, …)
/// ├── error       — IngestError taxonomy (network / parse / store)
/// ├── config      — .env + citydata.toml + environment, validated at startup
/// ├── db          — r2d2 connection pool and schema checks
/// ├── registry    — area name sources (area table or static list)
/// ├── ingest
/// │   ├── citydata     — city data API: URL construction, fetch, XML decoding
/// │   ├── iot_visitors — S-DoT visitor feed: paging and day filter
/// │   └── fixtures (test only) — representative XML payloads
/// ├── store       — last-write-wins upserts (PostgreSQL, in-memory)
/// ├── pipeline    — per-area orchestration, outcomes and run summary
/// └── park        — park visitor history CSV merge
/// ```

/// Public modules
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod model;
pub mod park;
pub mod pipeline;
pub mod registry;
pub mod store;
