/// Source of the area names to collect.
///
/// Names are opaque strings passed verbatim (after trimming) to the feed.
/// Both implementations return a de-duplicated, sorted list so two runs
/// over the same registry visit areas in the same order.

use crate::db::PgPool;
use crate::error::IngestError;
use std::collections::BTreeSet;

pub trait AreaRegistry: Send + Sync {
    fn area_names(&self) -> Result<Vec<String>, IngestError>;
}

/// Reads `SELECT DISTINCT area_nm FROM area`.
pub struct PgAreaRegistry {
    pool: PgPool,
}

impl PgAreaRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AreaRegistry for PgAreaRegistry {
    fn area_names(&self) -> Result<Vec<String>, IngestError> {
        let mut conn = self.pool.get()?;
        let rows = conn.query(
            "SELECT DISTINCT area_nm FROM area WHERE area_nm IS NOT NULL ORDER BY area_nm",
            &[],
        )?;

        Ok(normalize_names(rows.iter().map(|row| row.get::<_, String>(0))))
    }
}

/// Fixed list, typically `[registry] areas` from the config file.
pub struct StaticAreaRegistry {
    names: Vec<String>,
}

impl StaticAreaRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: normalize_names(names.into_iter().map(Into::into)),
        }
    }
}

impl AreaRegistry for StaticAreaRegistry {
    fn area_names(&self) -> Result<Vec<String>, IngestError> {
        Ok(self.names.clone())
    }
}

fn normalize_names(names: impl Iterator<Item = String>) -> Vec<String> {
    names
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
