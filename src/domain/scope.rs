//! Job scope: what one export run selects
//!
//! A run either descends recursively from a root node or selects, in one flat
//! query, the nodes below a root path whose modification time falls into a
//! date range.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::NodeId;

/// Modification-time bounds of a flat query
///
/// Bounds are kept in the textual form they were given in because that text
/// is part of the cache key. At least one bound is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl DateRange {
    /// Creates a range, validating both bounds and their order
    pub fn new(from: Option<String>, to: Option<String>) -> Result<Self, String> {
        let from = from.filter(|s| !s.trim().is_empty());
        let to = to.filter(|s| !s.trim().is_empty());

        if from.is_none() && to.is_none() {
            return Err("Date range needs a from-date, a to-date or both".to_string());
        }

        let parsed_from = from.as_deref().map(parse_date_bound).transpose()?;
        let parsed_to = to.as_deref().map(parse_date_bound).transpose()?;
        if let (Some(f), Some(t)) = (parsed_from, parsed_to) {
            if f > t {
                return Err(format!(
                    "from-date {} is after to-date {}",
                    from.as_deref().unwrap_or_default(),
                    to.as_deref().unwrap_or_default()
                ));
            }
        }

        Ok(Self { from, to })
    }

    /// Lower bound as a UTC instant
    pub fn from_instant(&self) -> Option<DateTime<Utc>> {
        self.from.as_deref().and_then(|s| parse_date_bound(s).ok())
    }

    /// Upper bound as a UTC instant
    pub fn to_instant(&self) -> Option<DateTime<Utc>> {
        self.to.as_deref().and_then(|s| parse_date_bound(s).ok())
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} TO {}]",
            self.from.as_deref().unwrap_or("MIN"),
            self.to.as_deref().unwrap_or("MAX")
        )
    }
}

/// Parses a date bound given as `YYYY-MM-DD` (midnight UTC) or RFC 3339
pub fn parse_date_bound(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| format!("Invalid date '{value}': expected YYYY-MM-DD or RFC 3339"))
}

/// Identifies one export run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobScope {
    /// Full recursive descent from `root`
    Descent { root: NodeId },

    /// Flat date-filtered selection restricted to the subtree at `path`
    Modified {
        root: NodeId,
        path: String,
        range: DateRange,
    },
}

impl JobScope {
    /// Root node of the scope
    pub fn root(&self) -> &NodeId {
        match self {
            JobScope::Descent { root } | JobScope::Modified { root, .. } => root,
        }
    }
}
