//! Parsing of caller-supplied instants into epoch milliseconds

use chrono::{DateTime, NaiveDate, TimeDelta};
use tidemark_core::{Error, Result};

/// Which end of a calendar day a bare date resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Start,
    End,
}

/// Parse epoch milliseconds, RFC 3339, or `YYYY-MM-DD` (UTC).
/// Returns `None` when the text is none of these.
pub fn parse_instant(raw: &str, bound: DateBound) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(ms) = raw.parse::<i64>() {
        return Some(ms);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let start = day.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis();
    match bound {
        DateBound::Start => Some(start),
        DateBound::End => Some(start + TimeDelta::days(1).num_milliseconds() - 1),
    }
}

/// [`parse_instant`] for a named parameter, failing with a descriptive error
pub fn parse_date_bound(name: &str, raw: &str, bound: DateBound) -> Result<i64> {
    parse_instant(raw, bound).ok_or_else(|| {
        Error::invalid(
            name,
            format!("expected epoch ms, RFC 3339 or YYYY-MM-DD, got {:?}", raw),
        )
    })
}
