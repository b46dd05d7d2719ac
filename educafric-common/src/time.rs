//! Timestamp utilities
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings
//! (`2026-10-19T08:30:00.000Z`), so comparing the TEXT columns in SQL orders
//! them chronologically.

use crate::config::MAX_SESSION_TTL_HOURS;
use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp for storage
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Current UTC time formatted for storage
pub fn now_rfc3339() -> String {
    format_timestamp(now())
}

/// Expiry instant for something created now and living `ttl_hours`
///
/// The lifetime is clamped to `0..=MAX_SESSION_TTL_HOURS`.
pub fn expiry_after_hours(ttl_hours: i64) -> DateTime<Utc> {
    now() + Duration::hours(ttl_hours.clamp(0, MAX_SESSION_TTL_HOURS))
}
