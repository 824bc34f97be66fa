// In crates/core-types/src/time.rs

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serializer;

use crate::{Error, Result};

/// Converts a platform timestamp (Unix seconds) into a UTC instant.
pub fn utc_from_unix(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or(Error::InvalidTimestamp(secs))
}

/// Formats an instant as ISO-8601 at second precision with an explicit offset,
/// e.g. `2024-03-01T10:15:00+00:00`.
pub fn to_iso_seconds(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// `serialize_with` helper for payload timestamps.
pub fn serialize_iso_seconds<S>(instant: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&to_iso_seconds(instant))
}
