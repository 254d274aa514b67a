//! Wire formatting for event timestamps.
//!
//! Journal events carry RFC 3339 timestamps in UTC (`2024-03-01T12:30:00Z`). CAPI documents may
//! carry fractional seconds, a non-UTC offset or no offset at all. Everything sent to EDDN goes
//! through [`normalize`], so both ingestion paths produce byte-identical strings for the same
//! instant.

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

#[derive(Error, Debug)]
pub enum TimestampError {
    #[error("failed to parse timestamp {0:?}")]
    Parse(String),
    #[error("failed to format timestamp: {0}")]
    Format(#[from] time::error::Format),
}

/// Parse a timestamp, assuming UTC when no offset is given.
pub fn parse(value: &str) -> Result<OffsetDateTime, TimestampError> {
    if let Ok(parsed) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(parsed);
    }

    PrimitiveDateTime::parse(
        value,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"),
    )
    .map(PrimitiveDateTime::assume_utc)
    .map_err(|_| TimestampError::Parse(value.to_owned()))
}

/// Format an instant the way EDDN expects it: UTC, second precision, `Z` suffix.
pub fn format(value: OffsetDateTime) -> Result<String, TimestampError> {
    Ok(value
        .to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second]Z"
        ))?)
}

pub fn normalize(value: &str) -> Result<String, TimestampError> {
    format(parse(value)?)
}
