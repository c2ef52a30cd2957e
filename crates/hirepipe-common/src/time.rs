//! ISO-8601 timestamp helpers
//!
//! Hire timestamps arrive from HTTP callers, CSV exports and Avro backups in
//! slightly different shapes. Everything is normalized to `DateTime<Utc>`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::error::{HirepipeError, Result};

/// Offset-less layouts, interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Layouts carrying a numeric offset without a colon (e.g. `+0000`).
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Parse an ISO-8601 instant.
///
/// Accepts RFC 3339 (a trailing `Z` means UTC), numeric offsets with or
/// without a colon, offset-less date-times and bare dates. The last two are
/// read as UTC.
///
/// # Example
///
/// ```
/// use hirepipe_common::time::parse_iso8601;
///
/// let instant = parse_iso8601("2021-05-15T14:30:00Z").unwrap();
/// assert_eq!(instant.to_rfc3339(), "2021-05-15T14:30:00+00:00");
/// ```
pub fn parse_iso8601(input: &str) -> Result<DateTime<Utc>> {
    let value = input.trim();
    if value.is_empty() {
        return Err(HirepipeError::InvalidTimestamp(input.to_string()));
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Ok(parsed.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(HirepipeError::InvalidTimestamp(input.to_string()))
}

/// Format an instant as RFC 3339 with a `Z` designator.
///
/// Fractional seconds are kept only when present.
pub fn format_iso8601(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_zulu_designator() {
        let parsed = parse_iso8601("2021-05-15T14:30:00Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2021, 5, 15, 14, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_numeric_offset_converts_to_utc() {
        let parsed = parse_iso8601("2021-05-15T14:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2021, 5, 15, 12, 30, 0).unwrap());

        let compact = parse_iso8601("2021-05-15T14:30:00-0300").unwrap();
        assert_eq!(compact, Utc.with_ymd_and_hms(2021, 5, 15, 17, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_is_utc() {
        let parsed = parse_iso8601("2021-11-07T02:48:42").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2021, 11, 7, 2, 48, 42).unwrap());

        let spaced = parse_iso8601("2021-11-07 02:48:42.250").unwrap();
        assert_eq!(spaced.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parse_bare_date_is_midnight() {
        let parsed = parse_iso8601("2021-01-31").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2021, 1, 31, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "   ", "yesterday", "2021-13-01T00:00:00Z", "2021-02-30", "14:30:00"] {
            assert!(
                matches!(parse_iso8601(input), Err(HirepipeError::InvalidTimestamp(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_format_uses_zulu() {
        let instant = Utc.with_ymd_and_hms(2021, 5, 15, 14, 30, 0).unwrap();
        assert_eq!(format_iso8601(&instant), "2021-05-15T14:30:00Z");
    }
}
