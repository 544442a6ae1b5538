//! Block timestamp format
//!
//! The textual form of a block's instant is part of its hashed payload, so
//! creation and verification must render it through the same routine:
//! millisecond-precision UTC, e.g. `2024-01-15T10:30:00.000Z`.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};

/// Current instant, truncated to the precision that gets hashed
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Render an instant in the canonical hashed form
pub fn format_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 instant (any offset) into UTC
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text.trim()).map(|dt| dt.with_timezone(&Utc))
}

/// Parse a time-travel cutoff: an RFC 3339 instant or a bare `YYYY-MM-DD`
/// date, which means midnight UTC.
pub fn parse_cutoff(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = parse_timestamp(text) {
        return Some(instant);
    }
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Serde adapter so a serialized block carries exactly the hashed string
pub mod serde_millis {
    use super::{format_timestamp, parse_timestamp};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        instant: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(instant))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_timestamp(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_format_has_millisecond_precision_and_z_suffix() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(format_timestamp(&instant), "2024-01-15T10:30:00.000Z");
    }

    #[test]
    fn test_now_is_truncated_to_milliseconds() {
        let instant = now();
        assert_eq!(instant.nanosecond() % 1_000_000, 0);
    }

    #[test]
    fn test_format_parse_roundtrip_is_stable() {
        let instant = now();
        let text = format_timestamp(&instant);
        let parsed = parse_timestamp(&text).unwrap();
        assert_eq!(parsed, instant);
        assert_eq!(format_timestamp(&parsed), text);
    }

    #[test]
    fn test_parse_converts_offsets_to_utc() {
        let parsed = parse_timestamp("2024-01-15T12:30:00.000+02:00").unwrap();
        assert_eq!(format_timestamp(&parsed), "2024-01-15T10:30:00.000Z");
    }

    #[test]
    fn test_cutoff_accepts_bare_date() {
        let cutoff = parse_cutoff("2024-03-01").unwrap();
        assert_eq!(format_timestamp(&cutoff), "2024-03-01T00:00:00.000Z");
    }

    #[test]
    fn test_cutoff_rejects_garbage() {
        assert!(parse_cutoff("yesterday").is_none());
    }
}
