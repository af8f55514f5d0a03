//! Rendering and parsing of the log's timestamp column.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt;
use thiserror::Error;

const WRITE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";
const COMPACT_OFFSET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub trait IntoUtcDateTime {
    fn into_utc(self) -> DateTime<Utc>;
}

impl IntoUtcDateTime for NaiveDateTime {
    fn into_utc(self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self)
    }
}

impl IntoUtcDateTime for DateTime<FixedOffset> {
    fn into_utc(self) -> DateTime<Utc> {
        self.with_timezone(&Utc)
    }
}

impl IntoUtcDateTime for DateTime<Tz> {
    fn into_utc(self) -> DateTime<Utc> {
        self.with_timezone(&Utc)
    }
}

impl IntoUtcDateTime for DateTime<Utc> {
    fn into_utc(self) -> DateTime<Utc> {
        self
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("Unknown time zone '{0}'")]
pub struct UnknownZoneError(pub String);

/// The zone timestamps are written in. Fixed for the lifetime of a log file.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use meteolog::LogClock;
///
/// let now = Utc.with_ymd_and_hms(2025, 3, 1, 8, 35, 9).unwrap();
/// let ist = LogClock::from_name("Asia/Kolkata").unwrap();
/// assert_eq!(ist.timestamp(now), "2025-03-01T14:05:09+05:30");
/// assert_eq!(LogClock::Utc.timestamp(now), "2025-03-01T08:35:09+00:00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogClock {
    Utc,
    Zone(Tz),
}

impl LogClock {
    pub fn from_name(name: &str) -> Result<Self, UnknownZoneError> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("utc") {
            return Ok(LogClock::Utc);
        }
        name.parse::<Tz>()
            .map(LogClock::Zone)
            .map_err(|_| UnknownZoneError(name.to_string()))
    }

    /// Renders `now` in this zone with whole-second precision.
    pub fn timestamp(&self, now: DateTime<Utc>) -> String {
        match self {
            LogClock::Utc => now.format(WRITE_FORMAT).to_string(),
            LogClock::Zone(tz) => now.with_timezone(tz).format(WRITE_FORMAT).to_string(),
        }
    }
}

impl fmt::Display for LogClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogClock::Utc => f.write_str("UTC"),
            LogClock::Zone(tz) => write!(f, "{}", tz.name()),
        }
    }
}

/// Parses a stored timestamp into UTC.
///
/// Accepts RFC 3339, ISO 8601 with a compact `+0530` offset, and offset-less
/// `YYYY-MM-DD HH:MM:SS` rows, which older UTC-only logs contain.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.into_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(text, COMPACT_OFFSET_FORMAT) {
        return Some(dt.into_utc());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(IntoUtcDateTime::into_utc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_parse_written_timestamps() {
        let now = at(8, 35, 9);
        for clock in [
            LogClock::Utc,
            LogClock::from_name("Asia/Kolkata").unwrap(),
            LogClock::from_name("America/New_York").unwrap(),
        ] {
            assert_eq!(parse_timestamp(&clock.timestamp(now)), Some(now), "{clock}");
        }
    }

    #[test]
    fn test_parse_legacy_formats() {
        assert_eq!(parse_timestamp("2025-03-01 08:35:09"), Some(at(8, 35, 9)));
        assert_eq!(parse_timestamp("2025-03-01T14:05:09+0530"), Some(at(8, 35, 9)));
        assert_eq!(parse_timestamp("2025-03-01T08:35:09Z"), Some(at(8, 35, 9)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("2025-13-01 00:00:00"), None);
    }

    #[test]
    fn test_subsecond_precision_is_dropped() {
        let now = at(8, 35, 9) + chrono::Duration::milliseconds(750);
        assert_eq!(LogClock::Utc.timestamp(now), "2025-03-01T08:35:09+00:00");
    }

    #[test]
    fn test_unknown_zone() {
        assert_eq!(
            LogClock::from_name("Mars/Olympus"),
            Err(UnknownZoneError("Mars/Olympus".to_string()))
        );
        assert_eq!(LogClock::from_name("utc"), Ok(LogClock::Utc));
    }
}
