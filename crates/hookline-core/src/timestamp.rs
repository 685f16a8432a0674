//! Timestamp normalization.
//!
//! Source systems send ISO-8601 style timestamps in a handful of shapes.
//! Everything is converted to UTC and rendered as
//! `DD MonthName YYYY - HH:MM AM/PM UTC`. Input that cannot be parsed is
//! replaced by the current time; normalization never fails.

use std::{borrow::Cow, sync::Arc};

use chrono::{
    format::{self as chrono_format, Parsed, StrftimeItems},
    DateTime, Datelike, NaiveDate, NaiveDateTime, Utc,
};
use thiserror::Error;
use tracing::warn;

use crate::time::Clock;

/// Output format, e.g. `15 January 2024 - 10:30 AM UTC`.
pub const DISPLAY_FORMAT: &str = "%d %B %Y - %I:%M %p UTC";

/// Years the display format can render with four digits.
const DISPLAY_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

// `%#z` accepts `+05`, `+0500` and `+05:00`.
const OFFSET_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%#z",
    "%Y%m%dT%H%M%S%.f%#z",
];

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S%.f",
    "%Y%m%dT%H%M",
];

/// Hour-only shapes; the flag marks formats carrying an offset.
const HOUR_FORMATS: [(&str, bool); 4] = [
    ("%Y-%m-%dT%H%#z", true),
    ("%Y-%m-%d %H%#z", true),
    ("%Y-%m-%dT%H", false),
    ("%Y-%m-%d %H", false),
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];

/// Reasons a raw timestamp could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// Input was empty or whitespace.
    #[error("timestamp is empty")]
    Empty,

    /// Input matched none of the accepted shapes.
    #[error("unrecognized timestamp '{0}'")]
    Unrecognized(String),

    /// Input parsed, but its UTC year has no four-digit rendering.
    #[error("timestamp '{0}' is outside years 1-9999 in UTC")]
    OutOfRange(String),
}

/// Parses an ISO-8601 style timestamp into UTC.
///
/// Accepts extended (`2024-01-15T10:00:00`) and basic (`20240115T100000`)
/// forms with a `T` or space separator, optional minutes, seconds and
/// fractional seconds, and a `Z`, `±HH`, `±HHMM` or `±HH:MM` offset. Values
/// without an offset are taken to be UTC already. A bare date is midnight
/// UTC.
///
/// # Errors
///
/// Returns [`TimestampError::OutOfRange`] when the UTC instant falls outside
/// years 1 to 9999, even if the input itself is in range.
pub fn parse(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TimestampError::Empty);
    }

    let candidate = match trimmed.strip_suffix(&['Z', 'z'][..]) {
        Some(body) => Cow::Owned(format!("{body}+00:00")),
        None => Cow::Borrowed(trimmed),
    };

    let instant =
        parse_candidate(&candidate).ok_or_else(|| TimestampError::Unrecognized(raw.to_string()))?;

    if !DISPLAY_YEARS.contains(&instant.year()) {
        return Err(TimestampError::OutOfRange(raw.to_string()));
    }
    Ok(instant)
}

fn parse_candidate(candidate: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(candidate) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(candidate, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(candidate, format) {
            return Some(parsed.and_utc());
        }
    }

    for (format, has_offset) in HOUR_FORMATS {
        if let Some(instant) = parse_hour_only(candidate, format, has_offset) {
            return Some(instant);
        }
    }

    DATE_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(candidate, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|midnight| midnight.and_utc())
    })
}

/// chrono requires minutes to build a time, so hour-only input is parsed
/// field by field and the minute pinned to zero.
fn parse_hour_only(candidate: &str, format: &str, has_offset: bool) -> Option<DateTime<Utc>> {
    let mut parsed = Parsed::default();
    chrono_format::parse(&mut parsed, candidate, StrftimeItems::new(format)).ok()?;
    parsed.set_minute(0).ok()?;

    if has_offset {
        parsed.to_datetime().ok().map(|instant| instant.with_timezone(&Utc))
    } else {
        parsed.to_naive_datetime_with_offset(0).ok().map(|naive| naive.and_utc())
    }
}

/// Renders a UTC instant in the display format.
pub fn format(instant: DateTime<Utc>) -> String {
    instant.format(DISPLAY_FORMAT).to_string()
}

/// Converts raw source timestamps into display strings.
///
/// Holds the clock used when a timestamp is absent or unparseable.
#[derive(Debug, Clone)]
pub struct TimestampNormalizer {
    clock: Arc<dyn Clock>,
}

impl TimestampNormalizer {
    /// Creates a normalizer that falls back to `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Normalizes `raw`, substituting the current time when it is absent,
    /// empty or unparseable.
    pub fn normalize(&self, raw: Option<&str>) -> String {
        let instant = match raw.map(parse) {
            Some(Ok(parsed)) => parsed,
            None | Some(Err(TimestampError::Empty)) => self.clock.now_utc(),
            Some(Err(err)) => {
                warn!(error = %err, "Falling back to current time for unparseable timestamp");
                self.clock.now_utc()
            },
        };
        format(instant)
    }
}
