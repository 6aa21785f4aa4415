// Timestamp normalization.
//
// Alert log timestamps are carried around as the exact matched strings; this
// module turns them into comparable instants. Anything that cannot be parsed
// yields `None` so callers can drop it from time-based views.

use crate::config::{AnalysisSettings, DEFAULT_OFFSET};
use crate::error::{AlertLensError, Result};
use crate::model::NOT_FOUND;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Formats that carry their own offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];

/// Formats without an offset; the normalizer's default offset is applied.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    // pre-12c alert log header, e.g. "Tue Oct 14 18:32:05 2025"
    "%a %b %d %H:%M:%S %Y",
    "%d-%b-%Y %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d-%b-%Y"];

// Used by the fuzzy pass to pull a date-looking substring out of noise.
static EMBEDDED_DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:\s?(?:Z|[+\-]\d{2}:?\d{2}))?|(?:Mon|Tue|Wed|Thu|Fri|Sat|Sun)\s+[A-Z][a-z]{2}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2}\s+\d{4}|\d{4}-\d{2}-\d{2})",
    )
    .expect("Failed to compile embedded datetime regex")
});

/// Parse an offset such as `+05:30`, `-0700`, `Z` or `UTC`.
pub fn parse_offset(value: &str) -> Result<FixedOffset> {
    let invalid = || AlertLensError::InvalidOffset(value.to_string());
    let trimmed = value.trim();

    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match trimmed.chars().next() {
        Some('+') => (1, &trimmed[1..]),
        Some('-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampNormalizer {
    default_offset: FixedOffset,
}

impl Default for TimestampNormalizer {
    fn default() -> Self {
        Self {
            default_offset: parse_offset(DEFAULT_OFFSET).unwrap_or_else(|_| Utc.fix()),
        }
    }
}

impl TimestampNormalizer {
    pub fn new(default_offset: FixedOffset) -> Self {
        Self { default_offset }
    }

    pub fn from_settings(settings: &AnalysisSettings) -> Result<Self> {
        Ok(Self::new(settings.offset()?))
    }

    pub fn default_offset(&self) -> FixedOffset {
        self.default_offset
    }

    /// Strict ISO-8601 first, then known formats, then a fuzzy search for an
    /// embedded date. Values without an offset get the default offset.
    pub fn normalize(&self, value: &str) -> Option<DateTime<FixedOffset>> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed == NOT_FOUND {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(dt);
        }

        if let Some(dt) = self.parse_lenient(trimmed) {
            return Some(dt);
        }

        let candidate = EMBEDDED_DATETIME.find(trimmed)?.as_str();
        let parsed = DateTime::parse_from_rfc3339(candidate)
            .ok()
            .or_else(|| self.parse_lenient(candidate));
        if parsed.is_none() {
            debug!("Unparseable timestamp: {:?}", value);
        }
        parsed
    }

    /// Same as `normalize`, except that a bare date stands for the last
    /// instant of that day. Used for the upper end of a time range.
    pub fn normalize_upper_bound(&self, value: &str) -> Option<DateTime<FixedOffset>> {
        let trimmed = value.trim();
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                return date
                    .and_hms_nano_opt(23, 59, 59, 999_999_999)
                    .and_then(|naive| self.localize(naive));
            }
        }
        self.normalize(value)
    }

    fn parse_lenient(&self, value: &str) -> Option<DateTime<FixedOffset>> {
        let owned;
        let value = match value.strip_suffix('Z') {
            Some(head) => {
                owned = format!("{}+00:00", head.trim_end());
                owned.as_str()
            }
            None => value,
        };

        for format in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(value, format) {
                return Some(dt);
            }
        }

        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
                return self.localize(naive);
            }
        }

        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(value, format) {
                return date.and_hms_opt(0, 0, 0).and_then(|naive| self.localize(naive));
            }
        }

        None
    }

    fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        self.default_offset.from_local_datetime(&naive).earliest()
    }
}
