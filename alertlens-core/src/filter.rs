use crate::error::{AlertLensError, Result};
use crate::model::{InstanceEvent, KillSession, OraError, Warning};
use crate::timestamp::TimestampNormalizer;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// Closed interval of instants; both ends are included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

impl TimeRange {
    pub fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Result<Self> {
        if start > end {
            return Err(AlertLensError::InvalidTimeRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Builds a range from optional bounds, leaving a missing side open.
    pub fn from_bounds(
        start: Option<DateTime<FixedOffset>>,
        end: Option<DateTime<FixedOffset>>,
    ) -> Result<Option<Self>> {
        match (start, end) {
            (None, None) => Ok(None),
            (start, end) => {
                let start = start.unwrap_or_else(|| DateTime::<Utc>::MIN_UTC.fixed_offset());
                let end = end.unwrap_or_else(|| DateTime::<Utc>::MAX_UTC.fixed_offset());
                Self::new(start, end).map(Some)
            }
        }
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    pub fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }

    pub fn contains(&self, instant: &DateTime<FixedOffset>) -> bool {
        *instant >= self.start && *instant <= self.end
    }
}

/// Fields an event exposes to time and keyword filtering.
pub trait Searchable {
    fn timestamp(&self) -> &str;
    fn search_fields(&self) -> Vec<&str>;
}

impl Searchable for OraError {
    fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.code.as_str(), self.trace_file.as_str(), self.source.as_str()]
    }
}

impl Searchable for Warning {
    fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.message.as_str(), self.trace_file.as_str(), self.source.as_str()]
    }
}

impl Searchable for KillSession {
    fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.sid.as_str(),
            self.serial.as_str(),
            self.reason.as_str(),
            self.requestor.as_str(),
            self.owner.as_str(),
            self.source.as_str(),
        ]
    }
}

impl Searchable for InstanceEvent {
    fn timestamp(&self) -> &str {
        &self.timestamp
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.line_text.as_str()]
    }
}

/// Rows whose timestamp cannot be normalized are dropped.
pub fn filter_by_time_range<T: Searchable + Clone>(
    items: &[T],
    range: &TimeRange,
    normalizer: &TimestampNormalizer,
) -> Vec<T> {
    items
        .iter()
        .filter(|item| {
            normalizer
                .normalize(item.timestamp())
                .is_some_and(|instant| range.contains(&instant))
        })
        .cloned()
        .collect()
}

/// Case-insensitive substring match over the item's search fields.
/// A blank keyword keeps everything.
pub fn filter_by_keyword<T: Searchable + Clone>(items: &[T], keyword: &str) -> Vec<T> {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| matches_keyword(*item, &needle))
        .cloned()
        .collect()
}

fn matches_keyword<T: Searchable>(item: &T, needle: &str) -> bool {
    item.search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub time_range: Option<TimeRange>,
    pub keyword: Option<String>,
    pub normalizer: TimestampNormalizer,
}

impl EventFilter {
    pub fn new(normalizer: TimestampNormalizer) -> Self {
        Self {
            time_range: None,
            keyword: None,
            normalizer,
        }
    }

    pub fn with_time_range(mut self, range: Option<TimeRange>) -> Self {
        self.time_range = range;
        self
    }

    pub fn with_keyword(mut self, keyword: Option<String>) -> Self {
        self.keyword = keyword;
        self
    }

    pub fn is_noop(&self) -> bool {
        self.time_range.is_none()
            && self
                .keyword
                .as_deref()
                .map_or(true, |k| k.trim().is_empty())
    }

    pub fn matches<T: Searchable>(&self, item: &T) -> bool {
        if let Some(range) = &self.time_range {
            match self.normalizer.normalize(item.timestamp()) {
                Some(instant) if range.contains(&instant) => {}
                _ => return false,
            }
        }
        match self.keyword.as_deref().map(|k| k.trim().to_lowercase()) {
            Some(needle) if !needle.is_empty() => matches_keyword(item, &needle),
            _ => true,
        }
    }

    pub fn apply<T: Searchable + Clone>(&self, items: &[T]) -> Vec<T> {
        items.iter().filter(|item| self.matches(*item)).cloned().collect()
    }
}
