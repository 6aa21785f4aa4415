// Dashboard statistics and ORA frequency buckets.

use crate::model::{Extraction, KillSession, OraError, Warning};
use crate::timestamp::TimestampNormalizer;
use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

/// How many distinct minute strings an hourly bucket keeps as samples.
pub const MAX_BUCKET_SAMPLES: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub files: usize,
    pub ora_errors: usize,
    pub warnings: usize,
    pub kill_sessions: usize,
    pub unique_ora_codes: usize,
}

impl AnalysisSummary {
    pub fn from_extraction(extraction: &Extraction, files: usize) -> Self {
        let unique: HashSet<&str> = extraction.ora_errors.iter().map(|e| e.code.as_str()).collect();
        Self {
            files,
            ora_errors: extraction.ora_errors.len(),
            warnings: extraction.warnings.len(),
            kill_sessions: extraction.kill_sessions.len(),
            unique_ora_codes: unique.len(),
        }
    }

    pub fn severity(&self) -> AlertSeverity {
        AlertSeverity::from_error_count(self.ora_errors)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn from_error_count(count: usize) -> Self {
        match count {
            n if n > 100 => AlertSeverity::Critical,
            n if n > 50 => AlertSeverity::High,
            n if n > 10 => AlertSeverity::Medium,
            _ => AlertSeverity::Low,
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSeverity::Low => write!(f, "LOW"),
            AlertSeverity::Medium => write!(f, "MEDIUM"),
            AlertSeverity::High => write!(f, "HIGH"),
            AlertSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Counts values and orders them by count descending, then by value.
fn ranked<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(value, count)| (value.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

pub fn ora_code_counts(errors: &[OraError]) -> Vec<(String, usize)> {
    ranked(errors.iter().map(|e| e.code.as_str()))
}

pub fn top_warnings(warnings: &[Warning], n: usize) -> Vec<(String, usize)> {
    let mut top = ranked(warnings.iter().map(|w| w.message.as_str()));
    top.truncate(n);
    top
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillSessionStats {
    pub total: usize,
    pub unique_sids: usize,
    pub most_common_mode: Option<String>,
    pub most_common_reason: Option<String>,
}

impl KillSessionStats {
    pub fn from_events(events: &[KillSession]) -> Self {
        let sids: HashSet<&str> = events.iter().map(|e| e.sid.as_str()).collect();
        Self {
            total: events.len(),
            unique_sids: sids.len(),
            most_common_mode: ranked(events.iter().map(|e| e.mode.as_str()))
                .into_iter()
                .next()
                .map(|(mode, _)| mode),
            most_common_reason: ranked(events.iter().map(|e| e.reason.as_str()))
                .into_iter()
                .next()
                .map(|(reason, _)| reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    Hourly,
    Daily,
}

impl Granularity {
    fn floor(&self, instant: &DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let naive = match self {
            Granularity::Hourly => instant
                .date_naive()
                .and_time(NaiveTime::from_hms_opt(instant.hour(), 0, 0)?),
            Granularity::Daily => instant.date_naive().and_time(NaiveTime::MIN),
        };
        instant.offset().from_local_datetime(&naive).earliest()
    }

    fn sample_label(&self, instant: &DateTime<FixedOffset>) -> String {
        match self {
            Granularity::Hourly => instant.format("%Y-%m-%d %H:%M").to_string(),
            Granularity::Daily => instant.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyBucket {
    pub bucket_start: DateTime<FixedOffset>,
    pub code: String,
    pub count: usize,
    pub samples: Vec<String>,
}

/// Groups ORA errors into time buckets per code. Buckets are floored in
/// the normalizer's default offset; events without a parseable timestamp
/// are skipped.
pub fn ora_frequency(
    errors: &[OraError],
    granularity: Granularity,
    normalizer: &TimestampNormalizer,
) -> Vec<FrequencyBucket> {
    let offset = normalizer.default_offset();
    let mut buckets: BTreeMap<(DateTime<FixedOffset>, String), (usize, BTreeSet<String>)> =
        BTreeMap::new();

    for error in errors {
        let Some(instant) = normalizer.normalize(&error.timestamp) else {
            continue;
        };
        let local = instant.with_timezone(&offset);
        let Some(start) = granularity.floor(&local) else {
            continue;
        };
        let entry = buckets.entry((start, error.code.clone())).or_default();
        entry.0 += 1;
        entry.1.insert(granularity.sample_label(&local));
    }

    buckets
        .into_iter()
        .map(|((bucket_start, code), (count, samples))| FrequencyBucket {
            bucket_start,
            code,
            count,
            samples: samples.into_iter().take(MAX_BUCKET_SAMPLES).collect(),
        })
        .collect()
}
