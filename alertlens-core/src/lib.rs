// AlertLens Library - Oracle alert log event extraction
//
// Turns raw alert log text into typed events (ORA errors, warnings, kill
// sessions, instance lifecycle events) and provides the filtering,
// comparison, statistics and export records built on top of them. Used by
// the `alertlens` CLI.

use tracing::{debug, info};

pub mod ai_provider;
pub mod classifier;
pub mod compare;
pub mod config;
pub mod error;
pub mod export;
pub mod extractor;
pub mod filter;
pub mod input;
pub mod instance;
pub mod model;
pub mod patterns;
pub mod stats;
pub mod timestamp;

pub use ai_provider::{PromptBuilder, RetryPolicy, SummaryCache};
#[cfg(feature = "ai-providers")]
pub use ai_provider::{create_provider, summarize, summarize_with_config, AIError, AIProvider, MistralProvider};
pub use classifier::{classify_line, LineClass};
pub use compare::{compare, Comparable, Comparison, CountRow};
pub use config::{AiSettings, AnalysisSettings, Config};
pub use error::{AlertLensError, Result};
pub use export::{build_sheets, Sheet};
pub use extractor::{Extractor, ScanState};
pub use filter::{filter_by_keyword, filter_by_time_range, EventFilter, Searchable, TimeRange};
pub use input::{read_log_file, AlertLogSet, LogLine};
pub use instance::{extract_instance_summary, extract_instance_summary_set, InstanceSummary};
pub use model::{
    ExtractedEvent, Extraction, InstanceEvent, InstanceEventKind, KillSession, OraError, Warning,
    NOT_FOUND,
};
pub use stats::{
    ora_code_counts, ora_frequency, top_warnings, AlertSeverity, AnalysisSummary, FrequencyBucket,
    Granularity, KillSessionStats,
};
pub use timestamp::{parse_offset, TimestampNormalizer};

/// Main library interface: a loaded configuration plus the extractor and
/// timestamp normalizer derived from it.
pub struct AlertLens {
    config: Config,
    extractor: Extractor,
    normalizer: TimestampNormalizer,
}

impl AlertLens {
    /// Create an instance from the first config file found, or defaults.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::load()?)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let normalizer = TimestampNormalizer::from_settings(&config.analysis)?;
        let extractor = Extractor::new(&config.analysis);
        debug!(
            "AlertLens configured with offset {} and trace window {}",
            normalizer.default_offset(),
            config.analysis.trace_window
        );
        Ok(Self {
            config,
            extractor,
            normalizer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn normalizer(&self) -> &TimestampNormalizer {
        &self.normalizer
    }

    /// Scan every source of the set.
    pub fn extract(&self, set: &AlertLogSet) -> Extraction {
        info!("Extracting events from {} source(s)", set.len());
        self.extractor.extract_set(set)
    }

    pub fn instances(&self, set: &AlertLogSet) -> InstanceSummary {
        extract_instance_summary_set(set)
    }

    /// Builds a filter from user-supplied bounds and keyword. Bounds go
    /// through the same normalizer as event timestamps; a date-only `to`
    /// covers that whole day.
    pub fn event_filter(&self, from: Option<&str>, to: Option<&str>, keyword: Option<&str>) -> Result<EventFilter> {
        let start = self.parse_bound(from, false)?;
        let end = self.parse_bound(to, true)?;
        Ok(EventFilter::new(self.normalizer)
            .with_time_range(TimeRange::from_bounds(start, end)?)
            .with_keyword(keyword.map(str::to_string)))
    }

    fn parse_bound(
        &self,
        value: Option<&str>,
        upper: bool,
    ) -> Result<Option<chrono::DateTime<chrono::FixedOffset>>> {
        let Some(raw) = value else {
            return Ok(None);
        };
        let parsed = if upper {
            self.normalizer.normalize_upper_bound(raw)
        } else {
            self.normalizer.normalize(raw)
        };
        parsed
            .map(Some)
            .ok_or_else(|| AlertLensError::InvalidTimestamp(raw.to_string()))
    }

    /// Applies `filter` to every collection of an extraction.
    pub fn filter_extraction(&self, extraction: &Extraction, filter: &EventFilter) -> Extraction {
        Extraction {
            ora_errors: filter.apply(&extraction.ora_errors),
            warnings: filter.apply(&extraction.warnings),
            kill_sessions: filter.apply(&extraction.kill_sessions),
        }
    }
}
