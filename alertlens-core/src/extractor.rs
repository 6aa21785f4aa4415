// Event extraction.
//
// A single forward pass over a source's lines. The only state carried from
// line to line is the last timestamp seen, threaded through a fold as
// `ScanState`. Nothing in here can fail: odd lines simply produce no event.

use crate::classifier::{classify_line, LineClass};
use crate::config::AnalysisSettings;
use crate::input::{AlertLogSet, LogLine};
use crate::model::{Extraction, KillSession, OraError, Warning, NOT_FOUND};
use crate::patterns;
use std::collections::HashSet;
use tracing::debug;

const KILL_ATTRIBUTE_KEYS: [&str; 5] = ["Reason =", "Mode =", "Requestor =", "Owner =", "Result ="];

/// Cursor carried across one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    pub last_timestamp: Option<String>,
}

impl ScanState {
    pub fn current_timestamp(&self) -> String {
        self.last_timestamp
            .clone()
            .unwrap_or_else(|| NOT_FOUND.to_string())
    }
}

/// All trace file references of a source, computed once per scan.
#[derive(Debug, Clone, Default)]
pub struct TraceIndex {
    locations: Vec<(usize, String)>,
}

impl TraceIndex {
    pub fn build(lines: &[LogLine]) -> Self {
        let locations = lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| patterns::find_trace_file(&line.text).map(|p| (i, p.to_string())))
            .collect();
        Self { locations }
    }

    /// First trace path at `idx..=idx + window`, or the sentinel.
    pub fn nearby(&self, idx: usize, window: usize) -> String {
        // locations are sorted by index, so the first candidate is the only one to check
        let start = self.locations.partition_point(|(t_idx, _)| *t_idx < idx);
        match self.locations.get(start) {
            Some((t_idx, path)) if t_idx - idx <= window => path.clone(),
            _ => NOT_FOUND.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

/// Attributes parsed from the lines following a `KILL SESSION` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillBlock {
    pub reason: String,
    pub mode: String,
    pub requestor: String,
    pub owner: String,
    pub result: String,
    pub lines: Vec<String>,
}

impl Default for KillBlock {
    fn default() -> Self {
        Self {
            reason: NOT_FOUND.to_string(),
            mode: NOT_FOUND.to_string(),
            requestor: NOT_FOUND.to_string(),
            owner: NOT_FOUND.to_string(),
            result: NOT_FOUND.to_string(),
            lines: Vec::new(),
        }
    }
}

impl KillBlock {
    fn slot(&mut self, key: &str) -> &mut String {
        match key {
            "Reason =" => &mut self.reason,
            "Mode =" => &mut self.mode,
            "Requestor =" => &mut self.requestor,
            "Owner =" => &mut self.owner,
            _ => &mut self.result,
        }
    }
}

/// Reads at most `window` lines starting at the marker line itself. Stops
/// after the first later line holding a timestamp or another kill marker;
/// that line is still recorded and parsed.
pub fn extract_kill_block(lines: &[LogLine], start: usize, window: usize) -> KillBlock {
    let mut block = KillBlock::default();
    let end = start.saturating_add(window).min(lines.len());

    for j in start..end {
        let line = &lines[j].text;
        block.lines.push(line.clone());

        let stripped = line.trim();
        if let Some(key) = KILL_ATTRIBUTE_KEYS.iter().find(|k| stripped.contains(*k)) {
            if let Some((_, value)) = stripped.split_once(key) {
                *block.slot(key) = value.trim().to_string();
            }
        }

        if j > start
            && (patterns::TIMESTAMP.is_match(stripped) || patterns::KILL_SESSION.is_match(stripped))
        {
            break;
        }
    }

    block
}

#[derive(Debug, Clone)]
pub struct Extractor {
    trace_window: usize,
    kill_block_window: usize,
    excluded_codes: HashSet<String>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(&AnalysisSettings::default())
    }
}

impl Extractor {
    pub fn new(settings: &AnalysisSettings) -> Self {
        Self {
            trace_window: settings.trace_window,
            kill_block_window: settings.kill_block_window,
            excluded_codes: settings.excluded_codes.iter().cloned().collect(),
        }
    }

    pub fn is_excluded(&self, code: &str) -> bool {
        self.excluded_codes.contains(code)
    }

    /// Scan one source. The result depends only on `lines`.
    pub fn extract(&self, lines: &[LogLine]) -> Extraction {
        let traces = TraceIndex::build(lines);
        let mut out = Extraction::default();

        let final_state = lines
            .iter()
            .enumerate()
            .fold(ScanState::default(), |mut state, (i, line)| {
                let text = line.text.trim_end_matches(['\n', '\r']);
                match classify_line(text) {
                    LineClass::Blank | LineClass::NoMatch => {}
                    LineClass::Timestamp(ts) => state.last_timestamp = Some(ts),
                    LineClass::KillSession { sid, serial } => {
                        let block = extract_kill_block(lines, i, self.kill_block_window);
                        out.kill_sessions.push(KillSession {
                            timestamp: state.current_timestamp(),
                            sid,
                            serial,
                            reason: block.reason,
                            mode: block.mode,
                            requestor: block.requestor,
                            owner: block.owner,
                            result: block.result,
                            trace_file: traces.nearby(i, self.trace_window),
                            source: line.source.clone(),
                            raw_line: text.to_string(),
                            full_block: block.lines.join("\n"),
                        });
                    }
                    LineClass::OraCode { code, message } => {
                        if !self.is_excluded(&code) {
                            out.ora_errors.push(OraError {
                                timestamp: state.current_timestamp(),
                                code,
                                message,
                                trace_file: traces.nearby(i, self.trace_window),
                                source: line.source.clone(),
                                raw_line: text.to_string(),
                            });
                        }
                    }
                    LineClass::Warning => {
                        out.warnings.push(Warning {
                            timestamp: state.current_timestamp(),
                            message: text.trim().to_string(),
                            trace_file: traces.nearby(i, self.trace_window),
                            source: line.source.clone(),
                            raw_line: text.to_string(),
                        });
                    }
                }
                state
            });

        debug!(
            "Scanned {} lines ({} trace refs, last timestamp {:?}): {} ORA errors, {} warnings, {} kill sessions",
            lines.len(),
            traces.len(),
            final_state.last_timestamp,
            out.ora_errors.len(),
            out.warnings.len(),
            out.kill_sessions.len()
        );
        out
    }

    /// Scan every source of the set independently and concatenate the results in set order.
    pub fn extract_set(&self, set: &AlertLogSet) -> Extraction {
        let mut combined = Extraction::default();
        for (name, lines) in set.iter() {
            debug!("Extracting events from {}", name);
            combined.extend(self.extract(lines));
        }
        combined
    }
}
