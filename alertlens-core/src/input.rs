use crate::error::{AlertLensError, Result};
use encoding_rs::UTF_8;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// One line of an alert log, immutable once ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub text: String,
    /// 0-based position within its source.
    pub index: usize,
    pub source: String,
}

impl LogLine {
    pub fn from_strings<S: AsRef<str>>(source: &str, lines: &[S]) -> Vec<LogLine> {
        lines
            .iter()
            .enumerate()
            .map(|(index, text)| LogLine {
                text: text.as_ref().to_string(),
                index,
                source: source.to_string(),
            })
            .collect()
    }
}

/// Decode raw bytes as UTF-8, replacing invalid sequences instead of rejecting them.
///
/// Lines end at `\n`, `\r\n` or a bare `\r`.
pub fn decode_lines(data: &[u8]) -> Vec<String> {
    let (text, had_errors) = UTF_8.decode_with_bom_removal(data);
    if had_errors {
        warn!("Input contained invalid UTF-8 sequences; they were replaced");
    }

    let text = text.replace("\r\n", "\n");
    let mut lines: Vec<String> = text.split(['\n', '\r']).map(str::to_string).collect();
    if text.is_empty() || text.ends_with(['\n', '\r']) {
        lines.pop();
    }
    lines
}

pub fn read_log_file(file_path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = file_path.as_ref();
    info!("Reading log file: {}", path.display());

    let data = fs::read(path).map_err(|source| AlertLensError::Io {
        path: path.display().to_string(),
        source,
    })?;
    debug!("Read {} bytes from file {}", data.len(), path.display());

    let lines = decode_lines(&data);
    debug!("Decoded {} lines from file {}", lines.len(), path.display());
    Ok(lines)
}

/// Named collection of uploaded alert logs, in upload order.
#[derive(Debug, Clone, Default)]
pub struct AlertLogSet {
    sources: Vec<(String, Vec<LogLine>)>,
}

impl AlertLogSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a source; an existing source with the same name is replaced in place.
    pub fn insert<S: AsRef<str>>(&mut self, name: &str, lines: &[S]) {
        let lines = LogLine::from_strings(name, lines);
        match self.sources.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = lines,
            None => self.sources.push((name.to_string(), lines)),
        }
    }

    pub fn insert_bytes(&mut self, name: &str, data: &[u8]) {
        let lines = decode_lines(data);
        self.insert(name, &lines);
    }

    /// Reads each path and registers it under its file name. A file name
    /// that is already taken falls back to the full path, then to a
    /// numbered suffix, so every path becomes its own source.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut set = AlertLogSet::new();
        for path in paths {
            let path = path.as_ref();
            let lines = read_log_file(path)?;
            let name = set.unique_name(path);
            set.insert(&name, &lines);
        }
        info!("Loaded {} alert log source(s)", set.len());
        Ok(set)
    }

    fn unique_name(&self, path: &Path) -> String {
        let full = path.display().to_string();
        let preferred = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| full.clone());

        if self.get(&preferred).is_none() {
            return preferred;
        }
        warn!("Source name {} is already loaded; using {}", preferred, full);
        if self.get(&full).is_none() {
            return full;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{} ({})", full, n);
            if self.get(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn get(&self, name: &str) -> Option<&[LogLine]> {
        self.sources
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, lines)| lines.as_slice())
    }

    pub fn require(&self, name: &str) -> Result<&[LogLine]> {
        self.get(name)
            .ok_or_else(|| AlertLensError::UnknownSource(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[LogLine])> {
        self.sources.iter().map(|(n, l)| (n.as_str(), l.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
