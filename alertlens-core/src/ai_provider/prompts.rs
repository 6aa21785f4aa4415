use crate::config::{AiSettings, DEFAULT_MAX_PROMPT_CHARS};
use crate::filter::TimeRange;
use crate::input::LogLine;
use crate::model::{Extraction, OraError};
use crate::patterns::ORA_MENTION;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

pub const SYSTEM_PROMPT: &str = "You are an Oracle DBA expert. Analyze ONLY the provided alert log text. \
Do NOT invent or assume additional ORA errors not present in the provided logs. \
If no ORA or warnings exist in the supplied segment, explicitly state that. \
Provide a concise summary suitable for production DBAs (3–5 sentences).";

pub const NO_ORA_ERRORS: &str = "No ORA errors in selected segment";

pub const ACCURACY_NOTE: &str = "\n\n**⚠️ Note:** Since the recommendations are generated through AI-based analysis, they may not always be fully accurate. For validation and further details, please refer to the official Oracle Support documentation and knowledge base articles linked below.";

/// Lines of context kept before the matched line; after it, one more.
const CONTEXT_BEFORE: usize = 3;
const CONTEXT_AFTER: usize = 4;

pub struct PromptBuilder {
    max_prompt_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PROMPT_CHARS)
    }
}

impl PromptBuilder {
    pub fn new(max_prompt_chars: usize) -> Self {
        Self { max_prompt_chars }
    }

    pub fn from_settings(settings: &AiSettings) -> Self {
        Self::new(settings.max_prompt_chars)
    }

    /// `{timestamp} - {code}` per ORA error of `source`.
    pub fn error_summary(&self, source: &str, errors: &[OraError]) -> String {
        let lines: Vec<String> = errors
            .iter()
            .filter(|e| e.source == source)
            .map(|e| format!("{} - {}", e.timestamp, e.code))
            .collect();
        if lines.is_empty() {
            NO_ORA_ERRORS.to_string()
        } else {
            lines.join("\n")
        }
    }

    /// Builds the alert log extract sent with the prompt.
    ///
    /// With a filtered segment, every ORA and warning row of `source` pulls
    /// in the lines around the first line containing its raw text. The whole
    /// source is used when nothing was filtered in or nothing matched.
    pub fn context_snippet(&self, source: &str, lines: &[LogLine], filtered: Option<&Extraction>) -> String {
        let mut snippet: Vec<&str> = Vec::new();

        if let Some(filtered) = filtered.filter(|f| !f.ora_errors.is_empty() || !f.warnings.is_empty()) {
            let raw_lines = filtered
                .ora_errors
                .iter()
                .filter(|e| e.source == source)
                .map(|e| e.raw_line.as_str())
                .chain(
                    filtered
                        .warnings
                        .iter()
                        .filter(|w| w.source == source)
                        .map(|w| w.raw_line.as_str()),
                );

            for raw in raw_lines.filter(|raw| !raw.is_empty()) {
                match lines.iter().position(|l| l.text.contains(raw)) {
                    Some(idx) => {
                        let start = idx.saturating_sub(CONTEXT_BEFORE);
                        let end = (idx + CONTEXT_AFTER).min(lines.len());
                        snippet.extend(lines[start..end].iter().map(|l| l.text.as_str()));
                    }
                    None => snippet.push(raw),
                }
            }
        }

        if snippet.is_empty() {
            snippet = lines.iter().map(|l| l.text.as_str()).collect();
        }

        truncate_chars(&snippet.join("\n"), self.max_prompt_chars)
    }

    /// Returns `None` when the instruction is blank or there is no log
    /// content to send.
    pub fn build(
        &self,
        instruction: &str,
        source: &str,
        lines: &[LogLine],
        filtered: &Extraction,
        use_filtered: bool,
    ) -> Option<String> {
        if instruction.trim().is_empty() {
            return None;
        }

        let snippet = self.context_snippet(source, lines, use_filtered.then_some(filtered));
        if snippet.trim().is_empty() {
            return None;
        }

        let summary = self.error_summary(source, &filtered.ora_errors);
        debug!("Built prompt for {} with a {} char extract", source, snippet.chars().count());

        Some(format!(
            "You are an Oracle Performance Expert analyzing the following alert log segment.\n\
             User instruction:\n{}\n\n\
             Detected ORA Errors:\n{}\n\n\
             Alert Log Extract:\n{}\n",
            instruction, summary, snippet
        ))
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

pub fn support_link(code: &str) -> String {
    format!("https://www.google.com/search?q={}+site:support.oracle.com", code)
}

/// Markdown block with one support link per distinct ORA code in `prompt`,
/// sorted; empty when the prompt names no code.
pub fn support_links(prompt: &str) -> String {
    let codes: BTreeSet<&str> = ORA_MENTION.find_iter(prompt).map(|m| m.as_str()).collect();
    if codes.is_empty() {
        return String::new();
    }

    let mut block = vec!["\n\n### 🔗 Related Oracle Support Links".to_string()];
    block.extend(
        codes
            .iter()
            .map(|code| format!("- **{}** → [Oracle Support]({})", code, support_link(code))),
    );
    block.join("\n")
}

pub fn format_summary(summary: &str, prompt: &str) -> String {
    format!(
        "### 🧠 AI Summary\n{}{}{}",
        summary.trim(),
        ACCURACY_NOTE,
        support_links(prompt)
    )
}

/// Summaries already produced in this session, keyed by request.
#[derive(Debug, Clone, Default)]
pub struct SummaryCache {
    entries: HashMap<String, String>,
}

impl SummaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(source: &str, instruction: &str, use_filtered: bool, range: Option<&TimeRange>) -> String {
        let (start, end) = range
            .map(|r| (r.start().to_rfc3339(), r.end().to_rfc3339()))
            .unwrap_or_default();
        format!(
            "{}||{}||{}||{}||{}",
            source,
            instruction.trim(),
            use_filtered,
            start,
            end
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: String, summary: String) {
        self.entries.insert(key, summary);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Warning, NOT_FOUND};
    use chrono::DateTime;

    fn ora(source: &str, timestamp: &str, code: &str, raw: &str) -> OraError {
        OraError {
            timestamp: timestamp.to_string(),
            code: code.to_string(),
            message: String::new(),
            trace_file: NOT_FOUND.to_string(),
            source: source.to_string(),
            raw_line: raw.to_string(),
        }
    }

    fn numbered_lines(n: usize) -> Vec<LogLine> {
        let text: Vec<String> = (0..n).map(|i| format!("line {:02}", i)).collect();
        LogLine::from_strings("a.log", &text)
    }

    #[test]
    fn test_error_summary_per_source() {
        let builder = PromptBuilder::default();
        let errors = vec![
            ora("a.log", "2025-10-14T18:32:05.1+05:30", "ORA-00600", ""),
            ora("b.log", NOT_FOUND, "ORA-01555", ""),
            ora("a.log", NOT_FOUND, "ORA-04031", ""),
        ];
        assert_eq!(
            builder.error_summary("a.log", &errors),
            "2025-10-14T18:32:05.1+05:30 - ORA-00600\nNot Found - ORA-04031"
        );
        assert_eq!(builder.error_summary("c.log", &errors), NO_ORA_ERRORS);
    }

    #[test]
    fn test_context_window_around_filtered_rows() {
        let lines = numbered_lines(20);
        let filtered = Extraction {
            ora_errors: vec![ora("a.log", NOT_FOUND, "ORA-00600", "line 10"), ora("b.log", NOT_FOUND, "ORA-00600", "line 02")],
            warnings: vec![Warning {
                timestamp: NOT_FOUND.to_string(),
                message: "line 01".to_string(),
                trace_file: NOT_FOUND.to_string(),
                source: "a.log".to_string(),
                raw_line: "line 01".to_string(),
            }],
            ..Default::default()
        };
        let snippet = PromptBuilder::default().context_snippet("a.log", &lines, Some(&filtered));
        assert_eq!(
            snippet,
            "line 07\nline 08\nline 09\nline 10\nline 11\nline 12\nline 13\nline 00\nline 01\nline 02\nline 03\nline 04"
        );
    }

    #[test]
    fn test_context_falls_back_to_whole_source() {
        let lines = numbered_lines(3);
        let builder = PromptBuilder::default();
        let whole = "line 00\nline 01\nline 02";

        assert_eq!(builder.context_snippet("a.log", &lines, None), whole);
        assert_eq!(builder.context_snippet("a.log", &lines, Some(&Extraction::default())), whole);

        // rows exist, but none for this source
        let other = Extraction {
            ora_errors: vec![ora("b.log", NOT_FOUND, "ORA-00600", "line 01")],
            ..Default::default()
        };
        assert_eq!(builder.context_snippet("a.log", &lines, Some(&other)), whole);

        // unmatched raw text is sent as-is
        let unmatched = Extraction {
            ora_errors: vec![ora("a.log", NOT_FOUND, "ORA-00600", "ORA-00600 gone")],
            ..Default::default()
        };
        assert_eq!(builder.context_snippet("a.log", &lines, Some(&unmatched)), "ORA-00600 gone");
    }

    #[test]
    fn test_snippet_truncated_by_chars() {
        let lines = LogLine::from_strings("a.log", &["ééééé", "abc"]);
        let snippet = PromptBuilder::new(7).context_snippet("a.log", &lines, None);
        assert_eq!(snippet, "ééééé\na");
    }

    #[test]
    fn test_build_prompt() {
        let lines = LogLine::from_strings("a.log", &["ORA-00600: internal error code"]);
        let filtered = Extraction {
            ora_errors: vec![ora("a.log", NOT_FOUND, "ORA-00600", "ORA-00600: internal error code")],
            ..Default::default()
        };
        let builder = PromptBuilder::default();
        let prompt = builder
            .build("Check for performance issues", "a.log", &lines, &filtered, true)
            .unwrap();
        assert!(prompt.starts_with("You are an Oracle Performance Expert"));
        assert!(prompt.contains("User instruction:\nCheck for performance issues\n\n"));
        assert!(prompt.contains("Detected ORA Errors:\nNot Found - ORA-00600\n\n"));
        assert!(prompt.ends_with("Alert Log Extract:\nORA-00600: internal error code\n"));

        assert_eq!(builder.build("   ", "a.log", &lines, &filtered, true), None);
        assert_eq!(builder.build("Check", "a.log", &[], &Extraction::default(), false), None);
    }

    #[test]
    fn test_support_links_are_distinct_and_sorted() {
        let links = support_links("ORA-04031 then ORA-00600 and ORA-04031 again, ORA-1 ignored");
        assert_eq!(
            links,
            "\n\n### 🔗 Related Oracle Support Links\n\
             - **ORA-00600** → [Oracle Support](https://www.google.com/search?q=ORA-00600+site:support.oracle.com)\n\
             - **ORA-04031** → [Oracle Support](https://www.google.com/search?q=ORA-04031+site:support.oracle.com)"
        );
        assert_eq!(support_links("no codes here"), "");
    }

    #[test]
    fn test_format_summary() {
        let text = format_summary("  Instance healthy.  ", "no codes");
        assert_eq!(text, format!("### 🧠 AI Summary\nInstance healthy.{}", ACCURACY_NOTE));
    }

    #[test]
    fn test_cache_key_and_lookup() {
        let range = TimeRange::new(
            DateTime::parse_from_rfc3339("2025-10-14T18:00:00+05:30").unwrap(),
            DateTime::parse_from_rfc3339("2025-10-14T19:00:00+05:30").unwrap(),
        )
        .unwrap();
        let key = SummaryCache::key("a.log", "  Check  ", true, Some(&range));
        assert_eq!(
            key,
            "a.log||Check||true||2025-10-14T18:00:00+05:30||2025-10-14T19:00:00+05:30"
        );
        assert_eq!(SummaryCache::key("a.log", "Check", false, None), "a.log||Check||false||||");

        let mut cache = SummaryCache::new();
        assert!(cache.get(&key).is_none());
        cache.insert(key.clone(), "cached".to_string());
        assert_eq!(cache.get(&key), Some("cached"));
        assert_eq!(cache.len(), 1);
    }
}
