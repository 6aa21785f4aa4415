use crate::patterns;

/// Result of matching a single line against the pattern registry.
///
/// A line gets at most one class. Checks run in priority order and the
/// first match wins: blank, timestamp, kill session, ORA code, warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    Blank,
    Timestamp(String),
    KillSession { sid: String, serial: String },
    OraCode { code: String, message: String },
    Warning,
    NoMatch,
}

pub fn classify_line(line: &str) -> LineClass {
    if line.trim().is_empty() {
        return LineClass::Blank;
    }

    if let Some(ts) = patterns::find_timestamp(line) {
        return LineClass::Timestamp(ts.to_string());
    }

    if let Some((sid, serial)) = patterns::match_kill_session(line) {
        return LineClass::KillSession { sid, serial };
    }

    if let Some((code, message)) = patterns::match_ora_code(line) {
        return LineClass::OraCode { code, message };
    }

    if patterns::is_warning(line) {
        return LineClass::Warning;
    }

    LineClass::NoMatch
}
