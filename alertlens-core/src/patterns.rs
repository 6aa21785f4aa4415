// Pattern registry for Oracle alert log lines.
//
// Every pattern is compiled once and is a pure function of its input line,
// so lines can be matched from any thread.

use regex::Regex;
use std::sync::LazyLock;

/// ISO-8601 timestamp with fractional seconds and an explicit offset,
/// e.g. `2025-10-14T18:32:05.123456+05:30`.
pub static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d+(?:[+\-]\d{2}:\d{2}))")
        .expect("Failed to compile timestamp regex")
});

pub static ORA_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bORA-(\d{3,5}):?\s*(.*)").expect("Failed to compile ORA code regex")
});

/// Bare ORA code mention, used when scanning free text such as prompts.
pub static ORA_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bORA-\d{3,5}\b").expect("Failed to compile ORA mention regex")
});

pub static WARNING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bwarning\b").expect("Failed to compile warning regex")
});

pub static TRACE_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(/[\w/.\-+]*\.trc)").expect("Failed to compile trace file regex")
});

pub static KILL_SESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)KILL SESSION for sid=\((\d+),\s*(\d+)\)")
        .expect("Failed to compile kill session regex")
});

pub static INSTANCE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Instance\s+name[:\s]*([A-Za-z0-9_\-.]+)")
        .expect("Failed to compile instance name regex")
});

pub static HOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Host\s*[:=]\s*([A-Za-z0-9\-._]+)").expect("Failed to compile host regex")
});

pub static RELEASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(Release\s+\d+(?:\.\d+)*)").expect("Failed to compile release regex")
});

pub static STARTUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(Starting\s+ORACLE\s+instance|PMON has started|Starting up ORACLE)")
        .expect("Failed to compile startup regex")
});

pub static SHUTDOWN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(Shutting down|shutdown\s+complete|Shutdown\s+normal)")
        .expect("Failed to compile shutdown regex")
});

pub static CRASH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(Instance terminated|terminated abnormally|abort|crash|ORA-00600|ORA-07445|core dump|ORA-609)",
    )
    .expect("Failed to compile crash regex")
});

pub static ALTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bALTER\s+[A-Z_]+\b").expect("Failed to compile ALTER regex")
});

pub static RESIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bRESIZE\b").expect("Failed to compile RESIZE regex")
});

pub fn find_timestamp(line: &str) -> Option<&str> {
    TIMESTAMP
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn find_trace_file(line: &str) -> Option<&str> {
    TRACE_FILE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Returns `(sid, serial)` for a `KILL SESSION for sid=(..)` marker.
pub fn match_kill_session(line: &str) -> Option<(String, String)> {
    let caps = KILL_SESSION.captures(line)?;
    Some((caps[1].to_string(), caps[2].to_string()))
}

/// Returns `(code, trailing message)` where code is `ORA-<digits>`.
pub fn match_ora_code(line: &str) -> Option<(String, String)> {
    let caps = ORA_CODE.captures(line)?;
    let code = format!("ORA-{}", &caps[1]);
    let message = caps
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    Some((code, message))
}

pub fn is_warning(line: &str) -> bool {
    WARNING.is_match(line)
}

pub fn find_instance_name(line: &str) -> Option<&str> {
    INSTANCE_NAME.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
}

pub fn find_host(line: &str) -> Option<&str> {
    HOST.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
}

pub fn find_release(line: &str) -> Option<&str> {
    RELEASE.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
}
