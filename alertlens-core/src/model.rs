use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder used whenever a field cannot be located within its search window.
pub const NOT_FOUND: &str = "Not Found";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OraError {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "ORA Error")]
    pub code: String,
    /// Text following the code on the same line, possibly empty.
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "Trace File")]
    pub trace_file: String,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Raw Line")]
    pub raw_line: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Warning Message")]
    pub message: String,
    #[serde(rename = "Trace File")]
    pub trace_file: String,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Raw Line")]
    pub raw_line: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillSession {
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "SID")]
    pub sid: String,
    #[serde(rename = "Serial#")]
    pub serial: String,
    #[serde(rename = "Reason")]
    pub reason: String,
    #[serde(rename = "Mode")]
    pub mode: String,
    #[serde(rename = "Requestor")]
    pub requestor: String,
    #[serde(rename = "Owner")]
    pub owner: String,
    #[serde(rename = "Result")]
    pub result: String,
    #[serde(rename = "Trace File")]
    pub trace_file: String,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "Raw Line")]
    pub raw_line: String,
    /// Every scanned line of the block, joined with `\n`.
    #[serde(rename = "Full Block")]
    pub full_block: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InstanceEventKind {
    Startup,
    Shutdown,
    Crash,
    Alter,
    Resize,
}

impl InstanceEventKind {
    pub const ALL: [InstanceEventKind; 5] = [
        InstanceEventKind::Startup,
        InstanceEventKind::Shutdown,
        InstanceEventKind::Alter,
        InstanceEventKind::Resize,
        InstanceEventKind::Crash,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            InstanceEventKind::Startup => "Startup Events",
            InstanceEventKind::Shutdown => "Shutdown Events",
            InstanceEventKind::Crash => "Crash Events",
            InstanceEventKind::Alter => "Alter Commands",
            InstanceEventKind::Resize => "Resize Commands",
        }
    }
}

impl fmt::Display for InstanceEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceEventKind::Startup => write!(f, "STARTUP"),
            InstanceEventKind::Shutdown => write!(f, "SHUTDOWN"),
            InstanceEventKind::Crash => write!(f, "CRASH"),
            InstanceEventKind::Alter => write!(f, "ALTER"),
            InstanceEventKind::Resize => write!(f, "RESIZE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceEvent {
    #[serde(rename = "Kind")]
    pub kind: InstanceEventKind,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Line")]
    pub line_text: String,
    #[serde(rename = "Index")]
    pub line_index: usize,
    #[serde(rename = "Source")]
    pub source: String,
}

/// One extracted record, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ExtractedEvent {
    OraError(OraError),
    Warning(Warning),
    KillSession(KillSession),
    Instance(InstanceEvent),
}

impl ExtractedEvent {
    pub fn timestamp(&self) -> &str {
        match self {
            ExtractedEvent::OraError(e) => &e.timestamp,
            ExtractedEvent::Warning(e) => &e.timestamp,
            ExtractedEvent::KillSession(e) => &e.timestamp,
            ExtractedEvent::Instance(e) => &e.timestamp,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            ExtractedEvent::OraError(e) => &e.source,
            ExtractedEvent::Warning(e) => &e.source,
            ExtractedEvent::KillSession(e) => &e.source,
            ExtractedEvent::Instance(e) => &e.source,
        }
    }
}

/// Output of one extraction pass, each collection in line order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub ora_errors: Vec<OraError>,
    pub warnings: Vec<Warning>,
    pub kill_sessions: Vec<KillSession>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.ora_errors.is_empty() && self.warnings.is_empty() && self.kill_sessions.is_empty()
    }

    pub fn extend(&mut self, other: Extraction) {
        self.ora_errors.extend(other.ora_errors);
        self.warnings.extend(other.warnings);
        self.kill_sessions.extend(other.kill_sessions);
    }

    /// Keeps only the events whose `source` equals `name`.
    pub fn for_source(&self, name: &str) -> Extraction {
        Extraction {
            ora_errors: self.ora_errors.iter().filter(|e| e.source == name).cloned().collect(),
            warnings: self.warnings.iter().filter(|e| e.source == name).cloned().collect(),
            kill_sessions: self
                .kill_sessions
                .iter()
                .filter(|e| e.source == name)
                .cloned()
                .collect(),
        }
    }

    pub fn events(&self) -> impl Iterator<Item = ExtractedEvent> + '_ {
        self.ora_errors
            .iter()
            .cloned()
            .map(ExtractedEvent::OraError)
            .chain(self.warnings.iter().cloned().map(ExtractedEvent::Warning))
            .chain(self.kill_sessions.iter().cloned().map(ExtractedEvent::KillSession))
    }
}
