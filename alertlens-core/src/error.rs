use thiserror::Error;

/// Errors raised at the library boundary.
///
/// Extraction itself never fails; these only come from ingestion,
/// configuration and caller-supplied arguments.
#[derive(Error, Debug)]
pub enum AlertLensError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("Invalid UTC offset: {0}")]
    InvalidOffset(String),
    #[error("Unrecognized timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("Invalid time range: start {start} is after end {end}")]
    InvalidTimeRange { start: String, end: String },
    #[error("Unknown log source: {0}")]
    UnknownSource(String),
}

pub type Result<T> = std::result::Result<T, AlertLensError>;
