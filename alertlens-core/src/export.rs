// Tabular records for an external exporter.
//
// Nothing here writes a file. Each sheet is a header row plus string cells
// that a spreadsheet or CSV writer can serialize as-is.

use crate::model::{Extraction, KillSession, OraError, Warning};
use crate::timestamp::TimestampNormalizer;
use serde::{Deserialize, Serialize};

pub const PARSED_TIMESTAMP_COLUMN: &str = "ParsedTimestamp";
/// Wall-clock format used once the offset has been stripped.
pub const PARSED_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    fn new(name: &str, columns: &[&str]) -> Self {
        let mut columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        columns.push(PARSED_TIMESTAMP_COLUMN.to_string());
        Self {
            name: name.to_string(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Timestamp cell for the exporter: the normalized instant in its own
/// offset's wall clock with the offset dropped, or empty.
pub fn parsed_timestamp_cell(value: &str, normalizer: &TimestampNormalizer) -> String {
    normalizer
        .normalize(value)
        .map(|dt| dt.naive_local().format(PARSED_TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

fn ora_sheet(errors: &[OraError], normalizer: &TimestampNormalizer) -> Sheet {
    let mut sheet = Sheet::new(
        "ORA_Errors",
        &["Timestamp", "ORA Error", "Message", "Trace File", "Source", "Raw Line"],
    );
    sheet.rows = errors
        .iter()
        .map(|e| {
            vec![
                e.timestamp.clone(),
                e.code.clone(),
                e.message.clone(),
                e.trace_file.clone(),
                e.source.clone(),
                e.raw_line.clone(),
                parsed_timestamp_cell(&e.timestamp, normalizer),
            ]
        })
        .collect();
    sheet
}

fn warning_sheet(warnings: &[Warning], normalizer: &TimestampNormalizer) -> Sheet {
    let mut sheet = Sheet::new(
        "Warnings",
        &["Timestamp", "Warning Message", "Trace File", "Source", "Raw Line"],
    );
    sheet.rows = warnings
        .iter()
        .map(|w| {
            vec![
                w.timestamp.clone(),
                w.message.clone(),
                w.trace_file.clone(),
                w.source.clone(),
                w.raw_line.clone(),
                parsed_timestamp_cell(&w.timestamp, normalizer),
            ]
        })
        .collect();
    sheet
}

fn kill_sheet(sessions: &[KillSession], normalizer: &TimestampNormalizer) -> Sheet {
    let mut sheet = Sheet::new(
        "Kill_Sessions",
        &[
            "Timestamp",
            "SID",
            "Serial#",
            "Reason",
            "Mode",
            "Requestor",
            "Owner",
            "Result",
            "Trace File",
            "Source",
            "Raw Line",
            "Full Block",
        ],
    );
    sheet.rows = sessions
        .iter()
        .map(|k| {
            vec![
                k.timestamp.clone(),
                k.sid.clone(),
                k.serial.clone(),
                k.reason.clone(),
                k.mode.clone(),
                k.requestor.clone(),
                k.owner.clone(),
                k.result.clone(),
                k.trace_file.clone(),
                k.source.clone(),
                k.raw_line.clone(),
                k.full_block.clone(),
                parsed_timestamp_cell(&k.timestamp, normalizer),
            ]
        })
        .collect();
    sheet
}

/// One sheet per non-empty collection, in the order ORA errors, warnings,
/// kill sessions.
pub fn build_sheets(extraction: &Extraction, normalizer: &TimestampNormalizer) -> Vec<Sheet> {
    [
        ora_sheet(&extraction.ora_errors, normalizer),
        warning_sheet(&extraction.warnings, normalizer),
        kill_sheet(&extraction.kill_sessions, normalizer),
    ]
    .into_iter()
    .filter(|sheet| !sheet.is_empty())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NOT_FOUND;

    fn ora(timestamp: &str) -> OraError {
        OraError {
            timestamp: timestamp.to_string(),
            code: "ORA-00600".to_string(),
            message: "internal error code".to_string(),
            trace_file: "/u01/trace/ORCL_ora_1.trc".to_string(),
            source: "alert_ORCL.log".to_string(),
            raw_line: "ORA-00600: internal error code".to_string(),
        }
    }

    #[test]
    fn test_offset_is_stripped_from_parsed_timestamp() {
        let normalizer = TimestampNormalizer::default();
        let test_cases = vec![
            ("2025-10-14T18:32:05.123456+05:30", "2025-10-14 18:32:05.123456"),
            ("2025-10-14T18:32:05.5-07:00", "2025-10-14 18:32:05.500"),
            ("2025-10-14 18:32:05", "2025-10-14 18:32:05"),
            (NOT_FOUND, ""),
        ];
        for (input, expected) in test_cases {
            assert_eq!(parsed_timestamp_cell(input, &normalizer), expected, "Failed for input: '{}'", input);
        }
    }

    #[test]
    fn test_empty_collections_are_omitted() {
        let extraction = Extraction {
            ora_errors: vec![ora("2025-10-14T18:32:05.123456+05:30"), ora(NOT_FOUND)],
            ..Default::default()
        };
        let sheets = build_sheets(&extraction, &TimestampNormalizer::default());
        assert_eq!(sheets.len(), 1);

        let sheet = &sheets[0];
        assert_eq!(sheet.name, "ORA_Errors");
        assert_eq!(sheet.columns.last().map(String::as_str), Some(PARSED_TIMESTAMP_COLUMN));
        assert_eq!(sheet.len(), 2);
        for row in &sheet.rows {
            assert_eq!(row.len(), sheet.columns.len());
        }
        let trace = sheet.column_index("Trace File").unwrap();
        assert_eq!(sheet.rows[0][trace], "/u01/trace/ORCL_ora_1.trc");
        let parsed = sheet.column_index(PARSED_TIMESTAMP_COLUMN).unwrap();
        assert_eq!(sheet.rows[1][parsed], "");

        assert!(build_sheets(&Extraction::default(), &TimestampNormalizer::default()).is_empty());
    }
}
