// CLI Tests
// Run the built binary against temporary alert logs

use serde_json::Value;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

const BASELINE_LOG: &str = "\
2025-10-14T18:32:05.123456+05:30
ORA-00600: internal error code, arguments: [kcratr_nab_less_than_odr]
Incident details in: /u01/app/oracle/diag/rdbms/orcl/ORCL1/incident/incdir_1/ORCL1_ora_1_i1.trc
WARNING: Heavy swapping observed on system in last 5 mins.
2025-10-14T18:45:10.000000+05:30
KILL SESSION for sid=(123, 4567):
  Reason = KILL SESSION
  Mode = IMMEDIATE
  Requestor = USER (orapid = 45)
  Owner = Process: USER (orapid = 52)
  Result = ORA-0
2025-10-14T19:05:00.000000+05:30
ORA-04031: unable to allocate 4160 bytes of shared memory
Shutting down instance (immediate)
";

const INCIDENT_LOG: &str = "\
2025-10-15T02:00:00.000000+05:30
ORA-00600: internal error code, arguments: [kcratr_nab_less_than_odr]
ORA-01555: snapshot too old
";

fn write_file(prefix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().prefix(prefix).suffix(".log").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

/// An explicit config keeps the run independent of any user config file.
fn default_config() -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(b"[analysis]\ndefault_offset = \"+05:30\"\n").unwrap();
    file
}

fn alertlens(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_alertlens"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env("RUST_LOG", "error")
        .output()
        .expect("failed to run alertlens")
}

fn path_str(file: &NamedTempFile) -> &str {
    file.path().to_str().unwrap()
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_analyze_json_report() {
    let config = default_config();
    let log = write_file("alert_", BASELINE_LOG);
    let report = stdout_json(&alertlens(config.path(), &["analyze", path_str(&log), "--json"]));

    assert_eq!(report["summary"]["files"], 1);
    assert_eq!(report["summary"]["ora_errors"], 2);
    assert_eq!(report["summary"]["warnings"], 1);
    assert_eq!(report["summary"]["kill_sessions"], 1);
    assert_eq!(report["severity"], "Low");
    assert_eq!(report["events"]["ora_errors"][0]["ORA Error"], "ORA-00600");
    assert_eq!(report["events"]["kill_sessions"][0]["SID"], "123");
    assert_eq!(report["kill_sessions"]["most_common_mode"], "IMMEDIATE");
}

#[test]
fn test_analyze_applies_filters() {
    let config = default_config();
    let log = write_file("alert_", BASELINE_LOG);

    let report = stdout_json(&alertlens(
        config.path(),
        &["analyze", path_str(&log), "--search", "ora-04031", "--json"],
    ));
    assert_eq!(report["summary"]["ora_errors"], 1);
    assert_eq!(report["events"]["ora_errors"][0]["ORA Error"], "ORA-04031");
    assert_eq!(report["summary"]["warnings"], 0);

    let report = stdout_json(&alertlens(
        config.path(),
        &["analyze", path_str(&log), "--from", "2025-10-14 18:40", "--to", "2025-10-14 18:50", "--json"],
    ));
    assert_eq!(report["summary"]["ora_errors"], 0);
    assert_eq!(report["summary"]["kill_sessions"], 1);
}

#[test]
fn test_compare_two_logs() {
    let config = default_config();
    let baseline = write_file("baseline_", BASELINE_LOG);
    let incident = write_file("incident_", INCIDENT_LOG);
    let result = stdout_json(&alertlens(
        config.path(),
        &["compare", path_str(&baseline), path_str(&incident), "--json"],
    ));

    let keys: Vec<&str> = result["counts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["ORA-00600", "ORA-01555", "ORA-04031"]);
    assert_eq!(result["new_in_b"][0]["ORA Error"], "ORA-01555");
    assert_eq!(result["new_in_a"][0]["ORA Error"], "ORA-04031");
}

#[test]
fn test_export_sheets() {
    let config = default_config();
    let log = write_file("alert_", INCIDENT_LOG);
    let sheets = stdout_json(&alertlens(config.path(), &["export", path_str(&log)]));

    let sheets = sheets.as_array().unwrap();
    assert_eq!(sheets.len(), 1);
    assert_eq!(sheets[0]["name"], "ORA_Errors");
    let columns = sheets[0]["columns"].as_array().unwrap();
    assert!(columns.iter().any(|c| c == "ParsedTimestamp"));
    assert_eq!(sheets[0]["rows"].as_array().unwrap().len(), 2);
}

#[test]
fn test_instances_and_frequency_text() {
    let config = default_config();
    let log = write_file("alert_", BASELINE_LOG);

    let output = alertlens(config.path(), &["instances", path_str(&log)]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Shutting down instance (immediate)"));

    let output = alertlens(config.path(), &["frequency", path_str(&log)]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2025-10-14 18:00"));
    assert!(stdout.contains("ORA-04031"));
}

#[test]
fn test_frequency_applies_filters_and_source() {
    let config = default_config();
    let baseline = write_file("baseline_", BASELINE_LOG);
    let incident = write_file("incident_", INCIDENT_LOG);

    let output = alertlens(
        config.path(),
        &["frequency", path_str(&baseline), "--to", "2025-10-14 18:59"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2025-10-14 18:00"));
    assert!(stdout.contains("ORA-00600"));
    assert!(!stdout.contains("ORA-04031"));

    let output = alertlens(
        config.path(),
        &["frequency", path_str(&baseline), "--search", "ora-04031", "--daily"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ORA-04031"));
    assert!(!stdout.contains("ORA-00600"));

    // A bare date as the upper bound keeps the evening errors of that day.
    let output = alertlens(
        config.path(),
        &["frequency", path_str(&baseline), path_str(&incident), "--to", "2025-10-14"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2025-10-14 19:00"));
    assert!(!stdout.contains("2025-10-15"));

    let incident_name = incident.path().file_name().unwrap().to_str().unwrap();
    let output = alertlens(
        config.path(),
        &["frequency", path_str(&baseline), path_str(&incident), "--source", incident_name],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2025-10-15 02:00"));
    assert!(stdout.contains("ORA-01555"));
    assert!(!stdout.contains("2025-10-14"));

    let output = alertlens(
        config.path(),
        &["frequency", path_str(&baseline), "--source", "alert_unknown.log"],
    );
    assert!(!output.status.success());
}

#[test]
fn test_compare_same_named_logs() {
    let config = default_config();
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let a = first.path().join("alert_ORCL.log");
    let b = second.path().join("alert_ORCL.log");
    std::fs::write(&a, BASELINE_LOG).unwrap();
    std::fs::write(&b, INCIDENT_LOG).unwrap();

    let result = stdout_json(&alertlens(
        config.path(),
        &["compare", a.to_str().unwrap(), b.to_str().unwrap(), "--json"],
    ));
    assert_eq!(result["new_in_b"][0]["ORA Error"], "ORA-01555");
    assert_eq!(result["new_in_a"][0]["ORA Error"], "ORA-04031");
}

#[test]
fn test_errors_exit_non_zero() {
    let config = default_config();
    let output = alertlens(config.path(), &["analyze", "/nonexistent/alert_missing.log"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let log = write_file("alert_", BASELINE_LOG);
    let output = alertlens(config.path(), &["analyze", path_str(&log), "--from", "not a time"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not a time"));
}
