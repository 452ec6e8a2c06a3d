use super::export::RunSummary;
use super::record::{FeatureLogRecord, SystemLogRecord};
use super::writer::{CsvDiagnosticsLogger, DiagnosticsSink};
use crate::logic::config::{DetectorConfig, FeatureSpec};
use crate::logic::features::FeatureTable;
use chrono::Utc;
use std::fs;
use tempfile::tempdir;

fn features() -> FeatureTable {
    let config = DetectorConfig {
        features: vec![
            FeatureSpec::new("SeaGuard_Temp_Sensor.Value", 0.0, 10.0, 0.04),
            FeatureSpec::new("pressure_pressure", 0.0, 10.0, 0.02),
        ],
        ..Default::default()
    };
    FeatureTable::from_config(&config).unwrap()
}

fn predicted_row(idx: usize, threshold: f64) -> FeatureLogRecord {
    FeatureLogRecord {
        idx,
        observed: Some(5.0),
        predicted: Some(5.5),
        lower_bound: Some(3.5),
        upper_bound: Some(7.5),
        is_anomalous: false,
        error: Some(0.0025),
        threshold,
    }
}

#[test]
fn test_logger_writes_headers_on_create() {
    let dir = tempdir().unwrap();
    let logger = CsvDiagnosticsLogger::create(dir.path(), &features()).unwrap();
    assert_eq!(logger.rows_written(), 0);

    let feature_log = fs::read_to_string(dir.path().join("Temp_Value_log.csv")).unwrap();
    assert_eq!(
        feature_log,
        "idx,observed,predicted,lower_bound,upper_bound,is_anomalous,error,threshold\n"
    );

    let system_log = fs::read_to_string(dir.path().join("system_log.csv")).unwrap();
    assert_eq!(system_log, "idx,is_anomalous,error,threshold\n");
}

#[test]
fn test_logger_appends_rows() {
    let dir = tempdir().unwrap();
    let mut logger = CsvDiagnosticsLogger::create(dir.path(), &features()).unwrap();

    let rows = vec![predicted_row(17, 0.04), predicted_row(17, 0.02)];
    let system = SystemLogRecord { idx: 17, is_anomalous: false, error: Some(0.00125), threshold: 0.019 };
    logger.record(&rows, &system).unwrap();

    let feature_log = fs::read_to_string(dir.path().join("pressure_pressure_log.csv")).unwrap();
    let lines: Vec<&str> = feature_log.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1], "17,5.0,5.5,3.5,7.5,false,0.002500,0.020000");

    let system_log = fs::read_to_string(dir.path().join("system_log.csv")).unwrap();
    assert_eq!(system_log.lines().nth(1), Some("17,false,0.001250,0.019000"));
    assert_eq!(logger.rows_written(), 1);
}

#[test]
fn test_fault_row_leaves_prediction_empty() {
    let dir = tempdir().unwrap();
    let mut logger = CsvDiagnosticsLogger::create(dir.path(), &features()).unwrap();

    let fault = FeatureLogRecord {
        idx: 18,
        observed: Some(42.0),
        predicted: None,
        lower_bound: None,
        upper_bound: None,
        is_anomalous: true,
        error: None,
        threshold: 0.04,
    };
    let system = SystemLogRecord { idx: 18, is_anomalous: true, error: None, threshold: 0.019 };
    logger.record(&[fault.clone(), fault], &system).unwrap();

    let feature_log = fs::read_to_string(dir.path().join("Temp_Value_log.csv")).unwrap();
    assert_eq!(feature_log.lines().nth(1), Some("18,42.0,,,,true,,0.040000"));

    let system_log = fs::read_to_string(dir.path().join("system_log.csv")).unwrap();
    assert_eq!(system_log.lines().nth(1), Some("18,true,,0.019000"));
}

#[test]
fn test_create_truncates_previous_logs() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("system_log.csv"), "stale\nrows\n").unwrap();

    CsvDiagnosticsLogger::create(dir.path(), &features()).unwrap();
    let system_log = fs::read_to_string(dir.path().join("system_log.csv")).unwrap();
    assert_eq!(system_log.lines().count(), 1);
}

#[test]
fn test_summary_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("summary.json");
    let table = features();

    let summary = RunSummary {
        started_at: Utc::now(),
        finished_at: Utc::now(),
        data_source: "data.csv".to_string(),
        features: table.names(),
        layout_hash: table.layout_hash(),
        samples_seen: 40,
        streaming_samples: 24,
        anomalies: vec![18, 30],
        last_threshold: Some(0.021),
    };
    summary.save(&path).unwrap();

    let loaded = RunSummary::load(&path).unwrap();
    assert_eq!(loaded, summary);
    assert_eq!(loaded.anomaly_count(), 2);
}
