//! Diagnostics writers
//!
//! `CsvDiagnosticsLogger` owns one CSV writer per feature plus the system
//! log. Files are created (truncated) and given their header once, when the
//! logger is built. Every row is flushed so the logs can be tailed while the
//! stream runs.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::constants::SYSTEM_LOG_FILE;
use crate::logic::error::DetectorResult;
use crate::logic::features::FeatureTable;
use super::record::{FeatureLogRecord, SystemLogRecord};

/// Destination of per-sample diagnostics.
///
/// Failures are reported to the caller, which logs them and keeps going.
pub trait DiagnosticsSink {
    fn record(&mut self, features: &[FeatureLogRecord], system: &SystemLogRecord) -> DetectorResult<()>;
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn record(&mut self, _features: &[FeatureLogRecord], _system: &SystemLogRecord) -> DetectorResult<()> {
        Ok(())
    }
}

pub struct CsvDiagnosticsLogger {
    log_dir: PathBuf,
    feature_writers: Vec<csv::Writer<File>>,
    system_writer: csv::Writer<File>,
    rows_written: u64,
}

impl CsvDiagnosticsLogger {
    pub fn create(log_dir: &Path, features: &FeatureTable) -> DetectorResult<Self> {
        fs::create_dir_all(log_dir)?;

        let feature_writers = features
            .iter()
            .map(|feature| open_writer(&log_dir.join(Self::feature_file_name(&feature.short_name()))))
            .collect::<Result<Vec<_>, _>>()?;
        let system_writer = open_writer(&log_dir.join(SYSTEM_LOG_FILE))?;

        let mut logger = Self {
            log_dir: log_dir.to_path_buf(),
            feature_writers,
            system_writer,
            rows_written: 0,
        };
        logger.write_headers()?;

        log::info!(
            "Diagnostics logs opened in {} ({} feature files)",
            logger.log_dir.display(),
            logger.feature_writers.len()
        );
        Ok(logger)
    }

    pub fn feature_file_name(short_name: &str) -> String {
        format!("{}_log.csv", short_name)
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    fn write_headers(&mut self) -> DetectorResult<()> {
        for writer in &mut self.feature_writers {
            writer.write_record([
                "idx",
                "observed",
                "predicted",
                "lower_bound",
                "upper_bound",
                "is_anomalous",
                "error",
                "threshold",
            ])?;
            writer.flush()?;
        }
        self.system_writer.write_record(["idx", "is_anomalous", "error", "threshold"])?;
        self.system_writer.flush()?;
        Ok(())
    }
}

// Headers are written by hand so they exist before the first row.
fn open_writer(path: &Path) -> csv::Result<csv::Writer<File>> {
    csv::WriterBuilder::new().has_headers(false).from_path(path)
}

impl DiagnosticsSink for CsvDiagnosticsLogger {
    fn record(&mut self, features: &[FeatureLogRecord], system: &SystemLogRecord) -> DetectorResult<()> {
        for (writer, row) in self.feature_writers.iter_mut().zip(features) {
            writer.serialize(row)?;
            writer.flush()?;
        }
        self.system_writer.serialize(system)?;
        self.system_writer.flush()?;
        self.rows_written += 1;
        Ok(())
    }
}
