//! Stream driver
//!
//! Opens the data source, resolves the feature layout against its header,
//! wires the detector to the CSV diagnostics logger and feeds every row
//! through it. Ends by writing the run summary next to the logs.

use chrono::Utc;

use crate::constants::SUMMARY_FILE;
use crate::logic::config::DetectorConfig;
use crate::logic::dataset::{CsvDiagnosticsLogger, RunSummary};
use crate::logic::detector::{MlpDetector, Outcome};
use crate::logic::error::DetectorResult;
use crate::logic::features::FeatureTable;
use crate::logic::source::CsvDataSource;

/// Run the detector over the configured data source until it is exhausted
pub fn run(config: &DetectorConfig) -> DetectorResult<RunSummary> {
    config.validate()?;
    let started_at = Utc::now();

    let source = CsvDataSource::open(&config.data_source_path)?;
    let features = FeatureTable::resolve(config, Some(source.headers()))?;
    log::info!(
        "Monitoring {} features (layout {:08x}): {}",
        features.len(),
        features.layout_hash(),
        features.names().join(", ")
    );

    let logger = CsvDiagnosticsLogger::create(&config.log_dir, &features)?;
    let samples = source.samples(&features)?;
    let mut detector = MlpDetector::with_mlp_models(config, features.clone(), Box::new(logger))?;

    let mut samples_seen = 0;
    for sample in samples {
        let sample = sample?;
        samples_seen += 1;

        match detector.process(&sample)? {
            Outcome::Staged { collected, required } if collected == 1 => {
                log::info!("Collecting {} samples for initial training", required);
            }
            Outcome::Trained => log::info!("Initial training done after {} samples", samples_seen),
            Outcome::Verdict(verdict) if verdict.is_anomalous => {
                log::info!("Anomaly at sample {}", verdict.index);
            }
            _ => {}
        }

        if config.progress_every > 0 && samples_seen % config.progress_every == 0 {
            log::info!(
                "Processed {} samples, {} anomalies so far",
                samples_seen,
                detector.anomalies().len()
            );
        }
    }

    if samples_seen < detector.train_size() {
        log::warn!(
            "Data source ended after {} samples, training needs {}",
            samples_seen,
            detector.train_size()
        );
    }

    let summary = RunSummary {
        started_at,
        finished_at: Utc::now(),
        data_source: config.data_source_path.display().to_string(),
        features: features.names(),
        layout_hash: features.layout_hash(),
        samples_seen,
        streaming_samples: detector.streaming_samples(),
        anomalies: detector.anomalies().to_vec(),
        last_threshold: detector.last_threshold(),
    };
    summary.save(&config.log_dir.join(SUMMARY_FILE))?;

    log::info!(
        "Run finished: {} samples, {} anomalies",
        summary.samples_seen,
        summary.anomaly_count()
    );
    Ok(summary)
}
