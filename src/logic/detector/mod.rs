//! Detector - online anomaly detection controller
//!
//! Owns every buffer, the two model collaborators and the diagnostics sink.
//! Lifecycle:
//! - `Initializing`: raw samples are staged until `train_size` is reached
//! - `Trained`: both models fitted, error window seeded from training residuals
//! - `Streaming`: every sample is gated, scored and used for an online update
//!
//! Missing and out-of-range samples never reach the models. They are recorded
//! as anomalies and a zero placeholder keeps the observation indices aligned.

use crate::logic::config::DetectorConfig;
use crate::logic::dataset::{DiagnosticsSink, FeatureLogRecord, SystemLogRecord};
use crate::logic::error::{DetectorError, DetectorResult, ModelError};
use crate::logic::features::{FeatureTable, Normalizer, SensorRangeTable};
use crate::logic::model::{
    Decision, ErrorBreakdown, ErrorThresholdGenerator, ForecastModel, SlidingWindowBuffer,
    ThresholdModel, ThresholdPolicy, WindowForecaster,
};
use crate::logic::source::Sample;


/// Detector wired with the bundled MLP collaborators
pub type MlpDetector = Detector<WindowForecaster, ErrorThresholdGenerator>;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Trained,
    Streaming,
}

/// Why a streaming sample got its verdict
#[derive(Debug, Clone, PartialEq)]
pub enum Reason {
    /// At least one component was missing
    MissingValue { features: Vec<usize> },
    /// At least one component fell outside its plausibility range
    OutOfRange { features: Vec<usize> },
    /// Lookback window still too short after training
    ColdStart,
    /// Forecast was made and scored
    Scored(Decision),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Absolute ObservationWindow index of the sample
    pub index: usize,
    pub is_anomalous: bool,
    pub reason: Reason,
}

/// Result of feeding one sample to `Detector::process`
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Sample staged for the initial training batch
    Staged { collected: usize, required: usize },
    /// Sample completed the training batch and both models were trained
    Trained,
    Verdict(Verdict),
}

/// Training and update hyperparameters, copied out of the configuration
#[derive(Debug, Clone, Copy, PartialEq)]
struct Schedule {
    lookback_len: usize,
    train_size: usize,
    epoch_train: usize,
    lr_train: f64,
    epoch_update: usize,
    lr_update: f64,
    update_g_epoch: usize,
    update_g_lr: f64,
}

impl From<&DetectorConfig> for Schedule {
    fn from(config: &DetectorConfig) -> Self {
        Self {
            lookback_len: config.lookback_len,
            train_size: config.train_size(),
            epoch_train: config.epoch_train,
            lr_train: config.lr_train,
            epoch_update: config.epoch_update,
            lr_update: config.lr_update,
            update_g_epoch: config.update_g_epoch,
            update_g_lr: config.update_g_lr,
        }
    }
}

// ============================================================================
// DETECTOR
// ============================================================================

pub struct Detector<F: ForecastModel, G: ThresholdModel> {
    features: FeatureTable,
    normalizer: Normalizer,
    ranges: SensorRangeTable,
    policy: ThresholdPolicy,
    schedule: Schedule,

    forecaster: F,
    generator: G,
    sink: Box<dyn DiagnosticsSink>,

    phase: Phase,
    staging: Vec<Sample>,
    observations: SlidingWindowBuffer<Vec<f64>>,
    predictions: SlidingWindowBuffer<Vec<f64>>,
    thresholds: SlidingWindowBuffer<f64>,
    errors: SlidingWindowBuffer<f64>,
    anomalies: Vec<usize>,

    /// ObservationWindow length when training completed
    stream_origin: usize,
    streaming_samples: usize,
}

impl MlpDetector {
    /// Detector with freshly initialized MLP collaborators
    pub fn with_mlp_models(
        config: &DetectorConfig,
        features: FeatureTable,
        sink: Box<dyn DiagnosticsSink>,
    ) -> DetectorResult<Self> {
        let forecaster = WindowForecaster::new(config.lookback_len, features.len(), config.forecast_model);
        let generator = ErrorThresholdGenerator::new(config.lookback_len, config.threshold_model);
        Self::new(config, features, forecaster, generator, sink)
    }
}

impl<F: ForecastModel, G: ThresholdModel> Detector<F, G> {
    pub fn new(
        config: &DetectorConfig,
        features: FeatureTable,
        forecaster: F,
        generator: G,
        sink: Box<dyn DiagnosticsSink>,
    ) -> DetectorResult<Self> {
        config.validate()?;
        let system_threshold = config.system_threshold()?;

        Ok(Self {
            normalizer: Normalizer::new(&features),
            ranges: SensorRangeTable::from_features(&features),
            policy: ThresholdPolicy::new(&features, system_threshold),
            schedule: Schedule::from(config),
            features,
            forecaster,
            generator,
            sink,
            phase: Phase::Initializing,
            staging: Vec::new(),
            observations: SlidingWindowBuffer::new(),
            predictions: SlidingWindowBuffer::new(),
            thresholds: SlidingWindowBuffer::from_items([system_threshold]),
            errors: SlidingWindowBuffer::new(),
            anomalies: Vec::new(),
            stream_origin: 0,
            streaming_samples: 0,
        })
    }

    // ========================================================================
    // DRIVER
    // ========================================================================

    /// Feed one sample through whatever phase the detector is in
    pub fn process(&mut self, sample: &[Option<f64>]) -> DetectorResult<Outcome> {
        self.check_width(sample)?;

        if self.phase != Phase::Initializing {
            return self.score(sample).map(Outcome::Verdict);
        }

        self.staging.push(sample.to_vec());
        if self.staging.len() < self.schedule.train_size {
            return Ok(Outcome::Staged {
                collected: self.staging.len(),
                required: self.schedule.train_size,
            });
        }

        let batch = std::mem::take(&mut self.staging);
        self.set_training_data(&batch)?;
        self.train()?;
        Ok(Outcome::Trained)
    }

    /// Normalize a raw batch and load it as the initial ObservationWindow
    pub fn set_training_data(&mut self, rows: &[Sample]) -> DetectorResult<()> {
        if self.phase != Phase::Initializing {
            return Err(DetectorError::Config("training data can only be set once".into()));
        }

        let mut placeholders = 0;
        let mut normalized = Vec::with_capacity(rows.len());
        for row in rows {
            self.check_width(row)?;
            let raw: Vec<f64> = row
                .iter()
                .map(|v| {
                    v.unwrap_or_else(|| {
                        placeholders += 1;
                        0.0
                    })
                })
                .collect();
            normalized.push(self.normalizer.normalize(&raw));
        }

        if placeholders > 0 {
            log::warn!("Training batch had {} missing values, replaced with zero", placeholders);
        }

        self.observations = SlidingWindowBuffer::from_items(normalized);
        Ok(())
    }

    /// Fit both models on the loaded training batch. One-shot.
    pub fn train(&mut self) -> DetectorResult<()> {
        if self.phase != Phase::Initializing {
            return Err(DetectorError::Config("detector is already trained".into()));
        }

        let training = self.observations.tail(self.observations.len());
        let batch = self.forecaster.train(self.schedule.epoch_train, self.schedule.lr_train, &training)?;

        // Residuals of the fitted forecaster seed the error window
        let residuals = batch
            .inputs
            .iter()
            .zip(&batch.targets)
            .map(|(window, target)| -> Result<f64, ModelError> {
                let predicted = self.forecaster.predict(window)?;
                self.check_prediction(&predicted)?;
                Ok(ErrorBreakdown::compute(&predicted, target).aggregate)
            })
            .collect::<Result<Vec<f64>, ModelError>>()?;

        self.generator.train(self.schedule.epoch_train, self.schedule.lr_train, &residuals)?;
        self.errors = SlidingWindowBuffer::from_items(residuals);

        self.stream_origin = self.observations.len();
        self.phase = Phase::Trained;
        log::info!(
            "Detector trained on {} samples ({} residuals), streaming from index {}",
            self.observations.len(),
            self.errors.len(),
            self.stream_origin
        );
        Ok(())
    }

    /// Streaming decision for one sample
    pub fn is_anomalous(&mut self, sample: &[Option<f64>]) -> DetectorResult<bool> {
        Ok(self.score(sample)?.is_anomalous)
    }

    // ========================================================================
    // STREAMING
    // ========================================================================

    /// Run the full streaming step and report why the verdict was reached
    pub fn score(&mut self, sample: &[Option<f64>]) -> DetectorResult<Verdict> {
        if self.phase == Phase::Initializing {
            return Err(ModelError::NotTrained.into());
        }
        self.check_width(sample)?;
        self.phase = Phase::Streaming;
        self.streaming_samples += 1;

        let verdict = self.step(sample)?;
        self.prune();

        log::debug!(
            "Sample {}: anomalous={} ({:?})",
            verdict.index,
            verdict.is_anomalous,
            verdict.reason
        );
        Ok(verdict)
    }

    fn step(&mut self, sample: &[Option<f64>]) -> DetectorResult<Verdict> {
        let index = self.observations.len();

        let missing: Vec<usize> = (0..sample.len()).filter(|&i| sample[i].is_none()).collect();
        if !missing.is_empty() {
            return Ok(self.fault(index, sample, Reason::MissingValue { features: missing }));
        }

        let raw: Vec<f64> = sample.iter().map(|v| v.unwrap_or(0.0)).collect();
        let outside: Vec<usize> = (0..raw.len()).filter(|&i| !self.ranges.is_inside(raw[i], i)).collect();
        if !outside.is_empty() {
            return Ok(self.fault(index, sample, Reason::OutOfRange { features: outside }));
        }

        let normalized = self.normalizer.normalize(&raw);
        let lookback_len = self.schedule.lookback_len;

        // The incoming sample counts toward the post-training tail
        if self.observations.len() - self.stream_origin + 1 < lookback_len {
            self.observations.append(normalized);
            self.log_unscored(index, sample, &[]);
            return Ok(Verdict { index, is_anomalous: false, reason: Reason::ColdStart });
        }

        let window = self.observations.tail(lookback_len);
        let predicted = self.forecaster.predict(&window)?;
        self.check_prediction(&predicted)?;
        let errors = ErrorBreakdown::compute(&predicted, &normalized);
        let decision = self.policy.decide(&errors);
        let threshold = self.policy.adaptive_threshold(&self.errors, lookback_len, &self.generator)?;
        let is_anomalous = decision.is_anomalous();

        self.log_scored(index, &raw, &predicted, &errors, is_anomalous);

        self.observations.append(normalized.clone());
        self.predictions.append(predicted);
        self.errors.append(errors.aggregate);
        self.thresholds.append(threshold.value);

        self.forecaster.update(self.schedule.epoch_update, self.schedule.lr_update, &window, &normalized)?;

        let system_threshold = self.policy.system_threshold();
        if threshold.exceeds_floor(system_threshold) {
            if let Some(error_window) = &threshold.window {
                self.generator.update(
                    self.schedule.update_g_epoch,
                    self.schedule.update_g_lr,
                    error_window,
                    errors.aggregate,
                )?;
            }
        }

        if is_anomalous {
            self.anomalies.push(index);
        }

        Ok(Verdict { index, is_anomalous, reason: Reason::Scored(decision) })
    }

    /// Missing or implausible sample: forced anomaly, zero placeholder
    fn fault(&mut self, index: usize, sample: &[Option<f64>], reason: Reason) -> Verdict {
        log::debug!("Sample {} rejected before scoring: {:?}", index, reason);

        self.anomalies.push(index);
        self.observations.append(vec![0.0; self.features.len()]);

        let offending = match &reason {
            Reason::MissingValue { features } | Reason::OutOfRange { features } => features.clone(),
            _ => Vec::new(),
        };
        self.log_unscored(index, sample, &offending);

        Verdict { index, is_anomalous: true, reason }
    }

    fn prune(&mut self) {
        let n = self.schedule.lookback_len;
        self.predictions.prune_to_length(n);
        self.errors.prune_to_length(n);
        self.thresholds.prune_to_length(n);
    }

    fn check_prediction(&self, predicted: &[f64]) -> Result<(), ModelError> {
        if predicted.len() != self.features.len() {
            return Err(ModelError::ShapeMismatch {
                expected: format!("{} features", self.features.len()),
                actual: format!("{} features", predicted.len()),
            });
        }
        if predicted.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite("prediction"));
        }
        Ok(())
    }

    fn check_width(&self, sample: &[Option<f64>]) -> DetectorResult<()> {
        if sample.len() != self.features.len() {
            return Err(DetectorError::SampleWidth { expected: self.features.len(), actual: sample.len() });
        }
        Ok(())
    }

    // ========================================================================
    // DIAGNOSTICS
    // ========================================================================

    fn log_scored(
        &mut self,
        index: usize,
        raw: &[f64],
        predicted: &[f64],
        errors: &ErrorBreakdown,
        is_anomalous: bool,
    ) {
        let rows: Vec<FeatureLogRecord> = (0..self.features.len())
            .map(|i| {
                let (lower, upper) = self.policy.bounds(predicted[i], i, &self.normalizer);
                FeatureLogRecord {
                    idx: index,
                    observed: Some(raw[i]),
                    predicted: Some(self.normalizer.denormalize(predicted[i], i)),
                    lower_bound: Some(lower),
                    upper_bound: Some(upper),
                    is_anomalous: self.policy.feature_exceeds(errors, i),
                    error: Some(errors.squared[i]),
                    threshold: self.policy.parameter_threshold(i),
                }
            })
            .collect();

        let system = SystemLogRecord {
            idx: index,
            is_anomalous,
            error: Some(errors.aggregate),
            threshold: self.policy.system_threshold(),
        };
        self.write_diagnostics(&rows, &system);
    }

    /// Rows for samples without a forecast. `offending` features are flagged.
    fn log_unscored(&mut self, index: usize, sample: &[Option<f64>], offending: &[usize]) {
        let rows: Vec<FeatureLogRecord> = sample
            .iter()
            .enumerate()
            .map(|(i, value)| FeatureLogRecord {
                idx: index,
                observed: *value,
                predicted: None,
                lower_bound: None,
                upper_bound: None,
                is_anomalous: offending.contains(&i),
                error: None,
                threshold: self.policy.parameter_threshold(i),
            })
            .collect();

        let system = SystemLogRecord {
            idx: index,
            is_anomalous: !offending.is_empty(),
            error: None,
            threshold: self.policy.system_threshold(),
        };
        self.write_diagnostics(&rows, &system);
    }

    fn write_diagnostics(&mut self, rows: &[FeatureLogRecord], system: &SystemLogRecord) {
        if let Err(e) = self.sink.record(rows, system) {
            log::error!("Failed to write diagnostics for sample {}: {}", system.idx, e);
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn features(&self) -> &FeatureTable {
        &self.features
    }

    pub fn train_size(&self) -> usize {
        self.schedule.train_size
    }

    pub fn system_threshold(&self) -> f64 {
        self.policy.system_threshold()
    }

    pub fn observations(&self) -> &SlidingWindowBuffer<Vec<f64>> {
        &self.observations
    }

    pub fn predictions(&self) -> &SlidingWindowBuffer<Vec<f64>> {
        &self.predictions
    }

    pub fn thresholds(&self) -> &SlidingWindowBuffer<f64> {
        &self.thresholds
    }

    pub fn errors(&self) -> &SlidingWindowBuffer<f64> {
        &self.errors
    }

    /// ObservationWindow indices of every anomalous sample, in order
    pub fn anomalies(&self) -> &[usize] {
        &self.anomalies
    }

    pub fn streaming_samples(&self) -> usize {
        self.streaming_samples
    }

    /// Most recent applied adaptive threshold
    pub fn last_threshold(&self) -> Option<f64> {
        self.thresholds.last().copied()
    }

    pub fn forecaster(&self) -> &F {
        &self.forecaster
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }
}
