//! Forecast Model - one-step-ahead predictor over a lookback window
//!
//! The controller only talks to the `ForecastModel` trait. `WindowForecaster`
//! is the bundled implementation: the flattened window of normalized feature
//! vectors goes through an `MlpRegressor` that outputs the next vector.

use crate::logic::config::NetworkConfig;
use crate::logic::error::ModelError;
use super::network::{rows_to_array, MlpRegressor};

/// One normalized feature vector
pub type Observation = Vec<f64>;

/// Input/target pairs built for the initial training pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingBatch {
    pub inputs: Vec<Vec<Observation>>,
    pub targets: Vec<Observation>,
}

impl TrainingBatch {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

// ============================================================================
// FORECAST MODEL TRAIT
// ============================================================================

/// Capability interface of the forecasting collaborator
pub trait ForecastModel {
    /// Fit on every `lookback_len` window of `training`, each predicting the
    /// sample right after it. Returns the constructed pairs.
    fn train(
        &mut self,
        epochs: usize,
        learning_rate: f64,
        training: &[Observation],
    ) -> Result<TrainingBatch, ModelError>;

    /// Single-step forecast. Does not change model state.
    fn predict(&self, window: &[Observation]) -> Result<Observation, ModelError>;

    /// A few online gradient steps fitting `window -> target`
    fn update(
        &mut self,
        epochs: usize,
        learning_rate: f64,
        window: &[Observation],
        target: &[f64],
    ) -> Result<(), ModelError>;
}

/// Slide a `lookback_len` window over `series`; each window predicts the next item
pub fn sliding_windows<T: Clone>(series: &[T], lookback_len: usize) -> (Vec<Vec<T>>, Vec<T>) {
    if lookback_len == 0 || series.len() <= lookback_len {
        return (Vec::new(), Vec::new());
    }
    series
        .windows(lookback_len + 1)
        .map(|w| (w[..lookback_len].to_vec(), w[lookback_len].clone()))
        .unzip()
}

// ============================================================================
// MLP IMPLEMENTATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct WindowForecaster {
    lookback_len: usize,
    feature_count: usize,
    network: MlpRegressor,
    trained: bool,
}

impl WindowForecaster {
    pub fn new(lookback_len: usize, feature_count: usize, config: NetworkConfig) -> Self {
        Self {
            lookback_len,
            feature_count,
            network: MlpRegressor::new(
                lookback_len * feature_count,
                config.hidden_size,
                feature_count,
                config.seed,
            ),
            trained: false,
        }
    }

    fn flatten(&self, window: &[Observation]) -> Result<Vec<f64>, ModelError> {
        if window.len() != self.lookback_len {
            return Err(ModelError::ShapeMismatch {
                expected: format!("window of {}", self.lookback_len),
                actual: format!("window of {}", window.len()),
            });
        }

        let mut flat = Vec::with_capacity(self.lookback_len * self.feature_count);
        for observation in window {
            if observation.len() != self.feature_count {
                return Err(ModelError::ShapeMismatch {
                    expected: format!("{} features", self.feature_count),
                    actual: format!("{} features", observation.len()),
                });
            }
            flat.extend_from_slice(observation);
        }
        Ok(flat)
    }
}

impl ForecastModel for WindowForecaster {
    fn train(
        &mut self,
        epochs: usize,
        learning_rate: f64,
        training: &[Observation],
    ) -> Result<TrainingBatch, ModelError> {
        let (inputs, targets) = sliding_windows(training, self.lookback_len);
        if inputs.is_empty() {
            return Err(ModelError::InsufficientData { have: training.len(), need: self.lookback_len });
        }

        let flat = inputs
            .iter()
            .map(|w| self.flatten(w))
            .collect::<Result<Vec<_>, _>>()?;
        let x = rows_to_array(&flat, self.network.input_size())?;
        let y = rows_to_array(&targets, self.feature_count)?;

        let loss = self.network.fit(&x, &y, epochs, learning_rate)?;
        self.trained = true;
        log::info!(
            "Forecast model trained on {} windows ({} epochs, loss {:.6})",
            inputs.len(),
            epochs,
            loss
        );

        Ok(TrainingBatch { inputs, targets })
    }

    fn predict(&self, window: &[Observation]) -> Result<Observation, ModelError> {
        if !self.trained {
            return Err(ModelError::NotTrained);
        }
        let flat = self.flatten(window)?;
        self.network.predict(&flat)
    }

    fn update(
        &mut self,
        epochs: usize,
        learning_rate: f64,
        window: &[Observation],
        target: &[f64],
    ) -> Result<(), ModelError> {
        let flat = self.flatten(window)?;
        let x = rows_to_array(&[flat], self.network.input_size())?;
        let y = rows_to_array(&[target.to_vec()], self.feature_count)?;
        self.network.fit(&x, &y, epochs, learning_rate)?;
        Ok(())
    }
}
