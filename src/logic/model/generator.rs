//! Threshold Model - forecasts the next acceptable aggregate error
//!
//! Same contract shape as the forecast model, but windows are sequences of
//! aggregate errors and the output is a single scalar.

use crate::logic::config::NetworkConfig;
use crate::logic::error::ModelError;
use super::forecast::sliding_windows;
use super::network::{rows_to_array, MlpRegressor};

/// Error windows and their next-error targets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorBatch {
    pub inputs: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

// ============================================================================
// THRESHOLD MODEL TRAIT
// ============================================================================

pub trait ThresholdModel {
    fn train(&mut self, epochs: usize, learning_rate: f64, errors: &[f64]) -> Result<ErrorBatch, ModelError>;

    /// Raw forecast of the next error magnitude (not floored)
    fn predict(&self, window: &[f64]) -> Result<f64, ModelError>;

    fn update(
        &mut self,
        epochs: usize,
        learning_rate: f64,
        window: &[f64],
        target: f64,
    ) -> Result<(), ModelError>;
}

// ============================================================================
// MLP IMPLEMENTATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct ErrorThresholdGenerator {
    lookback_len: usize,
    network: MlpRegressor,
    trained: bool,
}

impl ErrorThresholdGenerator {
    pub fn new(lookback_len: usize, config: NetworkConfig) -> Self {
        Self {
            lookback_len,
            network: MlpRegressor::new(lookback_len, config.hidden_size, 1, config.seed),
            trained: false,
        }
    }

    fn check_window(&self, window: &[f64]) -> Result<(), ModelError> {
        if window.len() != self.lookback_len {
            return Err(ModelError::ShapeMismatch {
                expected: format!("{} errors", self.lookback_len),
                actual: format!("{} errors", window.len()),
            });
        }
        Ok(())
    }
}

impl ThresholdModel for ErrorThresholdGenerator {
    fn train(&mut self, epochs: usize, learning_rate: f64, errors: &[f64]) -> Result<ErrorBatch, ModelError> {
        let (inputs, targets) = sliding_windows(errors, self.lookback_len);
        if inputs.is_empty() {
            return Err(ModelError::InsufficientData { have: errors.len(), need: self.lookback_len });
        }

        let x = rows_to_array(&inputs, self.lookback_len)?;
        let y = rows_to_array(&targets.iter().map(|t| vec![*t]).collect::<Vec<_>>(), 1)?;

        let loss = self.network.fit(&x, &y, epochs, learning_rate)?;
        self.trained = true;
        log::info!("Threshold model trained on {} error windows (loss {:.8})", inputs.len(), loss);

        Ok(ErrorBatch { inputs, targets })
    }

    fn predict(&self, window: &[f64]) -> Result<f64, ModelError> {
        if !self.trained {
            return Err(ModelError::NotTrained);
        }
        self.check_window(window)?;
        let output = self.network.predict(window)?;
        output.first().copied().ok_or(ModelError::NonFinite("prediction"))
    }

    fn update(
        &mut self,
        epochs: usize,
        learning_rate: f64,
        window: &[f64],
        target: f64,
    ) -> Result<(), ModelError> {
        self.check_window(window)?;
        let x = rows_to_array(&[window.to_vec()], self.lookback_len)?;
        let y = rows_to_array(&[vec![target]], 1)?;
        self.network.fit(&x, &y, epochs, learning_rate)?;
        Ok(())
    }
}
