//! Threshold Policy
//!
//! Turns model outputs into an anomaly verdict and an adaptive operating
//! threshold. The verdict uses a dual criterion: any single channel above its
//! own ceiling, or the aggregate error above the system floor.

use serde::{Deserialize, Serialize};

use crate::logic::error::ModelError;
use crate::logic::features::{FeatureTable, Normalizer};
use super::buffer::SlidingWindowBuffer;
use super::generator::ThresholdModel;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Squared errors of one forecast, on normalized values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBreakdown {
    /// Per-feature `(predicted - observed)^2`
    pub squared: Vec<f64>,
    /// Mean of `squared`
    pub aggregate: f64,
}

impl ErrorBreakdown {
    pub fn compute(predicted: &[f64], observed: &[f64]) -> Self {
        let squared: Vec<f64> = predicted
            .iter()
            .zip(observed.iter())
            .map(|(p, o)| (p - o).powi(2))
            .collect();
        let aggregate = if squared.is_empty() {
            0.0
        } else {
            squared.iter().sum::<f64>() / squared.len() as f64
        };
        Self { squared, aggregate }
    }
}

/// Which rule produced the verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// First feature whose error exceeded its parameter threshold
    ParameterExceeded { feature_index: usize },
    /// Aggregate error above the system threshold
    SystemExceeded,
    Normal,
}

impl Decision {
    pub fn is_anomalous(&self) -> bool {
        !matches!(self, Decision::Normal)
    }
}

/// Threshold applied to one sample
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveThreshold {
    /// `max(generated, system_threshold)`, or the floor when nothing was generated
    pub value: f64,
    /// Raw model output, if the error window was long enough
    pub generated: Option<f64>,
    /// Error window the model consumed
    pub window: Option<Vec<f64>>,
}

impl AdaptiveThreshold {
    /// Whether the generator produced something above the floor
    pub fn exceeds_floor(&self, system_threshold: f64) -> bool {
        self.value > system_threshold
    }
}

// ============================================================================
// POLICY
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdPolicy {
    parameter_thresholds: Vec<f64>,
    system_threshold: f64,
}

impl ThresholdPolicy {
    pub fn new(features: &FeatureTable, system_threshold: f64) -> Self {
        Self {
            parameter_thresholds: features.parameter_thresholds(),
            system_threshold,
        }
    }

    pub fn system_threshold(&self) -> f64 {
        self.system_threshold
    }

    pub fn parameter_threshold(&self, feature_index: usize) -> f64 {
        self.parameter_thresholds[feature_index]
    }

    /// Whether one feature's squared error is above its own ceiling
    pub fn feature_exceeds(&self, errors: &ErrorBreakdown, feature_index: usize) -> bool {
        errors.squared[feature_index] > self.parameter_thresholds[feature_index]
    }

    /// Ordered, short-circuiting decision rule
    pub fn decide(&self, errors: &ErrorBreakdown) -> Decision {
        if let Some(feature_index) =
            (0..errors.squared.len()).find(|&i| self.feature_exceeds(errors, i))
        {
            return Decision::ParameterExceeded { feature_index };
        }
        if errors.aggregate > self.system_threshold {
            return Decision::SystemExceeded;
        }
        Decision::Normal
    }

    /// The applied threshold may only be at least as strict as the floor
    pub fn floor(&self, generated: f64) -> f64 {
        if generated.is_finite() {
            generated.max(self.system_threshold)
        } else {
            self.system_threshold
        }
    }

    /// Forecast the next acceptable error from the last `lookback_len` errors.
    ///
    /// Falls back to the system threshold while the window is too short.
    pub fn adaptive_threshold<G: ThresholdModel + ?Sized>(
        &self,
        errors: &SlidingWindowBuffer<f64>,
        lookback_len: usize,
        model: &G,
    ) -> Result<AdaptiveThreshold, ModelError> {
        if errors.len() < lookback_len {
            return Ok(AdaptiveThreshold {
                value: self.system_threshold,
                generated: None,
                window: None,
            });
        }

        let window = errors.tail(lookback_len);
        let generated = model.predict(&window)?;

        Ok(AdaptiveThreshold {
            value: self.floor(generated),
            generated: Some(generated),
            window: Some(window),
        })
    }

    /// Confidence bounds of one feature, in real units (diagnostics only)
    pub fn bounds(&self, predicted: f64, feature_index: usize, normalizer: &Normalizer) -> (f64, f64) {
        let margin = self.parameter_thresholds[feature_index].sqrt();
        (
            normalizer.denormalize(predicted - margin, feature_index),
            normalizer.denormalize(predicted + margin, feature_index),
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::config::{DetectorConfig, FeatureSpec};
    use crate::logic::model::generator::ErrorBatch;

    struct FixedGenerator(f64);

    impl ThresholdModel for FixedGenerator {
        fn train(
            &mut self,
            _epochs: usize,
            _learning_rate: f64,
            _errors: &[f64],
        ) -> Result<ErrorBatch, ModelError> {
            Ok(Default::default())
        }

        fn predict(&self, _window: &[f64]) -> Result<f64, ModelError> {
            Ok(self.0)
        }

        fn update(&mut self, _: usize, _: f64, _: &[f64], _: f64) -> Result<(), ModelError> {
            Ok(())
        }
    }

    fn policy() -> (ThresholdPolicy, FeatureTable) {
        let config = DetectorConfig {
            features: vec![
                FeatureSpec::new("a", 0.0, 10.0, 0.04),
                FeatureSpec::new("b", 0.0, 10.0, 0.5),
                FeatureSpec::new("c", 0.0, 10.0, 0.5),
            ],
            system_threshold: Some(0.1),
            ..Default::default()
        };
        let features = FeatureTable::from_config(&config).unwrap();
        (ThresholdPolicy::new(&features, 0.1), features)
    }

    #[test]
    fn test_error_breakdown() {
        let errors = ErrorBreakdown::compute(&[0.5, 0.5], &[0.3, 0.5]);
        assert!((errors.squared[0] - 0.04).abs() < 1e-12);
        assert_eq!(errors.squared[1], 0.0);
        assert!((errors.aggregate - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_single_channel_short_circuits() {
        let (policy, _) = policy();
        // Feature 0 error 0.09 > 0.04, aggregate 0.03 < 0.1
        let errors = ErrorBreakdown::compute(&[0.3, 0.5, 0.5], &[0.0, 0.5, 0.5]);
        assert!(errors.aggregate < policy.system_threshold());

        let decision = policy.decide(&errors);
        assert_eq!(decision, Decision::ParameterExceeded { feature_index: 0 });
        assert!(decision.is_anomalous());
    }

    #[test]
    fn test_broad_drift_triggers_system_rule() {
        let (policy, _) = policy();
        // every channel below its ceiling, aggregate 0.16 > 0.1
        let errors = ErrorBreakdown { squared: vec![0.03, 0.2, 0.25], aggregate: 0.16 };
        assert_eq!(policy.decide(&errors), Decision::SystemExceeded);
    }

    #[test]
    fn test_normal() {
        let (policy, _) = policy();
        let errors = ErrorBreakdown::compute(&[0.5, 0.5, 0.5], &[0.45, 0.5, 0.55]);
        assert_eq!(policy.decide(&errors), Decision::Normal);
    }

    #[test]
    fn test_threshold_floor() {
        let (policy, _) = policy();
        let errors = SlidingWindowBuffer::from_items(vec![0.01, 0.02, 0.03]);

        let low = policy.adaptive_threshold(&errors, 3, &FixedGenerator(0.001)).unwrap();
        assert_eq!(low.value, 0.1);
        assert_eq!(low.generated, Some(0.001));
        assert!(!low.exceeds_floor(0.1));

        let high = policy.adaptive_threshold(&errors, 3, &FixedGenerator(0.3)).unwrap();
        assert_eq!(high.value, 0.3);
        assert!(high.exceeds_floor(0.1));

        assert_eq!(policy.floor(f64::NAN), 0.1);
    }

    #[test]
    fn test_short_error_window_uses_system_threshold() {
        let (policy, _) = policy();
        let errors = SlidingWindowBuffer::from_items(vec![0.5]);

        let threshold = policy.adaptive_threshold(&errors, 3, &FixedGenerator(0.9)).unwrap();
        assert_eq!(threshold.value, 0.1);
        assert_eq!(threshold.generated, None);
        assert_eq!(threshold.window, None);
    }

    #[test]
    fn test_bounds() {
        let (policy, features) = policy();
        let normalizer = Normalizer::new(&features);
        // sqrt(0.04) = 0.2 -> 0.3..0.7 normalized -> 3..7 real
        let (lower, upper) = policy.bounds(0.5, 0, &normalizer);
        assert!((lower - 3.0).abs() < 1e-9);
        assert!((upper - 7.0).abs() < 1e-9);
    }
}
