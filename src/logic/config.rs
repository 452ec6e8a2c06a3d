//! Detector Configuration
//!
//! Immutable configuration built once at startup and passed by reference
//! into the controller. Can be loaded from a JSON file, with a few
//! environment overrides applied on top.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::*;
use super::error::{DetectorError, DetectorResult};

// ============================================================================
// FEATURE CONFIG
// ============================================================================

/// One configured sensor channel.
///
/// `parameter_threshold` is a flat per-feature value; when absent the
/// system threshold is used for that channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    /// Column name in the data source
    pub name: String,
    /// Normalization bounds, also the plausibility range
    pub value_range: (f64, f64),
    /// Per-feature squared-error ceiling (normalized units)
    #[serde(default)]
    pub parameter_threshold: Option<f64>,
}

impl FeatureSpec {
    pub fn new(name: &str, min: f64, max: f64, parameter_threshold: f64) -> Self {
        Self {
            name: name.to_string(),
            value_range: (min, max),
            parameter_threshold: Some(parameter_threshold),
        }
    }
}

/// Hyperparameters owned by a model collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub hidden_size: usize,
    pub seed: u64,
}

impl NetworkConfig {
    pub fn forecast_default() -> Self {
        Self { hidden_size: DEFAULT_FORECAST_HIDDEN, seed: DEFAULT_MODEL_SEED }
    }

    pub fn threshold_default() -> Self {
        Self { hidden_size: DEFAULT_THRESHOLD_HIDDEN, seed: DEFAULT_MODEL_SEED }
    }
}

// ============================================================================
// DETECTOR CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub data_source_path: PathBuf,
    pub log_dir: PathBuf,
    pub features: Vec<FeatureSpec>,

    /// Window width for both models
    pub lookback_len: usize,
    /// Forecast horizon (only 1 is supported)
    pub prediction_len: usize,

    /// Initial training
    pub epoch_train: usize,
    pub lr_train: f64,

    /// Online forecast-model updates
    pub epoch_update: usize,
    pub lr_update: f64,

    /// Online threshold-model updates
    pub update_g_epoch: usize,
    pub update_g_lr: f64,

    /// Minimal aggregate-error floor. Mandatory: a config file that omits
    /// it loads as `None` and fails validation.
    #[serde(default)]
    pub system_threshold: Option<f64>,

    pub forecast_model: NetworkConfig,
    pub threshold_model: NetworkConfig,

    /// Progress log interval in rows (0 disables)
    pub progress_every: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            data_source_path: PathBuf::from(DEFAULT_DATA_SOURCE_PATH),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            features: vec![
                FeatureSpec::new("conductivity_conductivity", 25.0, 38.0, 0.04),
                FeatureSpec::new("pressure_pressure", 299.0, 321.0, 0.021),
                FeatureSpec::new("pressure_temperature", 5.0, 17.0, 0.018),
            ],
            lookback_len: DEFAULT_LOOKBACK_LEN,
            prediction_len: DEFAULT_PREDICTION_LEN,
            epoch_train: DEFAULT_EPOCH_TRAIN,
            lr_train: DEFAULT_LR_TRAIN,
            epoch_update: DEFAULT_EPOCH_UPDATE,
            lr_update: DEFAULT_LR_UPDATE,
            update_g_epoch: DEFAULT_UPDATE_G_EPOCH,
            update_g_lr: DEFAULT_UPDATE_G_LR,
            system_threshold: Some(DEFAULT_SYSTEM_THRESHOLD),
            forecast_model: NetworkConfig::forecast_default(),
            threshold_model: NetworkConfig::threshold_default(),
            progress_every: DEFAULT_PROGRESS_EVERY,
        }
    }
}

impl DetectorConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> DetectorResult<Self> {
        let data = std::fs::read(path)?;
        let config: DetectorConfig = serde_json::from_slice(&data)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply `SENSOR_GUARD_*` environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(path) = get_data_source_override() {
            self.data_source_path = PathBuf::from(path);
        }
        if let Some(dir) = get_log_dir_override() {
            self.log_dir = PathBuf::from(dir);
        }
        if let Some(threshold) = get_system_threshold_override() {
            self.system_threshold = Some(threshold);
        }
        self
    }

    /// Samples consumed before the first training pass
    pub fn train_size(&self) -> usize {
        5 * self.lookback_len + self.prediction_len
    }

    /// The mandatory system threshold, or a fatal error if unset or not positive
    pub fn system_threshold(&self) -> DetectorResult<f64> {
        match self.system_threshold {
            Some(t) if t.is_finite() && t > 0.0 => Ok(t),
            _ => Err(DetectorError::MissingSystemThreshold),
        }
    }

    /// Validate everything that does not depend on the data source
    pub fn validate(&self) -> DetectorResult<()> {
        self.system_threshold()?;

        if self.lookback_len == 0 {
            return Err(DetectorError::Config("lookback_len must be at least 1".into()));
        }
        if self.prediction_len != 1 {
            return Err(DetectorError::Config(format!(
                "prediction_len must be 1, got {}",
                self.prediction_len
            )));
        }
        if self.features.is_empty() {
            return Err(DetectorError::NoFeatureColumns);
        }

        for spec in &self.features {
            let (min, max) = spec.value_range;
            if !(min.is_finite() && max.is_finite() && min < max) {
                return Err(DetectorError::Config(format!(
                    "feature '{}' has invalid value_range ({}, {})",
                    spec.name, min, max
                )));
            }
            if let Some(t) = spec.parameter_threshold {
                if !(t.is_finite() && t >= 0.0) {
                    return Err(DetectorError::Config(format!(
                        "feature '{}' has invalid parameter_threshold {}",
                        spec.name, t
                    )));
                }
            }
        }

        if self.forecast_model.hidden_size == 0 || self.threshold_model.hidden_size == 0 {
            return Err(DetectorError::Config("hidden_size must be at least 1".into()));
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DetectorConfig::default();
        assert_eq!(config.lookback_len, 3);
        assert_eq!(config.train_size(), 16);
        assert_eq!(config.features.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_system_threshold_is_fatal() {
        let config = DetectorConfig { system_threshold: None, ..Default::default() };
        assert!(matches!(config.validate(), Err(DetectorError::MissingSystemThreshold)));

        let config = DetectorConfig { system_threshold: Some(0.0), ..Default::default() };
        assert!(matches!(config.validate(), Err(DetectorError::MissingSystemThreshold)));
    }

    #[test]
    fn test_invalid_range_rejected() {
        let mut config = DetectorConfig::default();
        config.features[0].value_range = (10.0, 10.0);
        assert!(matches!(config.validate(), Err(DetectorError::Config(_))));
    }

    #[test]
    fn test_prediction_len_fixed() {
        let config = DetectorConfig { prediction_len: 2, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "lookback_len": 4,
            "features": [
                {"name": "temp", "value_range": [0.0, 20.0]}
            ]
        }"#;
        let config: DetectorConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.lookback_len, 4);
        assert_eq!(config.train_size(), 21);
        assert_eq!(config.features[0].parameter_threshold, None);
        assert_eq!(config.epoch_update, DEFAULT_EPOCH_UPDATE);
        // The floor is mandatory and never inherited from the preset
        assert_eq!(config.system_threshold, None);
        assert!(matches!(config.validate(), Err(DetectorError::MissingSystemThreshold)));
    }

    #[test]
    fn test_file_without_system_threshold_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"features": [{"name": "temp", "value_range": [0.0, 20.0]}]}"#).unwrap();

        let result = DetectorConfig::load(&path).and_then(|config| config.validate());
        assert!(matches!(result, Err(DetectorError::MissingSystemThreshold)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let original = DetectorConfig { lookback_len: 5, ..Default::default() };
        std::fs::write(&path, serde_json::to_vec_pretty(&original).unwrap()).unwrap();

        let loaded = DetectorConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }
}
