//! Feature Layout - Centralized Feature Definition
//!
//! The feature table is resolved once at startup from the configuration and
//! the data source header. After that every per-feature structure is a plain
//! vector indexed by `Feature::index`; names are only used for lookup and
//! for naming log files.
//!
//! The layout hash identifies an ordered feature set so that logs and run
//! summaries from different configurations are never mixed up.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::logic::config::DetectorConfig;
use crate::logic::error::{DetectorError, DetectorResult};

// ============================================================================
// FEATURE
// ============================================================================

/// One sensor channel. Immutable after configuration load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub index: usize,
    pub value_range: (f64, f64),
    pub parameter_threshold: f64,
}

impl Feature {
    pub fn min(&self) -> f64 {
        self.value_range.0
    }

    pub fn max(&self) -> f64 {
        self.value_range.1
    }

    /// File-system friendly name used for the per-feature log
    pub fn short_name(&self) -> String {
        self.name
            .replace("SeaGuard_", "")
            .replace("_Sensor", "")
            .replace('.', "_")
    }
}

// ============================================================================
// FEATURE TABLE
// ============================================================================

/// Ordered feature set with a name -> index lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    features: Vec<Feature>,
}

impl FeatureTable {
    /// Build the table from every configured feature
    pub fn from_config(config: &DetectorConfig) -> DetectorResult<Self> {
        Self::resolve(config, None)
    }

    /// Build the table, keeping only features present in `columns`.
    ///
    /// Missing columns are dropped with a warning; an empty result is fatal.
    pub fn resolve(config: &DetectorConfig, columns: Option<&[String]>) -> DetectorResult<Self> {
        let system_threshold = config.system_threshold()?;
        let mut features = Vec::with_capacity(config.features.len());

        for spec in &config.features {
            if let Some(columns) = columns {
                if !columns.iter().any(|c| c == &spec.name) {
                    log::warn!("Configured feature '{}' not found in data source, skipping", spec.name);
                    continue;
                }
            }

            let (min, max) = spec.value_range;
            if !(min < max) {
                return Err(DetectorError::Config(format!(
                    "feature '{}' has invalid value_range ({}, {})",
                    spec.name, min, max
                )));
            }

            features.push(Feature {
                name: spec.name.clone(),
                index: features.len(),
                value_range: spec.value_range,
                parameter_threshold: spec.parameter_threshold.unwrap_or(system_threshold),
            });
        }

        if features.is_empty() {
            return Err(DetectorError::NoFeatureColumns);
        }

        Ok(Self { features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Feature> {
        self.features.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Get feature index by name (O(n) but features are few)
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.features.iter().map(|f| f.name.clone()).collect()
    }

    pub fn parameter_thresholds(&self) -> Vec<f64> {
        self.features.iter().map(|f| f.parameter_threshold).collect()
    }

    /// CRC32 over the ordered feature names
    pub fn layout_hash(&self) -> u32 {
        let mut hasher = Hasher::new();
        for feature in &self.features {
            hasher.update(feature.name.as_bytes());
            hasher.update(&[0]); // Separator
        }
        hasher.finalize()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::config::FeatureSpec;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_config_preserves_order() {
        let table = FeatureTable::from_config(&DetectorConfig::default()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.index_of("conductivity_conductivity"), Some(0));
        assert_eq!(table.index_of("pressure_temperature"), Some(2));
        assert_eq!(table.index_of("nonexistent"), None);
    }

    #[test]
    fn test_missing_columns_are_dropped() {
        let config = DetectorConfig::default();
        let available = columns(&["time", "pressure_temperature", "conductivity_conductivity"]);

        let table = FeatureTable::resolve(&config, Some(available.as_slice())).unwrap();

        assert_eq!(table.names(), vec!["conductivity_conductivity", "pressure_temperature"]);
        // Indices are re-packed after dropping
        assert_eq!(table.get(1).map(|f| f.index), Some(1));
    }

    #[test]
    fn test_no_usable_columns_is_fatal() {
        let config = DetectorConfig::default();
        let result = FeatureTable::resolve(&config, Some(columns(&["time"]).as_slice()));
        assert!(matches!(result, Err(DetectorError::NoFeatureColumns)));
    }

    #[test]
    fn test_parameter_threshold_defaults_to_system() {
        let config = DetectorConfig {
            features: vec![FeatureSpec {
                name: "temp".into(),
                value_range: (0.0, 10.0),
                parameter_threshold: None,
            }],
            system_threshold: Some(0.05),
            ..Default::default()
        };
        let table = FeatureTable::from_config(&config).unwrap();
        assert_eq!(table.parameter_thresholds(), vec![0.05]);
    }

    #[test]
    fn test_short_name() {
        let feature = Feature {
            name: "SeaGuard_Nord_Sensor.Temperature".into(),
            index: 0,
            value_range: (0.0, 1.0),
            parameter_threshold: 0.1,
        };
        assert_eq!(feature.short_name(), "Nord_Temperature");
    }

    #[test]
    fn test_layout_hash_depends_on_order() {
        let config = DetectorConfig::default();
        let full = FeatureTable::from_config(&config).unwrap();

        let mut reversed = config.clone();
        reversed.features.reverse();
        let reversed = FeatureTable::from_config(&reversed).unwrap();

        assert_eq!(full.layout_hash(), full.layout_hash());
        assert_ne!(full.layout_hash(), reversed.layout_hash());
    }
}
