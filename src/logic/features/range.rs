//! Static plausibility range per feature.
//!
//! A validity gate that is independent of model confidence. Bounds are
//! inclusive on both ends.

use super::layout::FeatureTable;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorRangeTable {
    ranges: Vec<Option<(f64, f64)>>,
}

impl SensorRangeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_features(features: &FeatureTable) -> Self {
        let mut table = Self::new();
        for feature in features.iter() {
            table.set(feature.index, feature.min(), feature.max());
        }
        table
    }

    pub fn set(&mut self, feature_index: usize, min: f64, max: f64) {
        if self.ranges.len() <= feature_index {
            self.ranges.resize(feature_index + 1, None);
        }
        self.ranges[feature_index] = Some((min, max));
    }

    fn range(&self, feature_index: usize) -> Option<(f64, f64)> {
        self.ranges.get(feature_index).copied().flatten()
    }

    /// Whether a real (denormalized) value lies within the configured range.
    /// A feature with no range configured accepts everything.
    pub fn is_inside(&self, value: f64, feature_index: usize) -> bool {
        match self.range(feature_index) {
            Some((min, max)) => value >= min && value <= max,
            None => true,
        }
    }
}
