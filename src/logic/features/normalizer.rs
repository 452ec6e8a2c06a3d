//! Min-max normalization per feature.
//!
//! `normalize` clips to `[0, 1]`; `denormalize` is the exact inverse of the
//! unclipped scaling and never clips, so unclipped predictions and bounds map
//! back to plausible real values.

use super::layout::FeatureTable;

#[derive(Debug, Clone, PartialEq)]
pub struct Normalizer {
    ranges: Vec<(f64, f64)>,
}

impl Normalizer {
    pub fn new(features: &FeatureTable) -> Self {
        Self {
            ranges: features.iter().map(|f| f.value_range).collect(),
        }
    }

    /// Unclipped scaling of one component
    pub fn scale(&self, value: f64, feature_index: usize) -> f64 {
        let (min, max) = self.ranges[feature_index];
        (value - min) / (max - min)
    }

    /// Scale every component and clip to [0, 1]
    pub fn normalize(&self, raw: &[f64]) -> Vec<f64> {
        raw.iter()
            .enumerate()
            .map(|(i, &v)| self.scale(v, i).clamp(0.0, 1.0))
            .collect()
    }

    pub fn denormalize(&self, value: f64, feature_index: usize) -> f64 {
        let (min, max) = self.ranges[feature_index];
        value * (max - min) + min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::config::DetectorConfig;

    fn normalizer() -> Normalizer {
        Normalizer::new(&FeatureTable::from_config(&DetectorConfig::default()).unwrap())
    }

    #[test]
    fn test_normalize_in_range() {
        let n = normalizer();
        let out = n.normalize(&[31.5, 310.0, 11.0]);
        assert!((out[0] - 0.5).abs() < 1e-12);
        assert!((out[1] - 0.5).abs() < 1e-12);
        assert!((out[2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_clips() {
        let n = normalizer();
        let out = n.normalize(&[0.0, 1000.0, 5.0]);
        assert_eq!(out, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_denormalize_does_not_clip() {
        let n = normalizer();
        // conductivity range 25..38
        assert!((n.denormalize(1.5, 0) - 44.5).abs() < 1e-9);
        assert!((n.denormalize(-0.5, 0) - 18.5).abs() < 1e-9);
    }
}
