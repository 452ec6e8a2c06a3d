//! Features Module - Sensor channel definitions
//!
//! Feature table (name <-> index), min-max normalization and the static
//! plausibility gate. Everything here is built once from configuration and is
//! read-only afterwards.

pub mod layout;
pub mod normalizer;
pub mod range;


// Re-export common types
pub use layout::{Feature, FeatureTable};
pub use normalizer::Normalizer;
pub use range::SensorRangeTable;
