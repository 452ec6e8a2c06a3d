//! Sensor Guard core - adaptive streaming anomaly detection
//!
//! - `logic::detector` - online controller (train once, then score and update per sample)
//! - `logic::model` - forecast / threshold models and sliding-window buffers
//! - `logic::features` - feature layout, normalization, plausibility ranges
//! - `logic::dataset` - diagnostics logs and run summary
//! - `logic::analysis_loop` - drives a CSV data source through the detector

pub mod constants;
pub mod logic;
