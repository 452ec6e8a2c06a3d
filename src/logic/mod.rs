//! Logic Module - detection pipeline
//!
//! - `features/` - Feature layout, normalizer, sensor ranges
//! - `model/` - Buffers, threshold policy, forecast and threshold models
//! - `detector/` - State machine tying it all together
//! - `dataset/` - Per-feature / system CSV logs, run summary

pub mod analysis_loop;
pub mod config;
pub mod dataset;
pub mod detector;
pub mod error;
pub mod features;
pub mod model;
pub mod source;
