//! Model Module - forecasting, adaptive thresholds and their buffers
//!
//! The controller depends on the `ForecastModel` and `ThresholdModel` traits
//! only; `WindowForecaster` and `ErrorThresholdGenerator` are the bundled
//! implementations built on `network::MlpRegressor`.

pub mod buffer;
pub mod forecast;
pub mod generator;
pub mod network;
pub mod threshold;

// Re-export common types
pub use buffer::SlidingWindowBuffer;
pub use forecast::{ForecastModel, Observation, TrainingBatch, WindowForecaster};
pub use generator::{ErrorBatch, ErrorThresholdGenerator, ThresholdModel};
pub use threshold::{AdaptiveThreshold, Decision, ErrorBreakdown, ThresholdPolicy};
