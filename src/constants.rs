//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! The defaults reproduce the Austevoll three-channel deployment.

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Sensor Guard";

// ============================================
// Stream defaults
// ============================================

/// Default CSV data source
pub const DEFAULT_DATA_SOURCE_PATH: &str = "data/Austevoll_Autumn_2023_no_dcps_small.csv";

/// Default directory for per-feature and system logs
pub const DEFAULT_LOG_DIR: &str = "results/austevoll";

/// Lookback window width shared by both models
pub const DEFAULT_LOOKBACK_LEN: usize = 3;

/// Forecast horizon. The decision logic only supports one step.
pub const DEFAULT_PREDICTION_LEN: usize = 1;

/// Minimal aggregate-error floor
pub const DEFAULT_SYSTEM_THRESHOLD: f64 = 0.019;

/// Log a progress line every N processed rows (0 disables)
pub const DEFAULT_PROGRESS_EVERY: usize = 500;

// ============================================
// Training defaults
// ============================================

pub const DEFAULT_EPOCH_TRAIN: usize = 1000;
pub const DEFAULT_LR_TRAIN: f64 = 0.0005;

pub const DEFAULT_EPOCH_UPDATE: usize = 100;
pub const DEFAULT_LR_UPDATE: f64 = 0.001;

pub const DEFAULT_UPDATE_G_EPOCH: usize = 100;
pub const DEFAULT_UPDATE_G_LR: f64 = 0.001;

/// Hidden width of the forecast network
pub const DEFAULT_FORECAST_HIDDEN: usize = 64;

/// Hidden width of the threshold network
pub const DEFAULT_THRESHOLD_HIDDEN: usize = 32;

pub const DEFAULT_MODEL_SEED: u64 = 0;

// ============================================
// Output file names
// ============================================

pub const SYSTEM_LOG_FILE: &str = "system_log.csv";
pub const SUMMARY_FILE: &str = "summary.json";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Config file path from environment, if set
pub fn get_config_path() -> Option<String> {
    std::env::var("SENSOR_GUARD_CONFIG").ok()
}

/// Data source override from environment, if set
pub fn get_data_source_override() -> Option<String> {
    std::env::var("SENSOR_GUARD_DATA").ok()
}

/// Log directory override from environment, if set
pub fn get_log_dir_override() -> Option<String> {
    std::env::var("SENSOR_GUARD_LOG_DIR").ok()
}

/// System threshold override from environment, if set and numeric
pub fn get_system_threshold_override() -> Option<f64> {
    std::env::var("SENSOR_GUARD_SYSTEM_THRESHOLD")
        .ok()
        .and_then(|s| s.trim().parse().ok())
}
