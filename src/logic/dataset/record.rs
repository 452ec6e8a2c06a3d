//! Diagnostic log rows
//!
//! Column order of each struct is the column order of its CSV file. Fields
//! that only exist for predicted samples are `Option`s and serialize as
//! empty cells.

use serde::{Deserialize, Serialize, Serializer};

/// One row of `<short_name>_log.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureLogRecord {
    pub idx: usize,
    /// Raw value in real units, empty when missing
    pub observed: Option<f64>,
    pub predicted: Option<f64>,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    pub is_anomalous: bool,
    /// Squared normalized error of this channel
    #[serde(serialize_with = "six_decimals_opt")]
    pub error: Option<f64>,
    /// Parameter threshold of this channel
    #[serde(serialize_with = "six_decimals")]
    pub threshold: f64,
}

/// One row of `system_log.csv`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemLogRecord {
    pub idx: usize,
    pub is_anomalous: bool,
    /// Aggregate error, empty when nothing was predicted
    #[serde(serialize_with = "six_decimals_opt")]
    pub error: Option<f64>,
    #[serde(serialize_with = "six_decimals")]
    pub threshold: f64,
}

fn six_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.6}", value))
}

fn six_decimals_opt<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => six_decimals(v, serializer),
        None => serializer.serialize_none(),
    }
}
