use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::error::DetectorResult;

/// End-of-run report written next to the CSV logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub data_source: String,
    pub features: Vec<String>,
    pub layout_hash: u32,
    pub samples_seen: usize,
    pub streaming_samples: usize,
    pub anomalies: Vec<usize>,
    pub last_threshold: Option<f64>,
}

impl RunSummary {
    pub fn anomaly_count(&self) -> usize {
        self.anomalies.len()
    }

    /// Write as pretty JSON, replacing any previous summary
    pub fn save(&self, path: &Path) -> DetectorResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Run summary saved to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> DetectorResult<Self> {
        let data = fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }
}
