//! Sensor Guard - Main Entry Point

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use sensor_guard_core::constants::{self, APP_NAME, APP_VERSION};
use sensor_guard_core::logic::analysis_loop;
use sensor_guard_core::logic::config::DetectorConfig;

#[derive(Parser)]
#[command(name = "sensor-guard")]
#[command(about = "Adaptive streaming anomaly detection for multivariate sensor data", long_about = None)]
struct Args {
    /// JSON configuration file (falls back to SENSOR_GUARD_CONFIG, then built-in defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSV data source, overrides the configuration
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Directory for diagnostics logs, overrides the configuration
    #[arg(short, long)]
    log_dir: Option<PathBuf>,

    /// Print the default configuration as JSON and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.print_default_config {
        println!("{}", serde_json::to_string_pretty(&DetectorConfig::default())?);
        return Ok(());
    }

    log::info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let mut config = match args.config.or_else(|| constants::get_config_path().map(PathBuf::from)) {
        Some(path) => DetectorConfig::load(&path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => {
            log::info!("No configuration file given, using built-in defaults");
            DetectorConfig::default()
        }
    }
    .with_env_overrides();

    if let Some(data) = args.data {
        config.data_source_path = data;
    }
    if let Some(log_dir) = args.log_dir {
        config.log_dir = log_dir;
    }

    let summary = analysis_loop::run(&config)
        .with_context(|| format!("detection run on {} failed", config.data_source_path.display()))?;

    println!(
        "{} samples processed, {} anomalies, logs in {}",
        summary.samples_seen,
        summary.anomaly_count(),
        config.log_dir.display()
    );
    Ok(())
}
