//! Dataset Module - diagnostics persistence
//!
//! Per-feature and system CSV logs written while streaming, and the JSON run
//! summary written once the data source is exhausted.

pub mod export;
pub mod record;
pub mod writer;

#[cfg(test)]
mod tests;

pub use export::RunSummary;
pub use record::{FeatureLogRecord, SystemLogRecord};
pub use writer::{CsvDiagnosticsLogger, DiagnosticsSink, NullSink};
