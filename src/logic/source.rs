//! CSV data source
//!
//! Reads the tabular input row by row. Header names are trimmed, each
//! resolved feature is mapped to its column once, and every cell that is
//! empty, non-numeric or NaN becomes a missing value.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::logic::error::{DetectorError, DetectorResult};
use crate::logic::features::FeatureTable;

/// One raw multivariate reading in feature order. `None` marks a missing value.
pub type Sample = Vec<Option<f64>>;

pub struct CsvDataSource {
    reader: csv::Reader<BufReader<File>>,
    headers: Vec<String>,
}

impl CsvDataSource {
    pub fn open(path: &Path) -> DetectorResult<Self> {
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        log::info!("Opened data source {} ({} columns)", path.display(), headers.len());

        Ok(Self { reader, headers })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Iterate rows as samples laid out like `features`
    pub fn samples(self, features: &FeatureTable) -> DetectorResult<Samples> {
        let columns = features
            .iter()
            .map(|feature| {
                self.headers
                    .iter()
                    .position(|h| h == &feature.name)
                    .ok_or_else(|| DetectorError::Config(format!("column '{}' not in data source", feature.name)))
            })
            .collect::<DetectorResult<Vec<_>>>()?;

        Ok(Samples { records: self.reader.into_records(), columns })
    }
}

pub struct Samples {
    records: csv::StringRecordsIntoIter<BufReader<File>>,
    columns: Vec<usize>,
}

impl Iterator for Samples {
    type Item = DetectorResult<Sample>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };
        Some(Ok(self.columns.iter().map(|&c| parse_cell(record.get(c))).collect()))
    }
}

fn parse_cell(cell: Option<&str>) -> Option<f64> {
    let value = cell?.trim().parse::<f64>().ok()?;
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}
