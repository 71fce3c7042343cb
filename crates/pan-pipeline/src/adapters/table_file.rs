//! Classification table sources
//!
//! - `FileTableSource` reads a curated CSV from disk
//! - `BundledTableSource` serves the sample table compiled into the crate

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::{BinTable, LoadReport, PipelineConfig};
use crate::error::TableError;
use crate::ports::BinTableSource;

const BUNDLED_TABLE: &str = include_str!("../../data/bin_table.csv");

/// Table read from a CSV file
#[derive(Clone, Debug)]
pub struct FileTableSource {
    path: PathBuf,
}

impl FileTableSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BinTableSource for FileTableSource {
    fn load(&self) -> Result<(BinTable, LoadReport), TableError> {
        let bytes = fs::read(&self.path).map_err(|source| TableError::Io {
            path: self.path.clone(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|e| TableError::Encoding(e.to_string()))?;
        Ok(BinTable::parse(&text))
    }
}

/// The sample table shipped with the crate
#[derive(Clone, Copy, Debug, Default)]
pub struct BundledTableSource;

impl BinTableSource for BundledTableSource {
    fn load(&self) -> Result<(BinTable, LoadReport), TableError> {
        Ok(BinTable::parse(BUNDLED_TABLE))
    }
}

/// Load the table named by `config.table_path`, or the bundled one.
pub fn load_configured_table(
    config: &PipelineConfig,
) -> Result<(Arc<BinTable>, LoadReport), TableError> {
    let (table, report, source) = match &config.table_path {
        Some(path) => {
            let file = FileTableSource::new(path);
            let (table, report) = file.load()?;
            (table, report, file.path().display().to_string())
        }
        None => {
            let (table, report) = BundledTableSource.load()?;
            (table, report, "bundled".to_string())
        }
    };
    tracing::info!(
        source = %source,
        accepted = report.accepted,
        malformed = report.malformed,
        duplicates = report.duplicates,
        "Classification table loaded"
    );
    Ok((Arc::new(table), report))
}
