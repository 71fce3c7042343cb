//! Error types for the PAN pipeline
//!
//! Per-record faults are not errors; see `pan_types::RecordFault`. The types
//! here cover startup concerns: configuration and table loading.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "SECURITY VIOLATION: token key is the all-zero development key. \
         Set PAN_TOKEN_SECRET or provide a secret in config."
    )]
    InsecureTokenKey,

    #[error("Invalid key width: {0} (expected 4, 6 or both)")]
    InvalidKeyWidth(String),

    #[error("Invalid drain order: {0}")]
    InvalidDrainOrder(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Errors from classification table sources
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to read table {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Table is not valid UTF-8: {0}")]
    Encoding(String),
}

/// Errors from `PanPipeline::new`
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
