//! Outbound Ports (Driven Ports)
//!
//! Dependencies the pipeline has on the outside world: where the
//! classification table comes from, and who receives issued tokens.

use pan_types::{ClassificationResult, TokenResult};

use crate::domain::{BinTable, LoadReport};
use crate::error::TableError;

/// Downstream consumer of issued tokens (Driven Port)
///
/// Called exactly once per issued token. The raw PAN never crosses this
/// port.
pub trait TokenSink: Send + Sync {
    fn deliver(&self, token: &TokenResult, classification: &ClassificationResult);
}

/// Sink that discards every token
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl TokenSink for NullSink {
    fn deliver(&self, _: &TokenResult, _: &ClassificationResult) {}
}

/// Source of the classification table (Driven Port)
pub trait BinTableSource {
    /// Load and parse the table. Malformed rows are reported, not fatal.
    fn load(&self) -> Result<(BinTable, LoadReport), TableError>;
}
