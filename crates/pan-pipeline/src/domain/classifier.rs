//! BIN classifier
//!
//! Looks the frozen IIN prefix up in the classification table. Runs only for
//! Luhn-valid records; otherwise publishes `ClassificationResult::SUPPRESSED`.

use std::sync::Arc;

use pan_types::{ClassificationResult, IinPrefix, PanRecord};

use super::config::KeyWidth;
use super::table::BinTable;

/// Prefix lookup gated by Luhn validity
#[derive(Clone, Debug)]
pub struct BinClassifier {
    table: Arc<BinTable>,
    key_width: KeyWidth,
}

impl BinClassifier {
    pub fn new(table: Arc<BinTable>, key_width: KeyWidth) -> Self {
        Self { table, key_width }
    }

    /// Classify a completed record.
    pub fn classify(&self, record: &PanRecord, luhn_valid: bool) -> ClassificationResult {
        self.classify_prefix(record.iin(), luhn_valid)
    }

    /// Classify a bare prefix.
    ///
    /// A Luhn-valid record without a prefix cannot occur (it has at least 13
    /// digits) but reads as a miss.
    pub fn classify_prefix(
        &self,
        prefix: Option<IinPrefix>,
        luhn_valid: bool,
    ) -> ClassificationResult {
        if !luhn_valid {
            return ClassificationResult::SUPPRESSED;
        }

        match prefix.and_then(|p| self.table.lookup(&p, self.key_width)) {
            Some(entry) => ClassificationResult::hit(entry.brand, entry.card_type, entry.issuer),
            None => ClassificationResult::MISS,
        }
    }

    pub fn key_width(&self) -> KeyWidth {
        self.key_width
    }

    pub fn table(&self) -> &BinTable {
        &self.table
    }
}
