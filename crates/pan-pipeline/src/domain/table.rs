//! Classification table
//!
//! Immutable prefix -> {brand, type, issuer} map, built once from the
//! curated CSV (`key,brand_guess,type_guess,issuer_guess,desc`).
//!
//! INVARIANTS:
//! - Keys are unique within one width; the first row for a key wins.
//! - Four- and six-digit keys live in separate maps, so `0401` and `000401`
//!   never collide.
//! - Malformed rows are skipped and counted, never fatal.

use std::collections::HashMap;

use pan_types::{Brand, CardType, IinPrefix, Issuer};
use serde::{Deserialize, Serialize};

use super::config::KeyWidth;

/// Classification attached to a table key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinEntry {
    pub brand: Brand,
    pub card_type: CardType,
    pub issuer: Issuer,
}

/// Counts from one table load
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Rows that became table entries
    pub accepted: usize,
    /// Rows with a bad key or too few columns
    pub malformed: usize,
    /// Rows whose key was already present
    pub duplicates: usize,
}

/// Static BIN/IIN classification table
#[derive(Clone, Debug, Default)]
pub struct BinTable {
    six: HashMap<u32, BinEntry>,
    four: HashMap<u32, BinEntry>,
}

impl BinTable {
    /// A table with no entries; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse CSV text. A header on the first data line (after any blank or
    /// `#` comment lines) is recognised and skipped.
    pub fn parse(text: &str) -> (Self, LoadReport) {
        let mut table = Self::empty();
        let mut report = LoadReport::default();
        let mut seen_data = false;

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let first_data_line = !seen_data;
            seen_data = true;
            if first_data_line && is_header(line) {
                continue;
            }

            match parse_row(line) {
                Some((width, key, entry)) => {
                    if table.insert(width, key, entry) {
                        report.accepted += 1;
                    } else {
                        report.duplicates += 1;
                        tracing::warn!(line = line_no + 1, key, "Duplicate table key ignored");
                    }
                }
                None => {
                    report.malformed += 1;
                    tracing::warn!(line = line_no + 1, "Malformed table row skipped");
                }
            }
        }

        tracing::debug!(
            accepted = report.accepted,
            malformed = report.malformed,
            duplicates = report.duplicates,
            "Classification table parsed"
        );
        (table, report)
    }

    /// Build from `(key, entry)` pairs where `key` is a 4- or 6-digit string.
    /// Invalid keys are skipped.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, BinEntry)>,
    {
        let mut table = Self::empty();
        for (key, entry) in entries {
            if let Some((width, value)) = parse_key(key) {
                table.insert(width, value, entry);
            }
        }
        table
    }

    /// Look up an IIN prefix.
    ///
    /// With `KeyWidth::Both` the six-digit key is tried first and a
    /// four-digit entry is only consulted when it misses.
    pub fn lookup(&self, prefix: &IinPrefix, width: KeyWidth) -> Option<&BinEntry> {
        if width.uses_six() {
            if let Some(entry) = prefix.key6().and_then(|k| self.six.get(&k)) {
                return Some(entry);
            }
        }
        if width.uses_four() {
            if let Some(entry) = prefix.key4().and_then(|k| self.four.get(&k)) {
                return Some(entry);
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.six.len() + self.four.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries keyed on six digits.
    pub fn six_digit_entries(&self) -> usize {
        self.six.len()
    }

    /// Entries keyed on four digits.
    pub fn four_digit_entries(&self) -> usize {
        self.four.len()
    }

    fn insert(&mut self, width: usize, key: u32, entry: BinEntry) -> bool {
        let map = if width == 6 {
            &mut self.six
        } else {
            &mut self.four
        };
        if map.contains_key(&key) {
            return false;
        }
        map.insert(key, entry);
        true
    }
}

fn is_header(line: &str) -> bool {
    line.split(',')
        .next()
        .map(|first| first.trim().trim_matches('"').eq_ignore_ascii_case("key"))
        .unwrap_or(false)
}

/// Parse one data row. `desc` is the last column and may contain commas.
fn parse_row(line: &str) -> Option<(usize, u32, BinEntry)> {
    let mut fields = line.splitn(5, ',');
    let key = fields.next()?;
    let brand = fields.next()?;
    let card_type = fields.next()?;
    let issuer = fields.next()?;

    let (width, value) = parse_key(key)?;
    let entry = BinEntry {
        brand: Brand::from_table_name(unquote(brand)),
        card_type: CardType::from_table_name(unquote(card_type)),
        issuer: Issuer::from_table_name(unquote(issuer)),
    };
    Some((width, value, entry))
}

/// A fixed-width, all-digit key of 4 or 6 characters.
fn parse_key(raw: &str) -> Option<(usize, u32)> {
    let key = unquote(raw);
    if !(key.len() == 4 || key.len() == 6) || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok().map(|value| (key.len(), value))
}

fn unquote(field: &str) -> &str {
    field.trim().trim_matches('"').trim()
}
