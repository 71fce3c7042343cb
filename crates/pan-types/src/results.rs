//! # Derived Results
//!
//! Classification and token outputs derived from a completed record, and the
//! enumerations with their stable wire IDs.

use serde::{Deserialize, Serialize};

/// Card brand. Discriminants are the 2-bit `brand_id` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Brand {
    #[default]
    Unknown = 0,
    Visa = 1,
    Mastercard = 2,
    Amex = 3,
}

/// Card product type. Discriminants are the 2-bit `type_id` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CardType {
    #[default]
    Unknown = 0,
    Credit = 1,
    Debit = 2,
    Prepaid = 3,
}

/// Issuing bank. Discriminants are the 3-bit `issuer_id` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Issuer {
    #[default]
    Unknown = 0,
    Td = 1,
    Cibc = 2,
    Rbc = 3,
    Desjardins = 4,
    Scotia = 5,
    Laurentian = 6,
}

impl Brand {
    /// Wire ID.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Decode a wire ID; out-of-range values read as `Unknown`.
    pub fn from_id(id: u8) -> Self {
        match id {
            1 => Brand::Visa,
            2 => Brand::Mastercard,
            3 => Brand::Amex,
            _ => Brand::Unknown,
        }
    }

    /// Parse a `brand_guess` column value. `OTHER` and anything unrecognised
    /// map to `Unknown`.
    pub fn from_table_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "VISA" => Brand::Visa,
            "MASTERCARD" => Brand::Mastercard,
            "AMEX" => Brand::Amex,
            _ => Brand::Unknown,
        }
    }
}

impl CardType {
    /// Wire ID.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Decode a wire ID; out-of-range values read as `Unknown`.
    pub fn from_id(id: u8) -> Self {
        match id {
            1 => CardType::Credit,
            2 => CardType::Debit,
            3 => CardType::Prepaid,
            _ => CardType::Unknown,
        }
    }

    /// Parse a `type_guess` column value.
    pub fn from_table_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "credit" => CardType::Credit,
            "debit" => CardType::Debit,
            "prepaid" => CardType::Prepaid,
            _ => CardType::Unknown,
        }
    }
}

impl Issuer {
    /// Wire ID.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Decode a wire ID; out-of-range values read as `Unknown`.
    pub fn from_id(id: u8) -> Self {
        match id {
            1 => Issuer::Td,
            2 => Issuer::Cibc,
            3 => Issuer::Rbc,
            4 => Issuer::Desjardins,
            5 => Issuer::Scotia,
            6 => Issuer::Laurentian,
            _ => Issuer::Unknown,
        }
    }

    /// Parse a canonical `issuer_guess` name.
    ///
    /// Issuers without a wire ID (BMO, MBNA, Tangerine, ...) read as
    /// `Unknown`; the table entry itself still counts as a hit.
    pub fn from_table_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "td" => Issuer::Td,
            "cibc" => Issuer::Cibc,
            "rbc" => Issuer::Rbc,
            "desjardins" => Issuer::Desjardins,
            "scotiabank" | "scotia" => Issuer::Scotia,
            "laurentian" => Issuer::Laurentian,
            _ => Issuer::Unknown,
        }
    }
}

/// Outcome of the BIN classifier for one record.
///
/// When `valid` is false, `hit`, `brand`, `card_type` and `issuer` are
/// undefined and read as their zero values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Mirrors Luhn validity: classification ran and was published.
    pub valid: bool,
    /// The prefix was present in the table.
    pub hit: bool,
    pub brand: Brand,
    pub card_type: CardType,
    pub issuer: Issuer,
}

impl ClassificationResult {
    /// The result published for a Luhn-invalid or incomplete record.
    pub const SUPPRESSED: ClassificationResult = ClassificationResult {
        valid: false,
        hit: false,
        brand: Brand::Unknown,
        card_type: CardType::Unknown,
        issuer: Issuer::Unknown,
    };

    /// A Luhn-valid record whose prefix is not in the table.
    pub const MISS: ClassificationResult = ClassificationResult {
        valid: true,
        hit: false,
        brand: Brand::Unknown,
        card_type: CardType::Unknown,
        issuer: Issuer::Unknown,
    };

    /// A Luhn-valid record whose prefix matched a table entry.
    pub fn hit(brand: Brand, card_type: CardType, issuer: Issuer) -> Self {
        Self {
            valid: true,
            hit: true,
            brand,
            card_type,
            issuer,
        }
    }
}

/// Opaque token issued for a Luhn-valid record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResult {
    pub token: u64,
    pub tag: u16,
}

impl TokenResult {
    /// Token bytes, least significant first (the drain order of the narrow bus).
    pub fn token_bytes(&self) -> [u8; 8] {
        self.token.to_le_bytes()
    }
}
