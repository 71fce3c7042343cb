//! # Record Faults
//!
//! Per-record outcomes that stop a record from reaching classification and
//! tokenization. None of these is fatal to the pipeline: the next `start`
//! begins a fresh record.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A control-line combination the capture protocol forbids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ProtocolViolation {
    /// Digit lines driven while `valid` is low during capture.
    #[error("digit lines driven without digit_valid")]
    DigitWithoutValid,

    /// `end` asserted without a concurrent valid digit.
    #[error("pan_end asserted without a valid digit")]
    EndWithoutDigit,

    /// `end` asserted with no open record.
    #[error("pan_end asserted without a preceding start")]
    EndWithoutStart,

    /// A valid digit arrived with no open record.
    #[error("digit received without a preceding start")]
    DigitWithoutStart,
}

/// Why a record produced no classification or token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RecordFault {
    /// Malformed signal sequence; the record was discarded.
    #[error("protocol error: {0}")]
    Protocol(ProtocolViolation),

    /// The record completed outside the 13..=19 digit range.
    #[error("invalid length: {length} digits")]
    LengthInvalid { length: u8 },

    /// A captured nibble was outside 0..=9.
    #[error("non-decimal digit captured")]
    DigitInvalid,

    /// The Luhn checksum failed.
    #[error("checksum invalid")]
    ChecksumInvalid,
}

impl RecordFault {
    /// Short label used for logs and metric dimensions.
    pub fn label(&self) -> &'static str {
        match self {
            RecordFault::Protocol(_) => "protocol",
            RecordFault::LengthInvalid { .. } => "length",
            RecordFault::DigitInvalid => "digit",
            RecordFault::ChecksumInvalid => "checksum",
        }
    }
}
