//! Luhn (mod-10) checksum
//!
//! Scanning right to left with the check digit at position 0, every digit at
//! an odd position is doubled and reduced by 9 when it exceeds 9. The number
//! is valid iff the sum is divisible by 10.

use pan_types::PanRecord;

/// Mod-10 check over raw digit values.
///
/// Returns false for an empty slice or any value above 9.
pub fn luhn_valid(digits: &[u8]) -> bool {
    if digits.is_empty() {
        return false;
    }

    let mut sum = 0u32;
    for (position, &digit) in digits.iter().rev().enumerate() {
        if digit > 9 {
            return false;
        }
        let mut value = u32::from(digit);
        if position % 2 == 1 {
            value *= 2;
            if value > 9 {
                value -= 9;
            }
        }
        sum += value;
    }

    sum % 10 == 0
}

/// Luhn result for a record.
///
/// Defined only for a ready record with `length_ok` and `digit_ok`; reads
/// false otherwise.
pub fn evaluate(record: &PanRecord) -> bool {
    record.is_checkable() && luhn_valid(record.digits())
}

/// Check digit that makes `payload` Luhn-valid when appended.
pub fn check_digit(payload: &[u8]) -> u8 {
    let mut sum = 0u32;
    // Once the check digit is appended every payload digit shifts one
    // position left, so doubling starts at the rightmost payload digit.
    for (position, &digit) in payload.iter().rev().enumerate() {
        let mut value = u32::from(digit.min(9));
        if position % 2 == 0 {
            value *= 2;
            if value > 9 {
                value -= 9;
            }
        }
        sum += value;
    }
    ((10 - sum % 10) % 10) as u8
}
