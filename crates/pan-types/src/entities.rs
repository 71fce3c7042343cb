//! # Capture Entities
//!
//! The per-step input event and the record the digit framer builds from it.
//!
//! ## Lifecycle
//!
//! A `PanRecord` is created on `start`, mutated only by the framer while
//! capturing, frozen once `ready` is set, and discarded on the next `start`,
//! an abort or a reset.

use serde::{Deserialize, Serialize};

/// Shortest PAN accepted as `length_ok`.
pub const MIN_PAN_DIGITS: u8 = 13;

/// Longest PAN accepted as `length_ok`, and the number of digits stored.
pub const MAX_PAN_DIGITS: usize = 19;

/// Number of leading digits frozen into the IIN prefix register.
pub const IIN_DIGITS: usize = 6;

/// Width of the narrow table key derived from the IIN prefix.
pub const IIN_SHORT_DIGITS: usize = 4;

/// One cycle's worth of framer input.
///
/// `value` is the raw 4-bit nibble from the wire. Values 10..=15 are kept as
/// they are so the framer can flag them instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DigitEvent {
    /// Raw digit nibble (only the low 4 bits are meaningful).
    pub value: u8,
    /// The digit lines carry a digit this cycle.
    pub valid: bool,
    /// Begin a new record, discarding any in-progress one.
    pub start: bool,
    /// This event carries the final digit of the record.
    pub end: bool,
}

impl DigitEvent {
    /// An idle cycle: no control lines asserted.
    pub const IDLE: DigitEvent = DigitEvent {
        value: 0,
        valid: false,
        start: false,
        end: false,
    };

    /// A valid digit, optionally the last one.
    pub fn digit(value: u8, end: bool) -> Self {
        Self {
            value: value & 0x0F,
            valid: true,
            start: false,
            end,
        }
    }

    /// A bare start strobe.
    pub fn start() -> Self {
        Self {
            start: true,
            ..Self::IDLE
        }
    }

    /// Whether any line of this event is asserted.
    pub fn is_idle(&self) -> bool {
        !self.valid && !self.start && !self.end && self.value & 0x0F == 0
    }
}

/// The first six captured digits, each packed as an independent 4-bit field.
///
/// Digit `i` occupies bits `4*i .. 4*i+3`, so the first digit is the least
/// significant nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct IinPrefix(u32);

impl IinPrefix {
    /// Build a prefix from six digit values.
    pub fn from_digits(digits: [u8; IIN_DIGITS]) -> Self {
        let packed = digits
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, d)| acc | (u32::from(d & 0x0F) << (4 * i)));
        Self(packed)
    }

    /// Raw 24-bit register value.
    pub fn packed(&self) -> u32 {
        self.0
    }

    /// Digit at position `index` (0-based from the start of the PAN).
    pub fn nibble(&self, index: usize) -> u8 {
        debug_assert!(index < IIN_DIGITS);
        ((self.0 >> (4 * index)) & 0x0F) as u8
    }

    /// All six digits in capture order.
    pub fn digits(&self) -> [u8; IIN_DIGITS] {
        let mut out = [0u8; IIN_DIGITS];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.nibble(i);
        }
        out
    }

    /// Six-digit lookup key as a decimal number, e.g. `402916`.
    ///
    /// Returns `None` if any nibble is not a decimal digit.
    pub fn key6(&self) -> Option<u32> {
        Self::decimal_key(&self.digits())
    }

    /// Four-digit lookup key derived from the same register, e.g. `4029`.
    pub fn key4(&self) -> Option<u32> {
        Self::decimal_key(&self.digits()[..IIN_SHORT_DIGITS])
    }

    fn decimal_key(digits: &[u8]) -> Option<u32> {
        digits.iter().try_fold(0u32, |acc, &d| {
            if d <= 9 {
                Some(acc * 10 + u32::from(d))
            } else {
                None
            }
        })
    }
}

impl std::fmt::Display for IinPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for d in self.digits() {
            write!(f, "{:X}", d)?;
        }
        Ok(())
    }
}

/// A PAN under capture.
///
/// Invariants (maintained by the mutators below):
/// - `length_ok` is true iff `13 <= length <= 19` and the record is ready.
/// - `digit_ok` is true iff every captured nibble is in `0..=9`.
/// - once `ready` is set no mutator changes the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanRecord {
    digits: [u8; MAX_PAN_DIGITS],
    length: u8,
    length_ok: bool,
    digit_ok: bool,
    error: bool,
    ready: bool,
    iin: Option<IinPrefix>,
}

impl Default for PanRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl PanRecord {
    /// An empty record, as created by `start`.
    pub fn new() -> Self {
        Self {
            digits: [0u8; MAX_PAN_DIGITS],
            length: 0,
            length_ok: false,
            digit_ok: true,
            error: false,
            ready: false,
            iin: None,
        }
    }

    /// Append one nibble.
    ///
    /// Digits past the 19th are counted but not stored; they can only ever
    /// produce `length_ok=false`. Ignored once the record is frozen.
    pub fn push_digit(&mut self, value: u8) {
        if self.ready || self.error {
            return;
        }
        let nibble = value & 0x0F;
        if nibble > 9 {
            self.digit_ok = false;
        }
        let index = usize::from(self.length);
        if index < MAX_PAN_DIGITS {
            self.digits[index] = nibble;
        }
        self.length = self.length.saturating_add(1);

        if self.iin.is_none() && usize::from(self.length) == IIN_DIGITS {
            let mut prefix = [0u8; IIN_DIGITS];
            prefix.copy_from_slice(&self.digits[..IIN_DIGITS]);
            self.iin = Some(IinPrefix::from_digits(prefix));
        }
    }

    /// Freeze the record: compute `length_ok` and set `ready`.
    pub fn complete(&mut self) {
        if self.ready || self.error {
            return;
        }
        self.length_ok = (MIN_PAN_DIGITS..=MAX_PAN_DIGITS as u8).contains(&self.length);
        self.ready = true;
    }

    /// Latch a protocol error. The record can no longer become ready.
    pub fn mark_error(&mut self) {
        if !self.ready {
            self.error = true;
        }
    }

    /// Stored digits in capture order (at most 19).
    pub fn digits(&self) -> &[u8] {
        let stored = usize::from(self.length).min(MAX_PAN_DIGITS);
        &self.digits[..stored]
    }

    /// Number of digits seen, including any beyond the 19th (saturating).
    pub fn length(&self) -> u8 {
        self.length
    }

    /// Length within 13..=19. Only meaningful once ready.
    pub fn length_ok(&self) -> bool {
        self.length_ok
    }

    /// Every captured nibble was a decimal digit.
    pub fn digit_ok(&self) -> bool {
        self.digit_ok
    }

    /// A protocol error was latched during capture.
    pub fn error(&self) -> bool {
        self.error
    }

    /// The record received its final digit and is frozen.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// The IIN prefix, available as soon as six digits have arrived.
    pub fn iin(&self) -> Option<IinPrefix> {
        self.iin
    }

    /// Ready, well-formed, and eligible for checksum evaluation.
    pub fn is_checkable(&self) -> bool {
        self.ready && !self.error && self.length_ok && self.digit_ok
    }
}
