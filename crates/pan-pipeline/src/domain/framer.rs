//! Digit framer
//!
//! Consumes one `DigitEvent` per step and builds the `PanRecord`.
//!
//! ```text
//!            start                  valid+end
//!   IDLE ───────────▶ CAPTURING ─────────────▶ DONE (ready)
//!    ▲                   │  ▲                    │
//!    │ reset/abort       │  └──── start ─────────┤
//!    │                   ▼ forbidden combination │ stray digit/end
//!    └───────────────  ERROR ◀───────────────────┘
//! ```
//!
//! INVARIANTS:
//! - `start` always opens a fresh record, from any state.
//! - `error` is latched until the next `start`; an errored record never
//!   becomes ready.
//! - The IIN prefix is frozen on the sixth digit and never changes after.

use pan_types::{DigitEvent, PanRecord, ProtocolViolation};
use serde::{Deserialize, Serialize};

/// Framer state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FramerState {
    #[default]
    Idle,
    Capturing,
    Done,
    Error,
}

/// What happened during one framer step
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FramerTransition {
    /// A new record was opened
    pub started: bool,
    /// The IIN prefix was frozen this step
    pub iin_frozen: bool,
    /// The record received its final digit this step
    pub completed: bool,
    /// A protocol violation was latched this step
    pub violation: Option<ProtocolViolation>,
}

/// Digit-serial framer state machine
#[derive(Clone, Debug, Default)]
pub struct DigitFramer {
    state: FramerState,
    record: PanRecord,
    violation: Option<ProtocolViolation>,
}

impl DigitFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one event.
    pub fn step(&mut self, event: DigitEvent) -> FramerTransition {
        let mut transition = FramerTransition::default();

        if event.start {
            self.open_record();
            transition.started = true;
        }

        match self.state {
            FramerState::Capturing => {
                if event.valid {
                    let had_iin = self.record.iin().is_some();
                    self.record.push_digit(event.value);
                    transition.iin_frozen = !had_iin && self.record.iin().is_some();

                    if event.end {
                        self.record.complete();
                        self.state = FramerState::Done;
                        transition.completed = true;
                    }
                } else if event.end {
                    transition.violation = self.latch(ProtocolViolation::EndWithoutDigit);
                } else if !event.start && event.value & 0x0F != 0 {
                    transition.violation = self.latch(ProtocolViolation::DigitWithoutValid);
                }
            }
            FramerState::Idle | FramerState::Done | FramerState::Error => {
                if event.valid {
                    transition.violation = self.latch(ProtocolViolation::DigitWithoutStart);
                } else if event.end {
                    transition.violation = self.latch(ProtocolViolation::EndWithoutStart);
                }
            }
        }

        transition
    }

    /// Discard any record and return to `Idle` (abort input).
    pub fn abort(&mut self) {
        self.state = FramerState::Idle;
        self.record = PanRecord::new();
        self.violation = None;
    }

    /// Synchronous reset.
    pub fn reset(&mut self) {
        self.abort();
    }

    pub fn state(&self) -> FramerState {
        self.state
    }

    pub fn record(&self) -> &PanRecord {
        &self.record
    }

    /// The latched violation, if the framer is in `Error`.
    pub fn violation(&self) -> Option<ProtocolViolation> {
        self.violation
    }

    fn open_record(&mut self) {
        self.record = PanRecord::new();
        self.state = FramerState::Capturing;
        self.violation = None;
    }

    /// Latch a violation. Only the first one per record is reported.
    fn latch(&mut self, violation: ProtocolViolation) -> Option<ProtocolViolation> {
        self.record.mark_error();
        self.state = FramerState::Error;
        if self.violation.is_some() {
            return None;
        }
        self.violation = Some(violation);
        tracing::debug!(?violation, length = self.record.length(), "Framer protocol error");
        Some(violation)
    }
}
