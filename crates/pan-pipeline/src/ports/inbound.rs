//! Inbound Ports (Driving Ports)
//!
//! The step API the bus adapters drive. One call is one cycle.

use pan_crypto::TokenNonce;
use pan_types::{ClassificationResult, DigitEvent, IinPrefix, RecordFault, TokenResult};
use serde::Serialize;

use crate::domain::FramerState;

/// Everything the pipeline consumes in one step
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineInput {
    /// Framer input for this cycle
    pub event: DigitEvent,
    /// Discard the current record and return to idle
    pub abort: bool,
    /// Nonce to latch for the next tokenization
    pub nonce: Option<TokenNonce>,
}

impl PipelineInput {
    /// A cycle with no lines asserted.
    pub fn idle() -> Self {
        Self::default()
    }

    /// A cycle carrying only a framer event.
    pub fn event(event: DigitEvent) -> Self {
        Self {
            event,
            ..Self::default()
        }
    }

    /// A cycle asserting only `abort`.
    pub fn abort() -> Self {
        Self {
            abort: true,
            ..Self::default()
        }
    }

    pub fn with_nonce(mut self, nonce: TokenNonce) -> Self {
        self.nonce = Some(nonce);
        self
    }
}

/// Registered pipeline outputs after a step
///
/// Derived results stay visible until the next `start`, abort, reset or
/// protocol error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSnapshot {
    /// Framer state
    pub state: FramerState,
    /// Digits seen in the current record
    pub length: u8,
    /// Ready and within 13..=19 digits
    pub length_ok: bool,
    /// No non-decimal nibble captured
    pub digit_ok: bool,
    /// Protocol error latched
    pub error: bool,
    /// Record complete
    pub ready: bool,
    /// Frozen IIN prefix, once six digits arrived
    pub iin: Option<IinPrefix>,
    /// Luhn result; false unless the record is checkable
    pub luhn_valid: bool,
    /// Published classification
    pub classification: ClassificationResult,
    /// Issued token
    pub token: Option<TokenResult>,
    /// Luhn-valid record waiting for a nonce
    pub token_pending: bool,
    /// Why the current record produced no outputs
    pub fault: Option<RecordFault>,
}

impl PipelineSnapshot {
    pub fn iin_ready(&self) -> bool {
        self.iin.is_some()
    }

    pub fn meta_valid(&self) -> bool {
        self.classification.valid
    }

    pub fn token_valid(&self) -> bool {
        self.token.is_some()
    }
}

/// Primary pipeline API (Driving Port)
pub trait PanIngestApi {
    /// Advance one cycle and return the registered outputs.
    fn step(&mut self, input: PipelineInput) -> PipelineSnapshot;

    /// Synchronous reset: discard the record, the latched nonce and all
    /// results.
    fn reset(&mut self);

    /// Current outputs without advancing.
    fn snapshot(&self) -> PipelineSnapshot;
}
