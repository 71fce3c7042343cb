//! Wide parallel-signal bus
//!
//! One `WideInput` word per cycle in, one `WideOutput` word out. Every
//! internal signal has its own field.

use pan_crypto::{TokenNonce, NONCE_LEN};
use pan_types::DigitEvent;
use serde::Serialize;

use crate::ports::{PanIngestApi, PipelineInput, PipelineSnapshot};

/// Input word for one cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WideInput {
    pub start: bool,
    /// Only the low 4 bits are sampled
    pub digit_in: u8,
    pub digit_valid: bool,
    pub pan_end: bool,
    pub abort: bool,
    pub nonce_in: [u8; NONCE_LEN],
    pub nonce_valid: bool,
}

impl WideInput {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn start() -> Self {
        Self {
            start: true,
            ..Self::default()
        }
    }

    pub fn digit(value: u8, last: bool) -> Self {
        Self {
            digit_in: value,
            digit_valid: true,
            pan_end: last,
            ..Self::default()
        }
    }

    pub fn abort() -> Self {
        Self {
            abort: true,
            ..Self::default()
        }
    }

    /// Present `nonce` on `nonce_in` with `nonce_valid` asserted.
    pub fn with_nonce(mut self, nonce: &TokenNonce) -> Self {
        self.nonce_in = *nonce.as_bytes();
        self.nonce_valid = true;
        self
    }

    fn to_pipeline(self) -> PipelineInput {
        PipelineInput {
            event: DigitEvent {
                value: self.digit_in & 0x0F,
                valid: self.digit_valid,
                start: self.start,
                end: self.pan_end,
            },
            abort: self.abort,
            nonce: self
                .nonce_valid
                .then(|| TokenNonce::from_bytes(self.nonce_in)),
        }
    }
}

/// Output word for one cycle
///
/// `meta_hit` and the IDs read 0 when `meta_valid` is low; `token64` and
/// `token_tag16` read 0 when `token_valid` is low.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WideOutput {
    pub len_final: u8,
    pub length_ok: bool,
    pub digit_ok: bool,
    pub error_flag: bool,
    pub pan_ready: bool,
    pub iin_ready: bool,
    pub iin_prefix: u32,
    pub luhn_valid: bool,
    pub meta_valid: bool,
    pub meta_hit: bool,
    pub brand_id: u8,
    pub type_id: u8,
    pub issuer_id: u8,
    pub token_valid: bool,
    pub token64: u64,
    pub token_tag16: u16,
}

impl From<PipelineSnapshot> for WideOutput {
    fn from(s: PipelineSnapshot) -> Self {
        let meta = s.classification;
        let meta_valid = meta.valid;
        let (token64, token_tag16) = s.token.map(|t| (t.token, t.tag)).unwrap_or((0, 0));

        Self {
            len_final: s.length,
            length_ok: s.length_ok,
            digit_ok: s.digit_ok,
            error_flag: s.error,
            pan_ready: s.ready,
            iin_ready: s.iin_ready(),
            iin_prefix: s.iin.map(|p| p.packed()).unwrap_or(0),
            luhn_valid: s.luhn_valid,
            meta_valid,
            meta_hit: meta_valid && meta.hit,
            brand_id: if meta_valid { meta.brand.id() } else { 0 },
            type_id: if meta_valid { meta.card_type.id() } else { 0 },
            issuer_id: if meta_valid { meta.issuer.id() } else { 0 },
            token_valid: s.token.is_some(),
            token64,
            token_tag16,
        }
    }
}

/// Wide bus adapter over any pipeline implementation
pub struct WideBus<P: PanIngestApi> {
    pipeline: P,
}

impl<P: PanIngestApi> WideBus<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Drive one cycle.
    pub fn step(&mut self, input: WideInput) -> WideOutput {
        self.pipeline.step(input.to_pipeline()).into()
    }

    /// Current outputs without advancing.
    pub fn output(&self) -> WideOutput {
        self.pipeline.snapshot().into()
    }

    pub fn reset(&mut self) {
        self.pipeline.reset();
    }

    /// Drive a whole record: a start cycle (carrying `nonce`, if any), then
    /// one digit per cycle with `pan_end` on the last. Returns the outputs
    /// of the final cycle.
    pub fn send_pan(&mut self, digits: &[u8], nonce: Option<&TokenNonce>) -> WideOutput {
        let mut start = WideInput::start();
        if let Some(nonce) = nonce {
            start = start.with_nonce(nonce);
        }
        let mut out = self.step(start);

        for (i, &d) in digits.iter().enumerate() {
            out = self.step(WideInput::digit(d, i + 1 == digits.len()));
        }
        out
    }

    /// Idle until `token_valid` or until `max_steps` cycles have passed.
    ///
    /// Returns `None` on timeout.
    pub fn wait_for_token(&mut self, max_steps: u32) -> Option<WideOutput> {
        let current = self.output();
        if current.token_valid {
            return Some(current);
        }
        for _ in 0..max_steps {
            let out = self.step(WideInput::idle());
            if out.token_valid {
                return Some(out);
            }
        }
        tracing::debug!(max_steps, "Timed out waiting for token");
        None
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn into_inner(self) -> P {
        self.pipeline
    }
}
