//! Byte-multiplexed bus
//!
//! The pin-constrained encoding: one input byte (plus a side byte for nonce
//! loading) per cycle, three output bytes.
//!
//! ```text
//! ui_in    [3:0] digit  [4] digit_valid  [5] start  [6] pan_end  [7] nonce_load
//! uio_in   nonce byte while nonce_load is high (byte 0 first, 12 bytes)
//!
//! uo_out   [0] pan_ready  [1] luhn_valid  [2] iin_ready  [3] length_ok
//!          [4] meta_valid [5] error_flag  [6] meta_hit   [7] token_valid
//! uio_out  [2:0] token byte index  [3] stream active
//! data_out token byte while streaming, else
//!          [1:0] brand  [3:2] type  [6:4] issuer  [7] digit_ok
//! ```
//!
//! The token drain starts the cycle after `token_valid` rises and presents
//! one byte per cycle for exactly eight cycles. Consumers reassemble by the
//! index on `uio_out`, never by arrival order.

use std::sync::Arc;

use pan_crypto::{TokenNonce, NONCE_LEN};
use pan_types::{Brand, CardType, DigitEvent, Issuer};

use crate::domain::DrainOrder;
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::{PanIngestApi, PipelineInput, PipelineSnapshot};

pub const UI_DIGIT_MASK: u8 = 0x0F;
pub const UI_DIGIT_VALID: u8 = 1 << 4;
pub const UI_START: u8 = 1 << 5;
pub const UI_PAN_END: u8 = 1 << 6;
pub const UI_NONCE_LOAD: u8 = 1 << 7;

pub const UO_PAN_READY: u8 = 1 << 0;
pub const UO_LUHN_VALID: u8 = 1 << 1;
pub const UO_IIN_READY: u8 = 1 << 2;
pub const UO_LENGTH_OK: u8 = 1 << 3;
pub const UO_META_VALID: u8 = 1 << 4;
pub const UO_ERROR: u8 = 1 << 5;
pub const UO_META_HIT: u8 = 1 << 6;
pub const UO_TOKEN_VALID: u8 = 1 << 7;

pub const UIO_INDEX_MASK: u8 = 0x07;
pub const UIO_STREAM_ACTIVE: u8 = 1 << 3;

const TOKEN_BYTES: usize = 8;

/// Pack a digit cycle into `ui_in`.
pub fn encode_digit(value: u8, start: bool, last: bool) -> u8 {
    let mut byte = (value & UI_DIGIT_MASK) | UI_DIGIT_VALID;
    if start {
        byte |= UI_START;
    }
    if last {
        byte |= UI_PAN_END;
    }
    byte
}

/// Output bytes for one cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NarrowOutput {
    pub uo_out: u8,
    pub uio_out: u8,
    pub data_out: u8,
}

impl NarrowOutput {
    fn flag(&self, mask: u8) -> bool {
        self.uo_out & mask != 0
    }

    pub fn pan_ready(&self) -> bool {
        self.flag(UO_PAN_READY)
    }

    pub fn luhn_valid(&self) -> bool {
        self.flag(UO_LUHN_VALID)
    }

    pub fn iin_ready(&self) -> bool {
        self.flag(UO_IIN_READY)
    }

    pub fn length_ok(&self) -> bool {
        self.flag(UO_LENGTH_OK)
    }

    pub fn meta_valid(&self) -> bool {
        self.flag(UO_META_VALID)
    }

    pub fn error_flag(&self) -> bool {
        self.flag(UO_ERROR)
    }

    pub fn meta_hit(&self) -> bool {
        self.flag(UO_META_HIT)
    }

    pub fn token_valid(&self) -> bool {
        self.flag(UO_TOKEN_VALID)
    }

    pub fn stream_active(&self) -> bool {
        self.uio_out & UIO_STREAM_ACTIVE != 0
    }

    /// Index of the token byte on `data_out` while streaming.
    pub fn byte_index(&self) -> u8 {
        self.uio_out & UIO_INDEX_MASK
    }

    /// Decoded brand; only meaningful when not streaming.
    pub fn brand(&self) -> Brand {
        Brand::from_id(self.data_out & 0x03)
    }

    pub fn card_type(&self) -> CardType {
        CardType::from_id((self.data_out >> 2) & 0x03)
    }

    pub fn issuer(&self) -> Issuer {
        Issuer::from_id((self.data_out >> 4) & 0x07)
    }

    pub fn digit_ok(&self) -> bool {
        self.data_out & 0x80 != 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drain {
    Idle,
    /// Token rose this cycle; streaming starts next cycle
    Armed([u8; TOKEN_BYTES]),
    Active {
        bytes: [u8; TOKEN_BYTES],
        position: usize,
    },
    /// All eight bytes presented for the current token
    Finished,
}

/// Byte-multiplexed bus adapter over any pipeline implementation
pub struct NarrowBus<P: PanIngestApi> {
    pipeline: P,
    drain_order: DrainOrder,
    nonce_shift: [u8; NONCE_LEN],
    nonce_count: usize,
    drain: Drain,
    token_was_valid: bool,
    last: NarrowOutput,
    metrics: Arc<dyn MetricsRecorder>,
}

impl<P: PanIngestApi> NarrowBus<P> {
    pub fn new(pipeline: P, drain_order: DrainOrder) -> Self {
        Self {
            pipeline,
            drain_order,
            nonce_shift: [0u8; NONCE_LEN],
            nonce_count: 0,
            drain: Drain::Idle,
            token_was_valid: false,
            last: NarrowOutput::default(),
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Report streamed token bytes to `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Drive one cycle.
    pub fn step(&mut self, ui_in: u8, uio_in: u8) -> NarrowOutput {
        let mut nonce = None;
        if ui_in & UI_NONCE_LOAD != 0 {
            self.nonce_shift[self.nonce_count] = uio_in;
            self.nonce_count += 1;
            if self.nonce_count == NONCE_LEN {
                nonce = Some(TokenNonce::from_bytes(self.nonce_shift));
                self.nonce_count = 0;
            }
        }

        let input = PipelineInput {
            event: DigitEvent {
                value: ui_in & UI_DIGIT_MASK,
                valid: ui_in & UI_DIGIT_VALID != 0,
                start: ui_in & UI_START != 0,
                end: ui_in & UI_PAN_END != 0,
            },
            abort: false,
            nonce,
        };
        let snapshot = self.pipeline.step(input);

        self.advance_drain(&snapshot);
        self.last = self.encode(&snapshot);
        self.last
    }

    /// Last cycle's outputs.
    pub fn output(&self) -> NarrowOutput {
        self.last
    }

    /// Synchronous reset: pipeline, nonce shift register and drain.
    pub fn reset(&mut self) {
        self.pipeline.reset();
        self.nonce_shift = [0u8; NONCE_LEN];
        self.nonce_count = 0;
        self.drain = Drain::Idle;
        self.token_was_valid = false;
        self.last = self.encode(&self.pipeline.snapshot());
    }

    /// Shift a full nonce in over twelve cycles.
    pub fn load_nonce(&mut self, nonce: &TokenNonce) -> NarrowOutput {
        let mut out = self.last;
        for &byte in nonce.as_bytes() {
            out = self.step(UI_NONCE_LOAD, byte);
        }
        out
    }

    /// Drive a whole record, loading `nonce` first if given. The first digit
    /// rides on the start cycle. Returns the outputs of the final cycle.
    pub fn send_pan(&mut self, digits: &[u8], nonce: Option<&TokenNonce>) -> NarrowOutput {
        if let Some(nonce) = nonce {
            self.load_nonce(nonce);
        }
        let mut out = self.last;
        for (i, &d) in digits.iter().enumerate() {
            out = self.step(encode_digit(d, i == 0, i + 1 == digits.len()), 0);
        }
        out
    }

    /// Idle until a full token has streamed out or `max_steps` pass.
    ///
    /// Returns `None` on timeout or if the stream window closes early.
    pub fn collect_token(&mut self, max_steps: u32) -> Option<u64> {
        let mut reassembler = TokenReassembler::new();
        for _ in 0..max_steps {
            let out = self.step(0, 0);
            match reassembler.push(&out) {
                ReassemblyEvent::Complete(token) => return Some(token),
                ReassemblyEvent::Incomplete { seen } => {
                    tracing::warn!(seen, "Token stream ended before all bytes arrived");
                    return None;
                }
                ReassemblyEvent::Idle | ReassemblyEvent::Progress { .. } => {}
            }
        }
        tracing::debug!(max_steps, "Timed out waiting for token stream");
        None
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub fn into_inner(self) -> P {
        self.pipeline
    }

    fn advance_drain(&mut self, snapshot: &PipelineSnapshot) {
        let token_valid = snapshot.token_valid();

        if !token_valid {
            if matches!(self.drain, Drain::Active { .. } | Drain::Armed(_)) {
                tracing::debug!("Token stream abandoned");
            }
            self.drain = Drain::Idle;
        } else if !self.token_was_valid {
            self.drain = match snapshot.token {
                Some(token) => Drain::Armed(token.token_bytes()),
                None => Drain::Idle,
            };
        } else {
            self.drain = match self.drain {
                Drain::Armed(bytes) => Drain::Active { bytes, position: 0 },
                Drain::Active { bytes, position } if position + 1 < TOKEN_BYTES => {
                    Drain::Active {
                        bytes,
                        position: position + 1,
                    }
                }
                Drain::Active { .. } | Drain::Finished => Drain::Finished,
                Drain::Idle => Drain::Idle,
            };
        }

        if matches!(self.drain, Drain::Active { .. }) {
            self.metrics.record_stream_byte();
        }
        self.token_was_valid = token_valid;
    }

    fn encode(&self, s: &PipelineSnapshot) -> NarrowOutput {
        let meta = s.classification;
        let mut uo_out = 0u8;
        for (set, mask) in [
            (s.ready, UO_PAN_READY),
            (s.luhn_valid, UO_LUHN_VALID),
            (s.iin_ready(), UO_IIN_READY),
            (s.length_ok, UO_LENGTH_OK),
            (meta.valid, UO_META_VALID),
            (s.error, UO_ERROR),
            (meta.valid && meta.hit, UO_META_HIT),
            (s.token_valid(), UO_TOKEN_VALID),
        ] {
            if set {
                uo_out |= mask;
            }
        }

        let (uio_out, data_out) = match self.drain {
            Drain::Active { bytes, position } => {
                let index = self.drain_order.index_at(position);
                (
                    UIO_STREAM_ACTIVE | (index & UIO_INDEX_MASK),
                    bytes[usize::from(index)],
                )
            }
            _ => {
                let mut packed = if meta.valid {
                    (meta.brand.id() & 0x03)
                        | ((meta.card_type.id() & 0x03) << 2)
                        | ((meta.issuer.id() & 0x07) << 4)
                } else {
                    0
                };
                if s.digit_ok {
                    packed |= 0x80;
                }
                (0, packed)
            }
        };

        NarrowOutput {
            uo_out,
            uio_out,
            data_out,
        }
    }
}

/// Outcome of feeding one cycle to a `TokenReassembler`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReassemblyEvent {
    /// No stream in progress
    Idle,
    /// A byte was stored; `seen` counts distinct indices so far
    Progress { index: u8, seen: u32 },
    /// All eight indices arrived within one window
    Complete(u64),
    /// The window closed with indices missing
    Incomplete { seen: u32 },
}

/// Rebuilds the 64-bit token from `(uio_out, data_out)` by byte index
#[derive(Clone, Debug, Default)]
pub struct TokenReassembler {
    bytes: [u8; TOKEN_BYTES],
    seen: u8,
    active: bool,
}

impl TokenReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, out: &NarrowOutput) -> ReassemblyEvent {
        if !out.stream_active() {
            if self.active {
                self.active = false;
                return ReassemblyEvent::Incomplete {
                    seen: self.seen.count_ones(),
                };
            }
            return ReassemblyEvent::Idle;
        }

        if !self.active {
            self.active = true;
            self.bytes = [0u8; TOKEN_BYTES];
            self.seen = 0;
        }

        let index = out.byte_index();
        self.bytes[usize::from(index)] = out.data_out;
        self.seen |= 1 << index;

        if self.seen == 0xFF {
            self.active = false;
            return ReassemblyEvent::Complete(u64::from_le_bytes(self.bytes));
        }
        ReassemblyEvent::Progress {
            index,
            seen: self.seen.count_ones(),
        }
    }
}
