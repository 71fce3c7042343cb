//! # Control Flows
//!
//! Restart, abort, out-of-range digits, protocol errors, late nonces and
//! result lifetime across consecutive records.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pan_pipeline::{
        encode_digit, DrainOrder, FramerState, PanIngestApi, PanPipeline, WideBus, WideInput,
    };
    use pan_types::{IinPrefix, ProtocolViolation, RecordFault};

    use crate::harness::*;

    fn fault_of(bus: &WideBus<PanPipeline>) -> Option<RecordFault> {
        bus.pipeline().snapshot().fault
    }

    // =========================================================================
    // RESTART / ABORT
    // =========================================================================

    #[test]
    fn test_restart_mid_record_discards_partial_digits() {
        let mut bus = wide_bus();
        bus.step(WideInput::start());
        for &d in &digits("5191") {
            bus.step(WideInput::digit(d, false));
        }

        let out = bus.send_pan(&digits(KNOWN_PAN), Some(&nonce(2)));
        assert_eq!(out.len_final, 16);
        assert!(out.luhn_valid && out.token_valid);
    }

    #[test]
    fn test_abort_mid_record_then_recover() {
        let mut bus = wide_bus();
        bus.step(WideInput::start().with_nonce(&nonce(3)));
        for &d in &digits("40291637") {
            bus.step(WideInput::digit(d, false));
        }

        let out = bus.step(WideInput::abort());
        assert!(!out.pan_ready && !out.luhn_valid && !out.token_valid);
        assert_eq!(bus.pipeline().snapshot().state, FramerState::Idle);

        // Abort keeps the latched nonce for the next record.
        let out = bus.send_pan(&digits(KNOWN_PAN), None);
        assert!(out.luhn_valid && out.token_valid);
    }

    #[test]
    fn test_reset_returns_to_power_on_outputs() {
        let mut bus = wide_bus();
        bus.send_pan(&digits(KNOWN_PAN), Some(&nonce(4)));
        bus.step(WideInput::idle().with_nonce(&nonce(5)));
        bus.reset();

        let out = bus.output();
        assert_eq!(out.len_final, 0);
        assert!(!out.pan_ready && !out.error_flag && !out.iin_ready);
        assert!(!out.luhn_valid && !out.meta_valid && !out.token_valid);

        // The nonce latched before the reset is gone.
        let out = bus.send_pan(&digits(KNOWN_PAN), None);
        assert!(out.luhn_valid && !out.token_valid);
    }

    // =========================================================================
    // OUT-OF-RANGE DIGITS
    // =========================================================================

    /// `KNOWN_PAN` with a hex nibble in the middle of the account number.
    fn pan_with_nibble_a() -> Vec<u8> {
        let mut pan = digits(KNOWN_PAN);
        pan[8] = 0xA;
        pan
    }

    #[test]
    fn test_out_of_range_digit_suppresses_wide_outputs() {
        let mut bus = wide_bus();
        let out = bus.send_pan(&pan_with_nibble_a(), Some(&nonce(9)));

        assert!(out.pan_ready && !out.error_flag);
        assert_eq!(out.len_final, 16);
        assert!(out.length_ok && !out.digit_ok);
        assert!(!out.luhn_valid && !out.meta_valid && !out.meta_hit);
        assert!(!out.token_valid);
        assert_eq!((out.brand_id, out.type_id, out.issuer_id), (0, 0, 0));
        assert_eq!(fault_of(&bus), Some(RecordFault::DigitInvalid));
        assert!(bus.wait_for_token(STEP_BUDGET).is_none());

        // The nonce is still latched and serves the next good record.
        let out = bus.send_pan(&digits(KNOWN_PAN), None);
        assert!(out.digit_ok && out.token_valid);
    }

    #[test]
    fn test_out_of_range_digit_suppresses_narrow_outputs() {
        let mut bus = narrow_bus(DrainOrder::lsb_first());
        let out = bus.send_pan(&pan_with_nibble_a(), Some(&nonce(9)));

        assert!(out.pan_ready() && !out.error_flag());
        assert!(out.length_ok() && !out.digit_ok());
        assert!(!out.luhn_valid() && !out.meta_valid() && !out.meta_hit());
        assert!(!out.token_valid());
        assert_eq!(
            bus.pipeline().snapshot().fault,
            Some(RecordFault::DigitInvalid)
        );
        assert!(bus.collect_token(STEP_BUDGET).is_none());
    }

    // =========================================================================
    // PROTOCOL ERRORS
    // =========================================================================

    #[test]
    fn test_end_without_start_raises_error() {
        let mut bus = wide_bus();
        let out = bus.step(WideInput {
            pan_end: true,
            ..WideInput::idle()
        });
        assert!(out.error_flag && !out.pan_ready);
        assert_eq!(
            fault_of(&bus),
            Some(RecordFault::Protocol(ProtocolViolation::EndWithoutStart))
        );

        let out = bus.send_pan(&digits(KNOWN_PAN), Some(&nonce(5)));
        assert!(!out.error_flag && out.luhn_valid);
        assert!(fault_of(&bus).is_none());
    }

    #[test]
    fn test_digit_lines_without_valid_during_capture() {
        let mut bus = wide_bus();
        bus.step(WideInput::start());
        bus.step(WideInput::digit(4, false));
        let out = bus.step(WideInput {
            digit_in: 7,
            ..WideInput::idle()
        });
        assert!(out.error_flag);
        assert_eq!(
            fault_of(&bus),
            Some(RecordFault::Protocol(ProtocolViolation::DigitWithoutValid))
        );

        // Remaining digits of the broken record do not complete it.
        for &d in &digits("02916377826541") {
            bus.step(WideInput::digit(d, false));
        }
        let out = bus.step(WideInput::digit(8, true));
        assert!(out.error_flag && !out.pan_ready && !out.token_valid);
    }

    #[test]
    fn test_stray_digit_after_completion_clears_results() {
        let mut bus = wide_bus();
        let out = bus.send_pan(&digits(KNOWN_PAN), Some(&nonce(6)));
        assert!(out.token_valid);

        let out = bus.step(WideInput::digit(1, false));
        assert!(out.error_flag);
        assert!(!out.meta_valid && !out.token_valid && !out.luhn_valid);
    }

    #[test]
    fn test_narrow_digit_without_start_sets_error_bit() {
        let mut bus = narrow_bus(DrainOrder::lsb_first());
        let out = bus.step(encode_digit(4, false, false), 0);
        assert!(out.error_flag() && !out.pan_ready());

        let out = bus.send_pan(&digits(KNOWN_PAN), Some(&nonce(7)));
        assert!(!out.error_flag() && out.token_valid());
    }

    // =========================================================================
    // NONCE HANDLING
    // =========================================================================

    #[test]
    fn test_late_nonce_releases_pending_token() {
        let mut bus = wide_bus();
        let out = bus.send_pan(&digits(KNOWN_PAN), None);
        assert!(out.luhn_valid && !out.token_valid);
        assert!(bus.pipeline().snapshot().token_pending);

        // Nothing arrives without a nonce.
        assert!(bus.wait_for_token(8).is_none());

        let mut sent = false;
        let out = within_steps(STEP_BUDGET, "late nonce token", || {
            let input = if sent {
                WideInput::idle()
            } else {
                sent = true;
                WideInput::idle().with_nonce(&nonce(8))
            };
            let out = bus.step(input);
            out.token_valid.then_some(out)
        });
        assert!(out.meta_valid && out.meta_hit);
    }

    #[test]
    fn test_one_nonce_one_token() {
        let mut bus = wide_bus();
        assert!(bus.send_pan(&digits(KNOWN_PAN), Some(&nonce(9))).token_valid);

        let out = bus.send_pan(&digits(UNKNOWN_PREFIX_PAN), None);
        assert!(out.luhn_valid && !out.token_valid);
        assert!(bus.wait_for_token(STEP_BUDGET).is_none());
    }

    #[test]
    fn test_same_nonce_reproduces_token() {
        let mut a = wide_bus();
        let mut b = wide_bus();
        let ta = a.send_pan(&digits(KNOWN_PAN), Some(&nonce(10)));
        let tb = b.send_pan(&digits(KNOWN_PAN), Some(&nonce(10)));
        assert_eq!(ta.token64, tb.token64);
        assert_eq!(ta.token_tag16, tb.token_tag16);
    }

    #[test]
    fn test_back_to_back_records_issue_distinct_tokens() {
        let mut bus = wide_bus();
        let mut tokens = HashSet::new();
        for seed in 0..32u8 {
            let out = bus.send_pan(&digits(KNOWN_PAN), Some(&nonce(seed)));
            assert!(out.token_valid);
            tokens.insert(out.token64);
        }
        assert_eq!(tokens.len(), 32);
    }

    // =========================================================================
    // RESULT LIFETIME
    // =========================================================================

    #[test]
    fn test_results_hold_until_next_start() {
        let mut bus = wide_bus();
        let done = bus.send_pan(&digits(KNOWN_PAN), Some(&nonce(11)));

        for _ in 0..STEP_BUDGET {
            assert_eq!(bus.step(WideInput::idle()), done);
        }

        let out = bus.step(WideInput::start());
        assert!(!out.pan_ready && !out.luhn_valid && !out.meta_valid && !out.token_valid);
        assert!(!out.iin_ready);
    }

    #[test]
    fn test_iin_visible_before_completion() {
        let mut bus = wide_bus();
        bus.step(WideInput::start());
        let ds = digits(KNOWN_PAN);
        let mut out = bus.output();
        for &d in &ds[..6] {
            out = bus.step(WideInput::digit(d, false));
        }
        assert!(out.iin_ready && !out.pan_ready);
        assert_eq!(out.iin_prefix, IinPrefix::from_digits([4, 0, 2, 9, 1, 6]).packed());
    }
}
