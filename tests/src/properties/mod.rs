//! # Pipeline Properties
//!
//! proptest properties over arbitrary digit streams, nonces and drain orders.
//! Each case drives a fresh pipeline through the public bus adapters.

#[cfg(test)]
mod tests {
    use std::ops::RangeInclusive;

    use pan_crypto::TokenNonce;
    use pan_pipeline::{DrainOrder, KeyWidth};
    use pan_types::IinPrefix;
    use proptest::prelude::*;

    use crate::harness::*;

    /// Plain mod-10 reference, written independently of the pipeline.
    fn reference_luhn(digits: &[u8]) -> bool {
        let sum: u32 = digits
            .iter()
            .rev()
            .enumerate()
            .map(|(i, &d)| {
                let d = u32::from(d);
                if i % 2 == 1 {
                    let doubled = d * 2;
                    doubled / 10 + doubled % 10
                } else {
                    d
                }
            })
            .sum();
        sum % 10 == 0
    }

    fn in_range_digits(len: RangeInclusive<usize>) -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(0u8..10, len)
    }

    fn any_nonce() -> impl Strategy<Value = TokenNonce> {
        any::<[u8; 12]>().prop_map(TokenNonce::from_bytes)
    }

    fn any_drain_order() -> impl Strategy<Value = DrainOrder> {
        Just((0u8..8).collect::<Vec<_>>())
            .prop_shuffle()
            .prop_map(|v| {
                let mut order = [0u8; 8];
                order.copy_from_slice(&v);
                DrainOrder::new(order).unwrap()
            })
    }

    /// A payload plus a check digit that is deliberately wrong by `offset`.
    fn luhn_invalid_16() -> impl Strategy<Value = Vec<u8>> {
        (in_range_digits(15..=15), 1u8..10).prop_map(|(payload, offset)| {
            let mut pan = with_check_digit(&payload);
            let last = pan.len() - 1;
            pan[last] = (pan[last] + offset) % 10;
            pan
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_valid_lengths_report_checksum(pan in in_range_digits(13..=19)) {
            let mut bus = wide_bus();
            let out = bus.send_pan(&pan, Some(&nonce(1)));

            prop_assert!(out.pan_ready);
            prop_assert!(out.length_ok && out.digit_ok);
            prop_assert_eq!(out.luhn_valid, reference_luhn(&pan));
            prop_assert_eq!(out.token_valid, out.luhn_valid);
        }

        #[test]
        fn prop_bad_lengths_never_classify_or_tokenize(
            pan in prop_oneof![in_range_digits(1..=12), in_range_digits(20..=40)],
        ) {
            let mut bus = wide_bus();
            let out = bus.send_pan(&pan, Some(&nonce(1)));

            prop_assert!(out.pan_ready && !out.length_ok);
            prop_assert!(!out.luhn_valid && !out.meta_valid && !out.token_valid);
            prop_assert!(bus.wait_for_token(16).is_none());
        }

        #[test]
        fn prop_luhn_invalid_never_classify_or_tokenize(pan in luhn_invalid_16()) {
            let mut bus = wide_bus();
            let out = bus.send_pan(&pan, Some(&nonce(1)));

            prop_assert!(out.length_ok && !out.luhn_valid);
            prop_assert!(!out.meta_valid && !out.meta_hit);
            prop_assert!(bus.wait_for_token(16).is_none());
        }

        #[test]
        fn prop_unknown_prefix_is_a_valid_miss(payload in in_range_digits(12..=18)) {
            let table = bundled_table();
            let pan = with_check_digit(&payload);
            let mut iin = [0u8; 6];
            iin.copy_from_slice(&pan[..6]);
            prop_assume!(table.lookup(&IinPrefix::from_digits(iin), KeyWidth::Both).is_none());

            let mut bus = wide_bus();
            let out = bus.send_pan(&pan, Some(&nonce(1)));

            prop_assert!(out.luhn_valid && out.meta_valid && !out.meta_hit);
            prop_assert_eq!((out.brand_id, out.type_id, out.issuer_id), (0, 0, 0));
            prop_assert!(out.token_valid);
        }

        #[test]
        fn prop_distinct_nonces_give_distinct_tokens(
            payload in in_range_digits(15..=15),
            a in any_nonce(),
            b in any_nonce(),
        ) {
            prop_assume!(a != b);
            let pan = with_check_digit(&payload);

            let ta = wide_bus().send_pan(&pan, Some(&a));
            let tb = wide_bus().send_pan(&pan, Some(&b));

            prop_assert!(ta.token_valid && tb.token_valid);
            prop_assert_ne!(ta.token64, tb.token64);
        }

        #[test]
        fn prop_narrow_stream_reassembles_to_wide_token(
            payload in in_range_digits(12..=18),
            n in any_nonce(),
            order in any_drain_order(),
        ) {
            let pan = with_check_digit(&payload);
            let wide = wide_bus().send_pan(&pan, Some(&n));

            let mut narrow = narrow_bus(order);
            narrow.send_pan(&pan, Some(&n));

            prop_assert_eq!(narrow.collect_token(STEP_BUDGET), Some(wide.token64));
        }
    }
}
