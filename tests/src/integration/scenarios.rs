//! # Reference Scenarios
//!
//! The four reference numbers on both buses:
//!
//! | PAN | Outcome |
//! |-----|---------|
//! | `4029163778265418` | checksum ok, table hit, token |
//! | `4500980840795554` | checksum fails, nothing downstream |
//! | `451064273502` | 12 digits, `length_ok=0` |
//! | `4999710862699773` | checksum ok, table miss, token |

#[cfg(test)]
mod tests {
    use pan_pipeline::DrainOrder;
    use pan_types::{Brand, CardType, Issuer};

    use crate::harness::*;

    // =========================================================================
    // WIDE BUS
    // =========================================================================

    #[test]
    fn test_wide_known_prefix() {
        let mut bus = wide_bus();
        let out = bus.send_pan(&digits(KNOWN_PAN), Some(&nonce(1)));

        assert_eq!(out.len_final, 16);
        assert!(out.pan_ready && out.length_ok && out.digit_ok && !out.error_flag);
        assert!(out.iin_ready);
        assert!(out.luhn_valid && out.meta_valid && out.meta_hit);
        assert_eq!(out.brand_id, Brand::Visa.id());
        assert_eq!(out.type_id, CardType::Credit.id());
        assert_eq!(out.issuer_id, Issuer::Td.id());
        assert!(out.token_valid);
    }

    #[test]
    fn test_wide_bad_checksum() {
        let mut bus = wide_bus();
        let out = bus.send_pan(&digits(BAD_CHECKSUM_PAN), Some(&nonce(1)));

        assert!(out.pan_ready && out.length_ok && out.digit_ok);
        assert!(!out.luhn_valid);
        assert!(!out.meta_valid && !out.meta_hit);
        assert_eq!((out.brand_id, out.type_id, out.issuer_id), (0, 0, 0));
        assert!(!out.token_valid);
        assert_eq!((out.token64, out.token_tag16), (0, 0));

        // The nonce stays latched; the token never shows up for this record.
        assert!(bus.wait_for_token(STEP_BUDGET).is_none());
    }

    #[test]
    fn test_wide_corrected_checksum_classifies() {
        let mut bus = wide_bus();
        let out = bus.send_pan(&digits("4500980840795553"), Some(&nonce(1)));
        assert!(out.luhn_valid && out.meta_hit);
        assert_eq!(out.issuer_id, Issuer::Cibc.id());
    }

    #[test]
    fn test_wide_short_record() {
        let mut bus = wide_bus();
        let out = bus.send_pan(&digits(SHORT_PAN), Some(&nonce(1)));

        assert!(out.pan_ready);
        assert_eq!(out.len_final, 12);
        assert!(!out.length_ok);
        assert!(!out.luhn_valid && !out.meta_valid && !out.token_valid);
    }

    #[test]
    fn test_wide_unknown_prefix() {
        let mut bus = wide_bus();
        let out = bus.send_pan(&digits(UNKNOWN_PREFIX_PAN), Some(&nonce(1)));

        assert!(out.luhn_valid && out.meta_valid);
        assert!(!out.meta_hit);
        assert_eq!((out.brand_id, out.type_id, out.issuer_id), (0, 0, 0));
        assert!(out.token_valid);
    }

    // =========================================================================
    // NARROW BUS
    // =========================================================================

    #[test]
    fn test_narrow_known_prefix() {
        let mut bus = narrow_bus(DrainOrder::lsb_first());
        let out = bus.send_pan(&digits(KNOWN_PAN), Some(&nonce(1)));

        assert!(out.pan_ready() && out.length_ok() && out.digit_ok());
        assert!(out.iin_ready() && !out.error_flag());
        assert!(out.luhn_valid() && out.meta_valid() && out.meta_hit());
        assert_eq!(out.brand(), Brand::Visa);
        assert_eq!(out.card_type(), CardType::Credit);
        assert_eq!(out.issuer(), Issuer::Td);
        assert!(out.token_valid());

        assert!(bus.collect_token(STEP_BUDGET).is_some());
    }

    #[test]
    fn test_narrow_bad_checksum() {
        let mut bus = narrow_bus(DrainOrder::lsb_first());
        let out = bus.send_pan(&digits(BAD_CHECKSUM_PAN), Some(&nonce(1)));

        assert!(out.pan_ready() && out.length_ok());
        assert!(!out.luhn_valid() && !out.meta_valid() && !out.token_valid());
        assert_eq!(out.brand(), Brand::Unknown);
        assert!(bus.collect_token(STEP_BUDGET).is_none());
    }

    #[test]
    fn test_narrow_short_record() {
        let mut bus = narrow_bus(DrainOrder::lsb_first());
        let out = bus.send_pan(&digits(SHORT_PAN), Some(&nonce(1)));

        assert!(out.pan_ready() && !out.length_ok());
        assert!(!out.luhn_valid() && !out.meta_valid() && !out.token_valid());
        assert!(bus.collect_token(STEP_BUDGET).is_none());
    }

    #[test]
    fn test_narrow_unknown_prefix() {
        let mut bus = narrow_bus(DrainOrder::lsb_first());
        let out = bus.send_pan(&digits(UNKNOWN_PREFIX_PAN), Some(&nonce(1)));

        assert!(out.luhn_valid() && out.meta_valid() && !out.meta_hit());
        assert_eq!(out.brand(), Brand::Unknown);
        assert_eq!(out.card_type(), CardType::Unknown);
        assert_eq!(out.issuer(), Issuer::Unknown);
        assert!(out.token_valid());
        assert!(bus.collect_token(STEP_BUDGET).is_some());
    }
}
