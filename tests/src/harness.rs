//! Shared fixtures and a step-bounded driver.
//!
//! Every wait in the suite goes through [`within_steps`], so a pipeline that
//! never produces an output fails the test instead of hanging it.

use std::sync::Arc;

use pan_crypto::TokenNonce;
use pan_pipeline::{
    check_digit, BinTable, BinTableSource, BundledTableSource, DrainOrder, NarrowBus,
    PanPipeline, PipelineConfig, PipelineConfigBuilder, WideBus,
};

/// Step budget for every wait in the suite.
pub const STEP_BUDGET: u32 = 64;

/// Valid checksum, six-digit table hit (TD Visa credit).
pub const KNOWN_PAN: &str = "4029163778265418";
/// A valid number with its last digit incremented.
pub const BAD_CHECKSUM_PAN: &str = "4500980840795554";
/// Twelve digits.
pub const SHORT_PAN: &str = "451064273502";
/// Valid checksum, prefix absent from the table.
pub const UNKNOWN_PREFIX_PAN: &str = "4999710862699773";

pub fn config() -> PipelineConfig {
    PipelineConfigBuilder::new()
        .token_secret("pan-tests")
        .token_timeout_steps(STEP_BUDGET)
        .build()
        .unwrap()
}

pub fn bundled_table() -> Arc<BinTable> {
    let (table, report) = BundledTableSource.load().unwrap();
    assert_eq!(report.malformed, 0);
    Arc::new(table)
}

pub fn pipeline() -> PanPipeline {
    PanPipeline::new(config(), bundled_table()).unwrap()
}

pub fn wide_bus() -> WideBus<PanPipeline> {
    WideBus::new(pipeline())
}

pub fn narrow_bus(order: DrainOrder) -> NarrowBus<PanPipeline> {
    NarrowBus::new(pipeline(), order)
}

pub fn digits(pan: &str) -> Vec<u8> {
    pan.bytes().map(|b| b - b'0').collect()
}

/// `payload` followed by its Luhn check digit.
pub fn with_check_digit(payload: &[u8]) -> Vec<u8> {
    let mut pan = payload.to_vec();
    pan.push(check_digit(payload));
    pan
}

/// Twelve distinct-ish bytes derived from `seed`.
pub fn nonce(seed: u8) -> TokenNonce {
    let mut bytes = [0u8; 12];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = seed.wrapping_mul(31).wrapping_add(i as u8);
    }
    TokenNonce::from_bytes(bytes)
}

/// Call `step` until it yields a value. Panics after `budget` calls.
pub fn within_steps<T>(budget: u32, what: &str, mut step: impl FnMut() -> Option<T>) -> T {
    for _ in 0..budget {
        if let Some(value) = step() {
            return value;
        }
    }
    panic!("{what}: nothing after {budget} steps");
}
