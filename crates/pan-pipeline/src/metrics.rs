//! Metrics hooks for pipeline stages
//!
//! Counters for records, faults, classifications and tokens. The runtime
//! bridges `MetricsRecorder` onto Prometheus; tests and embedded users can
//! read the atomic `Metrics` directly.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use pan_pipeline::metrics::Metrics;
//!
//! let metrics = Arc::new(Metrics::new());
//! let pipeline = PanPipeline::new(config, table)?.with_metrics(metrics.clone());
//! // ... drive records ...
//! println!("{:?}", metrics.snapshot());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use pan_types::RecordFault;

/// Metrics collector for pipeline operations
#[derive(Default)]
pub struct Metrics {
    /// Records that received their final digit
    pub records_completed: AtomicU64,
    /// Records discarded by a protocol error
    pub protocol_errors: AtomicU64,
    /// Completed records outside 13..=19 digits
    pub length_rejects: AtomicU64,
    /// Completed records with a non-decimal nibble
    pub digit_rejects: AtomicU64,
    /// Well-formed records failing the checksum
    pub luhn_failures: AtomicU64,
    /// Published classifications that hit the table
    pub classification_hits: AtomicU64,
    /// Published classifications that missed
    pub classification_misses: AtomicU64,
    /// Tokens derived
    pub tokens_issued: AtomicU64,
    /// Token bytes drained on the byte-multiplexed bus
    pub token_bytes_streamed: AtomicU64,
    /// Cumulative derivation time in nanoseconds
    pub token_time_ns: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_completed(&self, _length: u8) {
        self.records_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fault(&self, fault: &RecordFault) {
        let counter = match fault {
            RecordFault::Protocol(_) => &self.protocol_errors,
            RecordFault::LengthInvalid { .. } => &self.length_rejects,
            RecordFault::DigitInvalid => &self.digit_rejects,
            RecordFault::ChecksumInvalid => &self.luhn_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_classification(&self, hit: bool) {
        if hit {
            self.classification_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.classification_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a token derivation
    ///
    /// # Arguments
    /// * `duration` - Time spent in the keystream derivation
    pub fn record_token(&self, duration: Duration) {
        self.tokens_issued.fetch_add(1, Ordering::Relaxed);
        self.token_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn record_stream_byte(&self) {
        self.token_bytes_streamed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_completed: self.records_completed.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            length_rejects: self.length_rejects.load(Ordering::Relaxed),
            digit_rejects: self.digit_rejects.load(Ordering::Relaxed),
            luhn_failures: self.luhn_failures.load(Ordering::Relaxed),
            classification_hits: self.classification_hits.load(Ordering::Relaxed),
            classification_misses: self.classification_misses.load(Ordering::Relaxed),
            tokens_issued: self.tokens_issued.load(Ordering::Relaxed),
            token_bytes_streamed: self.token_bytes_streamed.load(Ordering::Relaxed),
            avg_token_ns: self.avg_token_time_ns(),
        }
    }

    /// Average derivation time in nanoseconds
    pub fn avg_token_time_ns(&self) -> u64 {
        let total = self.token_time_ns.load(Ordering::Relaxed);
        let count = self.tokens_issued.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        for counter in [
            &self.records_completed,
            &self.protocol_errors,
            &self.length_rejects,
            &self.digit_rejects,
            &self.luhn_failures,
            &self.classification_hits,
            &self.classification_misses,
            &self.tokens_issued,
            &self.token_bytes_streamed,
            &self.token_time_ns,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub records_completed: u64,
    pub protocol_errors: u64,
    pub length_rejects: u64,
    pub digit_rejects: u64,
    pub luhn_failures: u64,
    pub classification_hits: u64,
    pub classification_misses: u64,
    pub tokens_issued: u64,
    pub token_bytes_streamed: u64,
    pub avg_token_ns: u64,
}

/// Trait for custom metrics recording implementations
///
/// Implement this trait to forward pipeline events to an external metrics
/// system such as Prometheus.
pub trait MetricsRecorder: Send + Sync {
    /// A record received its final digit
    fn record_completed(&self, length: u8);

    /// A record stopped short of classification
    fn record_fault(&self, fault: &RecordFault);

    /// A classification was published
    fn record_classification(&self, hit: bool);

    /// A token was derived
    fn record_token(&self, duration: Duration);

    /// One token byte was presented on the byte-multiplexed bus
    fn record_stream_byte(&self);
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_completed(&self, _: u8) {}
    fn record_fault(&self, _: &RecordFault) {}
    fn record_classification(&self, _: bool) {}
    fn record_token(&self, _: Duration) {}
    fn record_stream_byte(&self) {}
}

impl MetricsRecorder for Metrics {
    fn record_completed(&self, length: u8) {
        Metrics::record_completed(self, length);
    }

    fn record_fault(&self, fault: &RecordFault) {
        Metrics::record_fault(self, fault);
    }

    fn record_classification(&self, hit: bool) {
        Metrics::record_classification(self, hit);
    }

    fn record_token(&self, duration: Duration) {
        Metrics::record_token(self, duration);
    }

    fn record_stream_byte(&self) {
        Metrics::record_stream_byte(self);
    }
}
