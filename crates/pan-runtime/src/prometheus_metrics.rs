//! `MetricsRecorder` backed by the Prometheus counters in `pan-telemetry`.

use std::time::Duration;

use pan_pipeline::MetricsRecorder;
use pan_telemetry::{
    metric_inc, CLASSIFICATIONS, RECORDS_COMPLETED, RECORD_FAULTS, TOKENS_ISSUED,
    TOKEN_BYTES_STREAMED, TOKEN_DERIVATION_DURATION,
};
use pan_types::RecordFault;

#[derive(Clone, Copy, Debug, Default)]
pub struct PrometheusMetrics;

impl MetricsRecorder for PrometheusMetrics {
    fn record_completed(&self, _length: u8) {
        metric_inc!(RECORDS_COMPLETED);
    }

    fn record_fault(&self, fault: &RecordFault) {
        metric_inc!(RECORD_FAULTS, &[fault.label()]);
    }

    fn record_classification(&self, hit: bool) {
        metric_inc!(CLASSIFICATIONS, &[if hit { "hit" } else { "miss" }]);
    }

    fn record_token(&self, duration: Duration) {
        metric_inc!(TOKENS_ISSUED);
        TOKEN_DERIVATION_DURATION.observe(duration.as_secs_f64());
    }

    fn record_stream_byte(&self) {
        metric_inc!(TOKEN_BYTES_STREAMED);
    }
}
